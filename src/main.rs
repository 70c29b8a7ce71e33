//! pipelower CLI
//!
//! Reads a JSON translation unit and prints, per step and target, the scatter
//! header, call arguments and output declarations.

use clap::Parser;
use pipelower::{LoweredStep, Target, TranslateConfig, TranslateError, TranslationUnit, Translator};
use std::fs;
use std::path::PathBuf;
use std::process;

/// Lower a pipeline description into workflow-language fragments.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON translation unit
    unit: PathBuf,

    /// Target to emit; repeat for several. Defaults to the unit's targets.
    #[arg(short, long)]
    target: Vec<Target>,

    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();
    setup_logging(&args.log_level);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        if let TranslateError::MultipleErrors { errors, .. } = &e {
            for error in errors {
                eprintln!("  - {}", error);
            }
        }
        process::exit(1);
    }
}

fn setup_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

fn run(args: Args) -> Result<(), TranslateError> {
    let contents = fs::read_to_string(&args.unit).map_err(|e| TranslateError::Io {
        message: format!("Failed to read {}", args.unit.display()),
        cause: e,
    })?;
    let unit: TranslationUnit = serde_json::from_str(&contents).map_err(|e| {
        TranslateError::invalid_definition(format!(
            "Failed to parse {}: {}",
            args.unit.display(),
            e
        ))
    })?;

    let config = match &args.config {
        Some(path) => TranslateConfig::load(path)?,
        None => TranslateConfig::default(),
    };
    let translator = Translator::new(config)?;

    let targets = if !args.target.is_empty() {
        args.target.clone()
    } else if !unit.targets.is_empty() {
        unit.targets.clone()
    } else {
        Target::ALL.to_vec()
    };

    for target in targets {
        let names = unit.naming_table(target);
        let steps = translator.lower_workflow(&unit.steps, target, &names)?;
        println!("== {} ==", target);
        for step in &steps {
            print_step(step, target);
        }
    }
    Ok(())
}

fn print_step(step: &LoweredStep, target: Target) {
    println!("[{}]", step.alias);
    if let Some(plan) = &step.scatter {
        for line in plan.header.render(target).lines() {
            println!("  {}", line);
        }
    }
    println!("  call:");
    for line in step.render_call(target) {
        println!("    {}", line);
    }
    println!("  outputs:");
    for output in &step.outputs {
        for declaration in &output.declarations {
            println!("    {}", declaration);
        }
    }
}

//! Operator rendering rules keyed by (operator, target)

use crate::error::TranslateError;
use crate::expr::OperatorKind;
use crate::target::Target;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Renders already-lowered operands into target text.
pub type RenderFn = fn(&[String]) -> String;

/// How an operator is handled for one target.
#[derive(Clone, Copy)]
pub enum Rule {
    Render(RenderFn),
    /// The target has no way to express the operator
    Unsupported(&'static str),
}

/// The shared built-in registry.
pub static BUILTIN: Lazy<OperatorRegistry> = Lazy::new(OperatorRegistry::builtin);

macro_rules! binary {
    ($op:literal) => {
        |a: &[String]| format!(concat!("({} ", $op, " {})"), a[0], a[1])
    };
}

/// Table of operator rendering rules.
#[derive(Default)]
pub struct OperatorRegistry {
    rules: HashMap<(OperatorKind, Target), Rule>,
}

impl OperatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the rules for every built-in operator and target.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_common();
        registry.register_wdl();
        registry.register_cwl();
        registry.register_nextflow();
        registry
    }

    /// Add or replace a rule.
    pub fn register(&mut self, kind: OperatorKind, target: Target, rule: Rule) {
        self.rules.insert((kind, target), rule);
    }

    pub fn rule(&self, kind: OperatorKind, target: Target) -> Option<&Rule> {
        self.rules.get(&(kind, target))
    }

    /// Render `kind` over lowered operands.
    pub fn render(
        &self,
        kind: OperatorKind,
        target: Target,
        args: &[String],
    ) -> Result<String, TranslateError> {
        if !kind.accepts(args.len()) {
            return Err(TranslateError::invalid_definition(format!(
                "operator {} expects {} operand(s), got {}",
                kind,
                kind.describe_arity(),
                args.len()
            )));
        }
        match self.rule(kind, target) {
            Some(Rule::Render(render)) => Ok(render(args)),
            Some(Rule::Unsupported(reason)) => Err(TranslateError::unsupported_operator(
                kind.name(),
                target.name(),
                *reason,
            )),
            None => Err(TranslateError::unsupported_operator(
                kind.name(),
                target.name(),
                "no rendering rule registered",
            )),
        }
    }

    /// Every (operator, target) pair without a rule.
    pub fn missing(&self) -> Vec<(OperatorKind, Target)> {
        let mut missing = Vec::new();
        for kind in OperatorKind::ALL {
            for target in Target::ALL {
                if !self.rules.contains_key(&(kind, target)) {
                    missing.push((kind, target));
                }
            }
        }
        missing
    }

    /// Fail unless every operator has a rule (or an explicit refusal) for
    /// every target.
    pub fn check_complete(&self) -> Result<(), TranslateError> {
        let missing = self.missing();
        if missing.is_empty() {
            return Ok(());
        }
        Err(TranslateError::IncompleteOperatorRegistry {
            missing: missing
                .into_iter()
                .map(|(kind, target)| format!("{}/{}", kind, target))
                .collect(),
        })
    }

    fn register_common(&mut self) {
        let shared: [(OperatorKind, RenderFn); 12] = [
            (OperatorKind::And, binary!("&&")),
            (OperatorKind::Or, binary!("||")),
            (OperatorKind::Add, binary!("+")),
            (OperatorKind::Subtract, binary!("-")),
            (OperatorKind::Multiply, binary!("*")),
            (OperatorKind::Divide, binary!("/")),
            (OperatorKind::Equal, binary!("==")),
            (OperatorKind::NotEqual, binary!("!=")),
            (OperatorKind::Less, binary!("<")),
            (OperatorKind::Greater, binary!(">")),
            (OperatorKind::Not, |a| format!("!{}", a[0])),
            (OperatorKind::Index, |a| format!("{}[{}]", a[0], a[1])),
        ];
        for target in Target::ALL {
            for (kind, render) in shared {
                self.register(kind, target, Rule::Render(render));
            }
        }
    }

    fn register_wdl(&mut self) {
        let t = Target::Wdl;
        self.register(OperatorKind::If, t, Rule::Render(|a| {
            format!("if ({}) then {} else {}", a[0], a[1], a[2])
        }));
        self.register(OperatorKind::IsDefined, t, Rule::Render(|a| format!("defined({})", a[0])));
        self.register(OperatorKind::Join, t, Rule::Render(|a| format!("sep({}, {})", a[1], a[0])));
        self.register(OperatorKind::BaseName, t, Rule::Render(|a| format!("basename({})", a[0])));
        self.register(OperatorKind::FirstNonNull, t, Rule::Render(|a| {
            format!("select_first([{}])", a.join(", "))
        }));
        self.register(OperatorKind::Length, t, Rule::Render(|a| format!("length({})", a[0])));
        self.register(OperatorKind::Flatten, t, Rule::Render(|a| format!("flatten({})", a[0])));
        self.register(OperatorKind::Transpose, t, Rule::Render(|a| format!("transpose({})", a[0])));
    }

    fn register_cwl(&mut self) {
        let t = Target::Cwl;
        self.register(OperatorKind::If, t, Rule::Render(|a| {
            format!("({} ? {} : {})", a[0], a[1], a[2])
        }));
        self.register(OperatorKind::IsDefined, t, Rule::Render(|a| format!("({} != null)", a[0])));
        self.register(OperatorKind::Join, t, Rule::Render(|a| format!("{}.join({})", a[0], a[1])));
        self.register(OperatorKind::BaseName, t, Rule::Render(|a| format!("{}.basename", a[0])));
        self.register(OperatorKind::FirstNonNull, t, Rule::Render(|a| {
            format!(
                "[{}].filter(function (inner) {{ return inner != null }})[0]",
                a.join(", ")
            )
        }));
        self.register(OperatorKind::Length, t, Rule::Render(|a| format!("{}.length", a[0])));
        self.register(OperatorKind::Flatten, t, Rule::Render(|a| format!("{}.flat()", a[0])));
        self.register(
            OperatorKind::Transpose,
            t,
            Rule::Unsupported("JavaScript expressions have no array transpose"),
        );
    }

    fn register_nextflow(&mut self) {
        let t = Target::Nextflow;
        self.register(OperatorKind::If, t, Rule::Render(|a| {
            format!("({} ? {} : {})", a[0], a[1], a[2])
        }));
        self.register(OperatorKind::IsDefined, t, Rule::Render(|a| format!("({} != null)", a[0])));
        self.register(OperatorKind::Join, t, Rule::Render(|a| format!("{}.join({})", a[0], a[1])));
        self.register(OperatorKind::BaseName, t, Rule::Render(|a| format!("{}.name", a[0])));
        self.register(OperatorKind::FirstNonNull, t, Rule::Render(|a| {
            format!("[{}].find{{ it != null }}", a.join(", "))
        }));
        self.register(OperatorKind::Length, t, Rule::Render(|a| format!("{}.size()", a[0])));
        self.register(OperatorKind::Flatten, t, Rule::Render(|a| format!("{}.flatten()", a[0])));
        self.register(OperatorKind::Transpose, t, Rule::Render(|a| format!("{}.transpose()", a[0])));
    }
}

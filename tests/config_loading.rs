//! Loading settings and translation units from disk.

use pipelower::{
    NamingTable, ScatterSpec, Target, TranslateConfig, TranslateError, TranslationUnit, Translator,
};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pipelower.toml");
    fs::write(
        &path,
        r#"
[scatter]
single_variable = "idx"
multi_variable = "pair"

[nextflow]
stderr_path = "stderr.txt"
"#,
    )
    .unwrap();

    let config = TranslateConfig::load(&path).unwrap();
    assert_eq!(config.scatter.single_variable, "idx");
    assert_eq!(config.scatter.multi_variable, "pair");
    assert_eq!(config.nextflow.stderr_path, "stderr.txt");
    assert_eq!(config.filenames.optional_fallback, "generated");
    assert_eq!(config.cwl.scatter_method, "dotproduct");
}

#[test]
fn test_missing_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = TranslateConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, TranslateConfig::default());
}

#[test]
fn test_unparsable_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[scatter\nsingle_variable = 1").unwrap();
    match TranslateConfig::load(&path) {
        Err(TranslateError::Config { message }) => assert!(message.contains("broken.toml")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_wrongly_typed_config_value() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("typed.toml");
    fs::write(&path, "[scatter]\nsingle_variable = 3\n").unwrap();
    assert!(matches!(
        TranslateConfig::load(&path),
        Err(TranslateError::Config { .. })
    ));
}

#[test]
fn test_configured_scatter_variables_reach_lowering() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("pipelower.toml");
    fs::write(&config_path, "[scatter]\nmulti_variable = \"pair\"\n").unwrap();

    let unit_path = dir.path().join("unit.json");
    fs::write(
        &unit_path,
        r#"{
            "targets": ["wdl"],
            "steps": [{
                "id": "join",
                "tool": {
                    "id": "join",
                    "inputs": [
                        {"id": "left", "data_type": {"Scalar": {"kind": "String"}}},
                        {"id": "right", "data_type": {"Scalar": {"kind": "Int"}}}
                    ],
                    "outputs": [{"id": "out", "data_type": {"Scalar": {"kind": "Stdout"}}}]
                },
                "edges": [
                    {
                        "source": {"WorkflowInput": {"id": "names"}},
                        "destination": "left",
                        "source_type": {"Array": {"item_type": {"Scalar": {"kind": "String"}}}},
                        "dest_type": {"Scalar": {"kind": "String"}}
                    },
                    {
                        "source": {"WorkflowInput": {"id": "counts"}},
                        "destination": "right",
                        "source_type": {"Array": {"item_type": {"Scalar": {"kind": "Int"}}}},
                        "dest_type": {"Scalar": {"kind": "Int"}}
                    }
                ],
                "scatter": {"fields": ["left", "right"]}
            }],
            "naming_tables": {"wdl": {"names": "names", "counts": "counts"}}
        }"#,
    )
    .unwrap();

    let config = TranslateConfig::load(&config_path).unwrap();
    let unit: TranslationUnit = serde_json::from_str(&fs::read_to_string(&unit_path).unwrap()).unwrap();
    assert_eq!(unit.steps[0].scatter, Some(ScatterSpec::dot(&["left", "right"])));

    let translator = Translator::new(config).unwrap();
    let lowered = translator
        .lower_workflow(&unit.steps, Target::Wdl, &unit.naming_table(Target::Wdl))
        .unwrap();
    assert_eq!(
        lowered[0].render_call(Target::Wdl),
        vec!["left=pair.left", "right=pair.right"]
    );

    // Without a naming table nothing resolves
    let result = translator.lower_workflow(&unit.steps, Target::Wdl, &NamingTable::new());
    match result {
        Err(TranslateError::InStep { step, cause }) => {
            assert_eq!(step, unit.steps[0].id);
            assert!(matches!(*cause, TranslateError::UnresolvedReference { .. }));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

//! Expression model tests

use super::*;
use crate::error::TranslateError;
use indexmap::IndexMap;

fn params(pairs: &[(&str, Expression)]) -> IndexMap<String, Expression> {
    pairs
        .iter()
        .map(|(name, expr)| (name.to_string(), expr.clone()))
        .collect()
}

#[test]
fn test_expr_render_literals() {
    assert_eq!(format!("{}", Expression::boolean(false)), "false");
    assert_eq!(format!("{}", Expression::int(1)), "1");
    assert_eq!(format!("{}", Expression::float(3.0)), "3.0");
    assert_eq!(format!("{}", Expression::float(2.5)), "2.5");
    assert_eq!(format!("{}", Expression::string("abc")), "\"abc\"");
    assert_eq!(format!("{}", Expression::null()), "None");
}

#[test]
fn test_expr_render_composites() {
    let expr = Expression::array(vec![Expression::int(1), Expression::input("x")]);
    assert_eq!(expr.to_string(), "[1, inputs.x]");

    let expr = Expression::filename_from(
        "{source}.sorted.bam",
        Expression::input_without_extension("bam"),
    );
    assert_eq!(
        expr.to_string(),
        "filename(\"{source}.sorted.bam\", inputs.bam!noext)"
    );

    let expr = Expression::if_then_else(
        Expression::is_defined(Expression::input("a")),
        Expression::input("a"),
        Expression::string("b"),
    );
    assert_eq!(expr.to_string(), "If(IsDefined(inputs.a), inputs.a, \"b\")");
}

#[test]
fn test_null_and_references() {
    assert!(Expression::null().is_null());
    assert!(!Expression::string("").is_null());
    assert_eq!(Expression::input("z").as_input_reference(), Some("z"));
}

#[test]
fn test_wildcard_validation() {
    assert!(Expression::wildcard("*.bam").is_ok());
    assert!(Expression::wildcard("out/**/*.txt").is_ok());
    match Expression::wildcard("a***b") {
        Err(TranslateError::InvalidDefinition { message }) => {
            assert!(message.contains("a***b"))
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_template_parsing() {
    let p = params(&[
        ("tumorName", Expression::input("tumor")),
        ("normalName", Expression::input("normal")),
    ]);
    let parts = template::parse_format("{tumorName}:{normalName}", &p).unwrap();
    assert_eq!(
        parts,
        vec![
            TemplatePart::Param("tumorName".to_string()),
            TemplatePart::Text(":".to_string()),
            TemplatePart::Param("normalName".to_string()),
        ]
    );

    let parts = template::parse_format("no params here", &IndexMap::new()).unwrap();
    assert_eq!(parts, vec![TemplatePart::Text("no params here".to_string())]);
}

#[test]
fn test_template_missing_param() {
    let result = Expression::string_template("{missing} value", IndexMap::new());
    assert!(matches!(
        result,
        Err(TranslateError::InvalidDefinition { .. })
    ));
}

#[test]
fn test_operator_arity() {
    assert!(OperatorKind::If.accepts(3));
    assert!(!OperatorKind::If.accepts(2));
    assert!(OperatorKind::FirstNonNull.accepts(5));
    assert!(!OperatorKind::FirstNonNull.accepts(0));
    assert_eq!(OperatorKind::Add.describe_arity(), "2");
    assert_eq!(OperatorKind::FirstNonNull.describe_arity(), "at least 1");
    assert_eq!(OperatorKind::ALL.len(), 20);
}

#[test]
fn test_deserialize_from_json() {
    let json = r#"{"Operator":{"kind":"Add","operands":[
        {"InputReference":{"input_id":"a"}},
        {"Literal":{"value":"_suffix"}}
    ]}}"#;
    let expr: Expression = serde_json::from_str(json).unwrap();
    assert_eq!(
        expr,
        Expression::add(Expression::input("a"), Expression::string("_suffix"))
    );

    let null: Expression = serde_json::from_str(r#"{"Literal":{"value":null}}"#).unwrap();
    assert!(null.is_null());
    let int: Expression = serde_json::from_str(r#"{"Literal":{"value":3}}"#).unwrap();
    assert_eq!(int, Expression::int(3));
}

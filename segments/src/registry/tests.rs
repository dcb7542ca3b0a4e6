use super::{FieldDescriptor, FieldRegistry};
use crate::compiler::SqlValue;
use crate::errors::SegmentError;
use crate::types::{Operator, Value, ValueType};

fn registry() -> FieldRegistry {
    FieldRegistry::new()
        .with_field("total_spent", FieldDescriptor::number("Total spent", "total_spent_expr"))
        .with_field("email", FieldDescriptor::string("Email", "c.email"))
        .with_field(
            "accepts_marketing",
            FieldDescriptor::boolean("Accepts marketing", "accepts_marketing_expr"),
        )
}

#[test]
fn test_describe_known_field() {
    let registry = registry();
    let descriptor = registry.describe("total_spent").unwrap();
    assert_eq!(descriptor.label, "Total spent");
    assert_eq!(descriptor.value_type, ValueType::Number);
    assert_eq!(descriptor.column, "total_spent_expr");
    assert_eq!(
        descriptor.allowed_operators,
        vec![
            Operator::Equals,
            Operator::Gt,
            Operator::Lt,
            Operator::Gte,
            Operator::Lte
        ]
    );
}

#[test]
fn test_describe_unknown_field() {
    let err = registry().describe("phone").unwrap_err();
    assert_eq!(err, SegmentError::UnknownField("phone".to_string()));
}

#[test]
fn test_operator_legality() {
    let registry = registry();
    assert!(registry.is_operator_allowed("total_spent", Operator::Gte));
    assert!(!registry.is_operator_allowed("total_spent", Operator::Contains));
    assert!(registry.is_operator_allowed("email", Operator::Contains));
    assert!(!registry.is_operator_allowed("email", Operator::Gt));
    assert!(registry.is_operator_allowed("accepts_marketing", Operator::Equals));
    assert!(!registry.is_operator_allowed("accepts_marketing", Operator::Contains));
    assert!(!registry.is_operator_allowed("phone", Operator::Equals));
}

#[test]
fn test_with_operators_drops_type_invalid_operators() {
    let descriptor = FieldDescriptor::boolean("Flag", "flag")
        .with_operators(&[Operator::Equals, Operator::Gt, Operator::Contains]);
    assert_eq!(descriptor.allowed_operators, vec![Operator::Equals]);

    let descriptor = FieldDescriptor::string("Type", "t").with_operators(&[Operator::Equals]);
    assert!(!descriptor.allows(Operator::Contains));
}

#[test]
fn test_coerce_numeric_string() {
    let registry = registry();
    assert_eq!(
        registry.coerce("total_spent", &Value::from("42")).unwrap(),
        SqlValue::Integer(42)
    );
    assert_eq!(
        registry.coerce("total_spent", &Value::from(" 99.5 ")).unwrap(),
        SqlValue::Float(99.5)
    );
    assert_eq!(
        registry.coerce("total_spent", &Value::from(100)).unwrap(),
        SqlValue::Integer(100)
    );
}

#[test]
fn test_coerce_rejects_non_numeric_string() {
    let err = registry()
        .coerce("total_spent", &Value::from("abc"))
        .unwrap_err();
    assert_eq!(
        err,
        SegmentError::TypeCoercion {
            field: "total_spent".to_string(),
            expected: ValueType::Number,
            value: Value::from("abc"),
        }
    );

    for raw in [Value::from("NaN"), Value::from("inf"), Value::from(true)] {
        assert!(matches!(
            registry().coerce("total_spent", &raw),
            Err(SegmentError::TypeCoercion { .. })
        ));
    }
}

#[test]
fn test_coerce_boolean() {
    let registry = registry();
    assert_eq!(
        registry.coerce("accepts_marketing", &Value::from(true)).unwrap(),
        SqlValue::Bool(true)
    );
    assert_eq!(
        registry.coerce("accepts_marketing", &Value::from("FALSE")).unwrap(),
        SqlValue::Bool(false)
    );
    assert_eq!(
        registry.coerce("accepts_marketing", &Value::from(1)).unwrap(),
        SqlValue::Bool(true)
    );
    assert!(registry.coerce("accepts_marketing", &Value::from(2)).is_err());
    assert!(registry.coerce("accepts_marketing", &Value::from("yes")).is_err());
}

#[test]
fn test_coerce_string() {
    let registry = registry();
    assert_eq!(
        registry.coerce("email", &Value::from("a@b.c")).unwrap(),
        SqlValue::String("a@b.c".to_string())
    );
    assert_eq!(
        registry.coerce("email", &Value::from(12345)).unwrap(),
        SqlValue::String("12345".to_string())
    );
    assert!(registry.coerce("email", &Value::from(false)).is_err());
}

#[test]
fn test_coerce_unknown_field() {
    assert_eq!(
        registry().coerce("phone", &Value::from("1")).unwrap_err(),
        SegmentError::UnknownField("phone".to_string())
    );
}

#[test]
fn test_catalog_preserves_registration_order() {
    let catalog = registry().catalog();
    let names: Vec<&str> = catalog.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["total_spent", "email", "accepts_marketing"]);
    assert_eq!(catalog[1].operators, vec![Operator::Equals, Operator::Contains]);

    let json = serde_json::to_value(&catalog[2]).unwrap();
    assert_eq!(json["value_type"], "boolean");
    assert_eq!(json["operators"], serde_json::json!(["equals"]));
}

#[test]
fn test_customer_registry_fields() {
    let registry = crate::customers::registry();
    assert_eq!(registry.len(), 9);
    assert!(registry.is_operator_allowed("order_count", Operator::Gte));
    assert!(registry.is_operator_allowed("city", Operator::Contains));
    assert!(!registry.is_operator_allowed("customer_type", Operator::Contains));
}

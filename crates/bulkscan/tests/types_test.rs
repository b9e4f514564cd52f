//! Unit tests for bulkscan types module

use bulkscan::error::ErrorCategory;
use bulkscan::types::{Row, Value};
use chrono::NaiveDate;

#[test]
fn test_value_null() {
    let v = Value::Null;
    assert!(v.is_null());
    assert_eq!(v.as_i64(), None);
}

#[test]
fn test_value_integer_types() {
    assert_eq!(Value::Int8(8).as_i64(), Some(8));
    assert_eq!(Value::Int16(16).as_i64(), Some(16));
    assert_eq!(Value::Int32(32).as_i64(), Some(32));
    assert_eq!(Value::Int64(64).as_i64(), Some(64));
    assert_eq!(Value::UInt64(64).as_i64(), Some(64));
}

#[test]
fn test_value_string_and_bytes() {
    let v = Value::from("hello");
    assert_eq!(v.as_str(), Some("hello"));

    let v = Value::from(vec![1u8, 2, 3]);
    assert_eq!(v, Value::Bytes(vec![1, 2, 3]));
    assert_eq!(v.as_str(), None);
}

#[test]
fn test_value_date() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let v = Value::from(date);

    assert_eq!(v, Value::Date(date));
}

#[test]
fn test_value_from_option() {
    let none_val: Option<i32> = None;
    assert!(Value::from(none_val).is_null());
    assert_eq!(Value::from(Some(5_i64)), Value::Int64(5));
}

#[test]
fn test_value_serialization() {
    let v = Value::String("test".to_string());
    let json = serde_json::to_string(&v).unwrap();
    assert!(json.contains("test"));

    let v2: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v, v2);
}

#[test]
fn test_row_get_by_index() {
    let row = Row::new(
        vec!["id".to_string(), "name".to_string()],
        vec![Value::Int32(1), Value::String("Alice".to_string())],
    )
    .unwrap();

    assert_eq!(row.len(), 2);
    assert!(!row.is_empty());
    assert_eq!(row.get(0).and_then(Value::as_i64), Some(1));
    assert_eq!(row.get(1).and_then(Value::as_str), Some("Alice"));
    assert!(row.get(2).is_none());
}

#[test]
fn test_row_get_by_name_ignores_case() {
    let row = Row::from_pairs([("ID", Value::Int64(9)), ("Name", Value::from("Bo"))]);

    assert_eq!(row.get_by_name("id"), Some(&Value::Int64(9)));
    assert_eq!(row.get_by_name("name").and_then(Value::as_str), Some("Bo"));
    assert!(row.get_by_name("unknown").is_none());
}

#[test]
fn test_row_iter_keeps_column_order() {
    let row = Row::from_pairs([("b", 2_i64), ("a", 1_i64)]);
    let columns: Vec<&str> = row.iter().map(|(c, _)| c).collect();
    assert_eq!(columns, vec!["b", "a"]);
}

#[test]
fn test_row_new_rejects_mismatched_lengths() {
    let err = Row::new(vec!["id".to_string()], vec![]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidInput);

    let err = Row::new(vec![], vec![Value::Int64(1)]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidInput);
}

#[test]
fn test_row_into_parts() {
    let row = Row::from_pairs([("id", Value::Int32(1)), ("name", Value::from("Alice"))]);
    let (columns, values) = row.into_parts();

    assert_eq!(columns, vec!["id", "name"]);
    assert_eq!(values, vec![Value::Int32(1), Value::from("Alice")]);
}

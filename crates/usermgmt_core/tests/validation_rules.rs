use serde_json::{json, Value};
use usermgmt_core::{validate_record, Rule, User, UserStore};

fn base_record() -> Value {
    json!({"id": 11, "name": "Fiona Gallagher", "email": "fionagallagher@example.com"})
}

fn with(field: &str, value: Value) -> Value {
    let mut record = base_record();
    record[field] = value;
    record
}

fn without(field: &str) -> Value {
    let mut record = base_record();
    record.as_object_mut().unwrap().remove(field);
    record
}

#[test]
fn malformed_records_report_their_rule_and_are_never_admitted() {
    let cases = vec![
        (without("id"), "id", Rule::MissingField),
        (without("name"), "name", Rule::MissingField),
        (without("email"), "email", Rule::MissingField),
        (with("id", json!(0)), "id", Rule::IdNotPositive),
        (with("id", json!(-3)), "id", Rule::IdNotPositive),
        (with("id", json!("11")), "id", Rule::WrongType),
        (with("name", json!("Al")), "name", Rule::NameTooShort),
        (with("name", json!("   ")), "name", Rule::NameTooShort),
        (with("name", json!(["George Costanza"])), "name", Rule::WrongType),
        (with("email", json!("")), "email", Rule::EmailInvalid),
        (with("email", json!("michaelscott@.com")), "email", Rule::EmailInvalid),
        (
            with("email", json!({"email": "holly@example.com"})),
            "email",
            Rule::WrongType,
        ),
        (with("nickname", json!("fi")), "nickname", Rule::UnknownField),
    ];

    let store = UserStore::new();
    for (record, field, rule) in cases {
        let errors = validate_record(&record).unwrap_err();
        assert!(
            errors.contains(field, rule),
            "{record} should violate {rule} on {field}, got {errors}"
        );
        assert!(store.add(&record).is_err());
    }
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn name_is_trimmed_before_length_check_and_storage() {
    let user = validate_record(&with("name", json!("  Ann  "))).unwrap();
    assert_eq!(user.name(), "Ann");

    let errors = validate_record(&with("name", json!("  Al   "))).unwrap_err();
    assert!(errors.contains("name", Rule::NameTooShort));
}

#[test]
fn violation_carries_offending_value() {
    let errors = validate_record(&with("id", json!(-9))).unwrap_err();
    let violation = &errors.violations()[0];
    assert_eq!(violation.field, "id");
    assert_eq!(violation.value, Some(json!(-9)));
}

#[test]
fn user_serializes_to_exact_record_shape() {
    let user = User::new(5, "Nick Rijo", "nickrijo245@example.com").unwrap();
    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(
        json,
        json!({"id": 5, "name": "Nick Rijo", "email": "nickrijo245@example.com"})
    );
    assert_eq!(json, user.to_record());
}

#[test]
fn deserializing_a_user_applies_validation() {
    let decoded: User = serde_json::from_value(base_record()).unwrap();
    assert_eq!(decoded.id(), 11);

    let err = serde_json::from_value::<User>(with("extra", json!(true))).unwrap_err();
    assert!(err.to_string().contains("unknown_field"));
}

//! Record admission rules.
//!
//! # Responsibility
//! - Decide whether a loosely-typed candidate is a valid user record.
//! - Report every violated rule at once instead of stopping at the first.
//!
//! # Invariants
//! - Validation is pure: no logging, no shared state.
//! - A failure always carries at least one violation.
//! - Violation order is stable: `id`, `name`, `email`, then unknown keys in
//!   key order.

use crate::model::user::{User, UserId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minimum trimmed name length, counted in characters.
pub const NAME_MIN_CHARS: usize = 3;

/// Keys a record object may carry. Anything else is rejected.
pub const RECORD_FIELDS: [&str; 3] = ["id", "name", "email"];

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
    )
    .expect("valid email regex")
});

/// Rule violated by a candidate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Candidate is not a JSON object at all.
    NotAnObject,
    MissingField,
    WrongType,
    IdNotPositive,
    NameTooShort,
    EmailInvalid,
    UnknownField,
    /// Id-keyed bulk documents only: map key differs from the record `id`.
    KeyMismatch,
}

impl Rule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotAnObject => "not_an_object",
            Self::MissingField => "missing_field",
            Self::WrongType => "wrong_type",
            Self::IdNotPositive => "id_not_positive",
            Self::NameTooShort => "name_too_short",
            Self::EmailInvalid => "email_invalid",
            Self::UnknownField => "unknown_field",
            Self::KeyMismatch => "key_mismatch",
        }
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed rule together with the offending field and value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Field name, or empty when the whole candidate is at fault.
    pub field: String,
    pub rule: Rule,
    /// Offending value; `None` when the field is absent.
    pub value: Option<Value>,
}

impl Violation {
    pub fn new(field: impl Into<String>, rule: Rule, value: Option<Value>) -> Self {
        Self {
            field: field.into(),
            rule,
            value,
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.rule)?;
        } else {
            write!(f, "{}: {}", self.field, self.rule)?;
        }
        if let Some(value) = &self.value {
            write!(f, " (got {value})")?;
        }
        Ok(())
    }
}

/// Non-empty, ordered list of violations for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<Violation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns whether `rule` was violated on `field`.
    pub fn contains(&self, field: &str, rule: Rule) -> bool {
        self.0
            .iter()
            .any(|violation| violation.field == field && violation.rule == rule)
    }

    pub(crate) fn single(violation: Violation) -> Self {
        Self(vec![violation])
    }

    pub(crate) fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "record validation failed: ")?;
        for (index, violation) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

/// Validates one candidate record and returns the normalized user.
///
/// The returned user has its name trimmed. All rules are evaluated, so the
/// error lists every problem with the candidate.
pub fn validate_record(candidate: &Value) -> Result<User, ValidationErrors> {
    let Some(object) = candidate.as_object() else {
        return Err(ValidationErrors::single(Violation::new(
            "",
            Rule::NotAnObject,
            Some(candidate.clone()),
        )));
    };

    let mut violations = Vec::new();
    let id = check_id(object, &mut violations);
    let name = check_name(object, &mut violations);
    let email = check_email(object, &mut violations);

    let mut unknown: Vec<(&String, &Value)> = object
        .iter()
        .filter(|(key, _)| !RECORD_FIELDS.contains(&key.as_str()))
        .collect();
    unknown.sort_by(|left, right| left.0.cmp(right.0));
    for (key, value) in unknown {
        violations.push(Violation::new(
            key.as_str(),
            Rule::UnknownField,
            Some(value.clone()),
        ));
    }

    match (id, name, email) {
        (Some(id), Some(name), Some(email)) if violations.is_empty() => {
            Ok(User::from_validated(id, name, email))
        }
        _ => Err(ValidationErrors(violations)),
    }
}

/// Returns whether `email` matches the accepted address grammar.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn check_id(object: &Map<String, Value>, violations: &mut Vec<Violation>) -> Option<UserId> {
    let value = match object.get("id") {
        Some(value) => value,
        None => {
            violations.push(Violation::new("id", Rule::MissingField, None));
            return None;
        }
    };

    if let Some(id) = value.as_u64() {
        if id == 0 {
            violations.push(Violation::new("id", Rule::IdNotPositive, Some(value.clone())));
            return None;
        }
        return Some(id);
    }
    if value.as_i64().is_some() {
        // Negative integers.
        violations.push(Violation::new("id", Rule::IdNotPositive, Some(value.clone())));
        return None;
    }

    violations.push(Violation::new("id", Rule::WrongType, Some(value.clone())));
    None
}

fn check_name(object: &Map<String, Value>, violations: &mut Vec<Violation>) -> Option<String> {
    let value = match object.get("name") {
        Some(value) => value,
        None => {
            violations.push(Violation::new("name", Rule::MissingField, None));
            return None;
        }
    };
    let Some(raw) = value.as_str() else {
        violations.push(Violation::new("name", Rule::WrongType, Some(value.clone())));
        return None;
    };

    let trimmed = raw.trim();
    if trimmed.chars().count() < NAME_MIN_CHARS {
        violations.push(Violation::new("name", Rule::NameTooShort, Some(value.clone())));
        return None;
    }
    Some(trimmed.to_string())
}

fn check_email(object: &Map<String, Value>, violations: &mut Vec<Violation>) -> Option<String> {
    let value = match object.get("email") {
        Some(value) => value,
        None => {
            violations.push(Violation::new("email", Rule::MissingField, None));
            return None;
        }
    };
    let Some(email) = value.as_str() else {
        violations.push(Violation::new("email", Rule::WrongType, Some(value.clone())));
        return None;
    };

    if !is_valid_email(email) {
        violations.push(Violation::new("email", Rule::EmailInvalid, Some(value.clone())));
        return None;
    }
    Some(email.to_string())
}

#[cfg(test)]
mod tests {
    use super::{is_valid_email, validate_record, Rule};
    use serde_json::json;

    #[test]
    fn accepts_well_formed_record_and_trims_name() {
        let user = validate_record(&json!({
            "id": 7,
            "name": "  Karl Gekot  ",
            "email": "karlgekot435@example.com"
        }))
        .unwrap();
        assert_eq!(user.id(), 7);
        assert_eq!(user.name(), "Karl Gekot");
        assert_eq!(user.email(), "karlgekot435@example.com");
    }

    #[test]
    fn name_of_exactly_three_chars_is_accepted() {
        assert!(validate_record(&json!({"id": 1, "name": "Bob", "email": "b@x.io"})).is_ok());
    }

    #[test]
    fn reports_every_violation_in_stable_order() {
        let err = validate_record(&json!({
            "id": 0,
            "name": " X ",
            "email": "nope",
            "role": "admin",
            "age": 3
        }))
        .unwrap_err();

        let rules: Vec<(&str, Rule)> = err
            .violations()
            .iter()
            .map(|violation| (violation.field.as_str(), violation.rule))
            .collect();
        assert_eq!(
            rules,
            vec![
                ("id", Rule::IdNotPositive),
                ("name", Rule::NameTooShort),
                ("email", Rule::EmailInvalid),
                ("age", Rule::UnknownField),
                ("role", Rule::UnknownField),
            ]
        );
    }

    #[test]
    fn missing_and_mistyped_fields_are_reported() {
        let err = validate_record(&json!({"id": "1", "name": ["Bob Smith"]})).unwrap_err();
        assert!(err.contains("id", Rule::WrongType));
        assert!(err.contains("name", Rule::WrongType));
        assert!(err.contains("email", Rule::MissingField));
        assert_eq!(err.len(), 3);
    }

    #[test]
    fn negative_and_fractional_ids_are_rejected() {
        let negative =
            validate_record(&json!({"id": -4, "name": "Bob Smith", "email": "b@x.io"}))
                .unwrap_err();
        assert!(negative.contains("id", Rule::IdNotPositive));

        let fractional =
            validate_record(&json!({"id": 1.5, "name": "Bob Smith", "email": "b@x.io"}))
                .unwrap_err();
        assert!(fractional.contains("id", Rule::WrongType));
    }

    #[test]
    fn non_object_candidate_is_a_single_violation() {
        let err = validate_record(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.violations()[0].rule, Rule::NotAnObject);
    }

    #[test]
    fn email_grammar_accepts_common_addresses() {
        for email in [
            "a@b.co",
            "standardusernamehere123@example.com",
            "first.last+tag@sub.example.org",
            "o'hara@example.ie",
        ] {
            assert!(is_valid_email(email), "{email} should be valid");
        }
    }

    #[test]
    fn email_grammar_rejects_malformed_addresses() {
        for email in [
            "",
            "@example.com",
            "oscarmartinezexample.com",
            "michaelscott@.com",
            "rachelgreen222@",
            "nancydrew999@example$.com",
            "pambeesly111@example.%com",
            "quentintarantino@examplecom",
            "sheldoncooper@example.",
            "double..dot@example.com",
            ".leading@example.com",
            "spaced out@example.com",
            "dash@-example.com",
        ] {
            assert!(!is_valid_email(email), "{email} should be invalid");
        }
    }

    #[test]
    fn display_lists_violations() {
        let err = validate_record(&json!({"id": 2, "name": "X"})).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("record validation failed: "));
        assert!(message.contains("name: name_too_short"));
        assert!(message.contains("email: missing_field"));
    }
}

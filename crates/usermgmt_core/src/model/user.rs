//! User domain model.
//!
//! # Invariants
//! - `id >= 1`.
//! - `name` is trimmed and at least `NAME_MIN_CHARS` characters long.
//! - `email` matches the accepted address grammar.
//!
//! Fields are private; every constructor runs `validate_record`, so holding a
//! `User` is proof that the record was admitted.

use crate::model::validation::{validate_record, ValidationErrors};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};

/// Stable user identifier, unique within one store.
pub type UserId = u64;

/// Validated user record.
///
/// Serializes to exactly `{ "id", "name", "email" }`, the same shape accepted
/// by single adds and bulk loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct User {
    id: UserId,
    name: String,
    email: String,
}

impl User {
    /// Builds a user from typed parts, applying the same rules as untyped input.
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, ValidationErrors> {
        validate_record(&json!({
            "id": id,
            "name": name.into(),
            "email": email.into(),
        }))
    }

    /// Only called by the validator once every rule has passed.
    pub(crate) fn from_validated(id: UserId, name: String, email: String) -> Self {
        Self { id, name, email }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Converts back into the loosely-typed record shape.
    pub fn to_record(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
        })
    }
}

impl TryFrom<Value> for User {
    type Error = ValidationErrors;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        validate_record(&value)
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - ID: {}, Email: {}", self.name, self.id, self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::User;
    use crate::model::validation::Rule;

    #[test]
    fn new_runs_validation() {
        let err = User::new(0, "Al", "not-an-email").unwrap_err();
        assert!(err.contains("id", Rule::IdNotPositive));
        assert!(err.contains("name", Rule::NameTooShort));
        assert!(err.contains("email", Rule::EmailInvalid));
    }

    #[test]
    fn display_matches_listing_format() {
        let user = User::new(3, "Veronica Mars", "veronicamars@example.com").unwrap();
        assert_eq!(
            user.to_string(),
            "Veronica Mars - ID: 3, Email: veronicamars@example.com"
        );
    }
}

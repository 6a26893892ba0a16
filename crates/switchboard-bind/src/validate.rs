//! Validation adapter over the `validator` engine.
//!
//! This module is a pass-through: the constraint vocabulary (required,
//! length, range, email, ...) belongs to the engine and is declared on
//! the target type with `#[derive(Validate)]`. The adapter's only job is
//! the error shape — flattening the engine's nested report into a flat,
//! ordered list of [`FieldError`]s, all of them, never just the first.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// One structural validation failure attached to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the failing field (`"address.street"`,
    /// `"items[2].qty"`).
    pub field: String,
    /// Human-readable description of the failure.
    pub message: String,
}

/// Runs structural validation over a bound value.
///
/// Returns an empty vector when the value is valid. Failures are
/// flattened across nested structs and lists, and sorted by field path so
/// the report is deterministic regardless of the engine's internal map
/// ordering.
///
/// # Example
///
/// ```rust
/// use switchboard_bind::check;
/// use validator::Validate;
///
/// #[derive(Validate)]
/// struct Signup {
///     #[validate(length(min = 3, message = "username too short"))]
///     username: String,
/// }
///
/// let errors = check(&Signup { username: "ab".into() });
/// assert_eq!(errors[0].field, "username");
/// assert_eq!(errors[0].message, "username too short");
/// ```
#[must_use]
pub fn check<T: Validate>(value: &T) -> Vec<FieldError> {
    match value.validate() {
        Ok(()) => Vec::new(),
        Err(report) => {
            let mut errors = Vec::new();
            flatten("", &report, &mut errors);
            errors.sort_by(|a, b| a.field.cmp(&b.field));
            errors
        }
    }
}

fn flatten(prefix: &str, report: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in report.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(failures) => {
                for failure in failures {
                    let message = failure.message.as_ref().map_or_else(
                        || format!("validation failed on '{}'", failure.code),
                        ToString::to_string,
                    );
                    out.push(FieldError {
                        field: path.clone(),
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Address {
        #[validate(length(min = 1, message = "street is required"))]
        street: String,
    }

    #[derive(Validate)]
    struct Signup {
        #[validate(length(min = 3, message = "username too short"))]
        username: String,
        #[validate(email(message = "invalid email"))]
        email: String,
        #[validate(range(min = 13, max = 130))]
        age: u32,
        #[validate(nested)]
        address: Address,
    }

    fn valid_signup() -> Signup {
        Signup {
            username: "alice".into(),
            email: "alice@example.com".into(),
            age: 30,
            address: Address {
                street: "1 Main St".into(),
            },
        }
    }

    #[test]
    fn test_valid_value_yields_no_errors() {
        assert!(check(&valid_signup()).is_empty());
    }

    #[test]
    fn test_all_failures_are_collected() {
        let mut signup = valid_signup();
        signup.username = "ab".into();
        signup.email = "not-an-email".into();

        let errors = check(&signup);
        assert_eq!(errors.len(), 2);

        // Sorted by field path.
        assert_eq!(errors[0].field, "email");
        assert_eq!(errors[0].message, "invalid email");
        assert_eq!(errors[1].field, "username");
        assert_eq!(errors[1].message, "username too short");
    }

    #[test]
    fn test_code_fallback_when_no_message() {
        let mut signup = valid_signup();
        signup.age = 5;

        let errors = check(&signup);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "age");
        assert!(errors[0].message.contains("range"));
    }

    #[test]
    fn test_nested_struct_paths_are_dotted() {
        let mut signup = valid_signup();
        signup.address.street = String::new();

        let errors = check(&signup);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "address.street");
        assert_eq!(errors[0].message, "street is required");
    }

    #[test]
    fn test_field_error_serializes() {
        let error = FieldError {
            field: "email".into(),
            message: "invalid email".into(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains(r#""field":"email""#));

        let parsed: FieldError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, error);
    }
}

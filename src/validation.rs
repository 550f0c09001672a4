//! Field-level validation errors.
//!
//! Errors are keyed by a dotted field path (`weeks.0.workouts.1.day`) so both
//! request forms and nested AI output report where a problem was found.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.entry(path.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.0.get(path).map(Vec::as_slice)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    /// Flattened `path: message` lines, one per violation.
    pub fn messages(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(path, messages)| {
                messages.iter().map(move |message| {
                    if path.is_empty() {
                        message.clone()
                    } else {
                        format!("{path}: {message}")
                    }
                })
            })
            .collect()
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        collect(&errors, "", &mut out);
        out
    }
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    out.add(path.clone(), describe(error));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{path}.{index}"), out);
                }
            }
        }
    }
}

fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let bound = |name: &str| error.params.get(name).map(|v| v.to_string());
    match error.code.as_ref() {
        "length" => match (bound("min"), bound("max")) {
            (Some(min), Some(max)) => format!("must have between {min} and {max} items"),
            (Some(min), None) => format!("must have at least {min} item(s)"),
            (None, Some(max)) => format!("must have at most {max} item(s)"),
            _ => "invalid length".to_string(),
        },
        "range" => match (bound("min"), bound("max")) {
            (Some(min), Some(max)) => format!("must be between {min} and {max}"),
            (Some(min), None) => format!("must be at least {min}"),
            (None, Some(max)) => format!("must be at most {max}"),
            _ => "out of range".to_string(),
        },
        code => format!("invalid value ({code})"),
    }
}

/// Builds a validator error carrying a human-readable message.
pub fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Rejects values outside a fixed set of lowercase options.
pub fn one_of(
    value: &str,
    options: &[&str],
    code: &'static str,
    message: &'static str,
) -> Result<(), ValidationError> {
    if options.contains(&value) {
        Ok(())
    } else {
        let mut error = invalid(code, message);
        error.add_param(Cow::Borrowed("value"), &value);
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Inner {
        #[validate(range(min = 1, max = 5, message = "Level must be between 1 and 5"))]
        level: i64,
    }

    #[derive(Validate)]
    struct Outer {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(nested)]
        items: Vec<Inner>,
    }

    #[test]
    fn test_nested_paths_are_dotted() {
        let outer = Outer {
            name: String::new(),
            items: vec![Inner { level: 3 }, Inner { level: 9 }],
        };

        let errors = FieldErrors::from(outer.validate().unwrap_err());

        assert_eq!(errors.get("name"), Some(&["Name is required".to_string()][..]));
        assert_eq!(
            errors.get("items.1.level"),
            Some(&["Level must be between 1 and 5".to_string()][..])
        );
        assert!(!errors.contains("items.0.level"));
    }

    #[test]
    fn test_messages_prefix_path() {
        let mut errors = FieldErrors::new();
        errors.add("calories", "Cardio workouts should include calories burned");
        errors.add("", "missing field `title`");

        assert_eq!(
            errors.messages(),
            vec![
                "missing field `title`".to_string(),
                "calories: Cardio workouts should include calories burned".to_string(),
            ]
        );
    }

    #[test]
    fn test_one_of() {
        assert!(one_of("monday", &["monday"], "day", "bad day").is_ok());
        let error = one_of("Monday", &["monday"], "day", "bad day").unwrap_err();
        assert_eq!(error.code, "day");
    }
}

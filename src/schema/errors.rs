use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// Machine-readable validation failure codes.
///
/// Codes are stable strings intended for clients that map failures to
/// field-level messages; [`ErrorCode::as_str`] is the wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Type,
    Enum,
    Format,
    Pattern,
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MultipleOf,
    MinimumLength,
    MaximumLength,
    MinimumItems,
    MaximumItems,
    UniqueItems,
    MinimumProperties,
    MaximumProperties,
    RequiredProperty,
    AdditionalProperty,
    AdditionalItems,
    Property,
    AnyOf,
    OneOf,
    Not,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Type => "type_error",
            Self::Enum => "enum_error",
            Self::Format => "format_error",
            Self::Pattern => "pattern_error",
            Self::Minimum => "minimum_error",
            Self::Maximum => "maximum_error",
            Self::ExclusiveMinimum => "exclusive_minimum_error",
            Self::ExclusiveMaximum => "exclusive_maximum_error",
            Self::MultipleOf => "multiple_of_error",
            Self::MinimumLength => "minimum_length_error",
            Self::MaximumLength => "maximum_length_error",
            Self::MinimumItems => "minimum_items_error",
            Self::MaximumItems => "maximum_items_error",
            Self::UniqueItems => "unique_items_error",
            Self::MinimumProperties => "minimum_properties_error",
            Self::MaximumProperties => "maximum_properties_error",
            Self::RequiredProperty => "required_property_error",
            Self::AdditionalProperty => "additional_property_error",
            Self::AdditionalItems => "additional_items_error",
            Self::Property => "property_error",
            Self::AnyOf => "any_of_error",
            Self::OneOf => "one_of_error",
            Self::Not => "not_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the path from the validated root to a failing value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Descended into an object property
    Property(String),
    /// Descended into an array element
    Index(usize),
}

/// A schema validation failure.
///
/// Carries a machine-readable [`ErrorCode`], a human-readable message, a
/// free-form context map (expected values, limits) and the path from the
/// validated root to the offending value. As an error bubbles out of nested
/// validators each level prepends its own segment, so the final
/// [`property_path`](Self::property_path) reads like `address.street.number`
/// or `tags[3].id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    code: ErrorCode,
    message: String,
    context: Map<String, Value>,
    path: Vec<PathSegment>,
}

impl ValidationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Map::new(),
            path: Vec::new(),
        }
    }

    /// Attach a context entry (an expected value, a limit, the offending
    /// property name).
    #[must_use]
    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    /// Re-raise the error one object level up, under `name`.
    #[must_use]
    pub fn at_property(mut self, name: &str) -> Self {
        self.path.insert(0, PathSegment::Property(name.to_string()));
        self
    }

    /// Re-raise the error one array level up, at `index`.
    #[must_use]
    pub fn at_index(mut self, index: usize) -> Self {
        self.path.insert(0, PathSegment::Index(index));
        self
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    #[must_use]
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Dotted path from the validated root to the failing value:
    /// `address.zip`, `tags[3].id`. Empty when the root itself failed.
    #[must_use]
    pub fn property_path(&self) -> String {
        let mut rendered = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Property(name) => {
                    if !rendered.is_empty() {
                        rendered.push('.');
                    }
                    rendered.push_str(name);
                }
                PathSegment::Index(index) => {
                    rendered.push('[');
                    rendered.push_str(&index.to_string());
                    rendered.push(']');
                }
            }
        }
        rendered
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{} at `{}`", self.message, self.property_path())
        }
    }
}

impl std::error::Error for ValidationError {}

/// A schema document could not be turned into a validator.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema node has no recognizable shape (no combinator, no type,
    /// no enum).
    #[error("cannot build validator for schema: {0}")]
    CannotBuild(String),
    /// A pointer segment was missing while resolving a reference.
    #[error("could not resolve segment `{segment}` in reference `{pointer}`")]
    ReferenceNotFound { segment: String, pointer: String },
    /// A referenced document could not be read.
    #[error("failed to read schema document `{path}`")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// A referenced document could not be parsed as JSON or YAML.
    #[error("failed to parse schema document `{path}`: {detail}")]
    Parse { path: String, detail: String },
    /// A `$ref` was encountered but no resolver is configured.
    #[error("cannot resolve `$ref` `{0}` without a reference resolver")]
    NoResolver(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_path_rendering() {
        let err = ValidationError::new(ErrorCode::Type, "must be a string")
            .at_property("number")
            .at_property("street")
            .at_property("address");
        assert_eq!(err.property_path(), "address.street.number");
        assert_eq!(err.to_string(), "must be a string at `address.street.number`");
    }

    #[test]
    fn test_index_segments() {
        let err = ValidationError::new(ErrorCode::Type, "must be an integer")
            .at_property("id")
            .at_index(3)
            .at_property("tags");
        assert_eq!(err.property_path(), "tags[3].id");
    }

    #[test]
    fn test_root_error_has_empty_path() {
        let err = ValidationError::new(ErrorCode::Enum, "must be one of: a, b")
            .with_context("expected_values", json!(["a", "b"]));
        assert_eq!(err.property_path(), "");
        assert_eq!(err.to_string(), "must be one of: a, b");
        assert_eq!(err.context()["expected_values"], json!(["a", "b"]));
    }

    #[test]
    fn test_codes_are_stable_strings() {
        assert_eq!(ErrorCode::RequiredProperty.as_str(), "required_property_error");
        assert_eq!(ErrorCode::OneOf.as_str(), "one_of_error");
        assert_eq!(ErrorCode::MultipleOf.to_string(), "multiple_of_error");
    }
}

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::schema::errors::{ErrorCode, SchemaError, ValidationError};
use crate::schema::number::{enum_error, type_error};
use crate::schema::schema::StringConstraints;

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("static regex")
});
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([01]\d|2[0-3]):[0-5]\d:[0-5]\d(\.\d+)?([Zz]|[+-]([01]\d|2[0-3]):[0-5]\d)?$")
        .expect("static regex")
});
static DATE_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])[Tt ]([01]\d|2[0-3]):[0-5]\d:[0-5]\d(\.\d+)?([Zz]|[+-]([01]\d|2[0-3]):[0-5]\d)$",
    )
    .expect("static regex")
});
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex"));
static HOSTNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("static regex")
});
static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("static regex")
});

/// Check a string against a named format.
///
/// Unknown formats pass, which matches OpenAPI's open format vocabulary.
#[must_use]
pub fn matches_format(text: &str, format: &str) -> bool {
    match format {
        "date" => DATE_RE.is_match(text),
        "date-time" => DATE_TIME_RE.is_match(text),
        "time" => TIME_RE.is_match(text),
        "email" => EMAIL_RE.is_match(text),
        "hostname" => text.len() <= 253 && HOSTNAME_RE.is_match(text),
        "ipv4" => text.parse::<std::net::Ipv4Addr>().is_ok(),
        "ipv6" => text.parse::<std::net::Ipv6Addr>().is_ok(),
        "uri" => url::Url::parse(text).is_ok(),
        "uuid" => UUID_RE.is_match(text),
        _ => true,
    }
}

/// Compiled validator for `string` schemas.
///
/// The `pattern` regex is compiled at build time so an invalid pattern
/// fails schema construction, not request validation.
#[derive(Clone, Debug)]
pub(crate) struct StringValidator {
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    format: Option<String>,
    enum_values: Vec<Value>,
}

impl StringValidator {
    pub(crate) fn build(constraints: StringConstraints) -> Result<Self, SchemaError> {
        let pattern = constraints
            .pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|err| {
                SchemaError::CannotBuild(format!("invalid string pattern: {err}"))
            })?;
        Ok(Self {
            min_length: constraints.min_length,
            max_length: constraints.max_length,
            pattern,
            format: constraints.format,
            enum_values: constraints.enum_values,
        })
    }

    pub(crate) fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        let Value::String(text) = &value else {
            return Err(type_error("string"));
        };

        if !self.enum_values.is_empty() && !self.enum_values.contains(&value) {
            return Err(enum_error(&self.enum_values));
        }
        if let Some(format) = &self.format {
            if !matches_format(text, format) {
                return Err(ValidationError::new(
                    ErrorCode::Format,
                    format!("passed value must be valid string format: {format}"),
                )
                .with_context("expected_format", format.as_str()));
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(text) {
                return Err(ValidationError::new(
                    ErrorCode::Pattern,
                    format!("passed value must match pattern: {}", pattern.as_str()),
                )
                .with_context("expected_pattern", pattern.as_str()));
            }
        }
        let length = text.chars().count();
        if let Some(minimum) = self.min_length {
            if length < minimum {
                return Err(ValidationError::new(
                    ErrorCode::MinimumLength,
                    format!("passed value's length must be greater or equal to `{minimum}`"),
                )
                .with_context("expected_minimum", minimum));
            }
        }
        if let Some(maximum) = self.max_length {
            if length > maximum {
                return Err(ValidationError::new(
                    ErrorCode::MaximumLength,
                    format!("passed value's length must be lower or equal to `{maximum}`"),
                )
                .with_context("expected_maximum", maximum));
            }
        }

        Ok(value)
    }
}

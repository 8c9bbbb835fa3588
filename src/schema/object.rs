use regex::Regex;
use serde_json::{Map, Value};

use crate::schema::errors::{ErrorCode, ValidationError};
use crate::schema::number::type_error;
use crate::schema::validator::Validator;

/// Compiled validator for `object` schemas.
///
/// Per present key the first applicable rule wins: a declared property, a
/// matching `patternProperties` entry, then the `additionalProperties`
/// policy.
#[derive(Clone)]
pub(crate) struct ObjectValidator {
    pub(crate) required: Vec<String>,
    pub(crate) min_properties: Option<usize>,
    pub(crate) max_properties: Option<usize>,
    pub(crate) properties: Vec<(String, Validator)>,
    pub(crate) pattern_properties: Vec<(Regex, Validator)>,
    pub(crate) additional: AdditionalPropertiesValidator,
}

#[derive(Clone)]
pub(crate) enum AdditionalPropertiesValidator {
    Allow,
    Deny,
    Validate(Validator),
}

impl ObjectValidator {
    pub(crate) fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        let Value::Object(entries) = value else {
            return Err(type_error("object"));
        };

        // Required check fails fast on the first missing name, before any
        // per-property validation runs.
        for name in &self.required {
            if !entries.contains_key(name) {
                return Err(ValidationError::new(
                    ErrorCode::RequiredProperty,
                    format!("property `{name}` is required"),
                )
                .with_context("property_name", name.as_str()));
            }
        }

        if let Some(minimum) = self.min_properties {
            if entries.len() < minimum {
                return Err(ValidationError::new(
                    ErrorCode::MinimumProperties,
                    format!("passed object must have at least `{minimum}` properties"),
                )
                .with_context("expected_minimum", minimum));
            }
        }
        if let Some(maximum) = self.max_properties {
            if entries.len() > maximum {
                return Err(ValidationError::new(
                    ErrorCode::MaximumProperties,
                    format!("passed object must have at most `{maximum}` properties"),
                )
                .with_context("expected_maximum", maximum));
            }
        }

        let mut validated = Map::new();
        for (key, entry) in entries {
            if let Some((_, property_validator)) =
                self.properties.iter().find(|(name, _)| *name == key)
            {
                let entry = property_validator
                    .validate(entry)
                    .map_err(|err| err.at_property(&key))?;
                validated.insert(key, entry);
                continue;
            }

            if let Some((_, pattern_validator)) = self
                .pattern_properties
                .iter()
                .find(|(pattern, _)| pattern.is_match(&key))
            {
                let entry = pattern_validator
                    .validate(entry)
                    .map_err(|err| err.at_property(&key))?;
                validated.insert(key, entry);
                continue;
            }

            match &self.additional {
                AdditionalPropertiesValidator::Allow => {
                    validated.insert(key, entry);
                }
                AdditionalPropertiesValidator::Deny => {
                    return Err(ValidationError::new(
                        ErrorCode::AdditionalProperty,
                        format!("property `{key}` is not allowed"),
                    )
                    .with_context("property_name", key.as_str()));
                }
                AdditionalPropertiesValidator::Validate(additional_validator) => {
                    let entry = additional_validator
                        .validate(entry)
                        .map_err(|err| err.at_property(&key))?;
                    validated.insert(key, entry);
                }
            }
        }

        Ok(Value::Object(validated))
    }
}

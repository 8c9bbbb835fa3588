use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::schema::array::{AdditionalItemsValidator, ArrayValidator, ItemsValidator};
use crate::schema::errors::{ErrorCode, SchemaError, ValidationError};
use crate::schema::number::{enum_error, type_error, NumberValidator};
use crate::schema::object::{AdditionalPropertiesValidator, ObjectValidator};
use crate::schema::schema::{
    AdditionalItems, AdditionalProperties, Items, Schema, TypeKind, TypedSchema,
};
use crate::schema::string::StringValidator;

/// A compiled, reusable schema validator.
///
/// Validation is pure: on success the input value (possibly rebuilt while
/// descending into containers) is returned, on failure a
/// [`ValidationError`] describes the first offending value. A `Validator`
/// is cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct Validator {
    inner: Arc<dyn Fn(Value) -> Result<Value, ValidationError> + Send + Sync>,
}

impl Validator {
    pub fn from_fn(
        f: impl Fn(Value) -> Result<Value, ValidationError> + Send + Sync + 'static,
    ) -> Self {
        Self { inner: Arc::new(f) }
    }

    pub fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        (self.inner)(value)
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Validator")
    }
}

/// Compile a parsed [`Schema`] into a [`Validator`].
///
/// All sub-schemas compile eagerly, so a malformed schema fails here
/// rather than on the first request that happens to reach it.
pub fn build_validator(schema: &Schema) -> Result<Validator, SchemaError> {
    match schema {
        Schema::AllOf(subschemas) => {
            let validators = build_all(subschemas)?;
            Ok(Validator::from_fn(move |value| {
                validators
                    .iter()
                    .try_fold(value, |value, validator| validator.validate(value))
            }))
        }
        Schema::AnyOf(subschemas) => {
            let validators = build_all(subschemas)?;
            Ok(Validator::from_fn(move |value| {
                for validator in &validators {
                    if let Ok(validated) = validator.validate(value.clone()) {
                        return Ok(validated);
                    }
                }
                Err(ValidationError::new(
                    ErrorCode::AnyOf,
                    "passed value does not match any of the expected schemas",
                ))
            }))
        }
        Schema::OneOf(subschemas) => {
            let validators = build_all(subschemas)?;
            Ok(Validator::from_fn(move |value| {
                let mut matched = None;
                let mut matches = 0usize;
                for validator in &validators {
                    if let Ok(validated) = validator.validate(value.clone()) {
                        matches += 1;
                        matched = Some(validated);
                    }
                }
                match (matches, matched) {
                    (1, Some(validated)) => Ok(validated),
                    _ => Err(ValidationError::new(
                        ErrorCode::OneOf,
                        format!(
                            "passed value must match exactly one of the expected schemas, matched `{matches}`"
                        ),
                    )
                    .with_context("matched", matches)),
                }
            }))
        }
        Schema::Not(inner) => {
            let validator = build_validator(inner)?;
            Ok(Validator::from_fn(move |value| {
                match validator.validate(value.clone()) {
                    Err(_) => Ok(value),
                    Ok(_) => Err(ValidationError::new(
                        ErrorCode::Not,
                        "passed value must not match the excluded schema",
                    )),
                }
            }))
        }
        Schema::Enum(values) => {
            let values = values.clone();
            Ok(Validator::from_fn(move |value| {
                if values.contains(&value) {
                    Ok(value)
                } else {
                    Err(enum_error(&values))
                }
            }))
        }
        Schema::Typed(typed) => build_typed(typed),
    }
}

fn build_all(subschemas: &[Schema]) -> Result<Vec<Validator>, SchemaError> {
    subschemas.iter().map(build_validator).collect()
}

fn build_typed(typed: &TypedSchema) -> Result<Validator, SchemaError> {
    let base = match &typed.kind {
        TypeKind::Boolean => Validator::from_fn(|value| {
            if value.is_boolean() {
                Ok(value)
            } else {
                Err(type_error("boolean"))
            }
        }),
        TypeKind::Integer(constraints) => {
            let validator = NumberValidator::new(true, constraints.clone());
            Validator::from_fn(move |value| validator.validate(value))
        }
        TypeKind::Number(constraints) => {
            let validator = NumberValidator::new(false, constraints.clone());
            Validator::from_fn(move |value| validator.validate(value))
        }
        TypeKind::String(constraints) => {
            let validator = StringValidator::build(constraints.clone())?;
            Validator::from_fn(move |value| validator.validate(value))
        }
        TypeKind::Array(constraints) => {
            let items = match &constraints.items {
                None => None,
                Some(Items::Single(item_schema)) => {
                    Some(ItemsValidator::Single(build_validator(item_schema)?))
                }
                Some(Items::Tuple { prefix, additional }) => {
                    let additional = match additional {
                        AdditionalItems::Allow => AdditionalItemsValidator::Allow,
                        AdditionalItems::Deny => AdditionalItemsValidator::Deny,
                        AdditionalItems::Schema(schema) => {
                            AdditionalItemsValidator::Validate(build_validator(schema)?)
                        }
                    };
                    Some(ItemsValidator::Tuple {
                        prefix: build_all(prefix)?,
                        additional,
                    })
                }
            };
            let validator = ArrayValidator {
                min_items: constraints.min_items,
                max_items: constraints.max_items,
                unique_items: constraints.unique_items,
                items,
            };
            Validator::from_fn(move |value| validator.validate(value))
        }
        TypeKind::Object(constraints) => {
            let mut properties = Vec::with_capacity(constraints.properties.len());
            for (name, schema) in &constraints.properties {
                properties.push((name.clone(), build_validator(schema)?));
            }
            let mut pattern_properties = Vec::with_capacity(constraints.pattern_properties.len());
            for (pattern, schema) in &constraints.pattern_properties {
                let pattern = Regex::new(pattern).map_err(|err| {
                    SchemaError::CannotBuild(format!("invalid property pattern: {err}"))
                })?;
                pattern_properties.push((pattern, build_validator(schema)?));
            }
            let additional = match &constraints.additional {
                AdditionalProperties::Allow => AdditionalPropertiesValidator::Allow,
                AdditionalProperties::Deny => AdditionalPropertiesValidator::Deny,
                AdditionalProperties::Schema(schema) => {
                    AdditionalPropertiesValidator::Validate(build_validator(schema)?)
                }
            };
            let validator = ObjectValidator {
                required: constraints.required.clone(),
                min_properties: constraints.min_properties,
                max_properties: constraints.max_properties,
                properties,
                pattern_properties,
                additional,
            };
            Validator::from_fn(move |value| validator.validate(value))
        }
    };

    if typed.nullable {
        Ok(Validator::from_fn(move |value| {
            if value.is_null() {
                Ok(value)
            } else {
                base.validate(value)
            }
        }))
    } else {
        Ok(base)
    }
}

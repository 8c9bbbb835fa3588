use serde_json::Value;

use crate::schema::errors::{ErrorCode, ValidationError};
use crate::schema::number::type_error;
use crate::schema::validator::Validator;

/// Compiled validator for `array` schemas.
#[derive(Clone)]
pub(crate) struct ArrayValidator {
    pub(crate) min_items: Option<usize>,
    pub(crate) max_items: Option<usize>,
    pub(crate) unique_items: bool,
    pub(crate) items: Option<ItemsValidator>,
}

#[derive(Clone)]
pub(crate) enum ItemsValidator {
    /// One schema for every element
    Single(Validator),
    /// Positional schemas, with a policy for elements past the prefix
    Tuple {
        prefix: Vec<Validator>,
        additional: AdditionalItemsValidator,
    },
}

#[derive(Clone)]
pub(crate) enum AdditionalItemsValidator {
    Allow,
    Deny,
    Validate(Validator),
}

impl ArrayValidator {
    pub(crate) fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        let Value::Array(elements) = value else {
            return Err(type_error("array"));
        };

        if let Some(minimum) = self.min_items {
            if elements.len() < minimum {
                return Err(ValidationError::new(
                    ErrorCode::MinimumItems,
                    format!("passed array must contain at least `{minimum}` items"),
                )
                .with_context("expected_minimum", minimum));
            }
        }
        if let Some(maximum) = self.max_items {
            if elements.len() > maximum {
                return Err(ValidationError::new(
                    ErrorCode::MaximumItems,
                    format!("passed array must contain at most `{maximum}` items"),
                )
                .with_context("expected_maximum", maximum));
            }
        }
        if self.unique_items {
            for (index, element) in elements.iter().enumerate() {
                if elements[..index].contains(element) {
                    return Err(ValidationError::new(
                        ErrorCode::UniqueItems,
                        "passed array must contain only unique items",
                    )
                    .with_context("duplicate_index", index));
                }
            }
        }

        let elements = match &self.items {
            None => elements,
            Some(ItemsValidator::Single(item_validator)) => {
                let mut validated = Vec::with_capacity(elements.len());
                for (index, element) in elements.into_iter().enumerate() {
                    validated.push(
                        item_validator
                            .validate(element)
                            .map_err(|err| err.at_index(index))?,
                    );
                }
                validated
            }
            Some(ItemsValidator::Tuple { prefix, additional }) => {
                let mut validated = Vec::with_capacity(elements.len());
                for (index, element) in elements.into_iter().enumerate() {
                    match prefix.get(index) {
                        Some(item_validator) => validated.push(
                            item_validator
                                .validate(element)
                                .map_err(|err| err.at_index(index))?,
                        ),
                        None => match additional {
                            AdditionalItemsValidator::Allow => validated.push(element),
                            AdditionalItemsValidator::Deny => {
                                return Err(ValidationError::new(
                                    ErrorCode::AdditionalItems,
                                    format!(
                                        "passed array must not contain additional items past index `{}`",
                                        prefix.len().saturating_sub(1)
                                    ),
                                )
                                .with_context("index", index));
                            }
                            AdditionalItemsValidator::Validate(item_validator) => validated
                                .push(
                                    item_validator
                                        .validate(element)
                                        .map_err(|err| err.at_index(index))?,
                                ),
                        },
                    }
                }
                validated
            }
        };

        Ok(Value::Array(elements))
    }
}

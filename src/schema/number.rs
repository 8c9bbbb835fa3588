use serde_json::Value;

use crate::schema::errors::{ErrorCode, ValidationError};
use crate::schema::schema::NumberConstraints;

/// Relative tolerance for `multipleOf` on floats.
const MULTIPLE_OF_EPSILON: f64 = 1e-9;

/// Compiled validator for `integer` and `number` schemas.
#[derive(Clone)]
pub(crate) struct NumberValidator {
    integers_only: bool,
    constraints: NumberConstraints,
}

impl NumberValidator {
    pub(crate) fn new(integers_only: bool, constraints: NumberConstraints) -> Self {
        Self {
            integers_only,
            constraints,
        }
    }

    pub(crate) fn validate(&self, value: Value) -> Result<Value, ValidationError> {
        let number = self.check_type(&value)?;

        if let Some(minimum) = self.constraints.minimum {
            if number < minimum {
                return Err(ValidationError::new(
                    ErrorCode::Minimum,
                    format!("passed value must be greater or equal to set minimum `{minimum}`"),
                )
                .with_context("expected_minimum", minimum));
            }
        }
        if let Some(maximum) = self.constraints.maximum {
            if number > maximum {
                return Err(ValidationError::new(
                    ErrorCode::Maximum,
                    format!("passed value must be lower or equal to set maximum `{maximum}`"),
                )
                .with_context("expected_maximum", maximum));
            }
        }
        if let Some(minimum) = self.constraints.exclusive_minimum {
            if number <= minimum {
                return Err(ValidationError::new(
                    ErrorCode::ExclusiveMinimum,
                    format!("passed value must be greater than set minimum `{minimum}`"),
                )
                .with_context("expected_minimum", minimum));
            }
        }
        if let Some(maximum) = self.constraints.exclusive_maximum {
            if number >= maximum {
                return Err(ValidationError::new(
                    ErrorCode::ExclusiveMaximum,
                    format!("passed value must be lower than set maximum `{maximum}`"),
                )
                .with_context("expected_maximum", maximum));
            }
        }
        if let Some(multiple_of) = self.constraints.multiple_of {
            if !is_multiple_of(number, multiple_of) {
                return Err(ValidationError::new(
                    ErrorCode::MultipleOf,
                    format!("passed value must be multiple of `{multiple_of}`"),
                )
                .with_context("multiple_of", multiple_of));
            }
        }
        if !self.constraints.enum_values.is_empty()
            && !self.constraints.enum_values.contains(&value)
        {
            return Err(enum_error(&self.constraints.enum_values));
        }

        Ok(value)
    }

    fn check_type(&self, value: &Value) -> Result<f64, ValidationError> {
        let expected = if self.integers_only { "integer" } else { "number" };
        let Value::Number(number) = value else {
            return Err(type_error(expected));
        };
        let Some(float) = number.as_f64() else {
            return Err(type_error(expected));
        };
        if self.integers_only && !number.is_i64() && !number.is_u64() && float.fract() != 0.0 {
            return Err(type_error(expected));
        }
        Ok(float)
    }
}

pub(crate) fn type_error(expected: &str) -> ValidationError {
    ValidationError::new(
        ErrorCode::Type,
        format!("passed value must be valid {expected} type"),
    )
    .with_context("expected_type", expected)
}

pub(crate) fn enum_error(expected: &[Value]) -> ValidationError {
    ValidationError::new(
        ErrorCode::Enum,
        format!(
            "passed value must be one of: {}",
            expected
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    )
    .with_context("expected_values", Value::Array(expected.to_vec()))
}

fn is_multiple_of(number: f64, multiple_of: f64) -> bool {
    if multiple_of == 0.0 {
        return false;
    }
    let quotient = number / multiple_of;
    (quotient - quotient.round()).abs() < MULTIPLE_OF_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator(integers_only: bool, constraints: NumberConstraints) -> NumberValidator {
        NumberValidator::new(integers_only, constraints)
    }

    #[test]
    fn test_integer_rejects_fractions() {
        let v = validator(true, NumberConstraints::default());
        assert!(v.validate(json!(3)).is_ok());
        assert!(v.validate(json!(3.0)).is_ok());
        let err = v.validate(json!(3.5)).expect_err("fraction");
        assert_eq!(err.code(), ErrorCode::Type);
    }

    #[test]
    fn test_number_accepts_floats() {
        let v = validator(false, NumberConstraints::default());
        assert!(v.validate(json!(3.5)).is_ok());
        assert!(v.validate(json!("3.5")).is_err());
    }

    #[test]
    fn test_inclusive_bounds() {
        let v = validator(
            false,
            NumberConstraints {
                minimum: Some(1.0),
                maximum: Some(10.0),
                ..Default::default()
            },
        );
        assert!(v.validate(json!(1)).is_ok());
        assert!(v.validate(json!(10)).is_ok());
        assert_eq!(
            v.validate(json!(0)).expect_err("below minimum").code(),
            ErrorCode::Minimum
        );
        assert_eq!(
            v.validate(json!(11)).expect_err("above maximum").code(),
            ErrorCode::Maximum
        );
    }

    #[test]
    fn test_exclusive_bounds() {
        let v = validator(
            false,
            NumberConstraints {
                exclusive_minimum: Some(0.0),
                exclusive_maximum: Some(1.0),
                ..Default::default()
            },
        );
        assert!(v.validate(json!(0.5)).is_ok());
        assert_eq!(
            v.validate(json!(0)).expect_err("boundary excluded").code(),
            ErrorCode::ExclusiveMinimum
        );
        assert_eq!(
            v.validate(json!(1)).expect_err("boundary excluded").code(),
            ErrorCode::ExclusiveMaximum
        );
    }

    #[test]
    fn test_multiple_of() {
        let v = validator(
            false,
            NumberConstraints {
                multiple_of: Some(0.5),
                ..Default::default()
            },
        );
        assert!(v.validate(json!(1.5)).is_ok());
        assert_eq!(
            v.validate(json!(1.3)).expect_err("not a multiple").code(),
            ErrorCode::MultipleOf
        );
    }

    #[test]
    fn test_enum_constraint() {
        let v = validator(
            true,
            NumberConstraints {
                enum_values: vec![json!(1), json!(2)],
                ..Default::default()
            },
        );
        assert!(v.validate(json!(2)).is_ok());
        assert_eq!(
            v.validate(json!(3)).expect_err("not in enum").code(),
            ErrorCode::Enum
        );
    }
}

//! # Schema Module
//!
//! JSON Schema parsing, validator compilation and OpenAPI document access.
//!
//! A schema document parses into a [`Schema`] tree (with `$ref`s resolved
//! through a [`JsonReferenceResolver`]), which [`build_validator`] compiles
//! into a reusable [`Validator`]. Validation is pure: the input value is
//! returned on success and a [`ValidationError`] with a machine-readable
//! code and a property path describes the first failure.
//!
//! Compiled validators are shared through a [`ValidatorCache`].

mod array;
mod cache;
mod errors;
mod number;
mod object;
mod reference;
#[allow(clippy::module_inception)]
mod schema;
mod string;
mod validator;

pub use cache::ValidatorCache;
pub use errors::{ErrorCode, PathSegment, SchemaError, ValidationError};
pub use reference::{
    escape_pointer_segment, query_pointer, JsonReference, JsonReferenceResolver, OpenApiSchema,
    UriLoader,
};
pub use schema::{
    AdditionalItems, AdditionalProperties, ArrayConstraints, Items, NumberConstraints,
    ObjectConstraints, Schema, StringConstraints, TypeKind, TypedSchema,
};
pub use string::matches_format;
pub use validator::{build_validator, Validator};

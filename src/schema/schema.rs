use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::schema::errors::SchemaError;
use crate::schema::reference::JsonReferenceResolver;

/// A parsed JSON Schema node.
///
/// Parsing dispatches on the first recognized shape, in order:
/// `anyOf`, `oneOf`, `allOf`, `not`, `type`, bare `enum`. A node matching
/// none of these fails with [`SchemaError::CannotBuild`]. `$ref` nodes are
/// resolved during parsing when a resolver is supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    AnyOf(Vec<Schema>),
    OneOf(Vec<Schema>),
    AllOf(Vec<Schema>),
    Not(Box<Schema>),
    Typed(Box<TypedSchema>),
    /// A bare `enum` with no declared type
    Enum(Vec<Value>),
}

/// A schema with a declared `type`, plus the OpenAPI 3.0 `nullable` flag.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedSchema {
    pub kind: TypeKind,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Boolean,
    Integer(NumberConstraints),
    Number(NumberConstraints),
    String(StringConstraints),
    Array(ArrayConstraints),
    Object(ObjectConstraints),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberConstraints {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
    pub enum_values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringConstraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    pub format: Option<String>,
    pub enum_values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayConstraints {
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: bool,
    pub items: Option<Items>,
}

/// The `items` keyword, in both of its historical shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Items {
    /// `items` is a single schema applied to every element
    Single(Box<Schema>),
    /// `items` is a list of schemas applied positionally
    Tuple {
        prefix: Vec<Schema>,
        additional: AdditionalItems,
    },
}

/// Policy for array elements beyond the declared tuple prefix.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalItems {
    Allow,
    Deny,
    Schema(Box<Schema>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectConstraints {
    pub properties: Vec<(String, Schema)>,
    pub required: Vec<String>,
    pub min_properties: Option<usize>,
    pub max_properties: Option<usize>,
    /// `(name pattern, schema)` pairs, applied to undeclared keys
    pub pattern_properties: Vec<(String, Schema)>,
    pub additional: AdditionalProperties,
}

/// Policy for object keys not covered by `properties` or
/// `patternProperties`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AdditionalProperties {
    #[default]
    Allow,
    Deny,
    Schema(Box<Schema>),
}

/// Resolution context threaded through parsing: the resolver plus the file
/// the current fragment came from, so nested `$ref`s resolve relative to
/// the right document.
struct ParseContext<'a> {
    resolver: &'a JsonReferenceResolver,
    current_file: PathBuf,
}

impl Schema {
    /// Parse a self-contained schema node. `$ref` fails with
    /// [`SchemaError::NoResolver`].
    pub fn parse(value: &Value) -> Result<Self, SchemaError> {
        let mut seen = Vec::new();
        Self::parse_node(value, None, &mut seen)
    }

    /// Parse a schema node, resolving `$ref`s through `resolver`.
    /// References are taken relative to `current_file`; cyclic reference
    /// chains fail instead of recursing forever.
    pub fn parse_resolved(
        value: &Value,
        resolver: &JsonReferenceResolver,
        current_file: &Path,
    ) -> Result<Self, SchemaError> {
        let mut seen = Vec::new();
        let context = ParseContext {
            resolver,
            current_file: current_file.to_path_buf(),
        };
        Self::parse_node(value, Some(&context), &mut seen)
    }

    fn parse_node(
        value: &Value,
        context: Option<&ParseContext<'_>>,
        seen: &mut Vec<String>,
    ) -> Result<Self, SchemaError> {
        if let Some(reference) = value.get("$ref").and_then(Value::as_str) {
            return Self::parse_reference(reference, context, seen);
        }

        if let Some(subschemas) = value.get("anyOf").and_then(Value::as_array) {
            return Ok(Self::AnyOf(Self::parse_list(subschemas, context, seen)?));
        }
        if let Some(subschemas) = value.get("oneOf").and_then(Value::as_array) {
            return Ok(Self::OneOf(Self::parse_list(subschemas, context, seen)?));
        }
        if let Some(subschemas) = value.get("allOf").and_then(Value::as_array) {
            return Ok(Self::AllOf(Self::parse_list(subschemas, context, seen)?));
        }
        if let Some(inner) = value.get("not") {
            return Ok(Self::Not(Box::new(Self::parse_node(inner, context, seen)?)));
        }
        if let Some(type_name) = value.get("type").and_then(Value::as_str) {
            return Self::parse_typed(type_name, value, context, seen);
        }
        if let Some(values) = value.get("enum").and_then(Value::as_array) {
            return Ok(Self::Enum(values.clone()));
        }

        Err(SchemaError::CannotBuild(value.to_string()))
    }

    fn parse_reference(
        reference: &str,
        context: Option<&ParseContext<'_>>,
        seen: &mut Vec<String>,
    ) -> Result<Self, SchemaError> {
        let Some(context) = context else {
            return Err(SchemaError::NoResolver(reference.to_string()));
        };
        let resolved = context
            .resolver
            .resolve(reference, &context.current_file)?;
        if seen.iter().any(|uri| uri == resolved.uri()) {
            return Err(SchemaError::CannotBuild(format!(
                "cyclic $ref chain through `{}`",
                resolved.uri()
            )));
        }
        seen.push(resolved.uri().to_string());
        let nested = ParseContext {
            resolver: context.resolver,
            current_file: resolved.file().to_path_buf(),
        };
        let schema = Self::parse_node(resolved.data()?, Some(&nested), seen)?;
        seen.pop();
        Ok(schema)
    }

    fn parse_list(
        subschemas: &[Value],
        context: Option<&ParseContext<'_>>,
        seen: &mut Vec<String>,
    ) -> Result<Vec<Self>, SchemaError> {
        subschemas
            .iter()
            .map(|subschema| Self::parse_node(subschema, context, seen))
            .collect()
    }

    fn parse_typed(
        type_name: &str,
        value: &Value,
        context: Option<&ParseContext<'_>>,
        seen: &mut Vec<String>,
    ) -> Result<Self, SchemaError> {
        let kind = match type_name {
            "boolean" => TypeKind::Boolean,
            "integer" => TypeKind::Integer(Self::parse_number_constraints(value)),
            "number" => TypeKind::Number(Self::parse_number_constraints(value)),
            "string" => TypeKind::String(StringConstraints {
                min_length: usize_field(value, "minLength"),
                max_length: usize_field(value, "maxLength"),
                pattern: string_field(value, "pattern"),
                format: string_field(value, "format"),
                enum_values: enum_field(value),
            }),
            "array" => TypeKind::Array(ArrayConstraints {
                min_items: usize_field(value, "minItems"),
                max_items: usize_field(value, "maxItems"),
                unique_items: value
                    .get("uniqueItems")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                items: Self::parse_items(value, context, seen)?,
            }),
            "object" => TypeKind::Object(Self::parse_object_constraints(value, context, seen)?),
            other => {
                return Err(SchemaError::CannotBuild(format!(
                    "unsupported type `{other}`"
                )))
            }
        };
        let nullable = value
            .get("nullable")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(Self::Typed(Box::new(TypedSchema { kind, nullable })))
    }

    fn parse_number_constraints(value: &Value) -> NumberConstraints {
        NumberConstraints {
            minimum: f64_field(value, "minimum"),
            maximum: f64_field(value, "maximum"),
            exclusive_minimum: f64_field(value, "exclusiveMinimum"),
            exclusive_maximum: f64_field(value, "exclusiveMaximum"),
            multiple_of: f64_field(value, "multipleOf"),
            enum_values: enum_field(value),
        }
    }

    fn parse_items(
        value: &Value,
        context: Option<&ParseContext<'_>>,
        seen: &mut Vec<String>,
    ) -> Result<Option<Items>, SchemaError> {
        let Some(items) = value.get("items") else {
            return Ok(None);
        };
        match items {
            Value::Array(prefix) => {
                let prefix = Self::parse_list(prefix, context, seen)?;
                let additional = match value.get("additionalItems") {
                    None | Some(Value::Bool(true)) => AdditionalItems::Allow,
                    Some(Value::Bool(false)) => AdditionalItems::Deny,
                    Some(schema) => AdditionalItems::Schema(Box::new(Self::parse_node(
                        schema, context, seen,
                    )?)),
                };
                Ok(Some(Items::Tuple { prefix, additional }))
            }
            single => Ok(Some(Items::Single(Box::new(Self::parse_node(
                single, context, seen,
            )?)))),
        }
    }

    fn parse_object_constraints(
        value: &Value,
        context: Option<&ParseContext<'_>>,
        seen: &mut Vec<String>,
    ) -> Result<ObjectConstraints, SchemaError> {
        let mut properties = Vec::new();
        if let Some(declared) = value.get("properties").and_then(Value::as_object) {
            for (name, subschema) in declared {
                properties.push((name.clone(), Self::parse_node(subschema, context, seen)?));
            }
        }

        let mut pattern_properties = Vec::new();
        if let Some(patterns) = value.get("patternProperties").and_then(Value::as_object) {
            for (pattern, subschema) in patterns {
                pattern_properties
                    .push((pattern.clone(), Self::parse_node(subschema, context, seen)?));
            }
        }

        let required = value
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let additional = match value.get("additionalProperties") {
            None | Some(Value::Bool(true)) => AdditionalProperties::Allow,
            Some(Value::Bool(false)) => AdditionalProperties::Deny,
            Some(schema) => {
                AdditionalProperties::Schema(Box::new(Self::parse_node(schema, context, seen)?))
            }
        };

        Ok(ObjectConstraints {
            properties,
            required,
            min_properties: usize_field(value, "minProperties"),
            max_properties: usize_field(value, "maxProperties"),
            pattern_properties,
            additional,
        })
    }
}

fn f64_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

fn usize_field(value: &Value, key: &str) -> Option<usize> {
    value
        .get(key)
        .and_then(Value::as_u64)
        .map(|n| n as usize)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn enum_field(value: &Value) -> Vec<Value> {
    value
        .get("enum")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

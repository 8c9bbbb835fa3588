use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::errors::{DispatchError, HttpError};
use crate::http::{HttpRequest, HttpResponse, ParsedBody};
use crate::middleware::{Middleware, Next};
use crate::schema::{
    build_validator, escape_pointer_segment, ErrorCode, OpenApiSchema, Schema, SchemaError,
    ValidationError, Validator, ValidatorCache,
};

/// Which request parts the OpenAPI middleware validates.
#[derive(Debug, Clone, Copy)]
pub struct ValidationOptions {
    pub body: bool,
    pub headers: bool,
    pub query: bool,
    pub path: bool,
    pub cookies: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            body: true,
            headers: true,
            query: true,
            path: true,
            cookies: true,
        }
    }
}

/// Middleware that validates requests against an OpenAPI document.
///
/// Per `(method, route template)` it derives part schemas from the
/// document's `/paths/<escaped-path>/<method>` fragment: `parameters` at
/// path and operation level feed the path/query/header/cookie validators,
/// `requestBody.content.<content-type>.schema` feeds the body validator.
/// Validators compile through a shared [`ValidatorCache`] and the derived
/// groups are memoized for the life of the middleware.
///
/// On success the parsed body is replaced with the validated value, so
/// handlers observe exactly what was validated. Failures propagate as
/// [`DispatchError::Validation`] for an outer middleware to translate.
pub struct OpenApiMiddleware {
    schema: OpenApiSchema,
    options: ValidationOptions,
    cache: ValidatorCache,
    groups: RwLock<HashMap<String, Arc<ValidatorGroup>>>,
}

impl OpenApiMiddleware {
    /// Load the OpenAPI document at `path` and validate every part.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, SchemaError> {
        Self::with_options(path, ValidationOptions::default())
    }

    /// Load the OpenAPI document at `path` with per-part toggles.
    pub fn with_options(
        path: impl Into<PathBuf>,
        options: ValidationOptions,
    ) -> Result<Self, SchemaError> {
        Ok(Self {
            schema: OpenApiSchema::new(path)?,
            options,
            cache: ValidatorCache::new(),
            groups: RwLock::new(HashMap::new()),
        })
    }

    /// The shared validator cache, exposed for tests.
    #[must_use]
    pub fn cache(&self) -> &ValidatorCache {
        &self.cache
    }

    fn group_for(
        &self,
        template: &str,
        method: &http::Method,
        content_type: &str,
    ) -> Result<Arc<ValidatorGroup>, SchemaError> {
        let key = format!("{method} {template}").to_lowercase();
        {
            let groups = self.groups.read().expect("validator group lock poisoned");
            if let Some(group) = groups.get(&key) {
                return Ok(Arc::clone(group));
            }
        }

        let group = Arc::new(self.build_group(template, method, content_type)?);
        let mut groups = self.groups.write().expect("validator group lock poisoned");
        if let Some(existing) = groups.get(&key) {
            return Ok(Arc::clone(existing));
        }
        debug!(route = %template, method = %method, "openapi validator group built");
        groups.insert(key, Arc::clone(&group));
        Ok(group)
    }

    fn build_group(
        &self,
        template: &str,
        method: &http::Method,
        content_type: &str,
    ) -> Result<ValidatorGroup, SchemaError> {
        let mut group = ValidatorGroup::default();

        let pointer = format!("/paths/{}", escape_pointer_segment(template));
        let path_fragment = match self.schema.query(&pointer) {
            Ok(fragment) => fragment,
            // A route the document does not describe is not validated.
            Err(SchemaError::ReferenceNotFound { .. }) => return Ok(group),
            Err(err) => return Err(err),
        };
        let method_name = method.as_str().to_lowercase();
        let Some(operation) = path_fragment.get(&method_name) else {
            return Ok(group);
        };

        if self.options.body {
            let body_schema = operation
                .get("requestBody")
                .and_then(|body| body.get("content"))
                .and_then(|content| content.get(content_type))
                .and_then(|media| media.get("schema"));
            if let Some(node) = body_schema {
                group.body = Some(self.compile(template, method, "body", node)?);
            }
        }

        let mut parts: HashMap<&str, PartSchema> = HashMap::new();
        for parameters in [path_fragment.get("parameters"), operation.get("parameters")] {
            let Some(parameters) = parameters.and_then(Value::as_array) else {
                continue;
            };
            for parameter in parameters {
                let (Some(location), Some(name)) = (
                    parameter.get("in").and_then(Value::as_str),
                    parameter.get("name").and_then(Value::as_str),
                ) else {
                    continue;
                };
                let Some(part) = ["path", "query", "header", "cookie"]
                    .iter()
                    .copied()
                    .find(|known| *known == location)
                else {
                    continue;
                };
                let entry = parts.entry(part).or_default();
                if parameter
                    .get("required")
                    .and_then(Value::as_bool)
                    .unwrap_or(false)
                {
                    entry.required.push(name.to_string());
                }
                if let Some(schema) = parameter.get("schema") {
                    entry.properties.insert(name.to_string(), schema.clone());
                    if let Some(type_name) = schema.get("type").and_then(Value::as_str) {
                        entry
                            .property_types
                            .insert(name.to_string(), type_name.to_string());
                    }
                }
            }
        }

        for (part, part_schema) in parts {
            let enabled = match part {
                "path" => self.options.path,
                "query" => self.options.query,
                "header" => self.options.headers,
                "cookie" => self.options.cookies,
                _ => false,
            };
            if !enabled {
                continue;
            }
            let PartSchema {
                properties,
                required,
                property_types,
            } = part_schema;
            let node = json!({
                "type": "object",
                "properties": Value::Object(properties),
                "required": required,
            });
            let validator = PartValidator {
                validator: self.compile(template, method, part, &node)?,
                property_types,
            };
            match part {
                "path" => group.path = Some(validator),
                "query" => group.query = Some(validator),
                "header" => group.header = Some(validator),
                "cookie" => group.cookie = Some(validator),
                _ => {}
            }
        }

        Ok(group)
    }

    fn compile(
        &self,
        template: &str,
        method: &http::Method,
        part: &str,
        node: &Value,
    ) -> Result<Validator, SchemaError> {
        let key = format!("{method} {template}:{part}");
        self.cache.get_or_build(&key, || {
            let schema = Schema::parse_resolved(node, self.schema.resolver(), self.schema.path())?;
            build_validator(&schema)
        })
    }
}

impl Middleware for OpenApiMiddleware {
    fn handle(
        &self,
        request: &mut HttpRequest,
        next: Next,
    ) -> Result<HttpResponse, DispatchError> {
        let Some(route) = request.route() else {
            // Unrouted requests (404 path) pass through untouched.
            return next.run(request);
        };
        let template = route.template().to_string();
        let method = request.method().clone();
        let content_type = request
            .headers
            .get("content-type")
            .map_or_else(|| "application/json".to_string(), content_type_of);

        let group = self
            .group_for(&template, &method, &content_type)
            .map_err(|err| HttpError::internal(format!("openapi validation setup failed: {err}")))?;
        group.validate(request)?;
        next.run(request)
    }
}

fn content_type_of(header: &str) -> String {
    crate::http::parse_content_type(header).0
}

#[derive(Default)]
struct PartSchema {
    properties: Map<String, Value>,
    required: Vec<String>,
    property_types: HashMap<String, String>,
}

/// A parameter-part validator together with the declared scalar types,
/// used to coerce raw string values before validation.
struct PartValidator {
    validator: Validator,
    property_types: HashMap<String, String>,
}

impl PartValidator {
    fn validate(&self, part: &str, value: Value) -> Result<Value, ValidationError> {
        self.validator
            .validate(value)
            .map_err(|err| err.with_context("in", part))
    }

    /// Interpret a raw string per its declared schema type. A value that
    /// does not parse stays a string, so the type check reports it.
    fn coerce(&self, name: &str, raw: &str) -> Value {
        match self.property_types.get(name).map(String::as_str) {
            Some("integer") => raw.parse::<i64>().map_or_else(|_| Value::from(raw), Value::from),
            Some("number") => raw.parse::<f64>().map_or_else(|_| Value::from(raw), Value::from),
            Some("boolean") => match raw {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::from(raw),
            },
            _ => Value::from(raw),
        }
    }
}

#[derive(Default)]
struct ValidatorGroup {
    body: Option<Validator>,
    path: Option<PartValidator>,
    query: Option<PartValidator>,
    header: Option<PartValidator>,
    cookie: Option<PartValidator>,
}

impl ValidatorGroup {
    fn validate(&self, request: &mut HttpRequest) -> Result<(), ValidationError> {
        if let Some(body_validator) = &self.body {
            let value = request
                .parsed_body()
                .map_err(|err| {
                    ValidationError::new(
                        ErrorCode::Type,
                        format!("request body could not be validated: {}", err.message),
                    )
                    .with_context("in", "body")
                })?
                .to_value();
            if !value.is_object() && !value.is_array() {
                return Err(ValidationError::new(
                    ErrorCode::Type,
                    "request body could not be validated",
                )
                .with_context("in", "body"));
            }
            let validated = body_validator
                .validate(value)
                .map_err(|err| err.with_context("in", "body"))?;
            request.set_parsed_body(ParsedBody::Json(validated));
        }

        if let Some(path_validator) = &self.path {
            let mut object = Map::new();
            for (name, value) in request.path_params().iter() {
                object.insert(
                    name.to_string(),
                    path_validator.coerce(name.as_ref(), value.as_str()),
                );
            }
            path_validator.validate("path", Value::Object(object))?;
        }

        if let Some(header_validator) = &self.header {
            let mut object = Map::new();
            for (name, value) in request.headers.iter() {
                match object.get_mut(name) {
                    None => {
                        object.insert(
                            name.to_string(),
                            header_validator.coerce(name, value),
                        );
                    }
                    Some(Value::Array(values)) => {
                        values.push(Value::from(value));
                    }
                    Some(existing) => {
                        let first = existing.take();
                        *existing = Value::Array(vec![first, Value::from(value)]);
                    }
                }
            }
            header_validator.validate("header", Value::Object(object))?;
        }

        if let Some(query_validator) = &self.query {
            let mut object = Map::new();
            for (name, value) in request.query().iter() {
                object.insert(name.to_string(), query_validator.coerce(name, value));
            }
            query_validator.validate("query", Value::Object(object))?;
        }

        if let Some(cookie_validator) = &self.cookie {
            let mut object = Map::new();
            for cookie in request.cookies().iter() {
                object.insert(
                    cookie.name.clone(),
                    cookie_validator.coerce(&cookie.name, &cookie.value),
                );
            }
            cookie_validator.validate("cookie", Value::Object(object))?;
        }

        Ok(())
    }
}

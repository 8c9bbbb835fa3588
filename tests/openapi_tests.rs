use std::fs;
use std::path::PathBuf;

use http::{Method, StatusCode};
use serde_json::json;
use strada::errors::DispatchError;
use strada::middleware::{middleware_fn, Next, OpenApiMiddleware, ValidationOptions};
use strada::schema::ErrorCode;
use strada::{ApplicationBuilder, Application, HttpRequest, HttpResponse};
use tempfile::TempDir;

const PETSTORE_DOC: &str = r#"
openapi: "3.0.3"
info:
  title: Pet Service
  version: "1.0.0"
paths:
  /pets:
    get:
      parameters:
        - name: limit
          in: query
          required: true
          schema:
            type: integer
            minimum: 1
            maximum: 100
      responses:
        "200":
          description: pets
    post:
      requestBody:
        content:
          application/json:
            schema:
              type: object
              required:
                - name
              properties:
                name:
                  type: string
                  minLength: 1
                age:
                  type: integer
                  minimum: 0
      responses:
        "201":
          description: created
  /pets/{id}:
    parameters:
      - name: id
        in: path
        required: true
        schema:
          type: integer
    get:
      parameters:
        - name: x-trace
          in: header
          required: true
          schema:
            type: string
      responses:
        "200":
          description: one pet
"#;

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn write_doc(dir: &TempDir) -> PathBuf {
    init_tracing();
    let path = dir.path().join("openapi.yaml");
    fs::write(&path, PETSTORE_DOC).expect("write openapi doc");
    path
}

fn petstore_app(middleware: OpenApiMiddleware) -> Application {
    ApplicationBuilder::new()
        .middleware(middleware)
        .get("/pets", |_req| Ok(HttpResponse::ok()))
        .post("/pets", |req| {
            HttpResponse::json(StatusCode::CREATED, &req.parsed_body()?.to_value())
        })
        .get("/pets/{id}", |req| {
            Ok(HttpResponse::text(
                StatusCode::OK,
                req.path_param("id").unwrap_or(""),
            ))
        })
        .get("/undocumented", |_req| Ok(HttpResponse::ok()))
        .build()
        .expect("valid routes")
}

fn validation_error(result: Result<HttpResponse, DispatchError>) -> strada::ValidationError {
    match result {
        Err(DispatchError::Validation(err)) => err,
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn test_valid_body_passes_and_is_replaced() {
    let dir = TempDir::new().expect("tempdir");
    let middleware = OpenApiMiddleware::new(write_doc(&dir)).expect("doc loads");
    let app = petstore_app(middleware);

    let mut request = HttpRequest::new(Method::POST, "/pets")
        .with_header("Content-Type", "application/json")
        .with_body(br#"{"name": "rex", "age": 3}"#.to_vec());
    let response = app.invoke(&mut request).expect("valid request");
    assert_eq!(response.status(), StatusCode::CREATED);
    // The handler sees the value the validator accepted.
    assert_eq!(response.body_json(), Some(json!({"name": "rex", "age": 3})));
}

#[test]
fn test_missing_required_body_property_fails() {
    let dir = TempDir::new().expect("tempdir");
    let middleware = OpenApiMiddleware::new(write_doc(&dir)).expect("doc loads");
    let app = petstore_app(middleware);

    let mut request = HttpRequest::new(Method::POST, "/pets")
        .with_header("Content-Type", "application/json")
        .with_body(br#"{"age": 3}"#.to_vec());
    let err = validation_error(app.invoke(&mut request));
    assert_eq!(err.code(), ErrorCode::RequiredProperty);
    assert_eq!(err.context().get("in"), Some(&json!("body")));
}

#[test]
fn test_body_constraint_failure_carries_property_path() {
    let dir = TempDir::new().expect("tempdir");
    let middleware = OpenApiMiddleware::new(write_doc(&dir)).expect("doc loads");
    let app = petstore_app(middleware);

    let mut request = HttpRequest::new(Method::POST, "/pets")
        .with_header("Content-Type", "application/json")
        .with_body(br#"{"name": "rex", "age": -1}"#.to_vec());
    let err = validation_error(app.invoke(&mut request));
    assert_eq!(err.code(), ErrorCode::Minimum);
    assert_eq!(err.property_path(), "age");
}

#[test]
fn test_query_parameter_is_coerced_and_validated() {
    let dir = TempDir::new().expect("tempdir");
    let middleware = OpenApiMiddleware::new(write_doc(&dir)).expect("doc loads");
    let app = petstore_app(middleware);

    let mut request = HttpRequest::new(Method::GET, "/pets?limit=50");
    let response = app.invoke(&mut request).expect("valid request");
    assert_eq!(response.status(), StatusCode::OK);

    let mut request = HttpRequest::new(Method::GET, "/pets?limit=500");
    let err = validation_error(app.invoke(&mut request));
    assert_eq!(err.code(), ErrorCode::Maximum);
    assert_eq!(err.property_path(), "limit");
    assert_eq!(err.context().get("in"), Some(&json!("query")));

    // A value that does not parse as the declared type stays a string and
    // fails the type check.
    let mut request = HttpRequest::new(Method::GET, "/pets?limit=many");
    let err = validation_error(app.invoke(&mut request));
    assert_eq!(err.code(), ErrorCode::Type);
}

#[test]
fn test_missing_required_query_parameter_fails() {
    let dir = TempDir::new().expect("tempdir");
    let middleware = OpenApiMiddleware::new(write_doc(&dir)).expect("doc loads");
    let app = petstore_app(middleware);

    let mut request = HttpRequest::new(Method::GET, "/pets");
    let err = validation_error(app.invoke(&mut request));
    assert_eq!(err.code(), ErrorCode::RequiredProperty);
    assert_eq!(err.context().get("in"), Some(&json!("query")));
}

#[test]
fn test_path_level_parameter_validates_path_part() {
    let dir = TempDir::new().expect("tempdir");
    let middleware = OpenApiMiddleware::new(write_doc(&dir)).expect("doc loads");
    let app = petstore_app(middleware);

    let mut request =
        HttpRequest::new(Method::GET, "/pets/12").with_header("x-trace", "abc");
    let response = app.invoke(&mut request).expect("valid request");
    assert_eq!(response.body_text(), "12");

    let mut request =
        HttpRequest::new(Method::GET, "/pets/twelve").with_header("x-trace", "abc");
    let err = validation_error(app.invoke(&mut request));
    assert_eq!(err.code(), ErrorCode::Type);
    assert_eq!(err.context().get("in"), Some(&json!("path")));
}

#[test]
fn test_operation_level_header_parameter_is_required() {
    let dir = TempDir::new().expect("tempdir");
    let middleware = OpenApiMiddleware::new(write_doc(&dir)).expect("doc loads");
    let app = petstore_app(middleware);

    let mut request = HttpRequest::new(Method::GET, "/pets/12");
    let err = validation_error(app.invoke(&mut request));
    assert_eq!(err.code(), ErrorCode::RequiredProperty);
    assert_eq!(err.context().get("in"), Some(&json!("header")));
}

#[test]
fn test_undocumented_route_is_not_validated() {
    let dir = TempDir::new().expect("tempdir");
    let middleware = OpenApiMiddleware::new(write_doc(&dir)).expect("doc loads");
    let app = petstore_app(middleware);

    let mut request = HttpRequest::new(Method::GET, "/undocumented");
    let response = app.invoke(&mut request).expect("passes through");
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn test_disabled_parts_are_skipped() {
    let dir = TempDir::new().expect("tempdir");
    let middleware = OpenApiMiddleware::with_options(
        write_doc(&dir),
        ValidationOptions {
            query: false,
            ..ValidationOptions::default()
        },
    )
    .expect("doc loads");
    let app = petstore_app(middleware);

    // Without the query part the missing required `limit` goes unnoticed.
    let mut request = HttpRequest::new(Method::GET, "/pets");
    let response = app.invoke(&mut request).expect("query validation off");
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn test_validators_compile_once_per_route_part() {
    let dir = TempDir::new().expect("tempdir");
    let middleware = OpenApiMiddleware::new(write_doc(&dir)).expect("doc loads");
    let cache = middleware.cache().clone();
    let app = petstore_app(middleware);

    for _ in 0..3 {
        let mut request = HttpRequest::new(Method::GET, "/pets?limit=50");
        app.invoke(&mut request).expect("valid request");
    }
    // One query validator for GET /pets, no matter how many requests.
    assert_eq!(cache.size(), 1);

    let mut request = HttpRequest::new(Method::POST, "/pets")
        .with_header("Content-Type", "application/json")
        .with_body(br#"{"name": "rex"}"#.to_vec());
    app.invoke(&mut request).expect("valid request");
    assert_eq!(cache.size(), 2);
}

#[test]
fn test_outer_middleware_translates_validation_failures() {
    let dir = TempDir::new().expect("tempdir");
    let middleware = OpenApiMiddleware::new(write_doc(&dir)).expect("doc loads");

    let app = ApplicationBuilder::new()
        .middleware(middleware_fn(|req: &mut HttpRequest, next: Next| {
            match next.run(req) {
                Err(DispatchError::Validation(err)) => HttpResponse::json(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    &json!({
                        "code": err.code().as_str(),
                        "path": err.property_path(),
                        "message": err.message(),
                    }),
                )
                .map_err(Into::into),
                other => other,
            }
        }))
        .middleware(middleware)
        .post("/pets", |req| {
            HttpResponse::json(StatusCode::CREATED, &req.parsed_body()?.to_value())
        })
        .build()
        .expect("valid routes");

    let mut request = HttpRequest::new(Method::POST, "/pets")
        .with_header("Content-Type", "application/json")
        .with_body(br#"{"name": ""}"#.to_vec());
    let response = app.invoke(&mut request).expect("failure translated");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.body_json().expect("json body");
    assert_eq!(body["code"], "minimum_length_error");
    assert_eq!(body["path"], "name");
}

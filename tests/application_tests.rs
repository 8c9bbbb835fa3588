use http::{Method, StatusCode};
use serde_json::json;
use strada::http::HttpCookie;
use strada::{ApplicationBuilder, HttpRequest, HttpResponse};

#[test]
fn test_path_params_reach_handler() {
    let app = ApplicationBuilder::new()
        .get("/users/{user_id}/posts/{post_id}", |req| {
            HttpResponse::json(
                StatusCode::OK,
                &json!({
                    "user": req.path_param("user_id"),
                    "post": req.path_param("post_id"),
                }),
            )
        })
        .build()
        .expect("valid routes");

    let mut request = HttpRequest::new(Method::GET, "/users/alice/posts/42");
    let response = app.invoke(&mut request).expect("dispatch succeeds");
    assert_eq!(
        response.body_json(),
        Some(json!({"user": "alice", "post": "42"}))
    );
}

#[test]
fn test_query_and_json_body_reach_handler() {
    let app = ApplicationBuilder::new()
        .post("/pets", |req| {
            let limit = req.query().get("limit").unwrap_or("none").to_string();
            let body = req.parsed_body()?.to_value();
            HttpResponse::json(StatusCode::CREATED, &json!({"limit": limit, "body": body}))
        })
        .build()
        .expect("valid routes");

    let mut request = HttpRequest::new(Method::POST, "/pets?limit=10")
        .with_header("Content-Type", "application/json")
        .with_body(br#"{"name": "rex"}"#.to_vec());
    let response = app.invoke(&mut request).expect("dispatch succeeds");
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.body_json(),
        Some(json!({"limit": "10", "body": {"name": "rex"}}))
    );
}

#[test]
fn test_form_body_is_coerced() {
    let app = ApplicationBuilder::new()
        .post("/subscribe", |req| {
            HttpResponse::json(StatusCode::OK, &req.parsed_body()?.to_value())
        })
        .build()
        .expect("valid routes");

    let mut request = HttpRequest::new(Method::POST, "/subscribe")
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .with_body(b"email=a%40example.com&count=3&active=true".to_vec());
    let response = app.invoke(&mut request).expect("dispatch succeeds");
    assert_eq!(
        response.body_json(),
        Some(json!({"email": "a@example.com", "count": 3, "active": true}))
    );
}

#[test]
fn test_request_cookies_and_response_cookies() {
    let app = ApplicationBuilder::new()
        .get("/whoami", |req| {
            let session = req.cookies().value("session").unwrap_or("anonymous").to_string();
            let mut response = HttpResponse::text(StatusCode::OK, &session);
            response.add_cookie(HttpCookie::new("seen", "1").http_only());
            Ok(response)
        })
        .build()
        .expect("valid routes");

    let mut request =
        HttpRequest::new(Method::GET, "/whoami").with_header("Cookie", "session=abc123");
    let response = app.invoke(&mut request).expect("dispatch succeeds");
    assert_eq!(response.body_text(), "abc123");
    assert_eq!(
        response.headers().get("set-cookie"),
        Some("seen=1; HttpOnly")
    );
}

#[test]
fn test_handler_error_becomes_response() {
    let app = ApplicationBuilder::new()
        .get("/teapot", |_req| {
            Err(strada::HttpError::new(
                StatusCode::IM_A_TEAPOT,
                "short and stout",
            ))
        })
        .build()
        .expect("valid routes");

    let mut request = HttpRequest::new(Method::GET, "/teapot");
    let response = app.invoke(&mut request).expect("errors become responses");
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(response.body_text(), "short and stout");
}

#[test]
fn test_method_mismatch_is_404() {
    let app = ApplicationBuilder::new()
        .get("/pets", |_req| Ok(HttpResponse::ok()))
        .build()
        .expect("valid routes");

    let mut request = HttpRequest::new(Method::DELETE, "/pets");
    let response = app.invoke(&mut request).expect("404 is a response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_matching_is_case_insensitive() {
    let app = ApplicationBuilder::new()
        .get("/Pets/{id}", |req| {
            Ok(HttpResponse::text(
                StatusCode::OK,
                req.path_param("id").unwrap_or(""),
            ))
        })
        .build()
        .expect("valid routes");

    let mut request = HttpRequest::new(Method::GET, "/pets/7");
    let response = app.invoke(&mut request).expect("dispatch succeeds");
    assert_eq!(response.body_text(), "7");
}

#[test]
fn test_application_is_shareable_across_threads() {
    use std::sync::Arc;

    let app = Arc::new(
        ApplicationBuilder::new()
            .get("/pets/{id}", |req| {
                Ok(HttpResponse::text(
                    StatusCode::OK,
                    req.path_param("id").unwrap_or(""),
                ))
            })
            .build()
            .expect("valid routes"),
    );

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let app = Arc::clone(&app);
            std::thread::spawn(move || {
                let mut request = HttpRequest::new(Method::GET, format!("/pets/{n}"));
                let response = app.invoke(&mut request).expect("dispatch succeeds");
                assert_eq!(response.body_text(), n.to_string());
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread finishes");
    }
}

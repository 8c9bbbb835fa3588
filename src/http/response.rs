use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::errors::HttpError;
use crate::http::{CookieJar, HttpCookie, HttpHeaders};

/// The response produced by a handler or middleware.
///
/// The body is an append-only buffer written through [`HttpResponse::write`].
/// Cookies added to the jar are folded into `Set-Cookie` headers when the
/// response is serialized through [`HttpResponse::headers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HttpHeaders,
    /// Cookies to send with the response
    pub cookies: CookieJar,
    body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HttpHeaders::new(),
            cookies: CookieJar::new(),
            body: Vec::new(),
        }
    }

    /// A `200 OK` response with no body.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// A plain-text response with `Content-Type: text/plain`.
    pub fn text(status: StatusCode, body: impl AsRef<str>) -> Self {
        let mut response = Self::new(status);
        response
            .headers
            .set("content-type", "text/plain; charset=utf-8");
        response.write(body.as_ref().as_bytes());
        response
    }

    /// A JSON response serialized from `body` with
    /// `Content-Type: application/json`.
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Result<Self, HttpError> {
        let payload = serde_json::to_vec(body)
            .map_err(|err| HttpError::internal(format!("failed to serialize response: {err}")))?;
        let mut response = Self::new(status);
        response.headers.set("content-type", "application/json");
        response.write(&payload);
        Ok(response)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Append bytes to the response body.
    pub fn write(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, lossily.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON, if it is valid JSON.
    #[must_use]
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.set(name, value);
    }

    pub fn add_cookie(&mut self, cookie: HttpCookie) {
        self.cookies.set(cookie);
    }

    /// The response headers with every pending cookie folded in as a
    /// `Set-Cookie` entry. The stored headers and the jar are left
    /// untouched, so the fold is repeatable.
    #[must_use]
    pub fn headers(&self) -> HttpHeaders {
        let mut headers = self.headers.clone();
        for cookie in self.cookies.iter() {
            headers.append("set-cookie", cookie.to_set_cookie());
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_response() {
        let response = HttpResponse::text(StatusCode::NOT_FOUND, "nothing here");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body_text(), "nothing here");
        assert_eq!(
            response.headers().get("content-type"),
            Some("text/plain; charset=utf-8")
        );
    }

    #[test]
    fn test_json_response() {
        let response = HttpResponse::json(StatusCode::OK, &json!({"id": 7}))
            .expect("serializable body");
        assert_eq!(response.body_json(), Some(json!({"id": 7})));
        assert_eq!(response.headers().get("content-type"), Some("application/json"));
    }

    #[test]
    fn test_write_appends() {
        let mut response = HttpResponse::ok();
        response.write(b"hello, ");
        response.write(b"world");
        assert_eq!(response.body_text(), "hello, world");
    }

    #[test]
    fn test_cookies_fold_into_headers() {
        let mut response = HttpResponse::ok();
        response.add_cookie(HttpCookie::new("a", "1"));
        response.add_cookie(HttpCookie::new("b", "2").http_only());

        let headers = response.headers();
        let set_cookie: Vec<&str> = headers.get_all("set-cookie").collect();
        assert_eq!(set_cookie, vec!["a=1", "b=2; HttpOnly"]);

        // The fold does not mutate the response; a second call is identical.
        let again = response.headers();
        assert_eq!(again.get_all("set-cookie").count(), 2);
        assert_eq!(response.cookies.len(), 2);
    }
}

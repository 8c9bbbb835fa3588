use serde_json::{Map, Value};

use crate::errors::HttpError;
use crate::http::query::QueryString;

/// Split a `Content-Type` header into its media type and parameters.
///
/// `application/json; charset=utf-8` yields
/// `("application/json", [("charset", "utf-8")])`. The media type is
/// lowercased; parameter values keep their case and surrounding quotes are
/// stripped.
#[must_use]
pub fn parse_content_type(header: &str) -> (String, Vec<(String, String)>) {
    let mut segments = header.split(';');
    let media_type = segments
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    let params = segments
        .filter_map(|segment| {
            let mut parts = segment.splitn(2, '=');
            let name = parts.next()?.trim().to_ascii_lowercase();
            let value = parts.next()?.trim().trim_matches('"').to_string();
            if name.is_empty() {
                None
            } else {
                Some((name, value))
            }
        })
        .collect();
    (media_type, params)
}

/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    /// Field name from the `Content-Disposition` header
    pub name: String,
    /// Original filename, present for file uploads
    pub filename: Option<String>,
    /// Per-part `Content-Type`, if declared
    pub content_type: Option<String>,
    /// Raw part payload
    pub data: Vec<u8>,
}

impl MultipartPart {
    /// Part payload as UTF-8 text, if it decodes cleanly.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

/// A request body interpreted according to its `Content-Type`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    /// `application/json` (and `+json` suffixed types)
    Json(Value),
    /// `application/x-www-form-urlencoded`
    Form(QueryString),
    /// `multipart/form-data`
    Multipart(Vec<MultipartPart>),
    /// `application/yaml`, `application/x-yaml`, `text/yaml`
    Yaml(Value),
    /// Anything else, decoded as UTF-8 (lossy)
    Text(String),
}

impl ParsedBody {
    /// Parse a raw body buffer according to the request `Content-Type`.
    ///
    /// A missing content type falls back to plain text. Parse failures for
    /// structured types surface as `400 Bad Request`.
    pub fn parse(content_type: Option<&str>, body: &[u8]) -> Result<Self, HttpError> {
        let Some(header) = content_type else {
            return Ok(Self::Text(String::from_utf8_lossy(body).into_owned()));
        };
        let (media_type, params) = parse_content_type(header);
        match media_type.as_str() {
            t if t == "application/json" || t.ends_with("+json") => {
                let value = serde_json::from_slice(body).map_err(|err| {
                    HttpError::bad_request(format!("invalid json body: {err}"))
                })?;
                Ok(Self::Json(value))
            }
            "application/x-www-form-urlencoded" => {
                let text = std::str::from_utf8(body).map_err(|_| {
                    HttpError::bad_request("form body is not valid utf-8")
                })?;
                Ok(Self::Form(QueryString::parse(text)))
            }
            "multipart/form-data" => {
                let boundary = params
                    .iter()
                    .find(|(name, _)| name == "boundary")
                    .map(|(_, value)| value.as_str())
                    .ok_or_else(|| {
                        HttpError::bad_request("multipart body without boundary")
                    })?;
                Ok(Self::Multipart(parse_multipart(body, boundary)?))
            }
            "application/yaml" | "application/x-yaml" | "text/yaml" => {
                let value: Value = serde_yaml::from_slice(body).map_err(|err| {
                    HttpError::bad_request(format!("invalid yaml body: {err}"))
                })?;
                Ok(Self::Yaml(value))
            }
            _ => Ok(Self::Text(String::from_utf8_lossy(body).into_owned())),
        }
    }

    /// Project the body into JSON for schema validation.
    ///
    /// Form bodies become objects with coerced scalars, multipart bodies
    /// become objects of text fields (file parts map to their filename).
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Json(value) | Self::Yaml(value) => value.clone(),
            Self::Form(query) => query.to_value(),
            Self::Multipart(parts) => {
                let mut object = Map::new();
                for part in parts {
                    let value = match (&part.filename, part.text()) {
                        (Some(filename), _) => Value::String(filename.clone()),
                        (None, Some(text)) => Value::String(text.to_string()),
                        (None, None) => Value::Null,
                    };
                    object.insert(part.name.clone(), value);
                }
                Value::Object(object)
            }
            Self::Text(text) => Value::String(text.clone()),
        }
    }
}

/// Split a multipart payload on its boundary and parse each part's headers.
fn parse_multipart(body: &[u8], boundary: &str) -> Result<Vec<MultipartPart>, HttpError> {
    let delimiter = format!("--{boundary}");
    let text_zones = split_on(body, delimiter.as_bytes());
    let mut parts = Vec::new();

    for zone in text_zones {
        // The epilogue starts with "--"; the preamble has no CRLF-led headers.
        let zone = strip_crlf(zone);
        if zone.is_empty() || zone.starts_with(b"--") {
            continue;
        }
        let Some(split_at) = find_subslice(zone, b"\r\n\r\n") else {
            continue;
        };
        let headers = &zone[..split_at];
        let data = strip_trailing_crlf(&zone[split_at + 4..]).to_vec();

        let mut name = None;
        let mut filename = None;
        let mut content_type = None;
        for line in std::str::from_utf8(headers)
            .map_err(|_| HttpError::bad_request("multipart headers are not valid utf-8"))?
            .split("\r\n")
        {
            let lower = line.to_ascii_lowercase();
            if lower.starts_with("content-disposition:") {
                for param in line.split(';').skip(1) {
                    let mut kv = param.trim().splitn(2, '=');
                    let key = kv.next().unwrap_or("").to_ascii_lowercase();
                    let value = kv.next().unwrap_or("").trim_matches('"').to_string();
                    match key.as_str() {
                        "name" => name = Some(value),
                        "filename" => filename = Some(value),
                        _ => {}
                    }
                }
            } else if let Some(value) = lower.strip_prefix("content-type:") {
                content_type = Some(value.trim().to_string());
            }
        }

        let name = name
            .ok_or_else(|| HttpError::bad_request("multipart part without a field name"))?;
        parts.push(MultipartPart {
            name,
            filename,
            content_type,
            data,
        });
    }

    Ok(parts)
}

fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut zones = Vec::new();
    let mut start = 0;
    while let Some(pos) = find_subslice(&haystack[start..], needle) {
        zones.push(&haystack[start..start + pos]);
        start += pos + needle.len();
    }
    zones.push(&haystack[start..]);
    zones
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn strip_crlf(zone: &[u8]) -> &[u8] {
    zone.strip_prefix(b"\r\n").unwrap_or(zone)
}

fn strip_trailing_crlf(zone: &[u8]) -> &[u8] {
    zone.strip_suffix(b"\r\n").unwrap_or(zone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_content_type_with_params() {
        let (media, params) = parse_content_type("Application/JSON; charset=utf-8");
        assert_eq!(media, "application/json");
        assert_eq!(params, vec![("charset".to_string(), "utf-8".to_string())]);
    }

    #[test]
    fn test_json_body() {
        let body = ParsedBody::parse(Some("application/json"), br#"{"id": 1}"#)
            .expect("valid json body");
        assert_eq!(body.to_value(), json!({"id": 1}));
    }

    #[test]
    fn test_invalid_json_is_bad_request() {
        let err = ParsedBody::parse(Some("application/json"), b"{nope")
            .expect_err("malformed json must fail");
        assert_eq!(err.status, http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_form_body() {
        let body = ParsedBody::parse(
            Some("application/x-www-form-urlencoded"),
            b"name=bob&age=33",
        )
        .expect("valid form body");
        assert_eq!(body.to_value(), json!({"name": "bob", "age": 33}));
    }

    #[test]
    fn test_yaml_body() {
        let body = ParsedBody::parse(Some("application/yaml"), b"name: bob\nage: 33\n")
            .expect("valid yaml body");
        assert_eq!(body.to_value(), json!({"name": "bob", "age": 33}));
    }

    #[test]
    fn test_missing_content_type_is_text() {
        let body = ParsedBody::parse(None, b"hello").expect("text body");
        assert_eq!(body, ParsedBody::Text("hello".to_string()));
    }

    #[test]
    fn test_multipart_body() {
        let raw = b"--xyz\r\n\
            Content-Disposition: form-data; name=\"title\"\r\n\r\n\
            Hello\r\n\
            --xyz\r\n\
            Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            file-data\r\n\
            --xyz--\r\n";
        let body = ParsedBody::parse(Some("multipart/form-data; boundary=xyz"), raw)
            .expect("valid multipart body");
        let ParsedBody::Multipart(parts) = &body else {
            panic!("expected multipart");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "title");
        assert_eq!(parts[0].text(), Some("Hello"));
        assert_eq!(parts[1].filename.as_deref(), Some("a.txt"));
        assert_eq!(parts[1].content_type.as_deref(), Some("text/plain"));
        assert_eq!(parts[1].text(), Some("file-data"));
        assert_eq!(
            body.to_value(),
            json!({"title": "Hello", "upload": "a.txt"})
        );
    }

    #[test]
    fn test_multipart_without_boundary_fails() {
        let err = ParsedBody::parse(Some("multipart/form-data"), b"irrelevant")
            .expect_err("boundary is required");
        assert_eq!(err.status, http::StatusCode::BAD_REQUEST);
    }
}

use serde_json::{Map, Value};

/// Decoded query-string parameters.
///
/// Pairs keep their original order. [`QueryString::get`] returns the last
/// value for a repeated key (later occurrences win); [`QueryString::get_all`]
/// exposes every occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    pairs: Vec<(String, String)>,
}

impl QueryString {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (`a=1&b=two&a=3`), percent-decoding keys
    /// and values. A leading `?` is tolerated.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let pairs = url::form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    /// Last value recorded for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value recorded for `name`, in order of appearance.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Project the query into a JSON object for schema validation.
    ///
    /// Single-occurrence keys become coerced scalars; repeated keys become
    /// arrays of coerced scalars, preserving order.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        for (key, value) in &self.pairs {
            let coerced = coerce_scalar(value);
            match object.get_mut(key.as_str()) {
                None => {
                    object.insert(key.clone(), coerced);
                }
                Some(Value::Array(items)) => items.push(coerced),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, coerced]);
                }
            }
        }
        Value::Object(object)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryString {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Interpret a raw query value as the narrowest JSON scalar it parses as.
///
/// `true`/`false` become booleans, integral numbers become integers, other
/// numerics become floats, everything else stays a string. Used when
/// projecting query parameters into JSON for validation.
#[must_use]
pub fn coerce_scalar(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        if float.is_finite() {
            return Value::from(float);
        }
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_and_lookup() {
        let query = QueryString::parse("?name=bob&limit=10");
        assert_eq!(query.get("name"), Some("bob"));
        assert_eq!(query.get("limit"), Some("10"));
        assert_eq!(query.get("missing"), None);
    }

    #[test]
    fn test_last_value_wins() {
        let query = QueryString::parse("tag=a&tag=b&tag=c");
        assert_eq!(query.get("tag"), Some("c"));
        let all: Vec<&str> = query.get_all("tag").collect();
        assert_eq!(all, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_percent_decoding() {
        let query = QueryString::parse("q=hello%20world&sym=%26%3D");
        assert_eq!(query.get("q"), Some("hello world"));
        assert_eq!(query.get("sym"), Some("&="));
    }

    #[test]
    fn test_to_value_coerces_and_groups() {
        let query = QueryString::parse("limit=10&active=true&tag=a&tag=b&name=bob");
        assert_eq!(
            query.to_value(),
            json!({
                "limit": 10,
                "active": true,
                "tag": ["a", "b"],
                "name": "bob"
            })
        );
    }

    #[test]
    fn test_coerce_scalar() {
        assert_eq!(coerce_scalar("true"), json!(true));
        assert_eq!(coerce_scalar("42"), json!(42));
        assert_eq!(coerce_scalar("-3.5"), json!(-3.5));
        assert_eq!(coerce_scalar("042x"), json!("042x"));
        assert_eq!(coerce_scalar(""), json!(""));
    }
}

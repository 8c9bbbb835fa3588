use std::fmt;

/// `SameSite` policy for a response cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// A single cookie.
///
/// Request cookies carry only a name and value; the remaining attributes
/// matter when the cookie is sent back on a response as a `Set-Cookie`
/// header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    /// Expiry timestamp, already formatted per RFC 7231 (`Wdy, DD Mon YYYY
    /// HH:MM:SS GMT`). Formatting is the caller's concern.
    pub expires: Option<String>,
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl HttpCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            expires: None,
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    #[must_use]
    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    #[must_use]
    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, policy: SameSite) -> Self {
        self.same_site = Some(policy);
        self
    }

    /// Render the cookie as a `Set-Cookie` header value.
    #[must_use]
    pub fn to_set_cookie(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(domain) = &self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if let Some(expires) = &self.expires {
            out.push_str("; Expires=");
            out.push_str(expires);
        }
        if let Some(max_age) = self.max_age {
            out.push_str("; Max-Age=");
            out.push_str(&max_age.to_string());
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(policy) = self.same_site {
            out.push_str("; SameSite=");
            out.push_str(&policy.to_string());
        }
        out
    }
}

/// An ordered collection of cookies, unique by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<HttpCookie>,
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cookie, replacing any existing cookie with the same name.
    pub fn set(&mut self, cookie: HttpCookie) {
        if let Some(existing) = self.cookies.iter_mut().find(|c| c.name == cookie.name) {
            *existing = cookie;
        } else {
            self.cookies.push(cookie);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HttpCookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    /// Value of the named cookie, if present.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|c| c.value.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HttpCookie> {
        self.cookies.iter()
    }
}

/// Parse a request `Cookie` header (`name=value; other=value`) into a jar.
///
/// Malformed pairs without an `=` are kept with an empty value, matching
/// common server behavior.
#[must_use]
pub fn parse_cookie_header(header: &str) -> CookieJar {
    let mut jar = CookieJar::new();
    for pair in header.split(';') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let mut parts = pair.splitn(2, '=');
        let name = parts.next().unwrap_or("").trim();
        let value = parts.next().unwrap_or("").trim();
        if !name.is_empty() {
            jar.set(HttpCookie::new(name, value));
        }
    }
    jar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_header() {
        let jar = parse_cookie_header("session=abc123; theme=dark");
        assert_eq!(jar.value("session"), Some("abc123"));
        assert_eq!(jar.value("theme"), Some("dark"));
        assert_eq!(jar.len(), 2);
    }

    #[test]
    fn test_parse_tolerates_empty_pairs() {
        let jar = parse_cookie_header("a=1;; b ;c=2");
        assert_eq!(jar.value("a"), Some("1"));
        assert_eq!(jar.value("b"), Some(""));
        assert_eq!(jar.value("c"), Some("2"));
    }

    #[test]
    fn test_set_replaces_by_name() {
        let mut jar = CookieJar::new();
        jar.set(HttpCookie::new("id", "1"));
        jar.set(HttpCookie::new("id", "2"));
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.value("id"), Some("2"));
    }

    #[test]
    fn test_set_cookie_serialization() {
        let cookie = HttpCookie::new("session", "abc")
            .with_path("/")
            .with_max_age(3600)
            .secure()
            .http_only()
            .with_same_site(SameSite::Lax);
        assert_eq!(
            cookie.to_set_cookie(),
            "session=abc; Path=/; Max-Age=3600; Secure; HttpOnly; SameSite=Lax"
        );
    }
}

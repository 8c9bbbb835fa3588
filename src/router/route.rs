use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use smallvec::SmallVec;
use thiserror::Error;

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the match hot path.
///
/// Param names use `Arc<str>` instead of `String` because names come from
/// the compiled route (known at registration) and `Arc::clone()` is an O(1)
/// atomic increment. Values remain `String` as they are per-request data
/// captured from the URL.
pub type PathParams = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A route template failed to compile.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Placeholder names must be valid identifiers so they can back a
    /// named capture group.
    #[error("invalid parameter name `{name}` in route template `{template}`")]
    InvalidParameterName { template: String, name: String },
    /// The same `{name}` appeared twice in one template.
    #[error("duplicate parameter `{name}` in route template `{template}`")]
    DuplicateParameter { template: String, name: String },
    /// A caller-supplied constraint pattern did not compile.
    #[error("invalid pattern for parameter `{name}` in route template `{template}`")]
    InvalidPattern {
        template: String,
        name: String,
        #[source]
        source: regex::Error,
    },
    /// The assembled template regex did not compile.
    #[error("route template `{template}` did not compile")]
    Template {
        template: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled route template.
///
/// Templates use `{name}` placeholders and `*` wildcards:
///
/// - `{name}` captures one path segment (`[^/]+`) unless a constraint
///   pattern overrides it
/// - `*` matches any run of characters, lazily, without capturing
/// - everything else matches literally, case-insensitively
///
/// Compilation happens once at construction and is fallible; matching is
/// infallible and allocation-light.
#[derive(Debug, Clone)]
pub struct Route {
    template: String,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    wildcard: bool,
}

impl Route {
    /// Compile `template` with the default one-segment pattern for every
    /// placeholder.
    pub fn parse(template: impl Into<String>) -> Result<Self, RouteError> {
        Self::with_patterns(template, &HashMap::new())
    }

    /// Compile `template`, overriding placeholder patterns by name.
    ///
    /// A constraint such as `{"id": "[0-9]+"}` narrows what `{id}` accepts.
    /// Constraint patterns are validated here so a bad pattern fails at
    /// registration, never at match time.
    pub fn with_patterns(
        template: impl Into<String>,
        patterns: &HashMap<String, String>,
    ) -> Result<Self, RouteError> {
        let template = template.into();
        let mut pattern = String::with_capacity(template.len() + 16);
        pattern.push_str("(?i)^");
        let mut param_names: Vec<Arc<str>> = Vec::new();
        let mut literal = String::new();
        let mut rest = template.as_str();

        while !rest.is_empty() {
            if let Some(after_brace) = rest.strip_prefix('{') {
                let Some(end) = after_brace.find('}') else {
                    // Unterminated brace is treated as a literal.
                    literal.push('{');
                    rest = after_brace;
                    continue;
                };
                let name = &after_brace[..end];
                if !is_valid_param_name(name) {
                    return Err(RouteError::InvalidParameterName {
                        template: template.clone(),
                        name: name.to_string(),
                    });
                }
                if param_names.iter().any(|existing| existing.as_ref() == name) {
                    return Err(RouteError::DuplicateParameter {
                        template: template.clone(),
                        name: name.to_string(),
                    });
                }
                pattern.push_str(&regex::escape(&std::mem::take(&mut literal)));
                let constraint = patterns.get(name).map_or("[^/]+", String::as_str);
                if let Err(source) = Regex::new(&format!("^(?:{constraint})$")) {
                    return Err(RouteError::InvalidPattern {
                        template: template.clone(),
                        name: name.to_string(),
                        source,
                    });
                }
                pattern.push_str(&format!("(?P<{name}>{constraint})"));
                param_names.push(Arc::from(name));
                rest = &after_brace[end + 1..];
            } else if let Some(after_star) = rest.strip_prefix('*') {
                pattern.push_str(&regex::escape(&std::mem::take(&mut literal)));
                pattern.push_str(".*?");
                rest = after_star;
            } else {
                let mut chars = rest.chars();
                if let Some(ch) = chars.next() {
                    literal.push(ch);
                }
                rest = chars.as_str();
            }
        }
        pattern.push_str(&regex::escape(&literal));
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|source| RouteError::Template {
            template: template.clone(),
            source,
        })?;
        let wildcard = template.contains('*');

        Ok(Self {
            template,
            regex,
            param_names,
            wildcard,
        })
    }

    /// The original template string.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether the template contains a `*` wildcard. Wildcard routes sort
    /// after literal routes during matching.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Names of the `{name}` placeholders, in template order.
    #[must_use]
    pub fn param_names(&self) -> &[Arc<str>] {
        &self.param_names
    }

    /// Match `uri` against the compiled template.
    ///
    /// Returns the captured placeholder values on success. Values are the
    /// raw matched substrings; no decoding or type coercion happens here.
    #[must_use]
    pub fn matches(&self, uri: &str) -> Option<PathParams> {
        let captures = self.regex.captures(uri)?;
        let mut params = PathParams::new();
        for name in &self.param_names {
            if let Some(capture) = captures.name(name) {
                params.push((Arc::clone(name), capture.as_str().to_string()));
            }
        }
        Some(params)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template
    }
}

impl Eq for Route {}

fn is_valid_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

// src/filter.rs

//! Token filtering for files marked `filter = true`
//!
//! `${name}` and `@name@` tokens are replaced with values from a property
//! table. Unknown tokens are left untouched, and a backslash before `$`
//! escapes a token.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\\?)\$\{([A-Za-z0-9_.\-]+)\}|@([A-Za-z0-9_.\-]+)@")
        .expect("token pattern is valid")
});

/// Text substitution applied to filtered sources and scriptlets
pub trait Filter {
    fn filter(&self, text: &str) -> String;
}

/// Replaces `${key}` / `@key@` with property values
#[derive(Debug, Clone, Default)]
pub struct TokenFilter {
    properties: BTreeMap<String, String>,
}

impl TokenFilter {
    pub fn new(properties: BTreeMap<String, String>) -> Self {
        Self { properties }
    }

    /// Add or replace a property
    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }
}

impl Filter for TokenFilter {
    fn filter(&self, text: &str) -> String {
        TOKEN
            .replace_all(text, |caps: &Captures<'_>| {
                let whole = &caps[0];
                if let Some(name) = caps.get(2) {
                    if !caps[1].is_empty() {
                        // escaped: drop the backslash, keep the token
                        return whole[1..].to_string();
                    }
                    return self
                        .properties
                        .get(name.as_str())
                        .cloned()
                        .unwrap_or_else(|| whole.to_string());
                }
                caps.get(3)
                    .and_then(|name| self.properties.get(name.as_str()))
                    .cloned()
                    .unwrap_or_else(|| whole.to_string())
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> TokenFilter {
        TokenFilter::default()
            .with_property("project.version", "1.2.3")
            .with_property("user", "app")
    }

    #[test]
    fn test_substitutes_both_token_styles() {
        let out = filter().filter("version=${project.version} owner=@user@");
        assert_eq!(out, "version=1.2.3 owner=app");
    }

    #[test]
    fn test_unknown_tokens_unchanged() {
        let out = filter().filter("home=${HOME} mail=me@example.com");
        assert_eq!(out, "home=${HOME} mail=me@example.com");
    }

    #[test]
    fn test_escaped_token() {
        let out = filter().filter(r"literal \${user} real ${user}");
        assert_eq!(out, "literal ${user} real app");
    }
}

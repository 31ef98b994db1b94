//! URL matching for interception rules

use regex::Regex;
use std::fmt;

use crate::common::{Error, Result};

/// Pattern matched against the full request URL
///
/// Globs follow the usual browser-automation conventions: `**` matches
/// anything, `*` matches anything except `/`, `?` matches one character.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    source: String,
    regex: Regex,
}

impl UrlPattern {
    /// Compile a glob pattern
    pub fn glob(pattern: &str) -> Result<Self> {
        let mut translated = String::with_capacity(pattern.len() * 2 + 2);
        translated.push('^');

        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' if chars.peek() == Some(&'*') => {
                    chars.next();
                    translated.push_str(".*");
                }
                '*' => translated.push_str("[^/]*"),
                '?' => translated.push('.'),
                other => translated.push_str(&regex::escape(&other.to_string())),
            }
        }
        translated.push('$');

        let regex = Regex::new(&translated).map_err(|e| Error::invalid_pattern(pattern, e))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Compile a regular expression, matched anywhere in the URL
    pub fn regex(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_star_spans_segments() {
        let p = UrlPattern::glob("**/api/parameters/**").unwrap();
        assert!(p.matches("http://localhost:8080/api/parameters/system/flags"));
        assert!(!p.matches("http://localhost:8080/api/people/1"));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let p = UrlPattern::glob("http://h/api/*/flags").unwrap();
        assert!(p.matches("http://h/api/system/flags"));
        assert!(!p.matches("http://h/api/a/b/flags"));
    }

    #[test]
    fn test_single_star_covers_query_string() {
        let p = UrlPattern::glob("**/api/accounts*").unwrap();
        assert!(p.matches("https://bank.test/api/accounts?page=2"));
    }

    #[test]
    fn test_glob_escapes_regex_characters() {
        let p = UrlPattern::glob("http://h/api/v1.0/x?y").unwrap();
        assert!(p.matches("http://h/api/v1.0/x?y"));
        assert!(p.matches("http://h/api/v1.0/xzy"));
        assert!(!p.matches("http://h/api/v1x0/x?y"));
    }

    #[test]
    fn test_regex_pattern() {
        let p = UrlPattern::regex(r"/api/loans/\d+$").unwrap();
        assert!(p.matches("http://h/api/loans/42"));
        assert!(!p.matches("http://h/api/loans/new"));
        assert!(UrlPattern::regex("(").is_err());
    }
}

//! Request/response pairs as seen by the page

use serde_json::Value;

use crate::common::{Error, Result};

/// Outbound request issued by the page
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl PageRequest {
    /// A GET request with no headers
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A request carrying a JSON body
    pub fn json(method: impl Into<String>, url: impl Into<String>, body: &Value) -> Result<Self> {
        Ok(Self {
            method: method.into(),
            url: url.into(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(serde_json::to_vec(body)?),
        })
    }

    /// Append a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Response returned to the page
#[derive(Debug, Clone, PartialEq)]
pub struct PageResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl PageResponse {
    /// A response with a JSON body and status 200
    pub fn json(body: &Value) -> Self {
        Self {
            status: 200,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.to_string().into_bytes(),
        }
    }

    /// First header value with the given name, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All header values with the given name
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Parse the body as JSON
    pub fn body_json(&self) -> Result<Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Same status and headers with a replaced body
    ///
    /// Any `content-length` header is dropped since it described the old body.
    pub fn with_body(&self, body: Vec<u8>) -> Self {
        Self {
            status: self.status,
            headers: self
                .headers
                .iter()
                .filter(|(k, _)| !k.eq_ignore_ascii_case("content-length"))
                .cloned()
                .collect(),
            body,
        }
    }
}

/// Resolve a step URL against an optional base URL
///
/// Absolute `http(s)://` URLs are returned unchanged.
pub fn resolve_url(base: Option<&str>, url: &str) -> Result<String> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(url.to_string());
    }
    let base = base.ok_or_else(|| {
        Error::Config(format!(
            "Relative URL '{}' needs a base_url in the plan or configuration",
            url
        ))
    })?;
    Ok(format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_relative_url() {
        assert_eq!(
            resolve_url(Some("http://localhost:8080/"), "/api/people").unwrap(),
            "http://localhost:8080/api/people"
        );
        assert_eq!(
            resolve_url(None, "https://example.test/x").unwrap(),
            "https://example.test/x"
        );
        assert!(resolve_url(None, "/api/people").is_err());
    }

    #[test]
    fn test_with_body_drops_content_length() {
        let response = PageResponse {
            status: 201,
            headers: vec![
                ("Content-Length".to_string(), "2".to_string()),
                ("x-request-id".to_string(), "abc".to_string()),
            ],
            body: b"{}".to_vec(),
        };
        let replaced = response.with_body(b"{\"a\":1}".to_vec());
        assert_eq!(replaced.status, 201);
        assert_eq!(replaced.header("content-length"), None);
        assert_eq!(replaced.header("X-Request-Id"), Some("abc"));
    }

    #[test]
    fn test_json_helpers() {
        let response = PageResponse::json(&json!({"id": "P-1"}));
        assert_eq!(response.body_json().unwrap()["id"], "P-1");
        let request = PageRequest::json("POST", "http://h/api", &json!({"a": 1})).unwrap();
        assert_eq!(request.body.as_deref(), Some(&b"{\"a\":1}"[..]));
    }
}

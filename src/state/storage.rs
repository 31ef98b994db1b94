//! Serialized page storage

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Format version written into every snapshot
pub const STORAGE_STATE_VERSION: u32 = 1;

/// Session credential carried alongside the entity entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }

    /// Parse the `name=value` part of a `Set-Cookie` header
    pub fn from_set_cookie(header: &str) -> Option<Self> {
        let pair = header.split(';').next()?.trim();
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Self::new(name, value.trim());
        for attribute in header.split(';').skip(1) {
            if let Some((key, val)) = attribute.trim().split_once('=') {
                match key.trim().to_ascii_lowercase().as_str() {
                    "domain" => cookie.domain = Some(val.trim().to_string()),
                    "path" => cookie.path = Some(val.trim().to_string()),
                    _ => {}
                }
            }
        }
        Some(cookie)
    }
}

/// Full contents of a session's storage
///
/// `local_storage` holds the entity entries (flat name to value, last write
/// wins); `cookies` hold authentication material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageState {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub local_storage: BTreeMap<String, String>,
}

fn current_version() -> u32 {
    STORAGE_STATE_VERSION
}

impl Default for StorageState {
    fn default() -> Self {
        Self {
            version: STORAGE_STATE_VERSION,
            cookies: Vec::new(),
            local_storage: BTreeMap::new(),
        }
    }
}

impl StorageState {
    /// Insert or replace a cookie by name
    pub fn set_cookie(&mut self, cookie: Cookie) {
        match self.cookies.iter_mut().find(|c| c.name == cookie.name) {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
    }

    /// Value for a `Cookie` request header, if any cookies are set
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

//! Upstream network access
//!
//! The mutator never fabricates responses: every intercepted request is sent
//! to the real backend through an [`Upstream`] first, and only the returned
//! payload is overlaid.

mod http;
mod types;

pub use http::HttpUpstream;
pub use types::{resolve_url, PageRequest, PageResponse};

use async_trait::async_trait;

use crate::common::Result;

/// Performs the real network call for a page request
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Send `request` to the backend and return its full response
    async fn fetch(&self, request: &PageRequest) -> Result<PageResponse>;
}

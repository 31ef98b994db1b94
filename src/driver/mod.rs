//! Browser driver seam
//!
//! The harness needs three things from a browser: a hook that sees every
//! request/response pair, access to the page's storage, and session
//! open/close. [`BrowserDriver`] and [`BrowserSession`] capture exactly that;
//! [`HeadlessDriver`] implements them without a browser over any
//! [`Upstream`](crate::upstream::Upstream).

mod headless;

pub use headless::{HeadlessDriver, HeadlessSession};

use async_trait::async_trait;

use crate::common::Result;
use crate::intercept::Mutator;
use crate::state::{Cookie, StorageState};
use crate::upstream::{PageRequest, PageResponse};

/// Opens isolated browser sessions
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>>;
}

/// One isolated browser context
///
/// All calls on one session are sequential. After [`close`](Self::close)
/// every call fails with [`Error::SessionClosed`](crate::Error::SessionClosed).
#[async_trait]
pub trait BrowserSession: Send {
    /// Route every later page request through `mutator`, replacing any
    /// previously installed one
    async fn install_interceptor(&mut self, mutator: Mutator) -> Result<()>;

    /// Issue a request from the page and wait for the response it observes
    async fn request(&mut self, request: PageRequest) -> Result<PageResponse>;

    async fn storage_get(&mut self, name: &str) -> Result<Option<String>>;

    async fn storage_set(&mut self, name: &str, value: &str) -> Result<()>;

    async fn set_cookie(&mut self, cookie: Cookie) -> Result<()>;

    /// Dump the full storage, entries and credentials
    async fn storage_state(&mut self) -> Result<StorageState>;

    /// Replace the full storage
    async fn load_storage_state(&mut self, state: StorageState) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

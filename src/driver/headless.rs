//! Browserless session implementation
//!
//! Storage lives in memory and page requests go straight to an upstream,
//! through the installed mutator when there is one. Cookies are attached to
//! outgoing requests and `Set-Cookie` responses update them, so login flows
//! leave credentials in the snapshot like a real browser would.

use async_trait::async_trait;
use std::sync::Arc;

use crate::common::{Error, Result};
use crate::intercept::Mutator;
use crate::state::{Cookie, StorageState};
use crate::upstream::{PageRequest, PageResponse, Upstream};

use super::{BrowserDriver, BrowserSession};

/// Driver whose sessions talk to a shared upstream
#[derive(Clone)]
pub struct HeadlessDriver {
    upstream: Arc<dyn Upstream>,
}

impl HeadlessDriver {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl BrowserDriver for HeadlessDriver {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>> {
        Ok(Box::new(HeadlessSession::new(self.upstream.clone())))
    }
}

/// In-memory session
pub struct HeadlessSession {
    upstream: Arc<dyn Upstream>,
    mutator: Option<Mutator>,
    storage: StorageState,
    open: bool,
}

impl HeadlessSession {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            mutator: None,
            storage: StorageState::default(),
            open: true,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(Error::SessionClosed)
        }
    }
}

#[async_trait]
impl BrowserSession for HeadlessSession {
    async fn install_interceptor(&mut self, mutator: Mutator) -> Result<()> {
        self.ensure_open()?;
        self.mutator = Some(mutator);
        Ok(())
    }

    async fn request(&mut self, mut request: PageRequest) -> Result<PageResponse> {
        self.ensure_open()?;

        if let Some(cookies) = self.storage.cookie_header() {
            request = request.with_header("cookie", cookies);
        }

        let response = match &self.mutator {
            Some(mutator) => mutator.handle(&request, self.upstream.as_ref()).await?,
            None => self.upstream.fetch(&request).await?,
        };

        for header in response.header_values("set-cookie") {
            if let Some(cookie) = Cookie::from_set_cookie(header) {
                self.storage.set_cookie(cookie);
            }
        }
        Ok(response)
    }

    async fn storage_get(&mut self, name: &str) -> Result<Option<String>> {
        self.ensure_open()?;
        Ok(self.storage.local_storage.get(name).cloned())
    }

    async fn storage_set(&mut self, name: &str, value: &str) -> Result<()> {
        self.ensure_open()?;
        self.storage
            .local_storage
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn set_cookie(&mut self, cookie: Cookie) -> Result<()> {
        self.ensure_open()?;
        self.storage.set_cookie(cookie);
        Ok(())
    }

    async fn storage_state(&mut self) -> Result<StorageState> {
        self.ensure_open()?;
        Ok(self.storage.clone())
    }

    async fn load_storage_state(&mut self, state: StorageState) -> Result<()> {
        self.ensure_open()?;
        self.storage = state;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.open = false;
        self.mutator = None;
        Ok(())
    }
}

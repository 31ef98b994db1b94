//! Entity state store over a session's storage

use crate::common::{Error, Result};
use crate::driver::BrowserSession;

use super::{KeySchema, RestoreOutcome, SnapshotFile};

/// Named string values handed from producing suites to later consumers
///
/// Reads and writes go to the active session's storage; `snapshot` and
/// `restore` move that storage to and from the durable file. The store never
/// invents a value: an absent name stays absent until someone writes it.
pub struct EntityStateStore<'a> {
    session: &'a mut dyn BrowserSession,
    schema: Option<&'a KeySchema>,
}

impl<'a> EntityStateStore<'a> {
    pub fn new(session: &'a mut dyn BrowserSession, schema: Option<&'a KeySchema>) -> Self {
        Self { session, schema }
    }

    fn check(&self, name: &str) -> Result<()> {
        match self.schema {
            Some(schema) => schema.check(name),
            None => Ok(()),
        }
    }

    /// Store `value` under `name`; the last write wins
    pub async fn write(&mut self, name: &str, value: &str) -> Result<()> {
        self.check(name)?;
        tracing::debug!(name, value, "state write");
        self.session.storage_set(name, value).await
    }

    /// Value currently visible for `name`, if any
    pub async fn read(&mut self, name: &str) -> Result<Option<String>> {
        self.check(name)?;
        self.session.storage_get(name).await
    }

    /// Value for `name`, failing with [`Error::MissingState`] when absent
    pub async fn require(&mut self, name: &str) -> Result<String> {
        self.read(name)
            .await?
            .ok_or_else(|| Error::MissingState(name.to_string()))
    }

    /// Write the session's full storage to the snapshot file
    pub async fn snapshot(&mut self, file: &SnapshotFile) -> Result<()> {
        let state = self.session.storage_state().await?;
        file.save(&state)
    }

    /// Overlay the session's storage onto the existing snapshot
    ///
    /// Entries and cookies the session holds replace those of the same name;
    /// everything else already in the file is kept. Used by suites that
    /// started from empty storage, so earlier handoffs survive them.
    pub async fn snapshot_merged(&mut self, file: &SnapshotFile) -> Result<()> {
        let session_state = self.session.storage_state().await?;
        let (mut merged, outcome) = file.load();
        if let RestoreOutcome::Corrupt(reason) = &outcome {
            tracing::warn!(path = %file.path().display(), reason = %reason, "replacing unreadable snapshot");
        }

        merged.local_storage.extend(session_state.local_storage);
        for cookie in session_state.cookies {
            merged.set_cookie(cookie);
        }
        file.save(&merged)
    }

    /// Replace the session's storage with the snapshot file's contents
    ///
    /// A missing or corrupt file leaves the storage empty and is reported
    /// through the outcome, not as an error.
    pub async fn restore(&mut self, file: &SnapshotFile) -> Result<RestoreOutcome> {
        let (state, outcome) = file.load();
        match &outcome {
            RestoreOutcome::Restored { entries, cookies } => {
                tracing::debug!(path = %file.path().display(), entries, cookies, "snapshot restored")
            }
            RestoreOutcome::Missing => {
                tracing::warn!(path = %file.path().display(), "no snapshot to restore; state reads will be absent")
            }
            RestoreOutcome::Corrupt(reason) => {
                tracing::warn!(path = %file.path().display(), reason = %reason, "snapshot is unreadable; state reads will be absent")
            }
        }
        self.session.load_storage_state(state).await?;
        Ok(outcome)
    }
}

//! The per-session "active workbook" binding.
//!
//! A session starts unbound. An upload binds it to one store file and every
//! later submission or preview goes through that binding. There is no way
//! back to unbound; a new upload simply replaces the path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::{FeeError, Result};
use crate::models::{FeeRecord, PaymentNotice};
use crate::notifier::{NotificationOutcome, Notifier};
use crate::store;

const SESSION_KEY: &str = "excel_path";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbookBinding {
    path: Option<PathBuf>,
}

impl WorkbookBinding {
    #[allow(dead_code)]
    pub fn bound(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Point the session at a freshly saved upload. Content is not inspected.
    pub fn bind_workbook(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    /// The bound path, provided it still exists on disk.
    fn live_path(&self) -> Result<&Path> {
        match self.path.as_deref() {
            Some(path) if path.exists() => Ok(path),
            _ => Err(FeeError::MissingStore),
        }
    }

    /// Append one submission to the bound store, then confirm to the guardian.
    ///
    /// Fails with [`FeeError::MissingStore`] before touching anything when the
    /// binding is unset or its file has gone. The notification result is
    /// returned for the caller's benefit only; a failed send does not undo
    /// or fail the append.
    pub fn append_record(&self, record: &FeeRecord, notifier: &Notifier) -> Result<NotificationOutcome> {
        let path = self.live_path()?;
        store::append(path, record.fields())?;
        tracing::info!(
            store = %path.display(),
            student = record.student_name(),
            "record appended"
        );
        Ok(notifier.notify(&PaymentNotice::from(record)))
    }

    pub fn read_all(&self) -> Result<Vec<Vec<String>>> {
        store::read(self.live_path()?)
    }

    pub async fn load(session: &Session) -> Result<Self> {
        let path: Option<PathBuf> = session.get(SESSION_KEY).await?;
        Ok(Self { path })
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        if let Some(path) = &self.path {
            session.insert(SESSION_KEY, path).await?;
        }
        Ok(())
    }
}

//! Per-session state of the loader and review pages.
//!
//! Each browser session gets an id from `POST /api/session` and sends it back
//! in the `X-Session-Id` header. A `SessionContext` holds what the session has
//! loaded so far: the parsed upload and its raw bytes, the selected review
//! table and the cached snapshot of that table.
//!
//! The cached snapshot is dropped on a table switch, on an explicit refresh and
//! after every successful write, so the next read goes back to the warehouse.

use crate::error::{AppError, AppResult};
use crate::loader::{SourceFile, UploadedDataset};
use crate::review::TableSnapshot;
use log::debug;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// A parsed upload waiting for the submit step.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub dataset: UploadedDataset,
    pub source: SourceFile,
}

#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Resolved once when the session opens.
    pub user: String,
    pub upload: Option<PendingUpload>,
    /// Label of the selected review table.
    pub selected_table: Option<String>,
    pub snapshot: Option<TableSnapshot>,
}

/// Why a cached snapshot is being dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    TableSwitch,
    Refresh,
    AfterWrite,
}

/// Shared map of open sessions, injected into the app as `web::Data`.
#[derive(Clone, Default)]
pub struct SessionsState {
    pub sessions: Arc<RwLock<HashMap<String, SessionContext>>>,
}

impl SessionsState {
    pub async fn open(&self, user: String) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.sessions.write().await.insert(
            id.clone(),
            SessionContext {
                user,
                ..SessionContext::default()
            },
        );
        id
    }

    pub async fn get(&self, id: &str) -> AppResult<SessionContext> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| unknown_session(id))
    }

    /// Runs `f` on the session under the write lock.
    pub async fn update<F, R>(&self, id: &str, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut SessionContext) -> R,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id).ok_or_else(|| unknown_session(id))?;
        Ok(f(session))
    }

    pub async fn invalidate(&self, id: &str, reason: Invalidation) -> AppResult<()> {
        self.update(id, |session| {
            debug!(
                "dropping cached snapshot of {:?} ({:?})",
                session.selected_table, reason
            );
            if reason == Invalidation::TableSwitch {
                session.selected_table = None;
            }
            session.snapshot = None;
        })
        .await
    }

    pub async fn close(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }
}

fn unknown_session(id: &str) -> AppError {
    AppError::not_found(format!("session {} does not exist", id))
}

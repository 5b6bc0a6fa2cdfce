//! In-process storage for users, finished records and live sessions.

pub mod records;
pub mod sessions;
pub mod users;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::record::Record;
use crate::models::user::User;
use crate::session::RecordingSession;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StoreError {
    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Record not found: {0}")]
    RecordNotFound(Uuid),
}

/// A live session and the user it records for.
#[derive(Debug)]
pub struct SessionEntry {
    pub user_id: String,
    pub session: RecordingSession,
    /// Set once the session has been turned into a stored record.
    pub record_id: Option<Uuid>,
}

#[derive(Debug, Default)]
struct StoreState {
    users: HashMap<String, User>,
    records: Vec<Record>,
    sessions: HashMap<Uuid, Arc<Mutex<SessionEntry>>>,
}

/// Cheap to clone; all clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<StoreState>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StoreCounts {
    pub users: usize,
    pub records: usize,
    pub sessions: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn counts(&self) -> StoreCounts {
        let state = self.state.read().await;
        StoreCounts {
            users: state.users.len(),
            records: state.records.len(),
            sessions: state.sessions.len(),
        }
    }
}

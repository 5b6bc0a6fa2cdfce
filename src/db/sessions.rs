use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::{MemoryStore, SessionEntry, StoreError};
use crate::session::RecordingSession;

pub async fn create_session(store: &MemoryStore, user_id: String, session: RecordingSession) -> Uuid {
    let id = Uuid::new_v4();
    let entry = SessionEntry {
        user_id,
        session,
        record_id: None,
    };
    store
        .state
        .write()
        .await
        .sessions
        .insert(id, Arc::new(Mutex::new(entry)));
    id
}

/// Handle to one live session. Lock it for the duration of a single operation.
pub async fn get_session(store: &MemoryStore, id: Uuid) -> Result<Arc<Mutex<SessionEntry>>, StoreError> {
    let state = store.state.read().await;
    state
        .sessions
        .get(&id)
        .cloned()
        .ok_or(StoreError::SessionNotFound(id))
}

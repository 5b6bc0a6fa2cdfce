use uuid::Uuid;

use crate::db::{MemoryStore, StoreError};
use crate::models::record::Record;

pub async fn insert_record(store: &MemoryStore, record: Record) -> Uuid {
    let id = record.id;
    store.state.write().await.records.push(record);
    id
}

pub async fn get_record(store: &MemoryStore, id: Uuid) -> Result<Record, StoreError> {
    let state = store.state.read().await;
    state
        .records
        .iter()
        .find(|record| record.id == id)
        .cloned()
        .ok_or(StoreError::RecordNotFound(id))
}

/// All records of a user, newest first.
pub async fn get_records_for_user(store: &MemoryStore, user_id: &str) -> Vec<Record> {
    let state = store.state.read().await;
    let mut records: Vec<Record> = state
        .records
        .iter()
        .filter(|record| record.user_id == user_id)
        .cloned()
        .collect();
    records.sort_by(|a, b| b.datetime.cmp(&a.datetime));
    records
}

use crate::db::{MemoryStore, StoreError};
use crate::models::user::User;

pub async fn insert_user(store: &MemoryStore, user: User) -> Result<User, StoreError> {
    let mut state = store.state.write().await;
    if state.users.contains_key(&user.user_name) {
        return Err(StoreError::UserExists(user.user_name));
    }
    state.users.insert(user.user_name.clone(), user.clone());
    Ok(user)
}

/// Looks the user up by its lower-cased name.
pub async fn get_user(store: &MemoryStore, user_name: &str) -> Result<User, StoreError> {
    let user_name = user_name.trim().to_lowercase();
    let state = store.state.read().await;
    state
        .users
        .get(&user_name)
        .cloned()
        .ok_or(StoreError::UserNotFound(user_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(name: &str) -> User {
        User {
            user_name: name.into(),
            birth_year: 1985,
            gender: "female".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_users_are_rejected() {
        let store = MemoryStore::new();
        insert_user(&store, user("carol")).await.unwrap();
        assert_eq!(
            insert_user(&store, user("carol")).await,
            Err(StoreError::UserExists("carol".into()))
        );
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        insert_user(&store, user("carol")).await.unwrap();
        assert_eq!(get_user(&store, "Carol").await.unwrap().user_name, "carol");
        assert!(matches!(get_user(&store, "dave").await, Err(StoreError::UserNotFound(_))));
    }
}

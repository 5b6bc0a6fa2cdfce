use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::record::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_name: String,
    pub birth_year: i32,
    pub gender: String,
    pub created_at: DateTime<Utc>,
}

/// All fields optional so missing ones can be reported with a 400 instead of a parse error.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub user_name: Option<String>,
    pub birth_year: Option<i32>,
    pub gender: Option<String>,
}

impl fmt::Display for CreateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User name: {}", self.user_name.as_deref().unwrap_or("<missing>"))
    }
}

impl CreateUserRequest {
    /// Builds the user with its name stored lower-case.
    pub fn into_user(self) -> Result<User, ValidationError> {
        let user_name = self
            .user_name
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .ok_or(ValidationError::MissingField("user_name"))?;
        let birth_year = self.birth_year.ok_or(ValidationError::MissingField("birth_year"))?;
        let gender = self
            .gender
            .filter(|gender| !gender.trim().is_empty())
            .ok_or(ValidationError::MissingField("gender"))?;

        Ok(User {
            user_name,
            birth_year,
            gender,
            created_at: Utc::now(),
        })
    }
}

//! User data service: input validation plus the two store operations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::store::{PutOutcome, StoreError, UserStore};

/// Required attributes, in the order they are reported when missing.
const REQUIRED_FIELDS: [&str; 3] = ["userId", "name", "email"];

/// A stored user record. Attributes beyond the three required ones pass
/// through unvalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("UserId is required")]
    MissingUserId,
    #[error("User with ID {0} already exists")]
    AlreadyExists(String),
    #[error("User with ID {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct UserService<S> {
    store: S,
}

impl<S: UserStore> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a user from a decoded JSON object, returning the new `userId`.
    ///
    /// Validation happens before any store access. Uniqueness is enforced by
    /// a conditional write, so a duplicate `userId` never clobbers the
    /// existing record.
    pub async fn create_user(&self, mut data: Map<String, Value>) -> Result<String, ServiceError> {
        let mut missing = Vec::new();
        let mut take = |field: &'static str| {
            let value = string_field(&data, field);
            if value.is_none() {
                missing.push(field);
            }
            value
        };
        let fields = (take("userId"), take("name"), take("email"));
        let (Some(user_id), Some(name), Some(email)) = fields else {
            return Err(ServiceError::MissingFields(missing));
        };
        for field in REQUIRED_FIELDS {
            data.remove(field);
        }
        let user = User {
            user_id,
            name,
            email,
            extra: data,
        };
        match self.store.put_if_absent(&user).await? {
            PutOutcome::Created => Ok(user.user_id),
            PutOutcome::AlreadyExists => Err(ServiceError::AlreadyExists(user.user_id)),
        }
    }

    /// Fetches the full record for `user_id`.
    pub async fn fetch_user(&self, user_id: &str) -> Result<User, ServiceError> {
        if user_id.is_empty() {
            return Err(ServiceError::MissingUserId);
        }
        self.store
            .get(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(user_id.to_owned()))
    }
}

/// A required attribute counts as present only when it is a non-empty string.
fn string_field(data: &Map<String, Value>, field: &str) -> Option<String> {
    data.get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

//! Key-value store seam for user records.
//!
//! The service talks to a [`UserStore`] rather than to DynamoDB directly, so
//! tests can swap in an in-memory fake.

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::DisplayErrorContext,
    types::AttributeValue,
    Client,
};
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};
use thiserror::Error;

use crate::service::User;

const KEY_ATTRIBUTE: &str = "userId";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Outcome of a conditional write.
#[derive(Debug, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    AlreadyExists,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up a record by its `userId`.
    async fn get(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Writes the record only if no record with the same `userId` exists.
    /// On conflict the table is left untouched.
    async fn put_if_absent(&self, user: &User) -> Result<PutOutcome, StoreError>;
}

#[async_trait]
impl<'a, S: UserStore + ?Sized> UserStore for &'a S {
    async fn get(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        (**self).get(user_id).await
    }

    async fn put_if_absent(&self, user: &User) -> Result<PutOutcome, StoreError> {
        (**self).put_if_absent(user).await
    }
}

/// DynamoDB-backed store. The client is created once per warm instance and
/// shared across invocations.
pub struct DynamoStore {
    client: Client,
    table_name: String,
}

impl DynamoStore {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl UserStore for DynamoStore {
    async fn get(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, AttributeValue::S(user_id.to_owned()))
            .send()
            .await
            .map_err(|err| StoreError::Database(DisplayErrorContext(&err).to_string()))?;
        match output.item {
            Some(item) => from_item(item)
                .map(Some)
                .map_err(|err| StoreError::Database(err.to_string())),
            None => Ok(None),
        }
    }

    async fn put_if_absent(&self, user: &User) -> Result<PutOutcome, StoreError> {
        let item = to_item(user).map_err(|err| StoreError::Database(err.to_string()))?;
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression(format!("attribute_not_exists({KEY_ATTRIBUTE})"))
            .send()
            .await;
        match result {
            Ok(_) => Ok(PutOutcome::Created),
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception())
                {
                    Ok(PutOutcome::AlreadyExists)
                } else {
                    Err(StoreError::Database(DisplayErrorContext(&err).to_string()))
                }
            }
        }
    }
}

#[cfg(test)]
pub mod memory {
    //! In-memory fake with read/write counters, so tests can assert that an
    //! operation never reached the store.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryStore {
        records: Mutex<HashMap<String, User>>,
        reads: AtomicUsize,
        writes: AtomicUsize,
    }

    impl MemoryStore {
        pub fn with_user(user: User) -> Self {
            let store = Self::default();
            store
                .records
                .lock()
                .expect("store lock poisoned")
                .insert(user.user_id.clone(), user);
            store
        }

        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        pub fn snapshot(&self) -> HashMap<String, User> {
            self.records.lock().expect("store lock poisoned").clone()
        }
    }

    /// Fake for the store-outage path: every call fails with a transport
    /// error.
    pub struct FailingStore;

    #[async_trait]
    impl UserStore for FailingStore {
        async fn get(&self, _user_id: &str) -> Result<Option<User>, StoreError> {
            Err(StoreError::Database("connection refused".to_owned()))
        }

        async fn put_if_absent(&self, _user: &User) -> Result<PutOutcome, StoreError> {
            Err(StoreError::Database("connection refused".to_owned()))
        }
    }

    #[async_trait]
    impl UserStore for MemoryStore {
        async fn get(&self, user_id: &str) -> Result<Option<User>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .records
                .lock()
                .expect("store lock poisoned")
                .get(user_id)
                .cloned())
        }

        async fn put_if_absent(&self, user: &User) -> Result<PutOutcome, StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut records = self.records.lock().expect("store lock poisoned");
            if records.contains_key(&user.user_id) {
                return Ok(PutOutcome::AlreadyExists);
            }
            records.insert(user.user_id.clone(), user.clone());
            Ok(PutOutcome::Created)
        }
    }
}

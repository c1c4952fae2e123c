use async_trait::async_trait;

use super::aggregate::UserRecord;
use crate::shared::{DomainError, UserId};

/// Durable per-user record store.
///
/// Implementations must tolerate concurrent calls for distinct users and
/// give at least last-writer-wins semantics for a single user.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Return the stored record, creating an empty one if none exists.
    /// Concurrent calls for the same uid must end up with a single record.
    async fn get_or_create(&self, uid: &UserId) -> Result<UserRecord, DomainError>;

    /// Load a record; `DomainError::NotFound` when the user was never registered.
    async fn find_by_id(&self, uid: &UserId) -> Result<UserRecord, DomainError>;

    /// Overwrite the record, durable before returning.
    async fn save(&self, record: &UserRecord) -> Result<(), DomainError>;

    /// Every persisted user id.
    async fn list_ids(&self) -> Result<Vec<UserId>, DomainError>;
}

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::registration::{NewRegistration, Registration, RegistrationPatch};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("email {0} is already registered")]
    DuplicateEmail(String),
    #[error("storage failure: {0}")]
    Backend(String),
}

/// Persistence contract for registration records, keyed by normalized email.
///
/// The unique-email constraint of the backing store is the authority on
/// duplicates; any advisory pre-checks callers perform do not replace the
/// `DuplicateEmail` error path on `create`.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Persists a new record, returning it with its assigned id and
    /// timestamps. Fails with `StoreError::DuplicateEmail` when a record
    /// with the same email already exists.
    async fn create(&self, registration: NewRegistration) -> Result<Registration, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Registration>, StoreError>;

    /// Applies the set fields of `patch` to the record with `email`.
    /// Returns `None` when no record matches.
    async fn update(
        &self,
        email: &str,
        patch: RegistrationPatch,
    ) -> Result<Option<Registration>, StoreError>;

    /// Returns true iff a record was removed.
    async fn delete(&self, email: &str) -> Result<bool, StoreError>;
}

#[async_trait]
impl<T> RegistrationStore for Arc<T>
where
    T: RegistrationStore + ?Sized,
{
    async fn create(&self, registration: NewRegistration) -> Result<Registration, StoreError> {
        (**self).create(registration).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Registration>, StoreError> {
        (**self).find_by_email(email).await
    }

    async fn update(
        &self,
        email: &str,
        patch: RegistrationPatch,
    ) -> Result<Option<Registration>, StoreError> {
        (**self).update(email, patch).await
    }

    async fn delete(&self, email: &str) -> Result<bool, StoreError> {
        (**self).delete(email).await
    }
}

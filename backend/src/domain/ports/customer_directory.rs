//! Ports for reading and registering customers in the customer directory.

use async_trait::async_trait;

use crate::domain::{Customer, CustomerDraft, CustomerId};

use super::DirectoryError;

/// Read access to the customer directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Look up a customer; `Ok(None)` when the directory has no such record.
    async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DirectoryError>;
}

/// Write access used by the administrative HTTP surface.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerRegistry: Send + Sync {
    /// Register a new customer and return it with its assigned id.
    async fn register(&self, draft: CustomerDraft) -> Result<Customer, DirectoryError>;
}

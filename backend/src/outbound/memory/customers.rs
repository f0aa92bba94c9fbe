//! In-memory customer directory.

use async_trait::async_trait;

use super::Table;
use crate::domain::ports::{CustomerDirectory, CustomerRegistry, DirectoryError};
use crate::domain::{Customer, CustomerDraft, CustomerId};

/// Customer records kept in process.
#[derive(Default)]
pub struct InMemoryCustomerDirectory {
    table: Table<Customer>,
}

impl InMemoryCustomerDirectory {
    /// Insert or replace a customer under its own id.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] when the store lock is
    /// poisoned.
    pub fn seed(&self, customer: Customer) -> Result<(), DirectoryError> {
        let mut state = self.table.lock(DirectoryError::unavailable)?;
        state.seed(customer.id.get(), customer);
        Ok(())
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DirectoryError> {
        let state = self.table.lock(DirectoryError::unavailable)?;
        Ok(state.rows.get(&id.get()).cloned())
    }
}

#[async_trait]
impl CustomerRegistry for InMemoryCustomerDirectory {
    async fn register(&self, draft: CustomerDraft) -> Result<Customer, DirectoryError> {
        let mut state = self.table.lock(DirectoryError::unavailable)?;
        let id = state.allocate();
        let customer = Customer {
            id: CustomerId::new(id),
            full_name: draft.full_name,
            phone_number: draft.phone_number,
            email: draft.email,
        };
        state.rows.insert(id, customer.clone());
        Ok(customer)
    }
}

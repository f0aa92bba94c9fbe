//! In-memory check-in repository.

use async_trait::async_trait;

use super::Table;
use crate::domain::ports::{CheckInFilter, CheckInRepository, CheckInRepositoryError};
use crate::domain::{CheckIn, CheckInDraft, CheckInId};

/// Check-in store owned by the check-in orchestrator.
#[derive(Default)]
pub struct InMemoryCheckInRepository {
    table: Table<CheckIn>,
}

#[async_trait]
impl CheckInRepository for InMemoryCheckInRepository {
    async fn insert(&self, draft: CheckInDraft) -> Result<CheckIn, CheckInRepositoryError> {
        let mut state = self.table.lock(CheckInRepositoryError::connection)?;
        let id = state.allocate();
        let check_in = draft.into_check_in(CheckInId::new(id));
        state.rows.insert(id, check_in.clone());
        Ok(check_in)
    }

    async fn find_by_id(&self, id: CheckInId) -> Result<Option<CheckIn>, CheckInRepositoryError> {
        let state = self.table.lock(CheckInRepositoryError::connection)?;
        Ok(state.rows.get(&id.get()).cloned())
    }

    async fn update(&self, check_in: &CheckIn) -> Result<(), CheckInRepositoryError> {
        let mut state = self.table.lock(CheckInRepositoryError::connection)?;
        let slot = state
            .rows
            .get_mut(&check_in.id.get())
            .ok_or_else(|| CheckInRepositoryError::missing(check_in.id))?;
        *slot = check_in.clone();
        Ok(())
    }

    async fn delete(&self, id: CheckInId) -> Result<bool, CheckInRepositoryError> {
        let mut state = self.table.lock(CheckInRepositoryError::connection)?;
        Ok(state.rows.remove(&id.get()).is_some())
    }

    async fn list(&self, filter: CheckInFilter) -> Result<Vec<CheckIn>, CheckInRepositoryError> {
        let state = self.table.lock(CheckInRepositoryError::connection)?;
        Ok(state
            .rows
            .values()
            .filter(|check_in| filter.matches(check_in))
            .cloned()
            .collect())
    }
}

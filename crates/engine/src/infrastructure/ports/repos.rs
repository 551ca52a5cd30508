//! Repository port traits for database access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ringside_domain::*;

use super::error::RepoError;

// =============================================================================
// Bookers, memories and employment history
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookerRepo: Send + Sync {
    // CRUD
    async fn get(&self, id: BookerId) -> Result<Option<Booker>, RepoError>;
    async fn save(&self, booker: &Booker) -> Result<(), RepoError>;
    async fn delete(&self, id: BookerId) -> Result<(), RepoError>;

    // Queries
    async fn list_for_company(&self, company_id: CompanyId) -> Result<Vec<Booker>, RepoError>;
    /// The company's currently employed booker, if any.
    async fn get_active_for_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Option<Booker>, RepoError>;
    /// An active booker with auto-booking switched on, if any.
    async fn get_auto_booker_for_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Option<Booker>, RepoError>;

    // Memories
    async fn get_memory(&self, id: MemoryId) -> Result<Option<BookerMemory>, RepoError>;
    async fn list_memories(&self, booker_id: BookerId) -> Result<Vec<BookerMemory>, RepoError>;
    /// Memories created at or after `since`, newest first.
    async fn recent_memories(
        &self,
        booker_id: BookerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<BookerMemory>, RepoError>;
    /// Memories with recall at or above `STRONG_RECALL`.
    async fn strong_memories(&self, booker_id: BookerId)
        -> Result<Vec<BookerMemory>, RepoError>;
    async fn count_memories(&self, booker_id: BookerId) -> Result<usize, RepoError>;
    async fn save_memory(&self, memory: &BookerMemory) -> Result<(), RepoError>;
    /// Fails with `NotFound` when the memory was never saved.
    async fn update_memory(&self, memory: &BookerMemory) -> Result<(), RepoError>;
    /// Deletes memories with recall below `threshold`; returns how many went.
    async fn delete_weak_memories(
        &self,
        booker_id: BookerId,
        threshold: i32,
    ) -> Result<usize, RepoError>;

    // Employment history
    /// Oldest stint first.
    async fn list_employment_history(
        &self,
        booker_id: BookerId,
    ) -> Result<Vec<BookerEmployment>, RepoError>;
    async fn save_employment(&self, employment: &BookerEmployment) -> Result<(), RepoError>;
}

// =============================================================================
// Crises, communications and outcomes
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrisisRepo: Send + Sync {
    async fn get(&self, id: CrisisId) -> Result<Option<Crisis>, RepoError>;
    async fn save(&self, crisis: &Crisis) -> Result<(), RepoError>;
    /// Non-terminal crises, severity desc then escalation desc.
    async fn list_active(&self, company_id: CompanyId) -> Result<Vec<Crisis>, RepoError>;
    /// Active crises that are critical, same order as `list_active`.
    async fn list_critical(&self, company_id: CompanyId) -> Result<Vec<Crisis>, RepoError>;
    async fn count_resolved(&self, company_id: CompanyId) -> Result<usize, RepoError>;

    // Communications
    async fn get_communication(
        &self,
        id: CommunicationId,
    ) -> Result<Option<Communication>, RepoError>;
    /// Oldest first.
    async fn list_communications_for_crisis(
        &self,
        crisis_id: CrisisId,
    ) -> Result<Vec<Communication>, RepoError>;
    async fn save_communication(&self, communication: &Communication) -> Result<(), RepoError>;

    // Outcomes
    async fn get_outcome(&self, id: OutcomeId) -> Result<Option<CommunicationOutcome>, RepoError>;
    async fn get_outcome_for_communication(
        &self,
        communication_id: CommunicationId,
    ) -> Result<Option<CommunicationOutcome>, RepoError>;
    async fn save_outcome(&self, outcome: &CommunicationOutcome) -> Result<(), RepoError>;
    /// Share of the company's executed communications that succeeded, 0-100.
    async fn communication_success_rate(&self, company_id: CompanyId) -> Result<f64, RepoError>;
}

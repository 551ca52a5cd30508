//! Communication operation errors.

use ringside_domain::DomainError;

use crate::infrastructure::ports::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum CommunicationError {
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

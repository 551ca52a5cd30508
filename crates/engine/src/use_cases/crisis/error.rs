//! Crisis operation errors.

use crate::infrastructure::ports::RepoError;

/// Errors that can occur while running the crisis pipeline.
#[derive(Debug, thiserror::Error)]
pub enum CrisisError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

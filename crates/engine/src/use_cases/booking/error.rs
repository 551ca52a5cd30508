//! Booking operation errors.

use ringside_domain::DomainError;

use crate::infrastructure::ports::RepoError;

/// Errors that can occur while booking.
///
/// A missing booker is not an error: operations soft-fail with an empty
/// result instead.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

//! Weekly update errors.

use crate::infrastructure::ports::RepoError;
use crate::use_cases::booking::BookingError;
use crate::use_cases::crisis::CrisisError;

#[derive(Debug, thiserror::Error)]
pub enum WeeklyError {
    #[error("Booking error: {0}")]
    Booking(#[from] BookingError),
    #[error("Crisis error: {0}")]
    Crisis(#[from] CrisisError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

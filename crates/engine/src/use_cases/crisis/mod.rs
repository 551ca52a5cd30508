//! Backstage crisis use cases.

mod engine;
mod error;

pub use engine::CrisisEngine;
pub use error::CrisisError;

//! Backstage communication use cases: predicting, carrying out and
//! recommending interventions on a crisis.

mod engine;
mod error;

pub use engine::{CommunicationEngine, CommunicationRequest, DEFAULT_INITIATOR_INFLUENCE};
pub use error::CommunicationError;

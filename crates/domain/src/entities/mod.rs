//! Domain entities - records with identity and public fields.

pub mod booker;
pub mod booker_memory;
pub mod communication;
pub mod communication_outcome;
pub mod employment;

pub use booker::{
    Booker, BookingStyle, CreativeProfile, EmploymentStatus, WorkerArchetype, DOMINANT_TRAIT,
};
pub use booker_memory::{
    average_impact_for, BookerMemory, MemoryEvent, MemoryIntensity, STRONG_RECALL,
    WEAK_MEMORY_THRESHOLD,
};
pub use communication::{Communication, CommunicationKind, Tone, MAX_MESSAGE_CHARS};
pub use communication_outcome::CommunicationOutcome;
pub use employment::BookerEmployment;

//! Ringside domain - bookers, memories, crises and communications.
//!
//! Pure data and invariants. No I/O, no randomness, no clocks: anything
//! time-dependent takes `now` as an argument.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod value_objects;

pub use aggregates::{Crisis, CrisisKind, CrisisStage};
pub use entities::{
    average_impact_for, Booker, BookerEmployment, BookerMemory, BookingStyle, Communication,
    CommunicationKind, CommunicationOutcome, CreativeProfile, EmploymentStatus, MemoryEvent,
    MemoryIntensity, Tone, WorkerArchetype, MAX_MESSAGE_CHARS, STRONG_RECALL,
    WEAK_MEMORY_THRESHOLD,
};
pub use error::DomainError;
pub use events::CrisisUpdate;
pub use ids::*;
pub use value_objects::{
    AutoBookingConstraints, BookingControlLevel, ProductType, SegmentDefinition, SegmentKind,
    ShowContext, ShowDefinition, StorylineInfo, TitleInfo, WorkerSnapshot,
};

//! Aggregate mutation outcomes.

pub mod crisis_events;

pub use crisis_events::CrisisUpdate;

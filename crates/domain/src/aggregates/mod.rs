//! Aggregate roots - domain objects that own their related data
//!
//! Fields are private; state changes only through methods that return a
//! mutation outcome from `crate::events`.

pub mod crisis;

pub use crisis::{Crisis, CrisisKind, CrisisStage};

//! Once-a-week maintenance for a company's backstage state.

mod error;
mod update;

pub use error::WeeklyError;
pub use update::{LockerRoomConditions, WeeklyReport, WeeklyUpdate};

//! Use cases - booking decisions and backstage crisis handling.
//!
//! Each module owns its error type; all of them take their ports through
//! constructor injection.

pub mod booking;
pub mod communication;
pub mod crisis;
pub mod weekly;

pub use booking::{BookerAi, BookingControl, BookingError};
pub use communication::{CommunicationEngine, CommunicationError, CommunicationRequest};
pub use crisis::{CrisisEngine, CrisisError};
pub use weekly::{LockerRoomConditions, WeeklyError, WeeklyReport, WeeklyUpdate};

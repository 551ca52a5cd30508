//! Booking use cases.
//!
//! - `BookerAi`: main-event proposals, match evaluation, memories and the
//!   auto-booking pipeline, all driven by a booker's profile
//! - `BookingControl`: dispatch by the player's chosen control level

mod auto_booking;
mod booker_ai;
mod control;
mod error;

pub use booker_ai::BookerAi;
pub use control::BookingControl;
pub use error::BookingError;

#[cfg(test)]
mod test_support;

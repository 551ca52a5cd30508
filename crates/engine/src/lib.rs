//! Ringside Engine library.
//!
//! ## Structure
//!
//! - `use_cases/` - booker AI, booking control, crisis and communication engines
//! - `infrastructure/` - ports plus their SQLite and in-memory adapters
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;

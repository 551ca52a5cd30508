//! Booking vocabulary: product styles, control levels and auto-booking constraints.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::WorkerId;

/// The kind of wrestling product a booker prefers to put on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Hardcore,
    Puroresu,
    Technical,
    Entertainment,
    #[default]
    Balanced,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Hardcore => "hardcore",
            ProductType::Puroresu => "puroresu",
            ProductType::Technical => "technical",
            ProductType::Entertainment => "entertainment",
            ProductType::Balanced => "balanced",
        }
    }

    /// Main event (duration minutes, intensity) for this product.
    pub fn main_event_profile(&self) -> (u32, i32) {
        match self {
            ProductType::Puroresu => (25, 85),
            ProductType::Hardcore => (18, 90),
            ProductType::Technical => (22, 75),
            ProductType::Entertainment | ProductType::Balanced => (20, 70),
        }
    }

    /// Default length of an undercard match.
    pub fn filler_minutes(&self) -> u32 {
        match self {
            ProductType::Technical | ProductType::Puroresu => 15,
            ProductType::Hardcore => 10,
            ProductType::Entertainment | ProductType::Balanced => 12,
        }
    }

    /// Whether storyline segments lean towards talking rather than wrestling.
    pub fn favors_promos(&self) -> bool {
        matches!(self, ProductType::Entertainment)
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hardcore" => Ok(ProductType::Hardcore),
            "puroresu" => Ok(ProductType::Puroresu),
            "technical" => Ok(ProductType::Technical),
            "entertainment" => Ok(ProductType::Entertainment),
            "balanced" => Ok(ProductType::Balanced),
            other => Err(DomainError::parse(format!("Unknown product type: {other}"))),
        }
    }
}

/// How much of the booking the player hands over to the AI booker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingControlLevel {
    /// AI books the whole show
    Spectator,
    /// AI proposes, player validates
    Producer,
    /// Player books main event and titles, AI books the midcard
    CoBooker,
    /// Player books everything
    Dictator,
}

impl std::str::FromStr for BookingControlLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "spectator" => Ok(Self::Spectator),
            "producer" => Ok(Self::Producer),
            "cobooker" => Ok(Self::CoBooker),
            "dictator" => Ok(Self::Dictator),
            other => Err(DomainError::parse(format!("Unknown control level: {other}"))),
        }
    }
}

/// Owner-imposed limits applied when the AI books a show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoBookingConstraints {
    pub require_main_event: bool,
    pub max_segments: usize,
    /// Advisory floor; a short card is logged, not padded.
    pub min_segments: usize,
    pub banned_workers: Vec<WorkerId>,
    /// Workers the owner wants on the card; strongly preferred during filler selection.
    pub required_workers: Vec<WorkerId>,
    pub forbid_injured_workers: bool,
    pub max_fatigue_level: i32,
    pub forbid_multiple_appearances: bool,
    pub prioritize_active_storylines: bool,
    pub use_titles: bool,
    /// Target card length in minutes; falls back to the show's running time.
    pub target_duration: Option<u32>,
}

impl Default for AutoBookingConstraints {
    fn default() -> Self {
        Self {
            require_main_event: true,
            max_segments: 8,
            min_segments: 4,
            banned_workers: Vec::new(),
            required_workers: Vec::new(),
            forbid_injured_workers: true,
            max_fatigue_level: 80,
            forbid_multiple_appearances: true,
            prioritize_active_storylines: true,
            use_titles: true,
            target_duration: None,
        }
    }
}

impl AutoBookingConstraints {
    pub fn with_banned(mut self, workers: impl IntoIterator<Item = WorkerId>) -> Self {
        self.banned_workers.extend(workers);
        self
    }

    pub fn with_required(mut self, workers: impl IntoIterator<Item = WorkerId>) -> Self {
        self.required_workers.extend(workers);
        self
    }

    pub fn with_max_segments(mut self, max_segments: usize) -> Self {
        self.max_segments = max_segments;
        self
    }

    pub fn with_target_duration(mut self, minutes: u32) -> Self {
        self.target_duration = Some(minutes);
        self
    }

    pub fn without_main_event(mut self) -> Self {
        self.require_main_event = false;
        self
    }

    pub fn is_banned(&self, worker: WorkerId) -> bool {
        self.banned_workers.contains(&worker)
    }

    pub fn is_required(&self, worker: WorkerId) -> bool {
        self.required_workers.contains(&worker)
    }
}

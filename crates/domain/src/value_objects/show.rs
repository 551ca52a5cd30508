//! Read-only roster and show projections supplied by the show/roster subsystem.
//!
//! The booking core consumes these records but never mutates them.

use serde::{Deserialize, Serialize};

use crate::ids::{CompanyId, ShowId, StorylineId, TitleId, WorkerId};
use crate::value_objects::SegmentDefinition;

/// Snapshot of a wrestler's current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    pub id: WorkerId,
    pub name: String,
    pub in_ring: i32,
    pub entertainment: i32,
    pub story: i32,
    pub popularity: i32,
    pub momentum: i32,
    pub fatigue: i32,
    /// Description of the current injury, if any
    pub injury: Option<String>,
    pub tv_role: Option<String>,
}

impl WorkerSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: WorkerId::new(),
            name: name.into(),
            in_ring: 50,
            entertainment: 50,
            story: 50,
            popularity: 50,
            momentum: 0,
            fatigue: 0,
            injury: None,
            tv_role: None,
        }
    }

    pub fn with_popularity(mut self, popularity: i32) -> Self {
        self.popularity = popularity;
        self
    }

    /// Set all three skill axes to the same value.
    pub fn with_skill(mut self, skill: i32) -> Self {
        self.in_ring = skill;
        self.entertainment = skill;
        self.story = skill;
        self
    }

    pub fn with_fatigue(mut self, fatigue: i32) -> Self {
        self.fatigue = fatigue;
        self
    }

    pub fn with_injury(mut self, injury: impl Into<String>) -> Self {
        self.injury = Some(injury.into());
        self
    }

    /// Mean of in-ring, entertainment and story ability.
    pub fn skill(&self) -> i32 {
        (self.in_ring + self.entertainment + self.story) / 3
    }

    pub fn is_injured(&self) -> bool {
        self.injury
            .as_deref()
            .is_some_and(|injury| !injury.trim().is_empty())
    }
}

/// A championship and its current holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleInfo {
    pub id: TitleId,
    pub name: String,
    pub prestige: i32,
    pub holder: Option<WorkerId>,
}

/// An ongoing storyline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorylineInfo {
    pub id: StorylineId,
    pub name: String,
    /// Narrative momentum, 0-100
    pub heat: i32,
    pub participants: Vec<WorkerId>,
    pub active: bool,
}

/// Static description of a show being booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowDefinition {
    pub id: ShowId,
    pub company_id: CompanyId,
    pub name: String,
    pub week: u32,
    pub region: String,
    pub duration_minutes: u32,
    /// How big the show is for the company, 0-100
    pub importance: i32,
}

/// Everything the booker can see when building a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowContext {
    pub show: ShowDefinition,
    pub workers: Vec<WorkerSnapshot>,
    pub titles: Vec<TitleInfo>,
    pub storylines: Vec<StorylineInfo>,
    /// Segments already on the card when the context was captured
    pub segments: Vec<SegmentDefinition>,
}

impl ShowContext {
    pub fn worker(&self, id: WorkerId) -> Option<&WorkerSnapshot> {
        self.workers.iter().find(|w| w.id == id)
    }

    /// Most prestigious title held by any of the given workers.
    pub fn best_title_held_by(&self, workers: &[WorkerId]) -> Option<&TitleInfo> {
        self.titles
            .iter()
            .filter(|t| t.holder.is_some_and(|h| workers.contains(&h)))
            .max_by_key(|t| t.prestige)
    }

    /// Active storylines ordered by heat, hottest first.
    pub fn active_storylines_by_heat(&self) -> Vec<&StorylineInfo> {
        let mut storylines: Vec<_> = self.storylines.iter().filter(|s| s.active).collect();
        storylines.sort_by(|a, b| b.heat.cmp(&a.heat));
        storylines
    }
}

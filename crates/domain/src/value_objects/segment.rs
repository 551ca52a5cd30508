use serde::{Deserialize, Serialize};

use crate::ids::{SegmentId, StorylineId, TitleId, WorkerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Match,
    Promo,
}

/// One slot on a show card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDefinition {
    pub id: SegmentId,
    pub kind: SegmentKind,
    pub participants: Vec<WorkerId>,
    pub duration_minutes: u32,
    pub main_event: bool,
    pub storyline_id: Option<StorylineId>,
    pub title_id: Option<TitleId>,
    pub intensity: i32,
    pub winner: Option<WorkerId>,
    pub loser: Option<WorkerId>,
}

impl SegmentDefinition {
    pub fn new(kind: SegmentKind, participants: Vec<WorkerId>, duration_minutes: u32) -> Self {
        Self {
            id: SegmentId::new(),
            kind,
            participants,
            duration_minutes,
            main_event: false,
            storyline_id: None,
            title_id: None,
            intensity: 50,
            winner: None,
            loser: None,
        }
    }

    pub fn as_main_event(mut self) -> Self {
        self.main_event = true;
        self
    }

    pub fn with_storyline(mut self, storyline_id: StorylineId) -> Self {
        self.storyline_id = Some(storyline_id);
        self
    }

    pub fn with_title(mut self, title_id: TitleId) -> Self {
        self.title_id = Some(title_id);
        self
    }

    pub fn with_intensity(mut self, intensity: i32) -> Self {
        self.intensity = intensity.clamp(0, 100);
        self
    }

    pub fn involves(&self, worker: WorkerId) -> bool {
        self.participants.contains(&worker)
    }

    /// Segments the player owns under co-booking: the main event and title bouts.
    pub fn is_headline(&self) -> bool {
        self.main_event || self.title_id.is_some()
    }
}

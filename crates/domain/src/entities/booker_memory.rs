//! Booker memories - remembered outcomes that bias future booking decisions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_range, DomainError};
use crate::ids::{BookerId, MemoryId, WorkerId};

/// Recall strength at or above which a memory counts as strong.
pub const STRONG_RECALL: i32 = 70;
/// Memories whose recall falls below this are forgotten.
pub const WEAK_MEMORY_THRESHOLD: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryEvent {
    GoodMatch,
    BadMatch,
    WorkerComplaint,
    FanReaction,
    OwnerFeedback,
    ChampionshipDecision,
    PushSuccess,
    PushFailure,
}

impl MemoryEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryEvent::GoodMatch => "good_match",
            MemoryEvent::BadMatch => "bad_match",
            MemoryEvent::WorkerComplaint => "worker_complaint",
            MemoryEvent::FanReaction => "fan_reaction",
            MemoryEvent::OwnerFeedback => "owner_feedback",
            MemoryEvent::ChampionshipDecision => "championship_decision",
            MemoryEvent::PushSuccess => "push_success",
            MemoryEvent::PushFailure => "push_failure",
        }
    }

    pub fn is_push(&self) -> bool {
        matches!(self, MemoryEvent::PushSuccess | MemoryEvent::PushFailure)
    }
}

impl fmt::Display for MemoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryEvent {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good_match" => Ok(MemoryEvent::GoodMatch),
            "bad_match" => Ok(MemoryEvent::BadMatch),
            "worker_complaint" => Ok(MemoryEvent::WorkerComplaint),
            "fan_reaction" => Ok(MemoryEvent::FanReaction),
            "owner_feedback" => Ok(MemoryEvent::OwnerFeedback),
            "championship_decision" => Ok(MemoryEvent::ChampionshipDecision),
            "push_success" => Ok(MemoryEvent::PushSuccess),
            "push_failure" => Ok(MemoryEvent::PushFailure),
            other => Err(DomainError::parse(format!("Unknown memory event: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MemoryIntensity {
    Minor,
    Light,
    Moderate,
    Intense,
    VeryIntense,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookerMemory {
    pub id: MemoryId,
    pub booker_id: BookerId,
    pub event: MemoryEvent,
    pub description: String,
    /// Workers this memory is about
    pub workers: Vec<WorkerId>,
    /// -100 (disaster) to 100 (triumph)
    pub impact_score: i32,
    /// 0-100, decays weekly
    pub recall_strength: i32,
    pub created_at: DateTime<Utc>,
}

impl BookerMemory {
    pub fn new(
        booker_id: BookerId,
        event: MemoryEvent,
        description: impl Into<String>,
        impact_score: i32,
        recall_strength: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MemoryId::new(),
            booker_id,
            event,
            description: description.into(),
            workers: Vec::new(),
            impact_score: impact_score.clamp(-100, 100),
            recall_strength: recall_strength.clamp(0, 100),
            created_at,
        }
    }

    pub fn about(mut self, workers: impl IntoIterator<Item = WorkerId>) -> Self {
        self.workers.extend(workers);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let len = self.description.chars().count();
        if self.description.trim().is_empty() || len > 500 {
            return Err(DomainError::validation(
                "Memory description must be between 1 and 500 characters",
            ));
        }
        ensure_range("impact_score", self.impact_score, -100, 100)?;
        ensure_range("recall_strength", self.recall_strength, 0, 100)?;
        Ok(())
    }

    pub fn concerns(&self, worker: WorkerId) -> bool {
        self.workers.contains(&worker)
    }

    pub fn is_positive(&self) -> bool {
        self.impact_score > 0
    }

    pub fn is_negative(&self) -> bool {
        self.impact_score < 0
    }

    pub fn is_strong(&self) -> bool {
        self.recall_strength >= STRONG_RECALL
    }

    pub fn is_weak(&self) -> bool {
        self.recall_strength < WEAK_MEMORY_THRESHOLD
    }

    /// Fade the memory by one point per week. Never increases recall.
    pub fn apply_decay(&self, weeks_passed: u32) -> Self {
        let weeks = i32::try_from(weeks_passed).unwrap_or(i32::MAX);
        Self {
            recall_strength: self.recall_strength.saturating_sub(weeks).max(0),
            ..self.clone()
        }
    }

    pub fn reinforce(&self, strength_bonus: i32) -> Self {
        Self {
            recall_strength: (self.recall_strength + strength_bonus.max(0)).min(100),
            ..self.clone()
        }
    }

    /// |impact| scaled by how well the memory is remembered.
    pub fn influence_weight(&self) -> f64 {
        f64::from(self.impact_score.abs()) * f64::from(self.recall_strength) / 100.0
    }

    pub fn intensity(&self) -> MemoryIntensity {
        match self.impact_score.abs() {
            80.. => MemoryIntensity::VeryIntense,
            60..=79 => MemoryIntensity::Intense,
            40..=59 => MemoryIntensity::Moderate,
            20..=39 => MemoryIntensity::Light,
            _ => MemoryIntensity::Minor,
        }
    }
}

/// Average impact of the memories concerning `worker`, if any exist.
pub fn average_impact_for<'a>(
    memories: impl IntoIterator<Item = &'a BookerMemory>,
    worker: WorkerId,
) -> Option<f64> {
    let (sum, count) = memories
        .into_iter()
        .filter(|m| m.concerns(worker))
        .fold((0i64, 0i64), |(sum, count), m| {
            (sum + i64::from(m.impact_score), count + 1)
        });
    (count > 0).then(|| sum as f64 / count as f64)
}

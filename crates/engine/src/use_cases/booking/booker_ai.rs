//! Booker AI - decisions driven by a booker's profile and memory log.
//!
//! Every operation loads the booker fresh from the repository. A missing or
//! ineligible booker yields the neutral answer (`None`, `false`, `0`, empty)
//! rather than an error; repository failures propagate.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use ringside_domain::{
    average_impact_for, Booker, BookerId, BookerMemory, MemoryEvent, WorkerId,
    WEAK_MEMORY_THRESHOLD,
};

use crate::infrastructure::ports::{BookerRepo, ClockPort, RandomPort};

use super::error::BookingError;

/// Memories younger than this many weeks always count as influential.
const RECENT_MEMORY_WEEKS: i64 = 12;
const MAX_INFLUENTIAL_MEMORIES: usize = 10;
/// Quality at or above which a match is remembered as good.
const GOOD_MATCH_QUALITY: i32 = 70;
const BAD_MATCH_QUALITY: i32 = 40;
/// Average push-memory impact that overrides preference rules.
const PUSH_MEMORY_OVERRIDE: f64 = 50.0;

pub struct BookerAi {
    booker_repo: Arc<dyn BookerRepo>,
    random: Arc<dyn RandomPort>,
    clock: Arc<dyn ClockPort>,
}

impl BookerAi {
    pub fn new(
        booker_repo: Arc<dyn BookerRepo>,
        random: Arc<dyn RandomPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            booker_repo,
            random,
            clock,
        }
    }

    /// Pick the two headliners for a show, best first.
    pub async fn propose_main_event(
        &self,
        booker_id: BookerId,
        available_workers: &[WorkerId],
        show_importance: i32,
    ) -> Result<Option<(WorkerId, WorkerId)>, BookingError> {
        let mut seen = HashSet::new();
        let candidates: Vec<WorkerId> = available_workers
            .iter()
            .copied()
            .filter(|w| seen.insert(*w))
            .collect();
        if candidates.len() < 2 {
            return Ok(None);
        }

        let Some(booker) = self.eligible_booker(booker_id).await? else {
            return Ok(None);
        };
        let memories = self.influential_memories(booker_id).await?;

        let mut scored: Vec<(WorkerId, i32)> = candidates
            .into_iter()
            .map(|w| {
                let score = self.main_event_score(&booker, w, &memories, show_importance);
                (w, score)
            })
            .collect();
        // Stable: ties keep input order
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        tracing::debug!(
            booker_id = %booker_id,
            top_score = scored[0].1,
            runner_up_score = scored[1].1,
            "Scored main event candidates"
        );
        Ok(Some((scored[0].0, scored[1].0)))
    }

    /// Blend technical rating and crowd reaction into a 0-100 quality score.
    pub async fn evaluate_match_quality(
        &self,
        booker_id: BookerId,
        match_rating: i32,
        fan_reaction: i32,
        worker1: WorkerId,
        worker2: WorkerId,
    ) -> Result<i32, BookingError> {
        let Some(booker) = self.booker_repo.get(booker_id).await? else {
            return Ok(0);
        };

        // Integer halving matches how reactions are bucketed elsewhere
        let normalized_reaction = (fan_reaction + 100) / 2;
        // 60/40 blend, truncated
        let mut quality = (match_rating * 6 + normalized_reaction * 4) / 10;
        if booker.is_creative() && match_rating >= 85 {
            quality += 5;
        }
        if booker.is_logical() && fan_reaction >= 60 {
            quality += 5;
        }
        let quality = quality.clamp(0, 100);
        tracing::debug!(
            booker_id = %booker_id,
            worker1 = %worker1,
            worker2 = %worker2,
            match_rating,
            fan_reaction,
            quality,
            "Evaluated match"
        );
        Ok(quality)
    }

    /// Record a match as a memory. Returns the saved memory, or `None` when
    /// the booker does not exist. A blank description is replaced by one
    /// naming the quality.
    pub async fn create_memory_from_match(
        &self,
        booker_id: BookerId,
        match_quality: i32,
        description: &str,
        workers: &[WorkerId],
    ) -> Result<Option<BookerMemory>, BookingError> {
        let Some(booker) = self.booker_repo.get(booker_id).await? else {
            tracing::warn!(booker_id = %booker_id, "Booker not found, match not remembered");
            return Ok(None);
        };

        let event = if match_quality <= BAD_MATCH_QUALITY {
            MemoryEvent::BadMatch
        } else {
            MemoryEvent::GoodMatch
        };
        let impact = if match_quality >= GOOD_MATCH_QUALITY {
            match_quality
        } else {
            -(100 - match_quality)
        };
        let recall = (50 + booker.logic_score / 2).clamp(0, 100);
        let description = match description.trim() {
            "" => format!("Match rated {match_quality}"),
            given => given.to_string(),
        };

        let memory = BookerMemory::new(
            booker_id,
            event,
            description,
            impact,
            recall,
            self.clock.now(),
        )
        .about(workers.iter().copied());
        memory.validate()?;

        self.booker_repo.save_memory(&memory).await?;
        tracing::info!(
            booker_id = %booker_id,
            memory_id = %memory.id,
            event = %memory.event,
            impact = memory.impact_score,
            "Stored match memory"
        );
        Ok(Some(memory))
    }

    /// Whether the booker wants to put this worker over.
    pub async fn should_push_worker(
        &self,
        booker_id: BookerId,
        worker_id: WorkerId,
        worker_popularity: i32,
        worker_skill: i32,
    ) -> Result<bool, BookingError> {
        let Some(booker) = self.booker_repo.get(booker_id).await? else {
            return Ok(false);
        };

        let underdog = booker.likes_underdog && worker_popularity < 40;
        let veteran = booker.likes_veteran && worker_skill >= 75;
        let fast_rise = booker.likes_fast_rise && worker_skill >= 60 && worker_popularity < 50;
        let mut push = underdog || veteran || fast_rise;

        let memories = self.booker_repo.list_memories(booker_id).await?;
        let push_memories = memories.iter().filter(|m| m.event.is_push());
        if let Some(avg) = average_impact_for(push_memories, worker_id) {
            if avg > PUSH_MEMORY_OVERRIDE {
                push = true;
            } else if avg < -PUSH_MEMORY_OVERRIDE {
                push = false;
            }
        }
        Ok(push)
    }

    /// Fade every memory by `weeks_passed`, then forget the weak ones.
    /// Returns how many memories remain.
    pub async fn apply_memory_decay(
        &self,
        booker_id: BookerId,
        weeks_passed: u32,
    ) -> Result<usize, BookingError> {
        let memories = self.booker_repo.list_memories(booker_id).await?;
        for memory in &memories {
            let decayed = memory.apply_decay(weeks_passed);
            if decayed.recall_strength != memory.recall_strength {
                self.booker_repo.update_memory(&decayed).await?;
            }
        }

        let purged = self
            .booker_repo
            .delete_weak_memories(booker_id, WEAK_MEMORY_THRESHOLD)
            .await?;
        let remaining = self.booker_repo.count_memories(booker_id).await?;
        if purged > 0 {
            tracing::info!(booker_id = %booker_id, purged, remaining, "Forgot weak memories");
        }
        Ok(remaining)
    }

    /// Strong memories plus those from the last twelve weeks, heaviest first.
    pub async fn influential_memories(
        &self,
        booker_id: BookerId,
    ) -> Result<Vec<BookerMemory>, BookingError> {
        let strong = self.booker_repo.strong_memories(booker_id).await?;
        let since = self.clock.now() - Duration::weeks(RECENT_MEMORY_WEEKS);
        let recent = self.booker_repo.recent_memories(booker_id, since).await?;

        let mut seen = HashSet::new();
        let mut influential: Vec<BookerMemory> = strong
            .into_iter()
            .chain(recent)
            .filter(|m| seen.insert(m.id))
            .collect();
        influential.sort_by(|a, b| b.influence_weight().total_cmp(&a.influence_weight()));
        influential.truncate(MAX_INFLUENTIAL_MEMORIES);
        Ok(influential)
    }

    /// How predictable the booker's results have been, 0-100.
    pub async fn booker_consistency(&self, booker_id: BookerId) -> Result<i32, BookingError> {
        let Some(booker) = self.booker_repo.get(booker_id).await? else {
            return Ok(0);
        };
        let memories = self.booker_repo.list_memories(booker_id).await?;
        if memories.is_empty() {
            return Ok(booker.consistency_score());
        }

        let n = memories.len() as f64;
        let mean = memories.iter().map(|m| f64::from(m.impact_score)).sum::<f64>() / n;
        let variance = memories
            .iter()
            .map(|m| (f64::from(m.impact_score) - mean).powi(2))
            .sum::<f64>()
            / n;
        let from_memories = (100 - (variance.sqrt() / 2.0) as i32).clamp(0, 100);

        Ok((from_memories + booker.consistency_score()) / 2)
    }

    pub(super) async fn eligible_booker(
        &self,
        booker_id: BookerId,
    ) -> Result<Option<Booker>, BookingError> {
        let booker = self.booker_repo.get(booker_id).await?;
        match booker {
            Some(b) if b.can_auto_book() => Ok(Some(b)),
            Some(_) => {
                tracing::debug!(booker_id = %booker_id, "Booker cannot auto-book");
                Ok(None)
            }
            None => {
                tracing::warn!(booker_id = %booker_id, "Booker not found");
                Ok(None)
            }
        }
    }

    /// Creative bookers are less predictable.
    pub(super) fn creativity_jitter(&self, booker: &Booker) -> i32 {
        if booker.is_creative() {
            self.random.gen_range(-10, 19)
        } else {
            0
        }
    }

    fn main_event_score(
        &self,
        booker: &Booker,
        worker: WorkerId,
        memories: &[BookerMemory],
        show_importance: i32,
    ) -> i32 {
        let mut score = 50 + self.creativity_jitter(booker);
        if booker.is_logical() {
            score += 10;
        }
        if let Some(avg) = average_impact_for(memories, worker) {
            score += (avg / 10.0) as i32;
        }
        if show_importance >= 70 && booker.likes_veteran {
            score += 15;
        }
        score.clamp(0, 100)
    }
}

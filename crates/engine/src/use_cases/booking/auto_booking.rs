//! Automatic card generation.
//!
//! Cards are built in three passes over a shared candidate pool: the main
//! event, storyline segments, then filler until the clock or the segment cap
//! runs out.

use std::collections::HashSet;

use ringside_domain::{
    average_impact_for, AutoBookingConstraints, Booker, BookerId, BookerMemory, ProductType,
    SegmentDefinition, SegmentKind, ShowContext, WorkerId, WorkerSnapshot,
};

use super::booker_ai::BookerAi;
use super::error::BookingError;

const MAIN_EVENT_MIN_MINUTES: u32 = 20;
const STORYLINE_MIN_MINUTES: u32 = 10;
const FILLER_MIN_MINUTES: u32 = 5;
const MAX_STORYLINE_SEGMENTS: usize = 3;
const PREFERENCE_BONUS: i32 = 15;
const REQUIRED_WORKER_BONUS: i32 = 50;

impl BookerAi {
    /// Book a show around `existing`. Returns the existing segments followed
    /// by the generated ones, or an empty card when the booker cannot book.
    pub async fn generate_auto_booking(
        &self,
        booker_id: BookerId,
        show: &ShowContext,
        existing: &[SegmentDefinition],
        constraints: &AutoBookingConstraints,
    ) -> Result<Vec<SegmentDefinition>, BookingError> {
        let Some(booker) = self.eligible_booker(booker_id).await? else {
            return Ok(Vec::new());
        };
        let memories = self.influential_memories(booker_id).await?;

        let mut card = CardBuilder::new(show, existing, constraints);
        let has_main_event = existing.iter().any(|s| s.main_event);

        if constraints.require_main_event && !has_main_event {
            card.book_main_event(&booker);
        }
        if constraints.prioritize_active_storylines {
            card.book_storylines(&booker);
        }
        card.book_filler(booker.preferred_product, |candidate, required| {
            self.filler_score(&booker, &memories, candidate, required)
        });

        let generated = card.segments.len() - existing.len();
        if card.segments.len() < constraints.min_segments {
            tracing::warn!(
                booker_id = %booker_id,
                show = %show.show.name,
                segments = card.segments.len(),
                min_segments = constraints.min_segments,
                "Auto-booked card is shorter than requested"
            );
        }
        tracing::info!(
            booker_id = %booker_id,
            show = %show.show.name,
            generated,
            minutes_left = card.remaining,
            "Auto-booked show"
        );
        Ok(card.segments)
    }

    fn filler_score(
        &self,
        booker: &Booker,
        memories: &[BookerMemory],
        worker: &WorkerSnapshot,
        required: bool,
    ) -> i32 {
        let popularity = worker.popularity;
        let skill = worker.skill();
        let mut score = (popularity + skill) / 2;

        let preferences = [
            booker.likes_underdog && popularity < 40,
            booker.likes_veteran && skill >= 75,
            booker.likes_fast_rise && skill >= 60 && popularity < 50,
            booker.likes_slow_burn && skill >= 60 && worker.momentum <= 10,
        ];
        score += PREFERENCE_BONUS * preferences.iter().filter(|hit| **hit).count() as i32;

        if let Some(avg) = average_impact_for(memories, worker.id) {
            score += (avg / 10.0) as i32;
        }
        score += self.creativity_jitter(booker);
        if required {
            score += REQUIRED_WORKER_BONUS;
        }
        score
    }
}

/// Working state while a card is assembled.
struct CardBuilder<'a> {
    show: &'a ShowContext,
    constraints: &'a AutoBookingConstraints,
    /// Candidates still bookable, in roster order
    pool: Vec<&'a WorkerSnapshot>,
    segments: Vec<SegmentDefinition>,
    remaining: u32,
}

impl<'a> CardBuilder<'a> {
    fn new(
        show: &'a ShowContext,
        existing: &[SegmentDefinition],
        constraints: &'a AutoBookingConstraints,
    ) -> Self {
        let already_booked: HashSet<WorkerId> = existing
            .iter()
            .flat_map(|s| s.participants.iter().copied())
            .collect();

        let pool = show
            .workers
            .iter()
            .filter(|w| !constraints.is_banned(w.id))
            .filter(|w| !(constraints.forbid_injured_workers && w.is_injured()))
            .filter(|w| w.fatigue <= constraints.max_fatigue_level)
            .filter(|w| {
                !(constraints.forbid_multiple_appearances && already_booked.contains(&w.id))
            })
            .collect();

        let target = constraints
            .target_duration
            .unwrap_or(show.show.duration_minutes);
        let booked: u32 = existing.iter().map(|s| s.duration_minutes).sum();

        Self {
            show,
            constraints,
            pool,
            segments: existing.to_vec(),
            remaining: target.saturating_sub(booked),
        }
    }

    fn has_room(&self) -> bool {
        self.segments.len() < self.constraints.max_segments
    }

    fn in_pool(&self, worker: WorkerId) -> bool {
        self.pool.iter().any(|w| w.id == worker)
    }

    fn accept(&mut self, segment: SegmentDefinition) {
        self.remaining = self.remaining.saturating_sub(segment.duration_minutes);
        if self.constraints.forbid_multiple_appearances {
            self.pool.retain(|w| !segment.involves(w.id));
        }
        self.segments.push(segment);
    }

    fn book_main_event(&mut self, booker: &Booker) {
        if self.remaining < MAIN_EVENT_MIN_MINUTES || self.pool.len() < 2 || !self.has_room() {
            return;
        }

        let mut by_popularity = self.pool.clone();
        by_popularity.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        let participants = vec![by_popularity[0].id, by_popularity[1].id];

        let (minutes, intensity) = booker.preferred_product.main_event_profile();
        let mut segment =
            SegmentDefinition::new(SegmentKind::Match, participants, minutes.min(self.remaining))
                .as_main_event()
                .with_intensity(intensity);
        if self.constraints.use_titles {
            if let Some(title) = self.show.best_title_held_by(&segment.participants) {
                segment = segment.with_title(title.id);
            }
        }

        tracing::debug!(
            participants = ?segment.participants,
            minutes = segment.duration_minutes,
            title = ?segment.title_id,
            "Booked main event"
        );
        self.accept(segment);
    }

    fn book_storylines(&mut self, booker: &Booker) {
        let show = self.show;
        let mut built = 0;
        for storyline in show.active_storylines_by_heat() {
            if built >= MAX_STORYLINE_SEGMENTS
                || self.remaining < STORYLINE_MIN_MINUTES
                || !self.has_room()
            {
                break;
            }

            let participants: Vec<WorkerId> = storyline
                .participants
                .iter()
                .copied()
                .filter(|w| self.in_pool(*w))
                .take(2)
                .collect();
            if participants.is_empty() {
                continue;
            }

            let kind = if booker.preferred_product.favors_promos() || participants.len() == 1 {
                SegmentKind::Promo
            } else {
                SegmentKind::Match
            };
            let heat = storyline.heat.clamp(0, 100);
            let minutes = (STORYLINE_MIN_MINUTES + (heat / 20) as u32).min(self.remaining);

            let segment = SegmentDefinition::new(kind, participants, minutes)
                .with_storyline(storyline.id)
                .with_intensity(heat);
            tracing::debug!(storyline = %storyline.name, ?kind, minutes, "Booked storyline segment");
            self.accept(segment);
            built += 1;
        }
    }

    fn book_filler(
        &mut self,
        product: ProductType,
        mut score: impl FnMut(&WorkerSnapshot, bool) -> i32,
    ) {
        let product_minutes = product.filler_minutes();
        let favors_promos = product.favors_promos();
        let mut filler_count = 0usize;

        while self.has_room() && self.remaining >= FILLER_MIN_MINUTES && !self.pool.is_empty() {
            let mut ranked: Vec<(WorkerId, i32)> = self
                .pool
                .iter()
                .map(|w| (w.id, score(w, self.constraints.is_required(w.id))))
                .collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1));

            let promo = ranked.len() == 1 || (favors_promos && filler_count % 2 == 1);
            let (kind, take) = if promo {
                (SegmentKind::Promo, 1)
            } else {
                (SegmentKind::Match, 2)
            };
            let participants = ranked.iter().take(take).map(|(id, _)| *id).collect();
            let minutes = product_minutes.min(self.remaining).max(FILLER_MIN_MINUTES);

            self.accept(SegmentDefinition::new(kind, participants, minutes));
            filler_count += 1;
        }
    }
}

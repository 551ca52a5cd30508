//! Booking control - how much of a show the player hands to the AI booker.

use std::sync::Arc;

use ringside_domain::{
    AutoBookingConstraints, BookerId, BookingControlLevel, SegmentDefinition, ShowContext,
};

use super::booker_ai::BookerAi;
use super::error::BookingError;

/// Fewest segments the AI may add around a player-booked headline.
const CO_BOOKER_MIN_SEGMENTS: usize = 4;

pub struct BookingControl {
    booker_ai: Arc<BookerAi>,
}

impl BookingControl {
    pub fn new(booker_ai: Arc<BookerAi>) -> Self {
        Self { booker_ai }
    }

    pub async fn generate_show(
        &self,
        level: BookingControlLevel,
        booker_id: BookerId,
        show: &ShowContext,
        existing: &[SegmentDefinition],
        constraints: &AutoBookingConstraints,
    ) -> Result<Vec<SegmentDefinition>, BookingError> {
        tracing::debug!(?level, booker_id = %booker_id, show = %show.show.name, "Generating show");
        match level {
            BookingControlLevel::Spectator | BookingControlLevel::Producer => {
                self.booker_ai
                    .generate_auto_booking(booker_id, show, existing, constraints)
                    .await
            }
            BookingControlLevel::CoBooker => {
                self.co_book(booker_id, show, existing, constraints).await
            }
            BookingControlLevel::Dictator => Ok(existing.to_vec()),
        }
    }

    /// The player owns the main event and title bouts; the AI books the rest.
    async fn co_book(
        &self,
        booker_id: BookerId,
        show: &ShowContext,
        existing: &[SegmentDefinition],
        constraints: &AutoBookingConstraints,
    ) -> Result<Vec<SegmentDefinition>, BookingError> {
        let (headline, midcard): (Vec<_>, Vec<_>) =
            existing.iter().cloned().partition(|s| s.is_headline());
        if headline.is_empty() {
            return self
                .booker_ai
                .generate_auto_booking(booker_id, show, existing, constraints)
                .await;
        }

        let mut midcard_constraints = constraints.clone();
        midcard_constraints.require_main_event = false;
        midcard_constraints.max_segments = constraints
            .max_segments
            .saturating_sub(headline.len())
            .max(CO_BOOKER_MIN_SEGMENTS);

        let headline_minutes: u32 = headline.iter().map(|s| s.duration_minutes).sum();
        let target = constraints
            .target_duration
            .unwrap_or(show.show.duration_minutes);
        midcard_constraints.target_duration = Some(target.saturating_sub(headline_minutes));
        if constraints.forbid_multiple_appearances {
            midcard_constraints
                .banned_workers
                .extend(headline.iter().flat_map(|s| s.participants.iter().copied()));
        }

        let midcard = self
            .booker_ai
            .generate_auto_booking(booker_id, show, &midcard, &midcard_constraints)
            .await?;
        tracing::info!(
            booker_id = %booker_id,
            headline = headline.len(),
            midcard = midcard.len(),
            "Co-booked show around player headline"
        );

        Ok(headline.into_iter().chain(midcard).collect())
    }
}

#[cfg(test)]
mod tests {
    use ringside_domain::{SegmentKind, WorkerId};

    use super::*;
    use crate::infrastructure::clock::{FixedClock, FixedRandom};
    use crate::infrastructure::ports::MockBookerRepo;
    use crate::use_cases::booking::test_support::{booker_ai, now, plain_booker, show, worker};

    #[tokio::test]
    async fn dictator_keeps_the_player_card() {
        // Untouched repository: no expectations set
        let ai = BookerAi::new(
            Arc::new(MockBookerRepo::new()),
            Arc::new(FixedRandom(0)),
            Arc::new(FixedClock(now())),
        );
        let control = BookingControl::new(Arc::new(ai));
        let existing = vec![SegmentDefinition::new(
            SegmentKind::Promo,
            vec![WorkerId::new()],
            8,
        )];

        let card = control
            .generate_show(
                BookingControlLevel::Dictator,
                BookerId::new(),
                &show(Vec::new()),
                &existing,
                &AutoBookingConstraints::default(),
            )
            .await
            .unwrap();
        assert_eq!(card, existing);
    }

    #[tokio::test]
    async fn spectator_and_producer_match_auto_booking() {
        let booker = plain_booker();
        let ai = Arc::new(booker_ai(&booker).await);
        let control = BookingControl::new(ai.clone());
        let ctx = show((0..6).map(|i| worker(&format!("W{i}"), 40 + i * 10)).collect());
        let constraints = AutoBookingConstraints::default();

        let direct = ai
            .generate_auto_booking(booker.id, &ctx, &[], &constraints)
            .await
            .unwrap();
        for level in [BookingControlLevel::Spectator, BookingControlLevel::Producer] {
            let card = control
                .generate_show(level, booker.id, &ctx, &[], &constraints)
                .await
                .unwrap();
            let shape = |c: &[SegmentDefinition]| {
                c.iter()
                    .map(|s| (s.kind, s.participants.clone(), s.duration_minutes, s.main_event))
                    .collect::<Vec<_>>()
            };
            assert_eq!(shape(&card), shape(&direct));
        }
    }

    #[tokio::test]
    async fn co_booker_fills_around_player_headline() {
        let booker = plain_booker();
        let control = BookingControl::new(Arc::new(booker_ai(&booker).await));
        let workers: Vec<_> = (0..10).map(|i| worker(&format!("W{i}"), 50 + i)).collect();
        let (champ, challenger) = (workers[9].id, workers[8].id);
        let ctx = show(workers);
        let player_midcard = SegmentDefinition::new(SegmentKind::Promo, vec![champ], 5);
        let player_main =
            SegmentDefinition::new(SegmentKind::Match, vec![champ, challenger], 30).as_main_event();
        let existing = vec![player_midcard.clone(), player_main.clone()];

        let card = control
            .generate_show(
                BookingControlLevel::CoBooker,
                booker.id,
                &ctx,
                &existing,
                &AutoBookingConstraints::default().with_max_segments(6),
            )
            .await
            .unwrap();

        assert_eq!(card[0], player_main);
        assert_eq!(card[1], player_midcard);
        assert_eq!(card.iter().filter(|s| s.main_event).count(), 1);
        // Headline talent is not reused by the AI
        assert!(card[2..]
            .iter()
            .all(|s| !s.involves(champ) && !s.involves(challenger)));
        // max(4, 6 - 1) segments on the AI side, including the player's midcard
        assert_eq!(card.len(), 1 + 5);
        let minutes: u32 = card.iter().map(|s| s.duration_minutes).sum();
        assert!(minutes <= ctx.show.duration_minutes);
    }

    #[tokio::test]
    async fn co_booker_without_headline_books_like_spectator() {
        let booker = plain_booker();
        let control = BookingControl::new(Arc::new(booker_ai(&booker).await));
        let ctx = show((0..4).map(|i| worker(&format!("W{i}"), 60 + i)).collect());

        let card = control
            .generate_show(
                BookingControlLevel::CoBooker,
                booker.id,
                &ctx,
                &[],
                &AutoBookingConstraints::default(),
            )
            .await
            .unwrap();
        assert!(card[0].main_event);
    }
}

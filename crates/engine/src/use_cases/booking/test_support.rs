//! Shared fixtures for booking tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use ringside_domain::{
    Booker, CompanyId, ShowContext, ShowDefinition, ShowId, StorylineId, StorylineInfo, TitleId,
    TitleInfo, WorkerId, WorkerSnapshot,
};

use super::BookerAi;
use crate::infrastructure::clock::{FixedClock, FixedRandom};
use crate::infrastructure::memory::InMemoryBookerRepo;
use crate::infrastructure::ports::BookerRepo;

pub fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

pub fn worker(name: &str, popularity: i32) -> WorkerSnapshot {
    WorkerSnapshot::new(name).with_popularity(popularity)
}

pub fn show(workers: Vec<WorkerSnapshot>) -> ShowContext {
    ShowContext {
        show: ShowDefinition {
            id: ShowId::new(),
            company_id: CompanyId::new(),
            name: "Monday Brawl".to_string(),
            week: 12,
            region: "Midwest".to_string(),
            duration_minutes: 120,
            importance: 50,
        },
        workers,
        titles: Vec::new(),
        storylines: Vec::new(),
        segments: Vec::new(),
    }
}

pub fn title(name: &str, prestige: i32, holder: WorkerId) -> TitleInfo {
    TitleInfo {
        id: TitleId::new(),
        name: name.to_string(),
        prestige,
        holder: Some(holder),
    }
}

pub fn storyline(heat: i32, participants: Vec<WorkerId>) -> StorylineInfo {
    StorylineInfo {
        id: StorylineId::new(),
        name: format!("Feud at heat {heat}"),
        heat,
        participants,
        active: true,
    }
}

/// Booker AI over an in-memory repository holding `booker`.
pub async fn booker_ai(booker: &Booker) -> BookerAi {
    let repo = Arc::new(InMemoryBookerRepo::new());
    repo.save(booker).await.unwrap();
    BookerAi::new(repo, Arc::new(FixedRandom(0)), Arc::new(FixedClock(now())))
}

pub fn plain_booker() -> Booker {
    Booker::new(CompanyId::new(), "Paul", 50, 50, now())
}

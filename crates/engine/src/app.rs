//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    clock::{SeededRandom, SystemClock, SystemRandom},
    config::EngineConfig,
    memory::{InMemoryBookerRepo, InMemoryCrisisRepo},
    ports::{BookerRepo, ClockPort, CrisisRepo, RandomPort, RepoError},
    sqlite::{self, SqliteBookerRepo, SqliteCrisisRepo},
};
use crate::use_cases::{
    BookerAi, BookingControl, CommunicationEngine, CrisisEngine, WeeklyUpdate,
};

/// Main application state.
///
/// Every use case shares the same repositories, random source and clock.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
}

pub struct Repositories {
    pub booker: Arc<dyn BookerRepo>,
    pub crisis: Arc<dyn CrisisRepo>,
}

pub struct UseCases {
    pub booker_ai: Arc<BookerAi>,
    pub booking_control: BookingControl,
    pub crisis: Arc<CrisisEngine>,
    pub communication: CommunicationEngine,
    pub weekly: WeeklyUpdate,
}

impl App {
    pub fn new(
        booker_repo: Arc<dyn BookerRepo>,
        crisis_repo: Arc<dyn CrisisRepo>,
        random: Arc<dyn RandomPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let booker_ai = Arc::new(BookerAi::new(
            booker_repo.clone(),
            random.clone(),
            clock.clone(),
        ));
        let crisis = Arc::new(CrisisEngine::new(
            crisis_repo.clone(),
            random.clone(),
            clock.clone(),
        ));
        let communication = CommunicationEngine::new(crisis_repo.clone(), random, clock);
        let weekly = WeeklyUpdate::new(booker_repo.clone(), booker_ai.clone(), crisis.clone());

        let use_cases = UseCases {
            booking_control: BookingControl::new(booker_ai.clone()),
            booker_ai,
            crisis,
            communication,
            weekly,
        };

        Self {
            repositories: Repositories {
                booker: booker_repo,
                crisis: crisis_repo,
            },
            use_cases,
        }
    }

    /// Wire the application from configuration: SQLite or in-memory storage,
    /// seeded or thread-local randomness, and the system clock.
    pub async fn from_config(config: &EngineConfig) -> Result<Self, RepoError> {
        let random: Arc<dyn RandomPort> = match config.seed {
            Some(seed) => {
                tracing::info!(seed, "Using seeded random source");
                Arc::new(SeededRandom::new(seed))
            }
            None => Arc::new(SystemRandom::new()),
        };
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

        if config.uses_memory_store() {
            tracing::info!("Using in-memory store");
            return Ok(Self::new(
                Arc::new(InMemoryBookerRepo::new()),
                Arc::new(InMemoryCrisisRepo::new()),
                random,
                clock,
            ));
        }

        tracing::info!(path = %config.db_path, "Opening SQLite store");
        let pool = sqlite::connect(&config.db_path).await?;
        Ok(Self::new(
            Arc::new(SqliteBookerRepo::new(pool.clone())),
            Arc::new(SqliteCrisisRepo::new(pool)),
            random,
            clock,
        ))
    }
}

#[cfg(test)]
mod tests {
    use ringside_domain::{Booker, CompanyId};

    use super::*;
    use crate::infrastructure::config::IN_MEMORY_DB;
    use crate::use_cases::weekly::LockerRoomConditions;

    fn config(db_path: String) -> EngineConfig {
        EngineConfig {
            db_path,
            seed: Some(7),
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn memory_store_runs_a_week() {
        let app = App::from_config(&config(IN_MEMORY_DB.to_string()))
            .await
            .unwrap();
        let company = CompanyId::new();
        let booker = Booker::new(company, "Paul", 60, 60, chrono::Utc::now());
        app.repositories.booker.save(&booker).await.unwrap();

        let report = app
            .use_cases
            .weekly
            .run(company, LockerRoomConditions::default())
            .await
            .unwrap();
        assert_eq!(report.crises_progressed, 0);
        assert_eq!(report.memories_remaining, 0);
    }

    #[tokio::test]
    async fn sqlite_store_persists_between_apps() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ringside.db").display().to_string();
        let company = CompanyId::new();

        let crisis = {
            let app = App::from_config(&config(path.clone())).await.unwrap();
            app.use_cases
                .crisis
                .create_crisis(company, "a budget shortfall", 3)
                .await
                .unwrap()
        };

        let reopened = App::from_config(&config(path)).await.unwrap();
        let active = reopened.use_cases.crisis.active_crises(company).await.unwrap();
        assert_eq!(active, vec![crisis]);
    }
}

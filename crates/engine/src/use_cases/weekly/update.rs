//! Weekly update: crisis progression, crisis triggering and memory decay.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ringside_domain::{CompanyId, Crisis, CrisisStage};

use crate::infrastructure::ports::BookerRepo;
use crate::use_cases::booking::BookerAi;
use crate::use_cases::crisis::CrisisEngine;

use super::error::WeeklyError;

/// Morale assumed when only a rumor count is supplied.
const NEUTRAL_MORALE: i32 = 70;

/// Locker-room readings fed to crisis triggering. With neither value set
/// no new crisis is rolled for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockerRoomConditions {
    pub morale: Option<i32>,
    pub rumors: Option<u32>,
}

impl LockerRoomConditions {
    pub fn is_known(&self) -> bool {
        self.morale.is_some() || self.rumors.is_some()
    }
}

/// What happened during one weekly update.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReport {
    pub company_id: CompanyId,
    pub crises_progressed: usize,
    pub crises_escalated: usize,
    pub crises_ignored: usize,
    pub crisis_triggered: Option<Crisis>,
    /// Summed morale hit of the crises still active after the update
    pub morale_impact: i32,
    pub memories_remaining: usize,
}

impl fmt::Display for WeeklyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} crises progressed ({} escalated, {} fizzled), morale impact {}, {} memories kept",
            self.crises_progressed,
            self.crises_escalated,
            self.crises_ignored,
            self.morale_impact,
            self.memories_remaining
        )?;
        if let Some(crisis) = &self.crisis_triggered {
            write!(f, ", new crisis: {}", crisis.kind())?;
        }
        Ok(())
    }
}

pub struct WeeklyUpdate {
    booker_repo: Arc<dyn BookerRepo>,
    booker_ai: Arc<BookerAi>,
    crisis_engine: Arc<CrisisEngine>,
}

impl WeeklyUpdate {
    pub fn new(
        booker_repo: Arc<dyn BookerRepo>,
        booker_ai: Arc<BookerAi>,
        crisis_engine: Arc<CrisisEngine>,
    ) -> Self {
        Self {
            booker_repo,
            booker_ai,
            crisis_engine,
        }
    }

    pub async fn run(
        &self,
        company_id: CompanyId,
        conditions: LockerRoomConditions,
    ) -> Result<WeeklyReport, WeeklyError> {
        let stages_before: HashMap<_, _> = self
            .crisis_engine
            .active_crises(company_id)
            .await?
            .iter()
            .map(|c| (c.id(), c.stage()))
            .collect();

        let progressed = self.crisis_engine.progress_crises(company_id).await?;
        let crises_ignored = progressed
            .iter()
            .filter(|c| c.stage() == CrisisStage::Ignored)
            .count();
        let crises_escalated = progressed
            .iter()
            .filter(|c| c.is_active() && stages_before.get(&c.id()) != Some(&c.stage()))
            .count();

        let crisis_triggered = self.maybe_trigger(company_id, conditions).await?;

        let morale_impact = self
            .crisis_engine
            .active_crises(company_id)
            .await?
            .iter()
            .map(|c| self.crisis_engine.morale_impact(c))
            .sum();

        let mut memories_remaining = 0;
        for booker in self.booker_repo.list_for_company(company_id).await? {
            memories_remaining += self.booker_ai.apply_memory_decay(booker.id, 1).await?;
        }

        let report = WeeklyReport {
            company_id,
            crises_progressed: progressed.len(),
            crises_escalated,
            crises_ignored,
            crisis_triggered,
            morale_impact,
            memories_remaining,
        };
        tracing::info!(company_id = %company_id, %report, "Weekly update complete");
        Ok(report)
    }

    async fn maybe_trigger(
        &self,
        company_id: CompanyId,
        conditions: LockerRoomConditions,
    ) -> Result<Option<Crisis>, WeeklyError> {
        if !conditions.is_known() {
            return Ok(None);
        }
        let morale = conditions.morale.unwrap_or(NEUTRAL_MORALE);
        let rumors = conditions.rumors.unwrap_or(0);
        if !self
            .crisis_engine
            .should_trigger_crisis(company_id, morale, rumors)
        {
            return Ok(None);
        }

        let (reason, severity) = if morale < 30 {
            ("collapsing locker room morale".to_string(), 4)
        } else if morale < 50 {
            (format!("low morale and {rumors} active rumors"), 3)
        } else {
            (format!("{rumors} backstage rumors"), 2)
        };
        let crisis = self
            .crisis_engine
            .create_crisis(company_id, &reason, severity)
            .await?;
        Ok(Some(crisis))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use ringside_domain::{Booker, BookerMemory, CrisisKind, MemoryEvent};

    use super::*;
    use crate::infrastructure::clock::{FixedClock, FixedRandom, ScriptedRandom};
    use crate::infrastructure::memory::{InMemoryBookerRepo, InMemoryCrisisRepo};
    use crate::infrastructure::ports::{CrisisRepo, RandomPort};

    fn now() -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    struct Harness {
        bookers: Arc<InMemoryBookerRepo>,
        crises: Arc<InMemoryCrisisRepo>,
        update: WeeklyUpdate,
    }

    fn harness(random: impl RandomPort + 'static) -> Harness {
        let bookers = Arc::new(InMemoryBookerRepo::new());
        let crises = Arc::new(InMemoryCrisisRepo::new());
        let random: Arc<dyn RandomPort> = Arc::new(random);
        let clock = Arc::new(FixedClock(now()));
        let booker_ai = Arc::new(BookerAi::new(bookers.clone(), random.clone(), clock.clone()));
        let crisis_engine = Arc::new(CrisisEngine::new(crises.clone(), random, clock));
        Harness {
            update: WeeklyUpdate::new(bookers.clone(), booker_ai, crisis_engine),
            bookers,
            crises,
        }
    }

    fn grievance(company: CompanyId, stage: CrisisStage, escalation: i32) -> Crisis {
        Crisis::new(company, CrisisKind::WorkerGrievance, 2, "Pay dispute", now())
            .with_progress(stage, escalation, 0, None)
    }

    #[tokio::test]
    async fn week_progresses_crises_and_fades_memories() {
        let h = harness(FixedRandom(10));
        let company = CompanyId::new();
        h.crises
            .save(&grievance(company, CrisisStage::WeakSignals, 30))
            .await
            .unwrap();
        let booker = Booker::new(company, "Paul", 50, 50, now());
        h.bookers.save(&booker).await.unwrap();
        for recall in [10, 50] {
            let memory =
                BookerMemory::new(booker.id, MemoryEvent::GoodMatch, "Solid opener", 40, recall, now());
            h.bookers.save_memory(&memory).await.unwrap();
        }

        let report = h
            .update
            .run(company, LockerRoomConditions::default())
            .await
            .unwrap();

        assert_eq!(report.crises_progressed, 1);
        assert_eq!(report.crises_escalated, 1);
        assert_eq!(report.crises_ignored, 0);
        assert!(report.crisis_triggered.is_none());
        assert_eq!(report.memories_remaining, 1);
        // Severity 2 at Rumors: -10
        assert_eq!(report.morale_impact, -10);
    }

    #[tokio::test]
    async fn bad_morale_triggers_a_crisis() {
        let h = harness(FixedRandom(0));
        let company = CompanyId::new();

        let report = h
            .update
            .run(
                company,
                LockerRoomConditions {
                    morale: Some(20),
                    rumors: None,
                },
            )
            .await
            .unwrap();

        let crisis = report.crisis_triggered.unwrap();
        assert_eq!(crisis.kind(), CrisisKind::MoraleCollapse);
        assert_eq!(crisis.severity(), 4);
        assert_eq!(h.crises.list_active(company).await.unwrap().len(), 1);
        assert_eq!(report.crises_progressed, 0);
    }

    #[tokio::test]
    async fn fizzled_crises_are_counted() {
        // Escalation draw 10, then an ignore roll of 0
        let h = harness(ScriptedRandom::new([10, 0]));
        let company = CompanyId::new();
        h.crises
            .save(&grievance(company, CrisisStage::WeakSignals, 0))
            .await
            .unwrap();

        let report = h
            .update
            .run(company, LockerRoomConditions::default())
            .await
            .unwrap();

        assert_eq!(report.crises_ignored, 1);
        assert_eq!(report.crises_escalated, 0);
        assert_eq!(report.morale_impact, 0);
        assert!(report.to_string().contains("1 fizzled"));
    }
}

//! Crisis engine - detection, weekly escalation and resolution of backstage crises.

use std::sync::Arc;

use ringside_domain::{CompanyId, Crisis, CrisisId, CrisisKind, CrisisStage, CrisisUpdate};

use crate::infrastructure::ports::{ClockPort, CrisisRepo, RandomPort};

use super::error::CrisisError;

/// Weekly natural escalation bounds (inclusive).
const WEEKLY_ESCALATION: (i32, i32) = (10, 25);
/// Escalation relief after a failed resolution attempt (inclusive).
const FAILED_ATTEMPT_RELIEF: (i32, i32) = (10, 20);
const MIN_RESOLUTION_CHANCE: i32 = 10;
const MAX_RESOLUTION_CHANCE: i32 = 90;

pub struct CrisisEngine {
    crisis_repo: Arc<dyn CrisisRepo>,
    random: Arc<dyn RandomPort>,
    clock: Arc<dyn ClockPort>,
}

impl CrisisEngine {
    pub fn new(
        crisis_repo: Arc<dyn CrisisRepo>,
        random: Arc<dyn RandomPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            crisis_repo,
            random,
            clock,
        }
    }

    /// Roll whether locker-room conditions boil over into a new crisis.
    pub fn should_trigger_crisis(
        &self,
        company_id: CompanyId,
        morale: i32,
        active_rumors: u32,
    ) -> bool {
        let chance = if morale < 30 {
            80
        } else if morale < 50 && active_rumors >= 3 {
            50
        } else if active_rumors >= 5 {
            40
        } else {
            return false;
        };

        let triggered = self.random.roll_percent(chance);
        tracing::debug!(
            company_id = %company_id,
            morale,
            active_rumors,
            chance,
            triggered,
            "Rolled crisis trigger"
        );
        triggered
    }

    /// Open a new crisis in the weak-signals stage and persist it.
    pub async fn create_crisis(
        &self,
        company_id: CompanyId,
        trigger_reason: &str,
        severity: i32,
    ) -> Result<Crisis, CrisisError> {
        let kind = infer_kind(trigger_reason, severity);
        let crisis = Crisis::new(
            company_id,
            kind,
            severity,
            describe(kind, trigger_reason),
            self.clock.now(),
        );
        self.crisis_repo.save(&crisis).await?;

        tracing::info!(
            company_id = %company_id,
            crisis_id = %crisis.id(),
            kind = kind.as_str(),
            severity = crisis.severity(),
            "Crisis opened"
        );
        Ok(crisis)
    }

    /// Advance every active crisis by one week. Returns the crises as saved.
    pub async fn progress_crises(&self, company_id: CompanyId) -> Result<Vec<Crisis>, CrisisError> {
        let active = self.crisis_repo.list_active(company_id).await?;
        let mut progressed = Vec::with_capacity(active.len());

        for mut crisis in active {
            let (min, max) = WEEKLY_ESCALATION;
            crisis.increase_escalation(self.random.gen_range(min, max));

            let crossed = crisis
                .stage()
                .escalation_threshold()
                .is_some_and(|threshold| crisis.escalation_score() >= threshold);
            if crossed {
                if let CrisisUpdate::Escalated { from, to, .. } = crisis.escalate() {
                    tracing::info!(
                        crisis_id = %crisis.id(),
                        from = from.as_str(),
                        to = to.as_str(),
                        escalation = crisis.escalation_score(),
                        "Crisis escalated"
                    );
                }
            }

            if self.should_ignore_crisis(&crisis) {
                crisis.ignore(self.clock.now());
                tracing::info!(crisis_id = %crisis.id(), "Crisis fizzled out");
            }

            self.crisis_repo.save(&crisis).await?;
            progressed.push(crisis);
        }

        Ok(progressed)
    }

    /// Push a crisis to its next stage. `None` when missing or already closed.
    pub async fn escalate_crisis(&self, crisis_id: CrisisId) -> Result<Option<Crisis>, CrisisError> {
        let Some(mut crisis) = self.active_crisis(crisis_id).await? else {
            return Ok(None);
        };
        crisis.escalate();
        self.crisis_repo.save(&crisis).await?;
        Ok(Some(crisis))
    }

    /// Try to settle a crisis. Returns whether the attempt succeeded.
    pub async fn attempt_resolution(
        &self,
        crisis_id: CrisisId,
        intervention_quality: i32,
    ) -> Result<bool, CrisisError> {
        let Some(mut crisis) = self.active_crisis(crisis_id).await? else {
            return Ok(false);
        };

        // Chance uses the attempts made before this one
        let chance = resolution_chance(&crisis, intervention_quality);
        crisis.record_resolution_attempt();

        let success = self.random.roll_percent(chance);
        if success {
            crisis.resolve(self.clock.now());
        } else {
            let (min, max) = FAILED_ATTEMPT_RELIEF;
            crisis.decrease_escalation(self.random.gen_range(min, max));
        }
        self.crisis_repo.save(&crisis).await?;

        tracing::info!(
            crisis_id = %crisis_id,
            chance,
            success,
            attempts = crisis.resolution_attempts(),
            "Resolution attempted"
        );
        Ok(success)
    }

    /// Morale hit a crisis inflicts on the locker room, in [-50, 0].
    pub fn morale_impact(&self, crisis: &Crisis) -> i32 {
        let multiplier = match crisis.stage() {
            CrisisStage::WeakSignals => 0.5,
            CrisisStage::Rumors => 1.0,
            CrisisStage::Declared => 1.5,
            CrisisStage::InResolution => 1.2,
            CrisisStage::Resolved | CrisisStage::Ignored => 0.0,
        };
        let mut impact = (f64::from(crisis.severity() * -5) * multiplier) as i32;
        if crisis.escalation_score() >= 80 {
            impact -= 10;
        }
        impact.clamp(-50, 0)
    }

    /// Low-escalation crises sometimes die out on their own.
    pub fn should_ignore_crisis(&self, crisis: &Crisis) -> bool {
        let escalation = crisis.escalation_score();
        match crisis.stage() {
            CrisisStage::WeakSignals if escalation < 15 => self.random.roll_percent(30),
            CrisisStage::Rumors if escalation < 25 => self.random.roll_percent(20),
            _ => false,
        }
    }

    pub async fn active_crises(&self, company_id: CompanyId) -> Result<Vec<Crisis>, CrisisError> {
        Ok(self.crisis_repo.list_active(company_id).await?)
    }

    pub async fn critical_crises(&self, company_id: CompanyId) -> Result<Vec<Crisis>, CrisisError> {
        Ok(self.crisis_repo.list_critical(company_id).await?)
    }

    async fn active_crisis(&self, crisis_id: CrisisId) -> Result<Option<Crisis>, CrisisError> {
        match self.crisis_repo.get(crisis_id).await? {
            Some(crisis) if crisis.is_active() => Ok(Some(crisis)),
            Some(_) => {
                tracing::debug!(crisis_id = %crisis_id, "Crisis already closed");
                Ok(None)
            }
            None => {
                tracing::warn!(crisis_id = %crisis_id, "Crisis not found");
                Ok(None)
            }
        }
    }
}

/// Success chance for a resolution attempt, before it is recorded.
pub fn resolution_chance(crisis: &Crisis, intervention_quality: i32) -> i32 {
    let attempts = i32::try_from(crisis.resolution_attempts()).unwrap_or(i32::MAX);
    intervention_quality
        .saturating_sub(crisis.severity() * 10)
        .saturating_sub(attempts.saturating_mul(5))
        .clamp(MIN_RESOLUTION_CHANCE, MAX_RESOLUTION_CHANCE)
}

fn infer_kind(trigger_reason: &str, severity: i32) -> CrisisKind {
    let reason = trigger_reason.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| reason.contains(w));

    if mentions(&["morale"]) {
        CrisisKind::MoraleCollapse
    } else if mentions(&["rumor", "rumour"]) {
        CrisisKind::RumorEscalation
    } else if mentions(&["grievance", "complaint"]) {
        CrisisKind::WorkerGrievance
    } else if mentions(&["public", "scandal"]) {
        CrisisKind::PublicScandal
    } else if mentions(&["financial", "budget"]) {
        CrisisKind::FinancialCrisis
    } else if mentions(&["exodus", "resign"]) {
        CrisisKind::TalentExodus
    } else if severity >= 4 {
        CrisisKind::MoraleCollapse
    } else {
        CrisisKind::WorkerGrievance
    }
}

fn describe(kind: CrisisKind, trigger_reason: &str) -> String {
    match kind {
        CrisisKind::MoraleCollapse => {
            format!("Backstage morale is collapsing after {trigger_reason}.")
        }
        CrisisKind::RumorEscalation => format!("Rumors are spreading out of control: {trigger_reason}."),
        CrisisKind::WorkerGrievance => format!("Workers have filed formal complaints: {trigger_reason}."),
        CrisisKind::PublicScandal => format!("A public scandal has broken: {trigger_reason}."),
        CrisisKind::FinancialCrisis => {
            format!("A financial crisis threatens the company: {trigger_reason}.")
        }
        CrisisKind::TalentExodus => format!("Key talent is threatening to leave: {trigger_reason}."),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::infrastructure::clock::{FixedClock, FixedRandom, ScriptedRandom};
    use crate::infrastructure::memory::InMemoryCrisisRepo;
    use crate::infrastructure::ports::{MockCrisisRepo, MockRandomPort, RepoError};

    fn now() -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn engine(repo: Arc<dyn CrisisRepo>, random: impl RandomPort + 'static) -> CrisisEngine {
        CrisisEngine::new(repo, Arc::new(random), Arc::new(FixedClock(now())))
    }

    fn crisis(company: CompanyId, severity: i32) -> Crisis {
        Crisis::new(company, CrisisKind::WorkerGrievance, severity, "Pay dispute", now())
    }

    async fn stored(repo: &InMemoryCrisisRepo, crisis: Crisis) -> Crisis {
        repo.save(&crisis).await.unwrap();
        crisis
    }

    #[test]
    fn trigger_thresholds() {
        let company = CompanyId::new();
        let e = |roll| engine(Arc::new(InMemoryCrisisRepo::new()), FixedRandom(roll));

        assert!(e(79).should_trigger_crisis(company, 20, 0));
        assert!(!e(80).should_trigger_crisis(company, 20, 0));
        assert!(e(49).should_trigger_crisis(company, 45, 3));
        assert!(!e(49).should_trigger_crisis(company, 45, 2));
        assert!(e(39).should_trigger_crisis(company, 90, 5));
        assert!(!e(40).should_trigger_crisis(company, 90, 5));
    }

    #[test]
    fn calm_locker_room_never_rolls() {
        let mut random = MockRandomPort::new();
        random.expect_gen_range().never();
        random.expect_roll_percent().never();
        let e = engine(Arc::new(InMemoryCrisisRepo::new()), random);

        assert!(!e.should_trigger_crisis(CompanyId::new(), 75, 4));
    }

    #[tokio::test]
    async fn created_crisis_starts_weak_and_is_persisted() {
        let repo = Arc::new(InMemoryCrisisRepo::new());
        let e = engine(repo.clone(), FixedRandom(0));
        let company = CompanyId::new();

        let crisis = e.create_crisis(company, "a budget shortfall", 9).await.unwrap();
        assert_eq!(crisis.kind(), CrisisKind::FinancialCrisis);
        assert_eq!(crisis.stage(), CrisisStage::WeakSignals);
        assert_eq!(crisis.severity(), 5);
        assert_eq!(crisis.escalation_score(), 10);
        assert!(crisis.description().contains("a budget shortfall"));
        assert_eq!(repo.get(crisis.id()).await.unwrap(), Some(crisis));
    }

    #[test]
    fn kind_follows_trigger_keywords() {
        assert_eq!(infer_kind("Low MORALE", 1), CrisisKind::MoraleCollapse);
        assert_eq!(infer_kind("rumor mill", 1), CrisisKind::RumorEscalation);
        assert_eq!(infer_kind("complaint about pay", 1), CrisisKind::WorkerGrievance);
        assert_eq!(infer_kind("tabloid scandal", 1), CrisisKind::PublicScandal);
        assert_eq!(infer_kind("financial trouble", 1), CrisisKind::FinancialCrisis);
        assert_eq!(infer_kind("stars resign", 1), CrisisKind::TalentExodus);
        assert_eq!(infer_kind("unknown", 4), CrisisKind::MoraleCollapse);
        assert_eq!(infer_kind("unknown", 3), CrisisKind::WorkerGrievance);
    }

    #[tokio::test]
    async fn severe_crisis_progresses_one_week() {
        let repo = Arc::new(InMemoryCrisisRepo::new());
        let company = CompanyId::new();
        let c = stored(&repo, crisis(company, 5)).await;
        let e = engine(repo.clone(), FixedRandom(25));

        let progressed = e.progress_crises(company).await.unwrap();
        assert_eq!(progressed.len(), 1);
        assert_eq!(progressed[0].escalation_score(), 35);
        assert_eq!(progressed[0].stage(), CrisisStage::WeakSignals);
        assert_eq!(repo.get(c.id()).await.unwrap().unwrap().escalation_score(), 35);
    }

    #[tokio::test]
    async fn crossing_threshold_moves_to_rumors() {
        let repo = Arc::new(InMemoryCrisisRepo::new());
        let company = CompanyId::new();
        let c = crisis(company, 2).with_progress(CrisisStage::WeakSignals, 30, 0, None);
        stored(&repo, c).await;
        let e = engine(repo, FixedRandom(10));

        let progressed = e.progress_crises(company).await.unwrap();
        assert_eq!(progressed[0].stage(), CrisisStage::Rumors);
        assert_eq!(progressed[0].escalation_score(), 60);
    }

    #[tokio::test]
    async fn quiet_crisis_can_fizzle_out() {
        let repo = Arc::new(InMemoryCrisisRepo::new());
        let company = CompanyId::new();
        let c = crisis(company, 1).with_progress(CrisisStage::WeakSignals, 0, 0, None);
        let c = stored(&repo, c).await;
        let e = engine(repo.clone(), ScriptedRandom::new([10, 29]));

        let progressed = e.progress_crises(company).await.unwrap();
        assert_eq!(progressed[0].stage(), CrisisStage::Ignored);
        assert!(e.active_crises(company).await.unwrap().is_empty());
        assert!(repo.get(c.id()).await.unwrap().unwrap().resolved_at().is_some());
    }

    #[tokio::test]
    async fn escalate_skips_missing_and_closed() {
        let repo = Arc::new(InMemoryCrisisRepo::new());
        let company = CompanyId::new();
        let open = stored(&repo, crisis(company, 3)).await;
        let mut closed = crisis(company, 3);
        closed.resolve(now());
        let closed = stored(&repo, closed).await;
        let e = engine(repo.clone(), FixedRandom(0));

        let escalated = e.escalate_crisis(open.id()).await.unwrap().unwrap();
        assert_eq!(escalated.stage(), CrisisStage::Rumors);
        assert_eq!(escalated.escalation_score(), 30);
        assert_eq!(repo.get(open.id()).await.unwrap(), Some(escalated));
        assert!(e.escalate_crisis(closed.id()).await.unwrap().is_none());
        assert!(e.escalate_crisis(CrisisId::new()).await.unwrap().is_none());
    }

    #[test]
    fn resolution_chance_bounds() {
        let company = CompanyId::new();
        assert_eq!(resolution_chance(&crisis(company, 1), 100), 90);
        assert_eq!(resolution_chance(&crisis(company, 5), 10), 10);
        let tired = crisis(company, 2).with_progress(CrisisStage::Declared, 50, 3, None);
        assert_eq!(resolution_chance(&tired, 70), 35);
    }

    #[tokio::test]
    async fn successful_resolution_closes_crisis() {
        let repo = Arc::new(InMemoryCrisisRepo::new());
        let company = CompanyId::new();
        let c = stored(&repo, crisis(company, 1)).await;
        let e = engine(repo.clone(), FixedRandom(89));

        assert!(e.attempt_resolution(c.id(), 100).await.unwrap());
        let saved = repo.get(c.id()).await.unwrap().unwrap();
        assert_eq!(saved.stage(), CrisisStage::Resolved);
        assert_eq!(saved.resolution_attempts(), 1);
        assert!(!e.attempt_resolution(c.id(), 100).await.unwrap());
    }

    #[tokio::test]
    async fn failed_resolution_relieves_escalation() {
        let repo = Arc::new(InMemoryCrisisRepo::new());
        let company = CompanyId::new();
        let c = crisis(company, 3).with_progress(CrisisStage::Declared, 70, 0, None);
        let c = stored(&repo, c).await;
        // Chance 50 - 30 = 20; roll 20 fails, relief 15
        let e = engine(repo.clone(), ScriptedRandom::new([20, 15]));

        assert!(!e.attempt_resolution(c.id(), 50).await.unwrap());
        let saved = repo.get(c.id()).await.unwrap().unwrap();
        assert_eq!(saved.stage(), CrisisStage::Declared);
        assert_eq!(saved.escalation_score(), 55);
        assert_eq!(saved.resolution_attempts(), 1);
    }

    #[test]
    fn morale_impact_stays_in_bounds() {
        let e = engine(Arc::new(InMemoryCrisisRepo::new()), FixedRandom(0));
        let company = CompanyId::new();

        // -2.5 truncates to -2
        assert_eq!(e.morale_impact(&crisis(company, 1)), -2);
        let boiling = crisis(company, 5).with_progress(CrisisStage::Declared, 90, 0, None);
        assert_eq!(e.morale_impact(&boiling), -47);
        let mut settled = crisis(company, 5);
        settled.resolve(now());
        assert_eq!(e.morale_impact(&settled), 0);

        for stage in [
            CrisisStage::WeakSignals,
            CrisisStage::Rumors,
            CrisisStage::Declared,
            CrisisStage::InResolution,
        ] {
            for severity in 1..=5 {
                let c = crisis(company, severity).with_progress(stage, 100, 0, None);
                assert!((-50..=0).contains(&e.morale_impact(&c)));
            }
        }
    }

    #[tokio::test]
    async fn repository_failures_propagate() {
        let mut repo = MockCrisisRepo::new();
        repo.expect_list_active()
            .returning(|_| Err(RepoError::database("list_active_crises", "disk I/O error")));
        let e = engine(Arc::new(repo), FixedRandom(0));

        let result = e.progress_crises(CompanyId::new()).await;
        assert!(matches!(result, Err(CrisisError::Repo(_))));
    }
}

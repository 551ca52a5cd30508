//! Crisis aggregate - a backstage problem moving through a five-stage pipeline.
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: stage and escalation only change through methods
//! - **Closed stage enum**: `CrisisStage::next()` is the whole transition table
//! - **Terminal is final**: every mutation on a resolved or ignored crisis
//!   returns `CrisisUpdate::Unchanged`

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::events::CrisisUpdate;
use crate::ids::{CompanyId, CrisisId, WorkerId};

pub const MIN_SEVERITY: i32 = 1;
pub const MAX_SEVERITY: i32 = 5;
pub const MAX_ESCALATION: i32 = 100;
/// Escalation a freshly detected crisis starts with.
pub const INITIAL_ESCALATION: i32 = 10;
/// Escalation added by a forced stage advance.
pub const STAGE_ESCALATION_BONUS: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisKind {
    MoraleCollapse,
    RumorEscalation,
    WorkerGrievance,
    PublicScandal,
    FinancialCrisis,
    TalentExodus,
}

impl CrisisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrisisKind::MoraleCollapse => "morale_collapse",
            CrisisKind::RumorEscalation => "rumor_escalation",
            CrisisKind::WorkerGrievance => "worker_grievance",
            CrisisKind::PublicScandal => "public_scandal",
            CrisisKind::FinancialCrisis => "financial_crisis",
            CrisisKind::TalentExodus => "talent_exodus",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CrisisKind::MoraleCollapse => "Morale collapse",
            CrisisKind::RumorEscalation => "Rumor escalation",
            CrisisKind::WorkerGrievance => "Worker grievance",
            CrisisKind::PublicScandal => "Public scandal",
            CrisisKind::FinancialCrisis => "Financial crisis",
            CrisisKind::TalentExodus => "Talent exodus",
        }
    }
}

impl fmt::Display for CrisisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for CrisisKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "morale_collapse" => Ok(CrisisKind::MoraleCollapse),
            "rumor_escalation" => Ok(CrisisKind::RumorEscalation),
            "worker_grievance" => Ok(CrisisKind::WorkerGrievance),
            "public_scandal" => Ok(CrisisKind::PublicScandal),
            "financial_crisis" => Ok(CrisisKind::FinancialCrisis),
            "talent_exodus" => Ok(CrisisKind::TalentExodus),
            other => Err(DomainError::parse(format!("Unknown crisis kind: {other}"))),
        }
    }
}

/// Pipeline stage. `Resolved` and `Ignored` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisStage {
    WeakSignals,
    Rumors,
    Declared,
    InResolution,
    Resolved,
    Ignored,
}

impl CrisisStage {
    /// Successor under escalation. `InResolution` escalates onto itself;
    /// terminal stages have no successor.
    pub fn next(self) -> Option<CrisisStage> {
        match self {
            CrisisStage::WeakSignals => Some(CrisisStage::Rumors),
            CrisisStage::Rumors => Some(CrisisStage::Declared),
            CrisisStage::Declared => Some(CrisisStage::InResolution),
            CrisisStage::InResolution => Some(CrisisStage::InResolution),
            CrisisStage::Resolved | CrisisStage::Ignored => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CrisisStage::Resolved | CrisisStage::Ignored)
    }

    /// Escalation score at which weekly progression pushes the crisis on.
    pub fn escalation_threshold(self) -> Option<i32> {
        match self {
            CrisisStage::WeakSignals => Some(40),
            CrisisStage::Rumors => Some(60),
            CrisisStage::Declared => Some(80),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CrisisStage::WeakSignals => "weak_signals",
            CrisisStage::Rumors => "rumors",
            CrisisStage::Declared => "declared",
            CrisisStage::InResolution => "in_resolution",
            CrisisStage::Resolved => "resolved",
            CrisisStage::Ignored => "ignored",
        }
    }
}

impl fmt::Display for CrisisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CrisisStage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weak_signals" => Ok(CrisisStage::WeakSignals),
            "rumors" => Ok(CrisisStage::Rumors),
            "declared" => Ok(CrisisStage::Declared),
            "in_resolution" => Ok(CrisisStage::InResolution),
            "resolved" => Ok(CrisisStage::Resolved),
            "ignored" => Ok(CrisisStage::Ignored),
            other => Err(DomainError::parse(format!("Unknown crisis stage: {other}"))),
        }
    }
}

/// A backstage crisis.
///
/// # Invariants
///
/// - `severity` is within 1..=5 and never changes after creation
/// - `escalation_score` is within 0..=100
/// - `resolved_at` is set exactly when the stage is terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crisis {
    id: CrisisId,
    company_id: CompanyId,
    kind: CrisisKind,
    stage: CrisisStage,
    severity: i32,
    description: String,
    affected_workers: Vec<WorkerId>,
    escalation_score: i32,
    resolution_attempts: u32,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl Crisis {
    pub fn new(
        company_id: CompanyId,
        kind: CrisisKind,
        severity: i32,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CrisisId::new(),
            company_id,
            kind,
            stage: CrisisStage::WeakSignals,
            severity: severity.clamp(MIN_SEVERITY, MAX_SEVERITY),
            description: description.into(),
            affected_workers: Vec::new(),
            escalation_score: INITIAL_ESCALATION,
            resolution_attempts: 0,
            created_at: now,
            resolved_at: None,
        }
    }

    // =========================================================================
    // Builders (used when loading from storage)
    // =========================================================================

    pub fn with_id(mut self, id: CrisisId) -> Self {
        self.id = id;
        self
    }

    pub fn with_affected_workers(mut self, workers: impl IntoIterator<Item = WorkerId>) -> Self {
        self.affected_workers = workers.into_iter().collect();
        self
    }

    /// Restore persisted progress. Values are clamped into their valid ranges.
    pub fn with_progress(
        mut self,
        stage: CrisisStage,
        escalation_score: i32,
        resolution_attempts: u32,
        resolved_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.stage = stage;
        self.escalation_score = escalation_score.clamp(0, MAX_ESCALATION);
        self.resolution_attempts = resolution_attempts;
        self.resolved_at = if stage.is_terminal() {
            resolved_at.or(Some(self.created_at))
        } else {
            None
        };
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> CrisisId {
        self.id
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn kind(&self) -> CrisisKind {
        self.kind
    }

    pub fn stage(&self) -> CrisisStage {
        self.stage
    }

    pub fn severity(&self) -> i32 {
        self.severity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn affected_workers(&self) -> &[WorkerId] {
        &self.affected_workers
    }

    pub fn escalation_score(&self) -> i32 {
        self.escalation_score
    }

    pub fn resolution_attempts(&self) -> u32 {
        self.resolution_attempts
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_active(&self) -> bool {
        !self.stage.is_terminal()
    }

    pub fn is_critical(&self) -> bool {
        self.severity >= 4 || self.stage == CrisisStage::Declared
    }

    pub fn severity_label(&self) -> &'static str {
        match self.severity {
            1 => "Minor",
            2 => "Moderate",
            3 => "Serious",
            4 => "Severe",
            _ => "Critical",
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Advance one stage and add the stage bonus to escalation.
    pub fn escalate(&mut self) -> CrisisUpdate {
        let Some(next) = self.stage.next() else {
            return CrisisUpdate::Unchanged;
        };
        let from = self.stage;
        self.stage = next;
        self.escalation_score = (self.escalation_score + STAGE_ESCALATION_BONUS).min(MAX_ESCALATION);
        CrisisUpdate::Escalated {
            from,
            to: next,
            escalation_score: self.escalation_score,
        }
    }

    pub fn resolve(&mut self, at: DateTime<Utc>) -> CrisisUpdate {
        if self.close(CrisisStage::Resolved, at) {
            CrisisUpdate::Resolved
        } else {
            CrisisUpdate::Unchanged
        }
    }

    pub fn ignore(&mut self, at: DateTime<Utc>) -> CrisisUpdate {
        if self.close(CrisisStage::Ignored, at) {
            CrisisUpdate::Ignored
        } else {
            CrisisUpdate::Unchanged
        }
    }

    pub fn increase_escalation(&mut self, amount: i32) -> CrisisUpdate {
        self.shift_escalation(amount)
    }

    pub fn decrease_escalation(&mut self, amount: i32) -> CrisisUpdate {
        self.shift_escalation(amount.saturating_neg())
    }

    pub fn record_resolution_attempt(&mut self) -> CrisisUpdate {
        if !self.is_active() {
            return CrisisUpdate::Unchanged;
        }
        self.resolution_attempts += 1;
        CrisisUpdate::AttemptRecorded {
            attempts: self.resolution_attempts,
        }
    }

    fn shift_escalation(&mut self, delta: i32) -> CrisisUpdate {
        if !self.is_active() {
            return CrisisUpdate::Unchanged;
        }
        let from = self.escalation_score;
        self.escalation_score = from.saturating_add(delta).clamp(0, MAX_ESCALATION);
        CrisisUpdate::EscalationChanged {
            from,
            to: self.escalation_score,
        }
    }

    fn close(&mut self, stage: CrisisStage, at: DateTime<Utc>) -> bool {
        if !self.is_active() {
            return false;
        }
        self.stage = stage;
        self.escalation_score = 0;
        self.resolved_at = Some(at);
        true
    }
}

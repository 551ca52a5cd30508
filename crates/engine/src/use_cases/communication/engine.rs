//! Communication engine.
//!
//! A communication is created with a precomputed success chance, then
//! executed once: a single roll decides the outcome, which is stored and
//! pushed back into the crisis it targets.

use std::sync::Arc;

use ringside_domain::{
    Communication, CommunicationId, CommunicationKind, CommunicationOutcome, CompanyId, Crisis,
    CrisisId, CrisisStage, Tone,
};

use crate::infrastructure::ports::{ClockPort, CrisisRepo, RandomPort};

use super::error::CommunicationError;

/// Influence assumed for whoever initiates a communication.
pub const DEFAULT_INITIATOR_INFLUENCE: i32 = 70;
const NEUTRAL_BONUS: i32 = 50;
const MIN_SUCCESS_CHANCE: i32 = 10;
const MAX_SUCCESS_CHANCE: i32 = 95;
/// A successful communication that brings escalation this low ends the crisis.
const RESOLVED_ESCALATION: i32 = 10;

/// Input for a new communication.
#[derive(Debug, Clone)]
pub struct CommunicationRequest {
    pub company_id: CompanyId,
    pub crisis_id: Option<CrisisId>,
    pub kind: CommunicationKind,
    pub initiator_id: String,
    pub target_id: Option<String>,
    pub message: String,
    pub tone: Tone,
}

pub struct CommunicationEngine {
    crisis_repo: Arc<dyn CrisisRepo>,
    random: Arc<dyn RandomPort>,
    clock: Arc<dyn ClockPort>,
}

impl CommunicationEngine {
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

    /// Predicted chance of success, in [10, 95].
    pub fn success_chance(
        &self,
        kind: CommunicationKind,
        tone: Tone,
        crisis: Option<&Crisis>,
        initiator_influence: i32,
    ) -> i32 {
        let mut chance = initiator_influence * 4 / 10
            + type_bonus(kind, crisis) * 3 / 10
            + tone_bonus(tone, crisis) * 3 / 10;

        if let Some(crisis) = crisis {
            if crisis.severity() >= 4 {
                chance -= 15;
            }
            if crisis.escalation_score() >= 80 {
                chance -= 10;
            }
            if matches!(crisis.stage(), CrisisStage::WeakSignals | CrisisStage::Rumors) {
                chance += 10;
            }
        }
        chance.clamp(MIN_SUCCESS_CHANCE, MAX_SUCCESS_CHANCE)
    }

    pub async fn create_communication(
        &self,
        request: CommunicationRequest,
    ) -> Result<Communication, CommunicationError> {
        let crisis = match request.crisis_id {
            Some(id) => self.crisis_repo.get(id).await?,
            None => None,
        };
        let success_chance = self.success_chance(
            request.kind,
            request.tone,
            crisis.as_ref(),
            DEFAULT_INITIATOR_INFLUENCE,
        );

        let communication = Communication {
            id: CommunicationId::new(),
            company_id: request.company_id,
            crisis_id: request.crisis_id,
            kind: request.kind,
            initiator_id: request.initiator_id,
            target_id: request.target_id,
            message: request.message,
            tone: request.tone,
            success_chance,
            created_at: self.clock.now(),
        };
        communication.validate()?;
        self.crisis_repo.save_communication(&communication).await?;

        tracing::info!(
            communication_id = %communication.id,
            crisis_id = ?communication.crisis_id,
            kind = communication.kind.as_str(),
            tone = communication.tone.as_str(),
            success_chance,
            "Communication planned"
        );
        Ok(communication)
    }

    /// Carry out a stored communication.
    ///
    /// A missing communication yields a default failed outcome that is not
    /// persisted. A communication that already ran returns its stored outcome.
    pub async fn execute_communication(
        &self,
        communication_id: CommunicationId,
    ) -> Result<CommunicationOutcome, CommunicationError> {
        let Some(communication) = self.crisis_repo.get_communication(communication_id).await?
        else {
            tracing::warn!(communication_id = %communication_id, "Communication not found");
            return Ok(CommunicationOutcome::failed(communication_id, self.clock.now()));
        };
        if let Some(previous) = self
            .crisis_repo
            .get_outcome_for_communication(communication_id)
            .await?
        {
            tracing::debug!(communication_id = %communication_id, "Communication already executed");
            return Ok(previous);
        }

        let success = self.random.roll_percent(communication.success_chance);
        let outcome = if success {
            CommunicationOutcome::new(
                communication.id,
                true,
                success_morale(communication.kind),
                success_relationship(communication.tone),
                -escalation_relief(&communication),
                success_feedback(communication.kind),
                self.clock.now(),
            )
        } else {
            let (morale, relationship) = failure_penalties(communication.tone);
            let escalation = if communication.tone == Tone::Confrontational {
                20
            } else {
                10
            };
            CommunicationOutcome::new(
                communication.id,
                false,
                -morale,
                -relationship,
                escalation,
                failure_feedback(communication.tone),
                self.clock.now(),
            )
        };

        self.crisis_repo.save_outcome(&outcome).await?;
        tracing::info!(
            communication_id = %communication_id,
            success,
            morale = outcome.morale_impact,
            escalation_change = outcome.escalation_change,
            "Communication executed"
        );

        self.apply_outcome_effects(&outcome, communication.crisis_id)
            .await?;
        Ok(outcome)
    }

    /// Push an outcome's escalation change into its crisis. Returns the
    /// updated crisis, or `None` when there is no active crisis to touch.
    pub async fn apply_outcome_effects(
        &self,
        outcome: &CommunicationOutcome,
        crisis_id: Option<CrisisId>,
    ) -> Result<Option<Crisis>, CommunicationError> {
        let Some(crisis_id) = crisis_id else {
            return Ok(None);
        };
        let Some(mut crisis) = self.crisis_repo.get(crisis_id).await? else {
            return Ok(None);
        };
        if !crisis.is_active() {
            return Ok(None);
        }

        crisis.increase_escalation(outcome.escalation_change);
        if outcome.successful && crisis.escalation_score() <= RESOLVED_ESCALATION {
            crisis.resolve(self.clock.now());
            tracing::info!(crisis_id = %crisis_id, "Crisis talked down");
        }
        self.crisis_repo.save(&crisis).await?;
        Ok(Some(crisis))
    }

    /// Best kind of communication for where the crisis stands.
    pub fn recommend_kind(&self, crisis: &Crisis) -> CommunicationKind {
        match crisis.stage() {
            CrisisStage::Rumors => CommunicationKind::LockerRoomMeeting,
            CrisisStage::Declared if crisis.severity() >= 4 => CommunicationKind::Mediation,
            CrisisStage::Declared => CommunicationKind::LockerRoomMeeting,
            CrisisStage::InResolution => CommunicationKind::PublicStatement,
            _ => CommunicationKind::OneOnOne,
        }
    }

    pub fn recommend_tone(&self, crisis: &Crisis, kind: CommunicationKind) -> Tone {
        if crisis.severity() >= 4 {
            if kind == CommunicationKind::PublicStatement {
                Tone::Apologetic
            } else {
                Tone::Diplomatic
            }
        } else if crisis.escalation_score() >= 70 && kind != CommunicationKind::Mediation {
            Tone::Firm
        } else {
            Tone::Diplomatic
        }
    }

    /// Percentage of the company's executed communications that succeeded.
    pub async fn success_rate(&self, company_id: CompanyId) -> Result<f64, CommunicationError> {
        Ok(self.crisis_repo.communication_success_rate(company_id).await?)
    }
}

fn type_bonus(kind: CommunicationKind, crisis: Option<&Crisis>) -> i32 {
    use CommunicationKind::*;

    let Some(crisis) = crisis else {
        return NEUTRAL_BONUS;
    };
    let appropriate = match crisis.stage() {
        CrisisStage::WeakSignals => kind == OneOnOne,
        CrisisStage::Rumors => matches!(kind, OneOnOne | LockerRoomMeeting),
        CrisisStage::Declared => matches!(kind, LockerRoomMeeting | Mediation),
        CrisisStage::InResolution => matches!(kind, Mediation | PublicStatement),
        CrisisStage::Resolved | CrisisStage::Ignored => false,
    };
    if appropriate {
        80
    } else {
        40
    }
}

fn tone_bonus(tone: Tone, crisis: Option<&Crisis>) -> i32 {
    let Some(crisis) = crisis else {
        return NEUTRAL_BONUS;
    };
    match tone {
        Tone::Diplomatic => 70,
        Tone::Apologetic if crisis.severity() >= 4 => 75,
        Tone::Apologetic => 60,
        Tone::Firm if crisis.severity() <= 2 => 65,
        Tone::Firm => 40,
        Tone::Confrontational => 30,
    }
}

fn success_morale(kind: CommunicationKind) -> i32 {
    match kind {
        CommunicationKind::OneOnOne => 15,
        CommunicationKind::LockerRoomMeeting => 25,
        CommunicationKind::Mediation => 20,
        CommunicationKind::PublicStatement => 30,
    }
}

fn success_relationship(tone: Tone) -> i32 {
    match tone {
        Tone::Diplomatic => 15,
        Tone::Firm => 5,
        Tone::Apologetic => 20,
        Tone::Confrontational => 0,
    }
}

fn escalation_relief(communication: &Communication) -> i32 {
    let base = match communication.kind {
        CommunicationKind::OneOnOne => 15,
        CommunicationKind::LockerRoomMeeting => 25,
        CommunicationKind::Mediation => 35,
        CommunicationKind::PublicStatement => 30,
    };
    if communication.tone.is_conciliatory() {
        base + 10
    } else {
        base
    }
}

/// (morale, relationship) lost when a communication falls flat.
fn failure_penalties(tone: Tone) -> (i32, i32) {
    match tone {
        Tone::Confrontational => (20, 15),
        Tone::Firm => (10, 8),
        Tone::Diplomatic => (5, 3),
        Tone::Apologetic => (3, 2),
    }
}

fn success_feedback(kind: CommunicationKind) -> &'static str {
    match kind {
        CommunicationKind::OneOnOne => "The private talk paid off and things are improving.",
        CommunicationKind::LockerRoomMeeting => "The locker room meeting cleared the air.",
        CommunicationKind::Mediation => "Mediation calmed the tensions.",
        CommunicationKind::PublicStatement => "The public statement was well received.",
    }
}

fn failure_feedback(tone: Tone) -> &'static str {
    match tone {
        Tone::Confrontational => "The confrontational approach made things worse.",
        Tone::Firm => "The firm tone did not go down well.",
        Tone::Diplomatic => "Despite the diplomacy, nobody was convinced.",
        Tone::Apologetic => "The apology was not enough to settle things.",
    }
}

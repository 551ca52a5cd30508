use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CommunicationId, OutcomeId};

/// The single result of executing a communication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationOutcome {
    pub id: OutcomeId,
    pub communication_id: CommunicationId,
    pub successful: bool,
    /// -50..50
    pub morale_impact: i32,
    /// -30..30
    pub relationship_impact: i32,
    /// Signed change applied to the crisis escalation score, -50..50
    pub escalation_change: i32,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CommunicationOutcome {
    pub fn new(
        communication_id: CommunicationId,
        successful: bool,
        morale_impact: i32,
        relationship_impact: i32,
        escalation_change: i32,
        feedback: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OutcomeId::new(),
            communication_id,
            successful,
            morale_impact: morale_impact.clamp(-50, 50),
            relationship_impact: relationship_impact.clamp(-30, 30),
            escalation_change: escalation_change.clamp(-50, 50),
            feedback: Some(feedback.into()),
            created_at,
        }
    }

    /// Fallback result for a communication that could not be carried out.
    pub fn failed(communication_id: CommunicationId, created_at: DateTime<Utc>) -> Self {
        Self::new(
            communication_id,
            false,
            -15,
            -10,
            15,
            "The communication failed.",
            created_at,
        )
    }

    pub fn is_positive(&self) -> bool {
        self.successful
            && self.morale_impact >= 0
            && self.relationship_impact >= 0
            && self.escalation_change <= 0
    }

    pub fn is_negative(&self) -> bool {
        !self.successful
            || self.morale_impact < -20
            || self.relationship_impact < -15
            || self.escalation_change > 20
    }

    /// Weighted 40/30/30 blend of morale, relationships and de-escalation.
    pub fn overall_impact(&self) -> i32 {
        let overall = f64::from(self.morale_impact) * 0.4
            + f64::from(self.relationship_impact) * 0.3
            - f64::from(self.escalation_change) * 0.3;
        (overall as i32).clamp(-100, 100)
    }

    pub fn success_label(&self) -> &'static str {
        if !self.successful {
            return "Failure";
        }
        match self.overall_impact() {
            40.. => "Major success",
            20..=39 => "Success",
            0..=19 => "Modest success",
            _ => "Mixed success",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_failure_is_negative() {
        let outcome = CommunicationOutcome::failed(CommunicationId::new(), Utc::now());
        assert!(!outcome.successful);
        assert!(outcome.is_negative());
        assert_eq!(outcome.escalation_change, 15);
        assert_eq!(outcome.success_label(), "Failure");
    }

    #[test]
    fn overall_impact_rewards_de_escalation() {
        let outcome = CommunicationOutcome::new(
            CommunicationId::new(),
            true,
            30,
            20,
            -45,
            "great",
            Utc::now(),
        );
        // 12 + 6 + 13.5
        assert_eq!(outcome.overall_impact(), 31);
        assert!(outcome.is_positive());
        assert_eq!(outcome.success_label(), "Success");
    }

    #[test]
    fn impacts_are_clamped_to_their_ranges() {
        let outcome = CommunicationOutcome::new(
            CommunicationId::new(),
            true,
            90,
            -90,
            -90,
            "",
            Utc::now(),
        );
        assert_eq!(outcome.morale_impact, 50);
        assert_eq!(outcome.relationship_impact, -30);
        assert_eq!(outcome.escalation_change, -50);
    }
}

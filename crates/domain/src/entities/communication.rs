//! Backstage communications - one attempted intervention on a company's locker room.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_range, DomainError};
use crate::ids::{CommunicationId, CompanyId, CrisisId};

pub const MAX_MESSAGE_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationKind {
    OneOnOne,
    LockerRoomMeeting,
    PublicStatement,
    Mediation,
}

impl CommunicationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommunicationKind::OneOnOne => "one_on_one",
            CommunicationKind::LockerRoomMeeting => "locker_room_meeting",
            CommunicationKind::PublicStatement => "public_statement",
            CommunicationKind::Mediation => "mediation",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CommunicationKind::OneOnOne => "One-on-One",
            CommunicationKind::LockerRoomMeeting => "Locker Room Meeting",
            CommunicationKind::PublicStatement => "Public Statement",
            CommunicationKind::Mediation => "Mediation",
        }
    }

    /// One-on-ones and mediations are aimed at a specific person.
    pub fn requires_target(&self) -> bool {
        matches!(self, CommunicationKind::OneOnOne | CommunicationKind::Mediation)
    }
}

impl fmt::Display for CommunicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for CommunicationKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_on_one" => Ok(CommunicationKind::OneOnOne),
            "locker_room_meeting" => Ok(CommunicationKind::LockerRoomMeeting),
            "public_statement" => Ok(CommunicationKind::PublicStatement),
            "mediation" => Ok(CommunicationKind::Mediation),
            other => Err(DomainError::parse(format!(
                "Unknown communication kind: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Diplomatic,
    Firm,
    Apologetic,
    Confrontational,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Diplomatic => "diplomatic",
            Tone::Firm => "firm",
            Tone::Apologetic => "apologetic",
            Tone::Confrontational => "confrontational",
        }
    }

    pub fn is_conciliatory(&self) -> bool {
        matches!(self, Tone::Diplomatic | Tone::Apologetic)
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tone {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diplomatic" => Ok(Tone::Diplomatic),
            "firm" => Ok(Tone::Firm),
            "apologetic" => Ok(Tone::Apologetic),
            "confrontational" => Ok(Tone::Confrontational),
            other => Err(DomainError::parse(format!("Unknown tone: {other}"))),
        }
    }
}

/// An attempted intervention. Immutable once created; executed exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Communication {
    pub id: CommunicationId,
    pub company_id: CompanyId,
    /// `None` for preventive talks outside any crisis
    pub crisis_id: Option<CrisisId>,
    pub kind: CommunicationKind,
    pub initiator_id: String,
    pub target_id: Option<String>,
    pub message: String,
    pub tone: Tone,
    /// Precomputed chance of success, 0-100
    pub success_chance: i32,
    pub created_at: DateTime<Utc>,
}

impl Communication {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.initiator_id.trim().is_empty() {
            return Err(DomainError::validation("Initiator cannot be empty"));
        }
        let len = self.message.chars().count();
        if self.message.trim().is_empty() || len > MAX_MESSAGE_CHARS {
            return Err(DomainError::validation(format!(
                "Message must be between 1 and {MAX_MESSAGE_CHARS} characters"
            )));
        }
        if self.kind.requires_target() && !self.is_targeted() {
            return Err(DomainError::validation(format!(
                "{} requires a target",
                self.kind
            )));
        }
        ensure_range("success_chance", self.success_chance, 0, 100)?;
        Ok(())
    }

    pub fn is_preventive(&self) -> bool {
        self.crisis_id.is_none()
    }

    pub fn is_targeted(&self) -> bool {
        self.target_id
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn communication(kind: CommunicationKind, target: Option<&str>) -> Communication {
        Communication {
            id: CommunicationId::new(),
            company_id: CompanyId::new(),
            crisis_id: None,
            kind,
            initiator_id: "owner".to_string(),
            target_id: target.map(str::to_string),
            message: "Let's talk".to_string(),
            tone: Tone::Diplomatic,
            success_chance: 50,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn targeted_kinds_need_a_target() {
        assert!(communication(CommunicationKind::OneOnOne, None)
            .validate()
            .is_err());
        assert!(communication(CommunicationKind::Mediation, Some(" "))
            .validate()
            .is_err());
        assert!(communication(CommunicationKind::OneOnOne, Some("worker-1"))
            .validate()
            .is_ok());
        assert!(communication(CommunicationKind::PublicStatement, None)
            .validate()
            .is_ok());
    }

    #[test]
    fn overlong_message_is_rejected() {
        let mut c = communication(CommunicationKind::LockerRoomMeeting, None);
        c.message = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(c.validate().is_err());
    }

    #[test]
    fn preventive_when_not_tied_to_crisis() {
        let mut c = communication(CommunicationKind::LockerRoomMeeting, None);
        assert!(c.is_preventive());
        c.crisis_id = Some(CrisisId::new());
        assert!(!c.is_preventive());
    }
}

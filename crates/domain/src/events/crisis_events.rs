//! Crisis mutation outcomes.

use crate::aggregates::crisis::CrisisStage;

/// What a crisis mutation actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrisisUpdate {
    Escalated {
        from: CrisisStage,
        to: CrisisStage,
        escalation_score: i32,
    },
    EscalationChanged { from: i32, to: i32 },
    AttemptRecorded { attempts: u32 },
    Resolved,
    Ignored,
    /// The crisis was already closed; nothing changed.
    Unchanged,
}

impl CrisisUpdate {
    pub fn changed(&self) -> bool {
        !matches!(self, CrisisUpdate::Unchanged)
    }
}

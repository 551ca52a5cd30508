use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_range, DomainError};
use crate::ids::{BookerId, CompanyId, EmploymentId};

/// One stint of a booker at a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookerEmployment {
    pub id: EmploymentId,
    pub booker_id: BookerId,
    pub company_id: CompanyId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub termination_reason: Option<String>,
    pub performance_score: Option<i32>,
}

impl BookerEmployment {
    pub fn start(booker_id: BookerId, company_id: CompanyId, started_at: DateTime<Utc>) -> Self {
        Self {
            id: EmploymentId::new(),
            booker_id,
            company_id,
            started_at,
            ended_at: None,
            termination_reason: None,
            performance_score: None,
        }
    }

    pub fn terminate(
        &self,
        ended_at: DateTime<Utc>,
        reason: impl Into<String>,
        performance_score: Option<i32>,
    ) -> Self {
        Self {
            ended_at: Some(ended_at),
            termination_reason: Some(reason.into()),
            performance_score,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(ended_at) = self.ended_at {
            if ended_at < self.started_at {
                return Err(DomainError::validation(
                    "Employment cannot end before it started",
                ));
            }
            if self
                .termination_reason
                .as_deref()
                .map_or(true, |r| r.trim().is_empty())
            {
                return Err(DomainError::validation(
                    "A termination reason is required once employment has ended",
                ));
            }
        }
        if let Some(score) = self.performance_score {
            ensure_range("performance_score", score, 0, 100)?;
        }
        Ok(())
    }

    pub fn is_current(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn duration_weeks(&self, now: DateTime<Utc>) -> i64 {
        let end = self.ended_at.unwrap_or(now);
        (end - self.started_at).num_weeks()
    }

    pub fn performance_label(&self) -> &'static str {
        match self.performance_score {
            None => "Not rated",
            Some(90..) => "Outstanding",
            Some(75..=89) => "Excellent",
            Some(60..=74) => "Good",
            Some(40..=59) => "Average",
            Some(20..=39) => "Poor",
            Some(_) => "Bad",
        }
    }
}

//! SQLite-backed crisis, communication and outcome storage.

use async_trait::async_trait;
use ringside_domain::*;
use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;

use super::{column, decode, decode_json, decode_opt_time, decode_time, encode_json, encode_time};
use crate::infrastructure::ports::{CrisisRepo, RepoError};

const CRISIS_COLUMNS: &str = "id, company_id, kind, stage, severity, description, \
    affected_workers_json, escalation_score, resolution_attempts, created_at, resolved_at";

const COMMUNICATION_COLUMNS: &str = "id, company_id, crisis_id, kind, initiator_id, target_id, \
    message, tone, success_chance, created_at";

const OUTCOME_COLUMNS: &str = "id, communication_id, successful, morale_impact, \
    relationship_impact, escalation_change, feedback, created_at";

/// Terminal stages, for `NOT IN` filters.
const TERMINAL_STAGES: &str = "('resolved', 'ignored')";

pub struct SqliteCrisisRepo {
    pool: SqlitePool,
}

impl SqliteCrisisRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_crisis(row: &SqliteRow) -> Result<Crisis, RepoError> {
        let company_id: CompanyId = decode(&column::<String>(row, "company_id")?)?;
        let kind: CrisisKind = decode(&column::<String>(row, "kind")?)?;
        let stage: CrisisStage = decode(&column::<String>(row, "stage")?)?;
        let affected: Vec<WorkerId> = decode_json(&column::<String>(row, "affected_workers_json")?)?;
        let attempts: i64 = column(row, "resolution_attempts")?;

        Ok(Crisis::new(
            company_id,
            kind,
            column(row, "severity")?,
            column::<String>(row, "description")?,
            decode_time(&column::<String>(row, "created_at")?)?,
        )
        .with_id(decode(&column::<String>(row, "id")?)?)
        .with_affected_workers(affected)
        .with_progress(
            stage,
            column(row, "escalation_score")?,
            u32::try_from(attempts).map_err(RepoError::serialization)?,
            decode_opt_time(column(row, "resolved_at")?)?,
        ))
    }

    fn row_to_communication(row: &SqliteRow) -> Result<Communication, RepoError> {
        let crisis_id: Option<String> = column(row, "crisis_id")?;
        Ok(Communication {
            id: decode(&column::<String>(row, "id")?)?,
            company_id: decode(&column::<String>(row, "company_id")?)?,
            crisis_id: crisis_id.as_deref().map(decode).transpose()?,
            kind: decode(&column::<String>(row, "kind")?)?,
            initiator_id: column(row, "initiator_id")?,
            target_id: column(row, "target_id")?,
            message: column(row, "message")?,
            tone: decode(&column::<String>(row, "tone")?)?,
            success_chance: column(row, "success_chance")?,
            created_at: decode_time(&column::<String>(row, "created_at")?)?,
        })
    }

    fn row_to_outcome(row: &SqliteRow) -> Result<CommunicationOutcome, RepoError> {
        Ok(CommunicationOutcome {
            id: decode(&column::<String>(row, "id")?)?,
            communication_id: decode(&column::<String>(row, "communication_id")?)?,
            successful: column(row, "successful")?,
            morale_impact: column(row, "morale_impact")?,
            relationship_impact: column(row, "relationship_impact")?,
            escalation_change: column(row, "escalation_change")?,
            feedback: column(row, "feedback")?,
            created_at: decode_time(&column::<String>(row, "created_at")?)?,
        })
    }

    async fn fetch_crises(
        &self,
        operation: &'static str,
        sql: &str,
        company_id: CompanyId,
    ) -> Result<Vec<Crisis>, RepoError> {
        let rows = sqlx::query(sql)
            .bind(company_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database(operation, e))?;
        rows.iter().map(Self::row_to_crisis).collect()
    }

    async fn fetch_outcome(
        &self,
        operation: &'static str,
        sql: &str,
        key: String,
    ) -> Result<Option<CommunicationOutcome>, RepoError> {
        let row = sqlx::query(sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database(operation, e))?;
        row.as_ref().map(Self::row_to_outcome).transpose()
    }
}

#[async_trait]
impl CrisisRepo for SqliteCrisisRepo {
    async fn get(&self, id: CrisisId) -> Result<Option<Crisis>, RepoError> {
        let row = sqlx::query(&format!("SELECT {CRISIS_COLUMNS} FROM crises WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("get_crisis", e))?;
        row.as_ref().map(Self::row_to_crisis).transpose()
    }

    async fn save(&self, crisis: &Crisis) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO crises (
                id, company_id, kind, stage, severity, description, affected_workers_json,
                escalation_score, resolution_attempts, created_at, resolved_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                stage = excluded.stage,
                description = excluded.description,
                affected_workers_json = excluded.affected_workers_json,
                escalation_score = excluded.escalation_score,
                resolution_attempts = excluded.resolution_attempts,
                resolved_at = excluded.resolved_at
            "#,
        )
        .bind(crisis.id().to_string())
        .bind(crisis.company_id().to_string())
        .bind(crisis.kind().as_str())
        .bind(crisis.stage().as_str())
        .bind(crisis.severity())
        .bind(crisis.description())
        .bind(encode_json(&crisis.affected_workers())?)
        .bind(crisis.escalation_score())
        .bind(i64::from(crisis.resolution_attempts()))
        .bind(encode_time(crisis.created_at()))
        .bind(crisis.resolved_at().map(encode_time))
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("save_crisis", e))?;
        Ok(())
    }

    async fn list_active(&self, company_id: CompanyId) -> Result<Vec<Crisis>, RepoError> {
        self.fetch_crises(
            "list_active_crises",
            &format!(
                "SELECT {CRISIS_COLUMNS} FROM crises \
                 WHERE company_id = ? AND stage NOT IN {TERMINAL_STAGES} \
                 ORDER BY severity DESC, escalation_score DESC, created_at"
            ),
            company_id,
        )
        .await
    }

    async fn list_critical(&self, company_id: CompanyId) -> Result<Vec<Crisis>, RepoError> {
        self.fetch_crises(
            "list_critical_crises",
            &format!(
                "SELECT {CRISIS_COLUMNS} FROM crises \
                 WHERE company_id = ? AND stage NOT IN {TERMINAL_STAGES} \
                 AND (severity >= 4 OR stage = 'declared') \
                 ORDER BY severity DESC, escalation_score DESC, created_at"
            ),
            company_id,
        )
        .await
    }

    async fn count_resolved(&self, company_id: CompanyId) -> Result<usize, RepoError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM crises WHERE company_id = ? AND stage = 'resolved'",
        )
        .bind(company_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::database("count_resolved", e))?;
        usize::try_from(count).map_err(RepoError::serialization)
    }

    async fn get_communication(
        &self,
        id: CommunicationId,
    ) -> Result<Option<Communication>, RepoError> {
        let row = sqlx::query(&format!(
            "SELECT {COMMUNICATION_COLUMNS} FROM communications WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("get_communication", e))?;
        row.as_ref().map(Self::row_to_communication).transpose()
    }

    async fn list_communications_for_crisis(
        &self,
        crisis_id: CrisisId,
    ) -> Result<Vec<Communication>, RepoError> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMUNICATION_COLUMNS} FROM communications \
             WHERE crisis_id = ? ORDER BY created_at"
        ))
        .bind(crisis_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("list_communications", e))?;
        rows.iter().map(Self::row_to_communication).collect()
    }

    async fn save_communication(&self, communication: &Communication) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO communications (
                id, company_id, crisis_id, kind, initiator_id, target_id, message, tone,
                success_chance, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(communication.id.to_string())
        .bind(communication.company_id.to_string())
        .bind(communication.crisis_id.map(|id| id.to_string()))
        .bind(communication.kind.as_str())
        .bind(&communication.initiator_id)
        .bind(communication.target_id.as_deref())
        .bind(&communication.message)
        .bind(communication.tone.as_str())
        .bind(communication.success_chance)
        .bind(encode_time(communication.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("save_communication", e))?;
        Ok(())
    }

    async fn get_outcome(&self, id: OutcomeId) -> Result<Option<CommunicationOutcome>, RepoError> {
        self.fetch_outcome(
            "get_outcome",
            &format!("SELECT {OUTCOME_COLUMNS} FROM communication_outcomes WHERE id = ?"),
            id.to_string(),
        )
        .await
    }

    async fn get_outcome_for_communication(
        &self,
        communication_id: CommunicationId,
    ) -> Result<Option<CommunicationOutcome>, RepoError> {
        self.fetch_outcome(
            "get_outcome_for_communication",
            &format!(
                "SELECT {OUTCOME_COLUMNS} FROM communication_outcomes WHERE communication_id = ?"
            ),
            communication_id.to_string(),
        )
        .await
    }

    async fn save_outcome(&self, outcome: &CommunicationOutcome) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO communication_outcomes (
                id, communication_id, successful, morale_impact, relationship_impact,
                escalation_change, feedback, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(outcome.id.to_string())
        .bind(outcome.communication_id.to_string())
        .bind(outcome.successful)
        .bind(outcome.morale_impact)
        .bind(outcome.relationship_impact)
        .bind(outcome.escalation_change)
        .bind(outcome.feedback.as_deref())
        .bind(encode_time(outcome.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::constraint(
                format!("communication {} already has an outcome", outcome.communication_id),
            ),
            other => RepoError::database("save_outcome", other),
        })?;
        Ok(())
    }

    async fn communication_success_rate(&self, company_id: CompanyId) -> Result<f64, RepoError> {
        let (total, successful): (i64, Option<i64>) = sqlx::query_as(
            r#"
            SELECT COUNT(*), SUM(o.successful)
            FROM communication_outcomes o
            JOIN communications c ON c.id = o.communication_id
            WHERE c.company_id = ?
            "#,
        )
        .bind(company_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::database("communication_success_rate", e))?;
        if total == 0 {
            return Ok(0.0);
        }
        Ok(successful.unwrap_or(0) as f64 * 100.0 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::infrastructure::sqlite::connect;

    async fn open_repo(dir: &tempfile::TempDir) -> SqliteCrisisRepo {
        let path = dir.path().join("ringside.db");
        let pool = connect(&path.to_string_lossy()).await.expect("connect");
        SqliteCrisisRepo::new(pool)
    }

    fn communication(company: CompanyId, crisis: Option<CrisisId>, at: i64) -> Communication {
        Communication {
            id: CommunicationId::new(),
            company_id: company,
            crisis_id: crisis,
            kind: CommunicationKind::LockerRoomMeeting,
            initiator_id: "owner".to_string(),
            target_id: None,
            message: "Everyone calm down".to_string(),
            tone: Tone::Firm,
            success_chance: 55,
            created_at: Utc.timestamp_opt(at, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn crisis_progress_survives_a_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = open_repo(&dir).await;
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut crisis = Crisis::new(CompanyId::new(), CrisisKind::TalentExodus, 4, "Walkout", now)
            .with_affected_workers([WorkerId::new(), WorkerId::new()]);
        crisis.escalate();
        crisis.record_resolution_attempt();
        repo.save(&crisis).await.unwrap();

        assert_eq!(repo.get(crisis.id()).await.unwrap(), Some(crisis.clone()));

        crisis.resolve(now + Duration::days(3));
        repo.save(&crisis).await.unwrap();
        let stored = repo.get(crisis.id()).await.unwrap().unwrap();
        assert_eq!(stored.stage(), CrisisStage::Resolved);
        assert_eq!(stored.resolved_at(), Some(now + Duration::days(3)));
        assert!(repo.list_active(crisis.company_id()).await.unwrap().is_empty());
        assert_eq!(repo.count_resolved(crisis.company_id()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn critical_crises_include_declared_low_severity() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = open_repo(&dir).await;
        let company = CompanyId::new();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut declared = Crisis::new(company, CrisisKind::RumorEscalation, 1, "Dirt sheets", now);
        declared.escalate();
        declared.escalate();
        let calm = Crisis::new(company, CrisisKind::WorkerGrievance, 2, "Travel", now);
        let severe = Crisis::new(company, CrisisKind::PublicScandal, 5, "Arrest", now);
        for c in [&declared, &calm, &severe] {
            repo.save(c).await.unwrap();
        }

        let critical: Vec<_> = repo
            .list_critical(company)
            .await
            .unwrap()
            .iter()
            .map(Crisis::id)
            .collect();
        assert_eq!(critical, vec![severe.id(), declared.id()]);
        assert_eq!(repo.list_active(company).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn one_outcome_per_communication() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = open_repo(&dir).await;
        let company = CompanyId::new();
        let comm = communication(company, None, 1_700_000_000);
        repo.save_communication(&comm).await.unwrap();

        let now = Utc.timestamp_opt(1_700_000_100, 0).unwrap();
        let outcome = CommunicationOutcome::new(comm.id, true, 20, 5, -25, "Calmer", now);
        repo.save_outcome(&outcome).await.unwrap();

        let again = CommunicationOutcome::failed(comm.id, now);
        assert!(matches!(
            repo.save_outcome(&again).await,
            Err(RepoError::ConstraintViolation(_))
        ));
        assert_eq!(
            repo.get_outcome_for_communication(comm.id).await.unwrap(),
            Some(outcome.clone())
        );
        assert_eq!(repo.get_outcome(outcome.id).await.unwrap(), Some(outcome));
    }

    #[tokio::test]
    async fn success_rate_counts_only_the_company() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = open_repo(&dir).await;
        let company = CompanyId::new();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(repo.communication_success_rate(company).await.unwrap(), 0.0);

        for (i, ok) in [true, false, true, true].into_iter().enumerate() {
            let comm = communication(company, None, 1_700_000_000 + i as i64);
            repo.save_communication(&comm).await.unwrap();
            let outcome = if ok {
                CommunicationOutcome::new(comm.id, true, 10, 5, -10, "ok", now)
            } else {
                CommunicationOutcome::failed(comm.id, now)
            };
            repo.save_outcome(&outcome).await.unwrap();
        }
        let stranger = communication(CompanyId::new(), None, 1_700_000_000);
        repo.save_communication(&stranger).await.unwrap();
        repo.save_outcome(&CommunicationOutcome::failed(stranger.id, now))
            .await
            .unwrap();

        assert_eq!(repo.communication_success_rate(company).await.unwrap(), 75.0);
    }

    #[tokio::test]
    async fn crisis_communications_are_listed_oldest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = open_repo(&dir).await;
        let company = CompanyId::new();
        let crisis = CrisisId::new();
        let later = communication(company, Some(crisis), 1_700_000_500);
        let earlier = communication(company, Some(crisis), 1_700_000_100);
        repo.save_communication(&later).await.unwrap();
        repo.save_communication(&earlier).await.unwrap();
        repo.save_communication(&communication(company, None, 1_700_000_000))
            .await
            .unwrap();

        let listed = repo.list_communications_for_crisis(crisis).await.unwrap();
        assert_eq!(listed, vec![earlier.clone(), later]);
        assert_eq!(
            repo.get_communication(earlier.id).await.unwrap(),
            Some(earlier)
        );
    }
}

//! SQLite-backed booker, memory and employment storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ringside_domain::*;
use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;

use super::{column, decode, decode_json, decode_opt_time, decode_time, encode_json, encode_time};
use crate::infrastructure::ports::{BookerRepo, RepoError};

const BOOKER_COLUMNS: &str = "id, company_id, name, creativity_score, logic_score, \
    bias_resistance, preferred_style, preferred_product, likes_underdog, likes_veteran, \
    likes_fast_rise, likes_slow_burn, auto_booking_enabled, employment_status, hired_at, created_at";

const MEMORY_COLUMNS: &str =
    "id, booker_id, event, description, workers_json, impact_score, recall_strength, created_at";

pub struct SqliteBookerRepo {
    pool: SqlitePool,
}

impl SqliteBookerRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_booker(row: &SqliteRow) -> Result<Booker, RepoError> {
        Ok(Booker {
            id: decode(&column::<String>(row, "id")?)?,
            company_id: decode(&column::<String>(row, "company_id")?)?,
            name: column(row, "name")?,
            creativity_score: column(row, "creativity_score")?,
            logic_score: column(row, "logic_score")?,
            bias_resistance: column(row, "bias_resistance")?,
            preferred_style: decode(&column::<String>(row, "preferred_style")?)?,
            preferred_product: decode(&column::<String>(row, "preferred_product")?)?,
            likes_underdog: column(row, "likes_underdog")?,
            likes_veteran: column(row, "likes_veteran")?,
            likes_fast_rise: column(row, "likes_fast_rise")?,
            likes_slow_burn: column(row, "likes_slow_burn")?,
            auto_booking_enabled: column(row, "auto_booking_enabled")?,
            employment_status: decode(&column::<String>(row, "employment_status")?)?,
            hired_at: decode_time(&column::<String>(row, "hired_at")?)?,
            created_at: decode_time(&column::<String>(row, "created_at")?)?,
        })
    }

    fn row_to_memory(row: &SqliteRow) -> Result<BookerMemory, RepoError> {
        Ok(BookerMemory {
            id: decode(&column::<String>(row, "id")?)?,
            booker_id: decode(&column::<String>(row, "booker_id")?)?,
            event: decode(&column::<String>(row, "event")?)?,
            description: column(row, "description")?,
            workers: decode_json(&column::<String>(row, "workers_json")?)?,
            impact_score: column(row, "impact_score")?,
            recall_strength: column(row, "recall_strength")?,
            created_at: decode_time(&column::<String>(row, "created_at")?)?,
        })
    }

    fn row_to_employment(row: &SqliteRow) -> Result<BookerEmployment, RepoError> {
        Ok(BookerEmployment {
            id: decode(&column::<String>(row, "id")?)?,
            booker_id: decode(&column::<String>(row, "booker_id")?)?,
            company_id: decode(&column::<String>(row, "company_id")?)?,
            started_at: decode_time(&column::<String>(row, "started_at")?)?,
            ended_at: decode_opt_time(column(row, "ended_at")?)?,
            termination_reason: column(row, "termination_reason")?,
            performance_score: column(row, "performance_score")?,
        })
    }

    async fn fetch_bookers(
        &self,
        operation: &'static str,
        sql: &str,
        company_id: CompanyId,
    ) -> Result<Vec<Booker>, RepoError> {
        let rows = sqlx::query(sql)
            .bind(company_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database(operation, e))?;
        rows.iter().map(Self::row_to_booker).collect()
    }

    async fn fetch_memories(
        &self,
        operation: &'static str,
        sql: &str,
        booker_id: BookerId,
        extra: Option<i64>,
    ) -> Result<Vec<BookerMemory>, RepoError> {
        let mut query = sqlx::query(sql).bind(booker_id.to_string());
        if let Some(extra) = extra {
            query = query.bind(extra);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::database(operation, e))?;
        rows.iter().map(Self::row_to_memory).collect()
    }

    async fn upsert_memory(
        &self,
        operation: &'static str,
        memory: &BookerMemory,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO booker_memories
                (id, booker_id, event, description, workers_json, impact_score, recall_strength, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                event = excluded.event,
                description = excluded.description,
                workers_json = excluded.workers_json,
                impact_score = excluded.impact_score,
                recall_strength = excluded.recall_strength
            "#,
        )
        .bind(memory.id.to_string())
        .bind(memory.booker_id.to_string())
        .bind(memory.event.as_str())
        .bind(&memory.description)
        .bind(encode_json(&memory.workers)?)
        .bind(memory.impact_score)
        .bind(memory.recall_strength)
        .bind(encode_time(memory.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database(operation, e))?;
        Ok(())
    }
}

#[async_trait]
impl BookerRepo for SqliteBookerRepo {
    async fn get(&self, id: BookerId) -> Result<Option<Booker>, RepoError> {
        let row = sqlx::query(&format!("SELECT {BOOKER_COLUMNS} FROM bookers WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("get_booker", e))?;
        row.as_ref().map(Self::row_to_booker).transpose()
    }

    async fn save(&self, booker: &Booker) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO bookers (
                id, company_id, name, creativity_score, logic_score, bias_resistance,
                preferred_style, preferred_product, likes_underdog, likes_veteran,
                likes_fast_rise, likes_slow_burn, auto_booking_enabled, employment_status,
                hired_at, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                company_id = excluded.company_id,
                name = excluded.name,
                creativity_score = excluded.creativity_score,
                logic_score = excluded.logic_score,
                bias_resistance = excluded.bias_resistance,
                preferred_style = excluded.preferred_style,
                preferred_product = excluded.preferred_product,
                likes_underdog = excluded.likes_underdog,
                likes_veteran = excluded.likes_veteran,
                likes_fast_rise = excluded.likes_fast_rise,
                likes_slow_burn = excluded.likes_slow_burn,
                auto_booking_enabled = excluded.auto_booking_enabled,
                employment_status = excluded.employment_status,
                hired_at = excluded.hired_at
            "#,
        )
        .bind(booker.id.to_string())
        .bind(booker.company_id.to_string())
        .bind(&booker.name)
        .bind(booker.creativity_score)
        .bind(booker.logic_score)
        .bind(booker.bias_resistance)
        .bind(booker.preferred_style.as_str())
        .bind(booker.preferred_product.as_str())
        .bind(booker.likes_underdog)
        .bind(booker.likes_veteran)
        .bind(booker.likes_fast_rise)
        .bind(booker.likes_slow_burn)
        .bind(booker.auto_booking_enabled)
        .bind(booker.employment_status.as_str())
        .bind(encode_time(booker.hired_at))
        .bind(encode_time(booker.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("save_booker", e))?;
        Ok(())
    }

    async fn delete(&self, id: BookerId) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("delete_booker", e))?;
        for sql in [
            "DELETE FROM booker_memories WHERE booker_id = ?",
            "DELETE FROM booker_employment WHERE booker_id = ?",
            "DELETE FROM bookers WHERE id = ?",
        ] {
            sqlx::query(sql)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| RepoError::database("delete_booker", e))?;
        }
        tx.commit()
            .await
            .map_err(|e| RepoError::database("delete_booker", e))
    }

    async fn list_for_company(&self, company_id: CompanyId) -> Result<Vec<Booker>, RepoError> {
        self.fetch_bookers(
            "list_bookers",
            &format!("SELECT {BOOKER_COLUMNS} FROM bookers WHERE company_id = ? ORDER BY hired_at"),
            company_id,
        )
        .await
    }

    async fn get_active_for_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Option<Booker>, RepoError> {
        let bookers = self
            .fetch_bookers(
                "get_active_booker",
                &format!(
                    "SELECT {BOOKER_COLUMNS} FROM bookers \
                     WHERE company_id = ? AND employment_status = 'active' \
                     ORDER BY hired_at LIMIT 1"
                ),
                company_id,
            )
            .await?;
        Ok(bookers.into_iter().next())
    }

    async fn get_auto_booker_for_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Option<Booker>, RepoError> {
        let bookers = self
            .fetch_bookers(
                "get_auto_booker",
                &format!(
                    "SELECT {BOOKER_COLUMNS} FROM bookers \
                     WHERE company_id = ? AND employment_status = 'active' \
                     AND auto_booking_enabled = 1 ORDER BY hired_at LIMIT 1"
                ),
                company_id,
            )
            .await?;
        Ok(bookers.into_iter().next())
    }

    async fn get_memory(&self, id: MemoryId) -> Result<Option<BookerMemory>, RepoError> {
        let row = sqlx::query(&format!(
            "SELECT {MEMORY_COLUMNS} FROM booker_memories WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("get_memory", e))?;
        row.as_ref().map(Self::row_to_memory).transpose()
    }

    async fn list_memories(&self, booker_id: BookerId) -> Result<Vec<BookerMemory>, RepoError> {
        self.fetch_memories(
            "list_memories",
            &format!(
                "SELECT {MEMORY_COLUMNS} FROM booker_memories WHERE booker_id = ? ORDER BY created_at"
            ),
            booker_id,
            None,
        )
        .await
    }

    async fn recent_memories(
        &self,
        booker_id: BookerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<BookerMemory>, RepoError> {
        // Fixed-width RFC 3339 timestamps compare correctly as text
        let rows = sqlx::query(&format!(
            "SELECT {MEMORY_COLUMNS} FROM booker_memories WHERE booker_id = ? AND created_at >= ? \
             ORDER BY created_at DESC"
        ))
        .bind(booker_id.to_string())
        .bind(encode_time(since))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("recent_memories", e))?;
        rows.iter().map(Self::row_to_memory).collect()
    }

    async fn strong_memories(
        &self,
        booker_id: BookerId,
    ) -> Result<Vec<BookerMemory>, RepoError> {
        self.fetch_memories(
            "strong_memories",
            &format!(
                "SELECT {MEMORY_COLUMNS} FROM booker_memories WHERE booker_id = ? \
                 AND recall_strength >= ? ORDER BY recall_strength DESC"
            ),
            booker_id,
            Some(i64::from(STRONG_RECALL)),
        )
        .await
    }

    async fn count_memories(&self, booker_id: BookerId) -> Result<usize, RepoError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM booker_memories WHERE booker_id = ?")
                .bind(booker_id.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepoError::database("count_memories", e))?;
        usize::try_from(count).map_err(RepoError::serialization)
    }

    async fn save_memory(&self, memory: &BookerMemory) -> Result<(), RepoError> {
        self.upsert_memory("save_memory", memory).await
    }

    async fn update_memory(&self, memory: &BookerMemory) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE booker_memories SET recall_strength = ?, impact_score = ?, \
             description = ?, workers_json = ? WHERE id = ?",
        )
        .bind(memory.recall_strength)
        .bind(memory.impact_score)
        .bind(&memory.description)
        .bind(encode_json(&memory.workers)?)
        .bind(memory.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("update_memory", e))?;
        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("BookerMemory", memory.id));
        }
        Ok(())
    }

    async fn delete_weak_memories(
        &self,
        booker_id: BookerId,
        threshold: i32,
    ) -> Result<usize, RepoError> {
        let result =
            sqlx::query("DELETE FROM booker_memories WHERE booker_id = ? AND recall_strength < ?")
                .bind(booker_id.to_string())
                .bind(threshold)
                .execute(&self.pool)
                .await
                .map_err(|e| RepoError::database("delete_weak_memories", e))?;
        usize::try_from(result.rows_affected()).map_err(RepoError::serialization)
    }

    async fn list_employment_history(
        &self,
        booker_id: BookerId,
    ) -> Result<Vec<BookerEmployment>, RepoError> {
        let rows = sqlx::query(
            "SELECT id, booker_id, company_id, started_at, ended_at, termination_reason, \
             performance_score FROM booker_employment WHERE booker_id = ? ORDER BY started_at",
        )
        .bind(booker_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("list_employment_history", e))?;
        rows.iter().map(Self::row_to_employment).collect()
    }

    async fn save_employment(&self, employment: &BookerEmployment) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO booker_employment
                (id, booker_id, company_id, started_at, ended_at, termination_reason, performance_score)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                ended_at = excluded.ended_at,
                termination_reason = excluded.termination_reason,
                performance_score = excluded.performance_score
            "#,
        )
        .bind(employment.id.to_string())
        .bind(employment.booker_id.to_string())
        .bind(employment.company_id.to_string())
        .bind(encode_time(employment.started_at))
        .bind(employment.ended_at.map(encode_time))
        .bind(employment.termination_reason.as_deref())
        .bind(employment.performance_score)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("save_employment", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::infrastructure::sqlite::connect;

    async fn open_repo(dir: &tempfile::TempDir) -> SqliteBookerRepo {
        let path = dir.path().join("ringside.db");
        let pool = connect(&path.to_string_lossy()).await.expect("connect");
        SqliteBookerRepo::new(pool)
    }

    #[tokio::test]
    async fn booker_round_trips_through_sqlite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = open_repo(&dir).await;
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let booker = Booker::new(CompanyId::new(), "Vince", 82, 40, now)
            .with_product(ProductType::Puroresu)
            .liking(WorkerArchetype::Veteran);

        repo.save(&booker).await.unwrap();

        assert_eq!(repo.get(booker.id).await.unwrap(), Some(booker.clone()));
        assert_eq!(
            repo.get_auto_booker_for_company(booker.company_id)
                .await
                .unwrap()
                .map(|b| b.id),
            Some(booker.id)
        );
    }

    #[tokio::test]
    async fn auto_booker_lookup_skips_disabled_bookers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = open_repo(&dir).await;
        let company = CompanyId::new();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let manual = Booker::new(company, "Manual", 50, 50, now).with_auto_booking(false);
        repo.save(&manual).await.unwrap();

        assert!(repo
            .get_auto_booker_for_company(company)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            repo.get_active_for_company(company).await.unwrap().map(|b| b.id),
            Some(manual.id)
        );
    }

    #[tokio::test]
    async fn memories_persist_across_reconnect() {
        let dir = tempfile::tempdir().expect("tempdir");
        let booker_id = BookerId::new();
        let worker = WorkerId::new();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let memory = BookerMemory::new(booker_id, MemoryEvent::PushSuccess, "Rocket push", 75, 80, now)
            .about([worker]);

        {
            let repo = open_repo(&dir).await;
            repo.save_memory(&memory).await.unwrap();
            let weak = BookerMemory::new(
                booker_id,
                MemoryEvent::BadMatch,
                "Botched finish",
                -40,
                5,
                now + Duration::days(1),
            );
            repo.save_memory(&weak).await.unwrap();
        }

        let repo = open_repo(&dir).await;
        assert_eq!(repo.count_memories(booker_id).await.unwrap(), 2);
        assert_eq!(repo.strong_memories(booker_id).await.unwrap(), vec![memory.clone()]);
        assert_eq!(repo.delete_weak_memories(booker_id, 10).await.unwrap(), 1);

        let stored = repo.get_memory(memory.id).await.unwrap().unwrap();
        assert!(stored.concerns(worker));
    }

    #[tokio::test]
    async fn update_of_missing_memory_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = open_repo(&dir).await;
        let memory = BookerMemory::new(
            BookerId::new(),
            MemoryEvent::OwnerFeedback,
            "Owner loved it",
            30,
            50,
            Utc::now(),
        );
        assert!(repo.update_memory(&memory).await.unwrap_err().is_not_found());

        repo.save_memory(&memory).await.unwrap();
        repo.update_memory(&memory.apply_decay(20)).await.unwrap();
        let recent = repo
            .recent_memories(memory.booker_id, memory.created_at)
            .await
            .unwrap();
        assert_eq!(recent[0].recall_strength, 30);
    }

    #[tokio::test]
    async fn recent_memories_stop_at_the_cutoff() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = open_repo(&dir).await;
        let booker = BookerId::new();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        for weeks_ago in [0, 11, 12, 13, 52] {
            let memory = BookerMemory::new(
                booker,
                MemoryEvent::FanReaction,
                format!("{weeks_ago} weeks ago"),
                20,
                40,
                now - Duration::weeks(weeks_ago),
            );
            repo.save_memory(&memory).await.unwrap();
        }

        let recent = repo
            .recent_memories(booker, now - Duration::weeks(12))
            .await
            .unwrap();
        let descriptions: Vec<_> = recent.iter().map(|m| m.description.as_str()).collect();
        assert_eq!(descriptions, vec!["0 weeks ago", "11 weeks ago", "12 weeks ago"]);
    }

    #[tokio::test]
    async fn employment_history_is_ordered_by_start() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = open_repo(&dir).await;
        let booker = BookerId::new();
        let company = CompanyId::new();
        let start = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
        let first = BookerEmployment::start(booker, company, start).terminate(
            start + Duration::weeks(30),
            "contract expired",
            Some(65),
        );
        let second = BookerEmployment::start(booker, company, start + Duration::weeks(40));
        repo.save_employment(&second).await.unwrap();
        repo.save_employment(&first).await.unwrap();

        let history = repo.list_employment_history(booker).await.unwrap();
        assert_eq!(history, vec![first, second]);
    }
}

//! In-memory repositories for development and testing.
//!
//! Backed by `DashMap`; nothing is persisted. Ordering guarantees match the
//! SQLite adapters so use cases behave the same on either store.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ringside_domain::*;

use crate::infrastructure::ports::{BookerRepo, CrisisRepo, RepoError};

/// Severity desc, then escalation desc, oldest first on ties.
pub(crate) fn crisis_priority(a: &Crisis, b: &Crisis) -> Ordering {
    b.severity()
        .cmp(&a.severity())
        .then_with(|| b.escalation_score().cmp(&a.escalation_score()))
        .then_with(|| a.created_at().cmp(&b.created_at()))
}

#[derive(Default)]
pub struct InMemoryBookerRepo {
    bookers: DashMap<BookerId, Booker>,
    memories: DashMap<MemoryId, BookerMemory>,
    employments: DashMap<EmploymentId, BookerEmployment>,
}

impl InMemoryBookerRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn memories_of(&self, booker_id: BookerId) -> Vec<BookerMemory> {
        self.memories
            .iter()
            .filter(|entry| entry.booker_id == booker_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn bookers_of(&self, company_id: CompanyId) -> Vec<Booker> {
        let mut bookers: Vec<_> = self
            .bookers
            .iter()
            .filter(|entry| entry.company_id == company_id)
            .map(|entry| entry.value().clone())
            .collect();
        bookers.sort_by_key(|b| b.hired_at);
        bookers
    }
}

#[async_trait]
impl BookerRepo for InMemoryBookerRepo {
    async fn get(&self, id: BookerId) -> Result<Option<Booker>, RepoError> {
        Ok(self.bookers.get(&id).map(|b| b.value().clone()))
    }

    async fn save(&self, booker: &Booker) -> Result<(), RepoError> {
        self.bookers.insert(booker.id, booker.clone());
        Ok(())
    }

    async fn delete(&self, id: BookerId) -> Result<(), RepoError> {
        self.bookers.remove(&id);
        self.memories.retain(|_, m| m.booker_id != id);
        self.employments.retain(|_, e| e.booker_id != id);
        Ok(())
    }

    async fn list_for_company(&self, company_id: CompanyId) -> Result<Vec<Booker>, RepoError> {
        Ok(self.bookers_of(company_id))
    }

    async fn get_active_for_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Option<Booker>, RepoError> {
        Ok(self
            .bookers_of(company_id)
            .into_iter()
            .find(|b| b.is_active()))
    }

    async fn get_auto_booker_for_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Option<Booker>, RepoError> {
        Ok(self
            .bookers_of(company_id)
            .into_iter()
            .find(|b| b.can_auto_book()))
    }

    async fn get_memory(&self, id: MemoryId) -> Result<Option<BookerMemory>, RepoError> {
        Ok(self.memories.get(&id).map(|m| m.value().clone()))
    }

    async fn list_memories(&self, booker_id: BookerId) -> Result<Vec<BookerMemory>, RepoError> {
        let mut memories = self.memories_of(booker_id);
        memories.sort_by_key(|m| m.created_at);
        Ok(memories)
    }

    async fn recent_memories(
        &self,
        booker_id: BookerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<BookerMemory>, RepoError> {
        let mut memories: Vec<_> = self
            .memories_of(booker_id)
            .into_iter()
            .filter(|m| m.created_at >= since)
            .collect();
        memories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(memories)
    }

    async fn strong_memories(
        &self,
        booker_id: BookerId,
    ) -> Result<Vec<BookerMemory>, RepoError> {
        let mut memories: Vec<_> = self
            .memories_of(booker_id)
            .into_iter()
            .filter(BookerMemory::is_strong)
            .collect();
        memories.sort_by(|a, b| b.recall_strength.cmp(&a.recall_strength));
        Ok(memories)
    }

    async fn count_memories(&self, booker_id: BookerId) -> Result<usize, RepoError> {
        Ok(self
            .memories
            .iter()
            .filter(|entry| entry.booker_id == booker_id)
            .count())
    }

    async fn save_memory(&self, memory: &BookerMemory) -> Result<(), RepoError> {
        self.memories.insert(memory.id, memory.clone());
        Ok(())
    }

    async fn update_memory(&self, memory: &BookerMemory) -> Result<(), RepoError> {
        match self.memories.get_mut(&memory.id) {
            Some(mut stored) => {
                *stored = memory.clone();
                Ok(())
            }
            None => Err(RepoError::not_found("BookerMemory", memory.id)),
        }
    }

    async fn delete_weak_memories(
        &self,
        booker_id: BookerId,
        threshold: i32,
    ) -> Result<usize, RepoError> {
        let mut removed = 0;
        self.memories.retain(|_, m| {
            let weak = m.booker_id == booker_id && m.recall_strength < threshold;
            if weak {
                removed += 1;
            }
            !weak
        });
        Ok(removed)
    }

    async fn list_employment_history(
        &self,
        booker_id: BookerId,
    ) -> Result<Vec<BookerEmployment>, RepoError> {
        let mut history: Vec<_> = self
            .employments
            .iter()
            .filter(|entry| entry.booker_id == booker_id)
            .map(|entry| entry.value().clone())
            .collect();
        history.sort_by_key(|e| e.started_at);
        Ok(history)
    }

    async fn save_employment(&self, employment: &BookerEmployment) -> Result<(), RepoError> {
        self.employments.insert(employment.id, employment.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCrisisRepo {
    crises: DashMap<CrisisId, Crisis>,
    communications: DashMap<CommunicationId, Communication>,
    outcomes: DashMap<OutcomeId, CommunicationOutcome>,
}

impl InMemoryCrisisRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn active_of(&self, company_id: CompanyId) -> Vec<Crisis> {
        let mut crises: Vec<_> = self
            .crises
            .iter()
            .filter(|entry| entry.company_id() == company_id && entry.is_active())
            .map(|entry| entry.value().clone())
            .collect();
        crises.sort_by(crisis_priority);
        crises
    }
}

#[async_trait]
impl CrisisRepo for InMemoryCrisisRepo {
    async fn get(&self, id: CrisisId) -> Result<Option<Crisis>, RepoError> {
        Ok(self.crises.get(&id).map(|c| c.value().clone()))
    }

    async fn save(&self, crisis: &Crisis) -> Result<(), RepoError> {
        self.crises.insert(crisis.id(), crisis.clone());
        Ok(())
    }

    async fn list_active(&self, company_id: CompanyId) -> Result<Vec<Crisis>, RepoError> {
        Ok(self.active_of(company_id))
    }

    async fn list_critical(&self, company_id: CompanyId) -> Result<Vec<Crisis>, RepoError> {
        Ok(self
            .active_of(company_id)
            .into_iter()
            .filter(Crisis::is_critical)
            .collect())
    }

    async fn count_resolved(&self, company_id: CompanyId) -> Result<usize, RepoError> {
        Ok(self
            .crises
            .iter()
            .filter(|c| c.company_id() == company_id && c.stage() == CrisisStage::Resolved)
            .count())
    }

    async fn get_communication(
        &self,
        id: CommunicationId,
    ) -> Result<Option<Communication>, RepoError> {
        Ok(self.communications.get(&id).map(|c| c.value().clone()))
    }

    async fn list_communications_for_crisis(
        &self,
        crisis_id: CrisisId,
    ) -> Result<Vec<Communication>, RepoError> {
        let mut communications: Vec<_> = self
            .communications
            .iter()
            .filter(|c| c.crisis_id == Some(crisis_id))
            .map(|c| c.value().clone())
            .collect();
        communications.sort_by_key(|c| c.created_at);
        Ok(communications)
    }

    async fn save_communication(&self, communication: &Communication) -> Result<(), RepoError> {
        self.communications
            .insert(communication.id, communication.clone());
        Ok(())
    }

    async fn get_outcome(&self, id: OutcomeId) -> Result<Option<CommunicationOutcome>, RepoError> {
        Ok(self.outcomes.get(&id).map(|o| o.value().clone()))
    }

    async fn get_outcome_for_communication(
        &self,
        communication_id: CommunicationId,
    ) -> Result<Option<CommunicationOutcome>, RepoError> {
        Ok(self
            .outcomes
            .iter()
            .find(|o| o.communication_id == communication_id)
            .map(|o| o.value().clone()))
    }

    async fn save_outcome(&self, outcome: &CommunicationOutcome) -> Result<(), RepoError> {
        if self
            .outcomes
            .iter()
            .any(|o| o.communication_id == outcome.communication_id && o.id != outcome.id)
        {
            return Err(RepoError::constraint(format!(
                "communication {} already has an outcome",
                outcome.communication_id
            )));
        }
        self.outcomes.insert(outcome.id, outcome.clone());
        Ok(())
    }

    async fn communication_success_rate(&self, company_id: CompanyId) -> Result<f64, RepoError> {
        let (total, successful) = self
            .outcomes
            .iter()
            .filter(|o| {
                self.communications
                    .get(&o.communication_id)
                    .is_some_and(|c| c.company_id == company_id)
            })
            .fold((0usize, 0usize), |(total, ok), o| {
                (total + 1, ok + usize::from(o.successful))
            });
        if total == 0 {
            return Ok(0.0);
        }
        Ok(successful as f64 * 100.0 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;

    fn crisis(company: CompanyId, severity: i32, extra_escalation: i32) -> Crisis {
        let mut c = Crisis::new(company, CrisisKind::WorkerGrievance, severity, "pay", Utc::now());
        c.increase_escalation(extra_escalation);
        c
    }

    #[tokio::test]
    async fn active_crises_are_ordered_by_severity_then_escalation() {
        let repo = InMemoryCrisisRepo::new();
        let company = CompanyId::new();
        let low = crisis(company, 2, 50);
        let high_calm = crisis(company, 4, 0);
        let high_hot = crisis(company, 4, 30);
        let mut closed = crisis(company, 5, 0);
        closed.resolve(Utc::now());
        for c in [&low, &high_calm, &high_hot, &closed] {
            repo.save(c).await.unwrap();
        }
        repo.save(&crisis(CompanyId::new(), 5, 0)).await.unwrap();

        let ids: Vec<_> = repo
            .list_active(company)
            .await
            .unwrap()
            .iter()
            .map(Crisis::id)
            .collect();
        assert_eq!(ids, vec![high_hot.id(), high_calm.id(), low.id()]);
        assert_eq!(repo.count_resolved(company).await.unwrap(), 1);
        assert_eq!(repo.list_critical(company).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn weak_memories_are_purged_per_booker() {
        let repo = InMemoryBookerRepo::new();
        let booker = BookerId::new();
        let other = BookerId::new();
        let now = Utc::now();
        for (owner, recall) in [(booker, 5), (booker, 40), (other, 5)] {
            let m = BookerMemory::new(owner, MemoryEvent::BadMatch, "botch", -30, recall, now);
            repo.save_memory(&m).await.unwrap();
        }

        assert_eq!(repo.delete_weak_memories(booker, 10).await.unwrap(), 1);
        assert_eq!(repo.count_memories(booker).await.unwrap(), 1);
        assert_eq!(repo.count_memories(other).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn weak_memory_count_ignores_concurrent_inserts() {
        let repo = Arc::new(InMemoryBookerRepo::new());
        let booker = BookerId::new();
        for _ in 0..50 {
            let m = BookerMemory::new(booker, MemoryEvent::FanReaction, "faded", 5, 3, Utc::now());
            repo.save_memory(&m).await.unwrap();
        }

        let writer = {
            let repo = repo.clone();
            tokio::spawn(async move {
                let other = BookerId::new();
                for _ in 0..200 {
                    let m = BookerMemory::new(other, MemoryEvent::GoodMatch, "fresh", 40, 60, Utc::now());
                    repo.save_memory(&m).await.unwrap();
                }
            })
        };
        let removed = repo.delete_weak_memories(booker, 10).await.unwrap();
        writer.await.unwrap();

        assert_eq!(removed, 50);
        assert_eq!(repo.count_memories(booker).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn recent_memories_are_newest_first_within_window() {
        let repo = InMemoryBookerRepo::new();
        let booker = BookerId::new();
        let start = Utc::now();
        for week in 0..5 {
            let m = BookerMemory::new(
                booker,
                MemoryEvent::GoodMatch,
                format!("week {week}"),
                50,
                50,
                start + Duration::weeks(week),
            );
            repo.save_memory(&m).await.unwrap();
        }
        let recent = repo
            .recent_memories(booker, start + Duration::weeks(3))
            .await
            .unwrap();
        let descriptions: Vec<_> = recent.iter().map(|m| m.description.as_str()).collect();
        assert_eq!(descriptions, vec!["week 4", "week 3"]);
    }

    #[tokio::test]
    async fn updating_unknown_memory_is_not_found() {
        let repo = InMemoryBookerRepo::new();
        let m = BookerMemory::new(BookerId::new(), MemoryEvent::FanReaction, "pop", 10, 50, Utc::now());
        assert!(repo.update_memory(&m).await.unwrap_err().is_not_found());
    }
}

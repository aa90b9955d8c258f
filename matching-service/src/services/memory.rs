//! In-process stores for tests and `STORE_BACKEND=memory`.

use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::sync::{Mutex, MutexGuard};

use crate::models::{Account, ActorKind, Engagement, EngagementStatus};
use crate::services::store::{AccountStore, EngagementStore};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Memory store mutex poisoned: {}", e)))
}

pub struct MemoryAccounts<A> {
    records: Mutex<Vec<A>>,
}

impl<A> Default for MemoryAccounts<A> {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }
}

impl<A: Account> MemoryAccounts<A> {
    fn clashes(existing: &A, candidate: &A) -> bool {
        existing.handle() == candidate.handle()
            || existing.email() == candidate.email()
            || existing.credentials().token_seed == candidate.credentials().token_seed
    }

    fn conflict() -> AppError {
        AppError::Conflict(anyhow::anyhow!(
            "{} with that name or email already exists",
            A::KIND
        ))
    }
}

#[async_trait]
impl<A: Account> AccountStore<A> for MemoryAccounts<A> {
    async fn insert(&self, account: &A) -> Result<(), AppError> {
        let mut records = lock(&self.records)?;
        if records
            .iter()
            .any(|r| r.id() == account.id() || Self::clashes(r, account))
        {
            return Err(Self::conflict());
        }
        records.push(account.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<A>, AppError> {
        let records = lock(&self.records)?;
        Ok(records.iter().find(|r| r.id() == id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> Result<Vec<A>, AppError> {
        let records = lock(&self.records)?;
        let by_handle = records.iter().filter(|r| r.handle() == login);
        let by_email = records
            .iter()
            .filter(|r| r.email() == login && r.handle() != login);
        Ok(by_handle.chain(by_email).cloned().collect())
    }

    async fn find_by_token_seed(&self, token_seed: &str) -> Result<Option<A>, AppError> {
        let records = lock(&self.records)?;
        Ok(records
            .iter()
            .find(|r| r.credentials().token_seed == token_seed)
            .cloned())
    }

    async fn find_many(&self, ids: &[String]) -> Result<Vec<A>, AppError> {
        let records = lock(&self.records)?;
        Ok(records
            .iter()
            .filter(|r| ids.iter().any(|id| id == r.id()))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<A>, AppError> {
        Ok(lock(&self.records)?.clone())
    }

    async fn save(&self, account: &A) -> Result<(), AppError> {
        let mut records = lock(&self.records)?;
        if records
            .iter()
            .any(|r| r.id() != account.id() && Self::clashes(r, account))
        {
            return Err(Self::conflict());
        }
        match records.iter_mut().find(|r| r.id() == account.id()) {
            Some(slot) => {
                *slot = account.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(anyhow::anyhow!("{} not found", A::KIND))),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut records = lock(&self.records)?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        Ok(records.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryEngagements {
    records: Mutex<Vec<Engagement>>,
}

#[async_trait]
impl EngagementStore for MemoryEngagements {
    async fn find(
        &self,
        volunteer_id: &str,
        company_id: &str,
    ) -> Result<Option<Engagement>, AppError> {
        let key = Engagement::key(volunteer_id, company_id);
        let records = lock(&self.records)?;
        Ok(records.iter().find(|e| e.id == key).cloned())
    }

    async fn insert(&self, engagement: &Engagement) -> Result<(), AppError> {
        let mut records = lock(&self.records)?;
        if records.iter().any(|e| e.id == engagement.id) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "engagement already exists"
            )));
        }
        records.push(engagement.clone());
        Ok(())
    }

    async fn activate(
        &self,
        volunteer_id: &str,
        company_id: &str,
    ) -> Result<Option<Engagement>, AppError> {
        let key = Engagement::key(volunteer_id, company_id);
        let mut records = lock(&self.records)?;
        Ok(records
            .iter_mut()
            .find(|e| e.id == key && e.status == EngagementStatus::Pending)
            .map(|e| {
                e.status = EngagementStatus::Active;
                e.updated_at = Utc::now();
                e.clone()
            }))
    }

    async fn remove(&self, volunteer_id: &str, company_id: &str) -> Result<bool, AppError> {
        let key = Engagement::key(volunteer_id, company_id);
        let mut records = lock(&self.records)?;
        let before = records.len();
        records.retain(|e| e.id != key);
        Ok(records.len() < before)
    }

    async fn list(
        &self,
        kind: ActorKind,
        id: &str,
        status: EngagementStatus,
    ) -> Result<Vec<Engagement>, AppError> {
        let records = lock(&self.records)?;
        Ok(records
            .iter()
            .filter(|e| e.party(kind) == id && e.status == status)
            .cloned()
            .collect())
    }

    async fn remove_all_for(&self, kind: ActorKind, id: &str) -> Result<u64, AppError> {
        let mut records = lock(&self.records)?;
        let before = records.len();
        records.retain(|e| e.party(kind) != id);
        Ok((before - records.len()) as u64)
    }
}

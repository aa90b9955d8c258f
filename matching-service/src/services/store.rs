//! Persistence seams for accounts and engagements.

use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;

use crate::models::{Account, ActorKind, Company, Engagement, EngagementStatus, Volunteer};
use crate::services::database::{MongoAccounts, MongoDb, MongoEngagements};
use crate::services::memory::{MemoryAccounts, MemoryEngagements};

#[async_trait]
pub trait AccountStore<A: Account>: Send + Sync {
    /// Persist a new account. Fails with `Conflict` when the handle or email is taken.
    async fn insert(&self, account: &A) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<A>, AppError>;
    /// Accounts whose handle or email equals `login`, handle matches first.
    /// One account's handle may equal another account's email.
    async fn find_by_login(&self, login: &str) -> Result<Vec<A>, AppError>;
    async fn find_by_token_seed(&self, token_seed: &str) -> Result<Option<A>, AppError>;
    async fn find_many(&self, ids: &[String]) -> Result<Vec<A>, AppError>;
    async fn list_all(&self) -> Result<Vec<A>, AppError>;
    /// Overwrite an existing account. Fails with `Conflict` on a uniqueness clash.
    async fn save(&self, account: &A) -> Result<(), AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait EngagementStore: Send + Sync {
    async fn find(
        &self,
        volunteer_id: &str,
        company_id: &str,
    ) -> Result<Option<Engagement>, AppError>;
    /// Fails with `Conflict` when the pair already has an engagement.
    async fn insert(&self, engagement: &Engagement) -> Result<(), AppError>;
    /// Move a pending engagement to active. `None` when no pending record exists.
    async fn activate(
        &self,
        volunteer_id: &str,
        company_id: &str,
    ) -> Result<Option<Engagement>, AppError>;
    async fn remove(&self, volunteer_id: &str, company_id: &str) -> Result<bool, AppError>;
    /// Engagements of one party in the given state, oldest first.
    async fn list(
        &self,
        kind: ActorKind,
        id: &str,
        status: EngagementStatus,
    ) -> Result<Vec<Engagement>, AppError>;
    async fn remove_all_for(&self, kind: ActorKind, id: &str) -> Result<u64, AppError>;
}

/// Handles to every collection the service uses.
#[derive(Clone)]
pub struct Store {
    pub volunteers: Arc<dyn AccountStore<Volunteer>>,
    pub companies: Arc<dyn AccountStore<Company>>,
    pub engagements: Arc<dyn EngagementStore>,
    mongo: Option<MongoDb>,
}

impl Store {
    pub fn mongo(db: &MongoDb) -> Self {
        Self {
            volunteers: Arc::new(MongoAccounts::<Volunteer>::new(db)),
            companies: Arc::new(MongoAccounts::<Company>::new(db)),
            engagements: Arc::new(MongoEngagements::new(db)),
            mongo: Some(db.clone()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            volunteers: Arc::new(MemoryAccounts::<Volunteer>::default()),
            companies: Arc::new(MemoryAccounts::<Company>::default()),
            engagements: Arc::new(MemoryEngagements::default()),
            mongo: None,
        }
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        match &self.mongo {
            Some(db) => db.health_check().await,
            None => Ok(()),
        }
    }
}

/// Typed access to the account store for `A`.
pub trait AccountsOf<A: Account> {
    fn accounts(&self) -> Arc<dyn AccountStore<A>>;
}

impl AccountsOf<Volunteer> for Store {
    fn accounts(&self) -> Arc<dyn AccountStore<Volunteer>> {
        self.volunteers.clone()
    }
}

impl AccountsOf<Company> for Store {
    fn accounts(&self) -> Arc<dyn AccountStore<Company>> {
        self.companies.clone()
    }
}

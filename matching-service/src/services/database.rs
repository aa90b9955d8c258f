use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use crate::models::{Account, ActorKind, Company, Engagement, EngagementStatus, Volunteer};
use crate::services::store::{AccountStore, EngagementStore};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for matching-service");

        self.account_indexes::<Volunteer>().await?;
        self.account_indexes::<Company>().await?;

        let engagements = self.engagements();
        create_index(
            &engagements,
            doc! { "volunteer_id": 1, "company_id": 1 },
            "volunteer_company_unique",
            true,
        )
        .await?;
        // The compound index above already serves volunteer-side lookups.
        create_index(
            &engagements,
            doc! { "company_id": 1, "status": 1 },
            "company_status_lookup",
            false,
        )
        .await?;
        tracing::info!("Created indexes on engagements");

        Ok(())
    }

    async fn account_indexes<A: Account>(&self) -> Result<(), AppError> {
        let accounts = self.accounts::<A>();
        let handle_field = A::HANDLE_FIELD;
        create_index(
            &accounts,
            doc! { handle_field: 1 },
            &format!("{}_unique", A::HANDLE_FIELD),
            true,
        )
        .await?;
        create_index(&accounts, doc! { "email": 1 }, "email_unique", true).await?;
        create_index(
            &accounts,
            doc! { "credentials.token_seed": 1 },
            "token_seed_unique",
            true,
        )
        .await?;
        tracing::info!(collection = A::COLLECTION, "Created indexes on accounts");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn accounts<A: Account>(&self) -> Collection<A> {
        self.db.collection(A::COLLECTION)
    }

    pub fn engagements(&self) -> Collection<Engagement> {
        self.db.collection("engagements")
    }
}

async fn create_index<T>(
    collection: &Collection<T>,
    keys: Document,
    name: &str,
    unique: bool,
) -> Result<(), AppError> {
    let index = IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(name.to_string())
                .unique(unique)
                .build(),
        )
        .build();

    collection.create_index(index, None).await.map_err(|e| {
        tracing::error!(index = %name, "Failed to create index: {}", e);
        AppError::from(e)
    })?;
    Ok(())
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

fn conflict_or_db<A: Account>(err: mongodb::error::Error) -> AppError {
    if is_duplicate_key(&err) {
        AppError::Conflict(anyhow::anyhow!(
            "{} with that name or email already exists",
            A::KIND
        ))
    } else {
        AppError::from(err)
    }
}

pub struct MongoAccounts<A> {
    collection: Collection<A>,
}

impl<A: Account> MongoAccounts<A> {
    pub fn new(db: &MongoDb) -> Self {
        Self {
            collection: db.accounts::<A>(),
        }
    }
}

#[async_trait]
impl<A: Account> AccountStore<A> for MongoAccounts<A> {
    async fn insert(&self, account: &A) -> Result<(), AppError> {
        self.collection
            .insert_one(account, None)
            .await
            .map_err(conflict_or_db::<A>)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<A>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_by_login(&self, login: &str) -> Result<Vec<A>, AppError> {
        let handle_field = A::HANDLE_FIELD;
        let cursor = self
            .collection
            .find(
                doc! { "$or": [ { handle_field: login }, { "email": login } ] },
                None,
            )
            .await?;
        let mut accounts: Vec<A> = cursor.try_collect().await?;
        accounts.sort_by_key(|a| a.handle() != login);
        Ok(accounts)
    }

    async fn find_by_token_seed(&self, token_seed: &str) -> Result<Option<A>, AppError> {
        Ok(self
            .collection
            .find_one(doc! { "credentials.token_seed": token_seed }, None)
            .await?)
    }

    async fn find_many(&self, ids: &[String]) -> Result<Vec<A>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids } }, None)
            .await?;
        let accounts: Vec<A> = cursor.try_collect().await?;
        Ok(accounts)
    }

    async fn list_all(&self) -> Result<Vec<A>, AppError> {
        let options = FindOptions::builder().sort(doc! { "created_at": 1 }).build();
        let cursor = self.collection.find(doc! {}, options).await?;
        let accounts: Vec<A> = cursor.try_collect().await?;
        Ok(accounts)
    }

    async fn save(&self, account: &A) -> Result<(), AppError> {
        let result = self
            .collection
            .replace_one(doc! { "_id": account.id() }, account, None)
            .await
            .map_err(conflict_or_db::<A>)?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("{} not found", A::KIND)));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}

pub struct MongoEngagements {
    collection: Collection<Engagement>,
}

impl MongoEngagements {
    pub fn new(db: &MongoDb) -> Self {
        Self {
            collection: db.engagements(),
        }
    }
}

#[async_trait]
impl EngagementStore for MongoEngagements {
    async fn find(
        &self,
        volunteer_id: &str,
        company_id: &str,
    ) -> Result<Option<Engagement>, AppError> {
        let key = Engagement::key(volunteer_id, company_id);
        Ok(self.collection.find_one(doc! { "_id": key }, None).await?)
    }

    async fn insert(&self, engagement: &Engagement) -> Result<(), AppError> {
        self.collection
            .insert_one(engagement, None)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    AppError::Conflict(anyhow::anyhow!("engagement already exists"))
                } else {
                    AppError::from(e)
                }
            })?;
        Ok(())
    }

    async fn activate(
        &self,
        volunteer_id: &str,
        company_id: &str,
    ) -> Result<Option<Engagement>, AppError> {
        let key = Engagement::key(volunteer_id, company_id);
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .collection
            .find_one_and_update(
                doc! { "_id": key, "status": EngagementStatus::Pending.as_str() },
                doc! { "$set": {
                    "status": EngagementStatus::Active.as_str(),
                    "updated_at": BsonDateTime::now(),
                } },
                options,
            )
            .await?)
    }

    async fn remove(&self, volunteer_id: &str, company_id: &str) -> Result<bool, AppError> {
        let key = Engagement::key(volunteer_id, company_id);
        let result = self.collection.delete_one(doc! { "_id": key }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list(
        &self,
        kind: ActorKind,
        id: &str,
        status: EngagementStatus,
    ) -> Result<Vec<Engagement>, AppError> {
        let field = kind.engagement_field();
        let options = FindOptions::builder().sort(doc! { "created_at": 1 }).build();
        let cursor = self
            .collection
            .find(doc! { field: id, "status": status.as_str() }, options)
            .await?;
        let engagements: Vec<Engagement> = cursor.try_collect().await?;
        Ok(engagements)
    }

    async fn remove_all_for(&self, kind: ActorKind, id: &str) -> Result<u64, AppError> {
        let field = kind.engagement_field();
        let result = self
            .collection
            .delete_many(doc! { field: id }, None)
            .await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::{bson, error::WriteError};

    fn write_error(code: i32) -> mongodb::error::Error {
        let failure: WriteError = bson::from_document(doc! {
            "code": code,
            "errmsg": "E11000 duplicate key error collection: matching.volunteers",
        })
        .unwrap();
        ErrorKind::Write(WriteFailure::WriteError(failure)).into()
    }

    #[test]
    fn duplicate_key_is_detected() {
        assert!(is_duplicate_key(&write_error(DUPLICATE_KEY)));
        assert!(!is_duplicate_key(&write_error(121)));

        let io: mongodb::error::Error =
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset").into();
        assert!(!is_duplicate_key(&io));
    }

    #[test]
    fn duplicate_key_maps_to_conflict() {
        match conflict_or_db::<Volunteer>(write_error(DUPLICATE_KEY)) {
            AppError::Conflict(e) => {
                assert_eq!(e.to_string(), "volunteer with that name or email already exists")
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert!(matches!(
            conflict_or_db::<Company>(write_error(121)),
            AppError::DatabaseError(_)
        ));
    }
}

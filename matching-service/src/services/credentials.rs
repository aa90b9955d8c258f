use rand::{rngs::OsRng, RngCore};
use service_core::error::AppError;
use std::sync::Arc;

use crate::models::{Account, Credentials};
use crate::services::metrics::record_account;
use crate::services::store::AccountStore;
use crate::services::tokens::TokenService;
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

const TOKEN_SEED_BYTES: usize = 64;

/// Fresh 512-bit token seed, hex encoded.
pub fn generate_token_seed() -> String {
    let mut bytes = [0u8; TOKEN_SEED_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Password and session-token operations for one account type.
pub struct CredentialStore<A: Account> {
    accounts: Arc<dyn AccountStore<A>>,
    tokens: TokenService,
}

impl<A: Account> CredentialStore<A> {
    pub fn new(accounts: Arc<dyn AccountStore<A>>, tokens: TokenService) -> Self {
        Self { accounts, tokens }
    }

    /// Validate the profile, hash the password and persist a new account.
    pub async fn create(&self, profile: A::Profile, password: &Password) -> Result<A, AppError> {
        validator::Validate::validate(&profile)?;
        if password.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!("password is required")));
        }

        let credentials = Credentials {
            password_hash: hash_password(password)?.into_string(),
            token_seed: generate_token_seed(),
        };
        let account = A::from_profile(profile, credentials);
        self.accounts.insert(&account).await?;

        record_account(A::KIND.as_str(), "created");
        tracing::info!(kind = %A::KIND, account_id = %account.id(), "Account created");
        Ok(account)
    }

    pub fn verify_password(&self, record: A, candidate: &Password) -> Result<A, AppError> {
        let stored = PasswordHashString::new(record.credentials().password_hash.clone());
        verify_password(candidate, &stored).map_err(|_| unauthorized())?;
        Ok(record)
    }

    /// Rotate the token seed, persist it and sign a token carrying the new seed.
    /// Every token issued before this call stops resolving.
    pub async fn create_token(&self, record: &mut A) -> Result<String, AppError> {
        record.credentials_mut().token_seed = generate_token_seed();
        record.touch();
        self.accounts.save(record).await?;
        self.tokens.issue(A::KIND, &record.credentials().token_seed)
    }

    /// Re-hash and persist. Leaves the token seed alone.
    pub async fn change_password(
        &self,
        record: &mut A,
        new_password: &Password,
    ) -> Result<(), AppError> {
        record.credentials_mut().password_hash = hash_password(new_password)?.into_string();
        record.touch();
        self.accounts.save(record).await
    }

    /// Apply allow-listed changes and an optional new password. A fresh token
    /// is issued when the handle or the password changed.
    pub async fn update(
        &self,
        mut record: A,
        changes: A::Changes,
        password: Option<Password>,
    ) -> Result<(A, Option<String>), AppError> {
        let handle_changed = record.apply_changes(changes);

        match &password {
            Some(new_password) => self.change_password(&mut record, new_password).await?,
            None => self.accounts.save(&record).await?,
        }

        let token = if handle_changed || password.is_some() {
            Some(self.create_token(&mut record).await?)
        } else {
            None
        };

        tracing::info!(
            kind = %A::KIND,
            account_id = %record.id(),
            reissued = token.is_some(),
            "Account updated"
        );
        Ok((record, token))
    }

    pub(crate) fn accounts(&self) -> &Arc<dyn AccountStore<A>> {
        &self.accounts
    }

    pub(crate) fn tokens(&self) -> &TokenService {
        &self.tokens
    }
}

pub(crate) fn unauthorized() -> AppError {
    AppError::Unauthorized(anyhow::anyhow!("unauthorized"))
}

use service_core::error::AppError;

use crate::models::Account;
use crate::services::credentials::{unauthorized, CredentialStore};
use crate::utils::Password;

/// Resolves request credentials to an account of type `A`.
pub struct AuthGate<A: Account> {
    credentials: CredentialStore<A>,
}

impl<A: Account> AuthGate<A> {
    pub fn new(credentials: CredentialStore<A>) -> Self {
        Self { credentials }
    }

    /// Basic mode: `login` is matched against the handle, then the email.
    /// The first candidate whose password verifies wins.
    pub async fn basic(&self, login: &str, password: &Password) -> Result<A, AppError> {
        let candidates = self.credentials.accounts().find_by_login(login).await?;
        if candidates.is_empty() {
            tracing::debug!(kind = %A::KIND, "Login rejected: unknown account");
            return Err(unauthorized());
        }

        for record in candidates {
            if let Ok(account) = self.credentials.verify_password(record, password) {
                return Ok(account);
            }
        }
        tracing::debug!(kind = %A::KIND, "Login rejected: password mismatch");
        Err(unauthorized())
    }

    /// Bearer mode: the token must verify, belong to `A`'s kind and carry
    /// the account's current seed.
    pub async fn bearer(&self, token: &str) -> Result<A, AppError> {
        let claims = self.credentials.tokens().verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Bearer token rejected");
            unauthorized()
        })?;
        if claims.kind != A::KIND {
            tracing::debug!(expected = %A::KIND, actual = %claims.kind, "Token kind mismatch");
            return Err(unauthorized());
        }
        self.credentials
            .accounts()
            .find_by_token_seed(&claims.token_seed)
            .await?
            .ok_or_else(unauthorized)
    }
}

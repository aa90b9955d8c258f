//! Request authentication as handler extractors.
//!
//! `Bearer<Volunteer>` or `Basic<Company>` in a handler signature resolves the
//! caller to a stored account, or rejects the request with 401.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{
        authorization::{Basic as BasicCredentials, Bearer as BearerToken},
        Authorization,
    },
    TypedHeader,
};
use service_core::error::AppError;

use crate::models::Account;
use crate::services::{credentials::unauthorized, AccountsOf, Store};
use crate::utils::Password;
use crate::AppState;

/// Account resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct Bearer<A>(pub A);

/// Account resolved from `Authorization: Basic base64(login:password)`.
#[derive(Debug, Clone)]
pub struct Basic<A>(pub A);

#[async_trait]
impl<A> FromRequestParts<AppState> for Bearer<A>
where
    A: Account,
    Store: AccountsOf<A>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<BearerToken>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    tracing::debug!(error = %e, "Missing or malformed bearer credentials");
                    unauthorized()
                })?;

        let account = state.gate::<A>().bearer(bearer.token()).await?;
        tracing::Span::current().record("actor_id", account.id());

        Ok(Bearer(account))
    }
}

#[async_trait]
impl<A> FromRequestParts<AppState> for Basic<A>
where
    A: Account,
    Store: AccountsOf<A>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(basic)) =
            TypedHeader::<Authorization<BasicCredentials>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    tracing::debug!(error = %e, "Missing or malformed basic credentials");
                    unauthorized()
                })?;

        let password = Password::new(basic.password().to_string());
        let account = state.gate::<A>().basic(basic.username(), &password).await?;
        tracing::Span::current().record("actor_id", account.id());

        Ok(Basic(account))
    }
}

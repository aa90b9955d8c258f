use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// JSON body that has passed its `validator` rules. Both parse and rule
/// failures surface as 400 through `AppError`.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

/// Companion to validator's `email` rule: the domain must contain a dot with
/// text on both sides, so `jane@x` is refused.
pub fn dotted_email_domain(email: &str) -> Result<(), ValidationError> {
    let dotted = email
        .rsplit_once('@')
        .and_then(|(_, domain)| domain.rsplit_once('.'))
        .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty());

    if dotted {
        Ok(())
    } else {
        Err(ValidationError::new("email").with_message(Cow::Borrowed("valid email required")))
    }
}

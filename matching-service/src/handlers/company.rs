use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::dtos::company::{
    ActiveVolunteersResponse, PendingVolunteersResponse, SignupCompanyRequest,
    UpdateCompanyRequest, UpdateCompanyResponse, VolunteerTarget,
};
use crate::dtos::TokenResponse;
use crate::middleware::{Basic, Bearer};
use crate::models::{Company, EngagementStatus};
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SignupCompanyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (profile, password) = body.into_parts();
    let credentials = state.credentials::<Company>();
    let mut company = credentials.create(profile, &password).await?;
    let token = credentials.create_token(&mut company).await?;
    Ok(Json(TokenResponse { token }))
}

pub async fn login(
    State(state): State<AppState>,
    Basic(mut company): Basic<Company>,
) -> Result<impl IntoResponse, AppError> {
    let token = state
        .credentials::<Company>()
        .create_token(&mut company)
        .await?;
    tracing::info!(company_id = %company.id, "Company logged in");
    Ok(Json(TokenResponse { token }))
}

pub async fn pending(
    State(state): State<AppState>,
    Bearer(company): Bearer<Company>,
) -> Result<impl IntoResponse, AppError> {
    let pending_volunteers = state
        .ledger
        .volunteers_of(&company.id, EngagementStatus::Pending)
        .await?;
    Ok(Json(PendingVolunteersResponse { pending_volunteers }))
}

pub async fn active(
    State(state): State<AppState>,
    Bearer(company): Bearer<Company>,
) -> Result<impl IntoResponse, AppError> {
    let active_volunteers = state
        .ledger
        .volunteers_of(&company.id, EngagementStatus::Active)
        .await?;
    Ok(Json(ActiveVolunteersResponse { active_volunteers }))
}

pub async fn update(
    State(state): State<AppState>,
    Bearer(company): Bearer<Company>,
    ValidatedJson(body): ValidatedJson<UpdateCompanyRequest>,
) -> Result<impl IntoResponse, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "<companyName>, <email>, <phoneNumber>, <website> or <password> are required to update company info"
        )));
    }

    let (changes, password) = body.into_parts();
    let (company, token) = state
        .credentials::<Company>()
        .update(company, changes, password)
        .await?;

    Ok(Json(UpdateCompanyResponse {
        company: company.censored(),
        token,
    }))
}

pub async fn approve(
    State(state): State<AppState>,
    Bearer(company): Bearer<Company>,
    ValidatedJson(target): ValidatedJson<VolunteerTarget>,
) -> Result<impl IntoResponse, AppError> {
    let volunteer_id = target
        .volunteer_id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("volunteer id is required")))?;

    let approval = state.ledger.approve(&company, &volunteer_id).await?;
    Ok(Json(approval))
}

pub async fn terminate(
    State(state): State<AppState>,
    Bearer(company): Bearer<Company>,
    ValidatedJson(target): ValidatedJson<VolunteerTarget>,
) -> Result<impl IntoResponse, AppError> {
    let volunteer_id = target
        .volunteer_id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("volunteer id is required")))?;

    let roster = state.ledger.terminate(&company, &volunteer_id).await?;
    Ok(Json(roster))
}

pub async fn delete(
    State(state): State<AppState>,
    Bearer(company): Bearer<Company>,
) -> Result<impl IntoResponse, AppError> {
    state.ledger.remove_company(&company).await?;
    Ok(StatusCode::NO_CONTENT)
}

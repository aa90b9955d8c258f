use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::dtos::volunteer::{
    ActiveCompaniesResponse, CompanyTarget, OpportunitiesResponse, PendingCompaniesResponse,
    SignupVolunteerRequest, UpdateVolunteerRequest, UpdateVolunteerResponse,
};
use crate::dtos::TokenResponse;
use crate::middleware::{Basic, Bearer};
use crate::models::{EngagementStatus, Volunteer};
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SignupVolunteerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (profile, password) = body.into_parts();
    let credentials = state.credentials::<Volunteer>();
    let mut volunteer = credentials.create(profile, &password).await?;
    let token = credentials.create_token(&mut volunteer).await?;
    Ok(Json(TokenResponse { token }))
}

pub async fn login(
    State(state): State<AppState>,
    Basic(mut volunteer): Basic<Volunteer>,
) -> Result<impl IntoResponse, AppError> {
    let token = state
        .credentials::<Volunteer>()
        .create_token(&mut volunteer)
        .await?;
    tracing::info!(volunteer_id = %volunteer.id, "Volunteer logged in");
    Ok(Json(TokenResponse { token }))
}

pub async fn opportunities(
    State(state): State<AppState>,
    Bearer(_volunteer): Bearer<Volunteer>,
) -> Result<impl IntoResponse, AppError> {
    let companies = state.ledger.opportunities().await?;
    Ok(Json(OpportunitiesResponse { companies }))
}

pub async fn pending(
    State(state): State<AppState>,
    Bearer(volunteer): Bearer<Volunteer>,
) -> Result<impl IntoResponse, AppError> {
    let pending_companies = state
        .ledger
        .companies_of(&volunteer.id, EngagementStatus::Pending)
        .await?;
    Ok(Json(PendingCompaniesResponse { pending_companies }))
}

pub async fn active(
    State(state): State<AppState>,
    Bearer(volunteer): Bearer<Volunteer>,
) -> Result<impl IntoResponse, AppError> {
    let active_companies = state
        .ledger
        .companies_of(&volunteer.id, EngagementStatus::Active)
        .await?;
    Ok(Json(ActiveCompaniesResponse { active_companies }))
}

pub async fn update(
    State(state): State<AppState>,
    Bearer(volunteer): Bearer<Volunteer>,
    ValidatedJson(body): ValidatedJson<UpdateVolunteerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "<userName>, <email>, <phoneNumber>, <firstName>, <lastName> or <password> are required to update volunteer info"
        )));
    }

    let (changes, password) = body.into_parts();
    let (volunteer, token) = state
        .credentials::<Volunteer>()
        .update(volunteer, changes, password)
        .await?;

    Ok(Json(UpdateVolunteerResponse {
        volunteer: volunteer.censored(),
        token,
    }))
}

pub async fn apply(
    State(state): State<AppState>,
    Bearer(volunteer): Bearer<Volunteer>,
    ValidatedJson(target): ValidatedJson<CompanyTarget>,
) -> Result<impl IntoResponse, AppError> {
    let company_id = target
        .company_id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("<companyId> is required to apply.")))?;

    let roster = state.ledger.apply(&volunteer, &company_id).await?;
    Ok(Json(roster))
}

pub async fn leave(
    State(state): State<AppState>,
    Bearer(volunteer): Bearer<Volunteer>,
    ValidatedJson(target): ValidatedJson<CompanyTarget>,
) -> Result<impl IntoResponse, AppError> {
    let company_id = target
        .company_id
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("company id is required")))?;

    let roster = state.ledger.leave(&volunteer, &company_id).await?;
    Ok(Json(roster))
}

pub async fn delete(
    State(state): State<AppState>,
    Bearer(volunteer): Bearer<Volunteer>,
) -> Result<impl IntoResponse, AppError> {
    state.ledger.remove_volunteer(&volunteer).await?;
    Ok(StatusCode::NO_CONTENT)
}

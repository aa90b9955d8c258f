//! Volunteer/company relationship state machine.
//!
//! Every pair moves `none -> pending -> active` and back to `none` on
//! terminate or leave. Each transition is a single engagement write.

use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;

use crate::dtos::company::{ApprovalResponse, CompanyRoster};
use crate::dtos::volunteer::VolunteerRoster;
use crate::models::{
    Account, ActorKind, Company, CompanyView, Engagement, EngagementStatus, Volunteer,
    VolunteerView,
};
use crate::services::metrics::{record_account, record_sms, record_transition};
use crate::services::sms::{SmsMessage, SmsProvider};
use crate::services::store::{AccountStore, Store};

pub struct RelationshipLedger {
    store: Store,
    sms: Arc<dyn SmsProvider>,
}

impl RelationshipLedger {
    pub fn new(store: Store, sms: Arc<dyn SmsProvider>) -> Self {
        Self { store, sms }
    }

    /// Volunteer asks to join a company.
    pub async fn apply(
        &self,
        volunteer: &Volunteer,
        company_id: &str,
    ) -> Result<VolunteerRoster, AppError> {
        self.company(company_id).await?;

        if self
            .store
            .engagements
            .find(&volunteer.id, company_id)
            .await?
            .is_some()
        {
            return Err(duplicate_volunteer());
        }

        match self
            .store
            .engagements
            .insert(&Engagement::pending(&volunteer.id, company_id))
            .await
        {
            Ok(()) => {}
            Err(AppError::Conflict(_)) => return Err(duplicate_volunteer()),
            Err(e) => return Err(e),
        }

        record_transition("apply");
        tracing::info!(volunteer_id = %volunteer.id, company_id = %company_id, "Volunteer applied");
        self.volunteer_roster(&volunteer.id).await
    }

    /// Company accepts a pending volunteer and notifies them by SMS. A failed
    /// SMS leaves the approval in place; `sid` is then absent.
    pub async fn approve(
        &self,
        company: &Company,
        volunteer_id: &str,
    ) -> Result<ApprovalResponse, AppError> {
        let pending = self
            .store
            .engagements
            .find(volunteer_id, &company.id)
            .await?
            .filter(|e| e.status == EngagementStatus::Pending);
        if pending.is_none() {
            return Err(not_pending());
        }

        let volunteer = self.volunteer(volunteer_id).await?;

        self.store
            .engagements
            .activate(volunteer_id, &company.id)
            .await?
            .ok_or_else(not_pending)?;

        record_transition("approve");
        tracing::info!(volunteer_id = %volunteer_id, company_id = %company.id, "Volunteer approved");

        let sid = self.notify_acceptance(&volunteer, company).await;
        let roster = self.company_roster(&company.id).await?;
        Ok(ApprovalResponse { sid, roster })
    }

    /// Company drops a volunteer, pending or active. Idempotent.
    pub async fn terminate(
        &self,
        company: &Company,
        volunteer_id: &str,
    ) -> Result<CompanyRoster, AppError> {
        self.volunteer(volunteer_id).await?;

        if self.store.engagements.remove(volunteer_id, &company.id).await? {
            record_transition("terminate");
            tracing::info!(volunteer_id = %volunteer_id, company_id = %company.id, "Volunteer terminated");
        }
        self.company_roster(&company.id).await
    }

    /// Volunteer withdraws from a company, pending or active. Idempotent.
    pub async fn leave(
        &self,
        volunteer: &Volunteer,
        company_id: &str,
    ) -> Result<VolunteerRoster, AppError> {
        self.company(company_id).await?;

        if self.store.engagements.remove(&volunteer.id, company_id).await? {
            record_transition("leave");
            tracing::info!(volunteer_id = %volunteer.id, company_id = %company_id, "Volunteer left");
        }
        self.volunteer_roster(&volunteer.id).await
    }

    /// Every company, censored.
    pub async fn opportunities(&self) -> Result<Vec<CompanyView>, AppError> {
        let companies = self.store.companies.list_all().await?;
        Ok(companies.iter().map(CompanyView::from).collect())
    }

    pub async fn companies_of(
        &self,
        volunteer_id: &str,
        status: EngagementStatus,
    ) -> Result<Vec<CompanyView>, AppError> {
        let ids = self
            .counterpart_ids(ActorKind::Volunteer, volunteer_id, status)
            .await?;
        let companies = self.store.companies.find_many(&ids).await?;
        Ok(in_order(&ids, companies)
            .iter()
            .map(CompanyView::from)
            .collect())
    }

    pub async fn volunteers_of(
        &self,
        company_id: &str,
        status: EngagementStatus,
    ) -> Result<Vec<VolunteerView>, AppError> {
        let ids = self
            .counterpart_ids(ActorKind::Company, company_id, status)
            .await?;
        let volunteers = self.store.volunteers.find_many(&ids).await?;
        Ok(in_order(&ids, volunteers)
            .iter()
            .map(VolunteerView::from)
            .collect())
    }

    pub async fn volunteer_roster(&self, volunteer_id: &str) -> Result<VolunteerRoster, AppError> {
        Ok(VolunteerRoster {
            pending_companies: self
                .companies_of(volunteer_id, EngagementStatus::Pending)
                .await?,
            active_companies: self
                .companies_of(volunteer_id, EngagementStatus::Active)
                .await?,
        })
    }

    pub async fn company_roster(&self, company_id: &str) -> Result<CompanyRoster, AppError> {
        Ok(CompanyRoster {
            pending_volunteers: self
                .volunteers_of(company_id, EngagementStatus::Pending)
                .await?,
            active_volunteers: self
                .volunteers_of(company_id, EngagementStatus::Active)
                .await?,
        })
    }

    /// Drop the volunteer, then every engagement naming them.
    pub async fn remove_volunteer(&self, volunteer: &Volunteer) -> Result<(), AppError> {
        self.remove_account(volunteer, self.store.volunteers.as_ref())
            .await
    }

    /// Drop the company, then every engagement naming it.
    pub async fn remove_company(&self, company: &Company) -> Result<(), AppError> {
        self.remove_account(company, self.store.companies.as_ref())
            .await
    }

    async fn remove_account<A: Account>(
        &self,
        account: &A,
        accounts: &dyn AccountStore<A>,
    ) -> Result<(), AppError> {
        accounts.delete(account.id()).await?;
        let released = self
            .store
            .engagements
            .remove_all_for(A::KIND, account.id())
            .await?;

        record_account(A::KIND.as_str(), "deleted");
        tracing::info!(
            kind = %A::KIND,
            account_id = %account.id(),
            released_engagements = released,
            "Account deleted"
        );
        Ok(())
    }

    async fn notify_acceptance(&self, volunteer: &Volunteer, company: &Company) -> Option<String> {
        let sms = SmsMessage {
            to: volunteer.phone_number.clone(),
            body: acceptance_message(&volunteer.first_name, &company.company_name),
        };

        match self.sms.send(&sms).await {
            Ok(response) => {
                record_sms(self.sms.name(), "sent");
                tracing::info!(
                    sid = ?response.provider_id,
                    to = %sms.to,
                    "Acceptance SMS sent"
                );
                response.provider_id
            }
            Err(e) => {
                record_sms(self.sms.name(), "failed");
                tracing::warn!(error = %e, volunteer_id = %volunteer.id, "Acceptance SMS failed");
                None
            }
        }
    }

    async fn counterpart_ids(
        &self,
        kind: ActorKind,
        id: &str,
        status: EngagementStatus,
    ) -> Result<Vec<String>, AppError> {
        let engagements = self.store.engagements.list(kind, id, status).await?;
        Ok(engagements
            .iter()
            .map(|e| e.counterpart(kind).to_string())
            .collect())
    }

    async fn company(&self, company_id: &str) -> Result<Company, AppError> {
        self.store
            .companies
            .find_by_id(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("company not found.")))
    }

    async fn volunteer(&self, volunteer_id: &str) -> Result<Volunteer, AppError> {
        self.store
            .volunteers
            .find_by_id(volunteer_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("volunteer not found.")))
    }
}

pub fn acceptance_message(first_name: &str, company_name: &str) -> String {
    format!(
        "Congratulations {}, you've been accepted as a volunteer by {}!",
        first_name, company_name
    )
}

fn duplicate_volunteer() -> AppError {
    AppError::Conflict(anyhow::anyhow!("duplicate volunteer."))
}

fn not_pending() -> AppError {
    AppError::NotFound(anyhow::anyhow!(
        "volunteer does not exist in pending volunteers"
    ))
}

/// Reorder `records` to follow `ids`, skipping ids with no record.
fn in_order<A: Account>(ids: &[String], records: Vec<A>) -> Vec<A> {
    let mut by_id: HashMap<String, A> = records
        .into_iter()
        .map(|r| (r.id().to_string(), r))
        .collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

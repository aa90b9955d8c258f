use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{CompanyChanges, CompanyProfile, CompanyView, VolunteerView};
use crate::utils::Password;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupCompanyRequest {
    #[validate(length(min = 1, message = "companyName is required"))]
    pub company_name: String,
    #[validate(
        email(message = "valid email required"),
        custom(function = "crate::utils::dotted_email_domain")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "phoneNumber is required"))]
    pub phone_number: String,
    #[validate(length(min = 1, message = "website is required"))]
    pub website: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl SignupCompanyRequest {
    pub fn into_parts(self) -> (CompanyProfile, Password) {
        (
            CompanyProfile {
                company_name: self.company_name,
                email: self.email,
                phone_number: self.phone_number,
                website: self.website,
            },
            Password::new(self.password),
        )
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, message = "companyName cannot be empty"))]
    pub company_name: Option<String>,
    #[validate(
        email(message = "valid email required"),
        custom(function = "crate::utils::dotted_email_domain")
    )]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "phoneNumber cannot be empty"))]
    pub phone_number: Option<String>,
    #[validate(length(min = 1, message = "website cannot be empty"))]
    pub website: Option<String>,
    #[validate(length(min = 1, message = "password cannot be empty"))]
    pub password: Option<String>,
}

impl UpdateCompanyRequest {
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.website.is_none()
            && self.password.is_none()
    }

    pub fn into_parts(self) -> (CompanyChanges, Option<Password>) {
        (
            CompanyChanges {
                company_name: self.company_name,
                email: self.email,
                phone_number: self.phone_number,
                website: self.website,
            },
            self.password.map(Password::new),
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCompanyResponse {
    #[serde(flatten)]
    pub company: CompanyView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Body of `/company/approve` and `/company/terminate`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerTarget {
    #[validate(length(min = 1, message = "volunteerId cannot be empty"))]
    pub volunteer_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRoster {
    pub pending_volunteers: Vec<VolunteerView>,
    pub active_volunteers: Vec<VolunteerView>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    /// Delivery id of the acceptance SMS; absent when sending failed.
    pub sid: Option<String>,
    #[serde(flatten)]
    pub roster: CompanyRoster,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingVolunteersResponse {
    pub pending_volunteers: Vec<VolunteerView>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveVolunteersResponse {
    pub active_volunteers: Vec<VolunteerView>,
}

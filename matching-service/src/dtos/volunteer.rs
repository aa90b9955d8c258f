use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{CompanyView, VolunteerChanges, VolunteerProfile, VolunteerView};
use crate::utils::Password;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupVolunteerRequest {
    #[validate(length(min = 1, message = "firstName is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "lastName is required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "userName is required"))]
    pub user_name: String,
    #[validate(
        email(message = "valid email required"),
        custom(function = "crate::utils::dotted_email_domain")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "phoneNumber is required"))]
    pub phone_number: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl SignupVolunteerRequest {
    pub fn into_parts(self) -> (VolunteerProfile, Password) {
        (
            VolunteerProfile {
                first_name: self.first_name,
                last_name: self.last_name,
                user_name: self.user_name,
                email: self.email,
                phone_number: self.phone_number,
            },
            Password::new(self.password),
        )
    }
}

/// Fields a volunteer may change about themselves. Anything else in the body
/// is ignored.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVolunteerRequest {
    #[validate(length(min = 1, message = "firstName cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "lastName cannot be empty"))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, message = "userName cannot be empty"))]
    pub user_name: Option<String>,
    #[validate(
        email(message = "valid email required"),
        custom(function = "crate::utils::dotted_email_domain")
    )]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "phoneNumber cannot be empty"))]
    pub phone_number: Option<String>,
    #[validate(length(min = 1, message = "password cannot be empty"))]
    pub password: Option<String>,
}

impl UpdateVolunteerRequest {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.user_name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.password.is_none()
    }

    pub fn into_parts(self) -> (VolunteerChanges, Option<Password>) {
        (
            VolunteerChanges {
                first_name: self.first_name,
                last_name: self.last_name,
                user_name: self.user_name,
                email: self.email,
                phone_number: self.phone_number,
            },
            self.password.map(Password::new),
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateVolunteerResponse {
    #[serde(flatten)]
    pub volunteer: VolunteerView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Body of `/volunteer/apply` and `/volunteer/leave`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompanyTarget {
    #[validate(length(min = 1, message = "companyId cannot be empty"))]
    pub company_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpportunitiesResponse {
    pub companies: Vec<CompanyView>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerRoster {
    pub pending_companies: Vec<CompanyView>,
    pub active_companies: Vec<CompanyView>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCompaniesResponse {
    pub pending_companies: Vec<CompanyView>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCompaniesResponse {
    pub active_companies: Vec<CompanyView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_signup_fields_fail_validation() {
        let request: SignupVolunteerRequest =
            serde_json::from_str(r#"{"firstName":"Jane","email":"jane@x.com"}"#).unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("last_name"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("first_name"));
    }

    #[test]
    fn update_ignores_unlisted_fields() {
        let request: UpdateVolunteerRequest =
            serde_json::from_str(r#"{"tokenSeed":"x","passwordHash":"y"}"#).unwrap();
        assert!(request.is_empty());
    }

    #[test]
    fn update_rejects_bad_email() {
        let request = UpdateVolunteerRequest {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }
}

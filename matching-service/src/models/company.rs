use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::account::{Account, ActorKind, Credentials};

/// Identity fields supplied at signup.
#[derive(Debug, Clone, Validate)]
pub struct CompanyProfile {
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
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    #[serde(rename = "_id")]
    pub id: String,
    pub company_name: String,
    pub email: String,
    pub phone_number: String,
    pub website: String,
    pub credentials: Credentials,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CompanyChanges {
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub website: Option<String>,
}

/// Public projection, used for opportunities and relationship lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyView {
    pub company_id: String,
    pub company_name: String,
    pub phone_number: String,
    pub email: String,
    pub website: String,
}

impl Company {
    pub fn new(profile: CompanyProfile, credentials: Credentials) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            company_name: profile.company_name,
            email: profile.email,
            phone_number: profile.phone_number,
            website: profile.website,
            credentials,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn censored(&self) -> CompanyView {
        CompanyView::from(self)
    }
}

impl From<&Company> for CompanyView {
    fn from(c: &Company) -> Self {
        Self {
            company_id: c.id.clone(),
            company_name: c.company_name.clone(),
            phone_number: c.phone_number.clone(),
            email: c.email.clone(),
            website: c.website.clone(),
        }
    }
}

impl Account for Company {
    const KIND: ActorKind = ActorKind::Company;
    const COLLECTION: &'static str = "companies";
    const HANDLE_FIELD: &'static str = "company_name";

    type Profile = CompanyProfile;
    type Changes = CompanyChanges;

    fn from_profile(profile: Self::Profile, credentials: Credentials) -> Self {
        Company::new(profile, credentials)
    }

    fn apply_changes(&mut self, changes: Self::Changes) -> bool {
        let mut handle_changed = false;
        if let Some(company_name) = changes.company_name {
            handle_changed = company_name != self.company_name;
            self.company_name = company_name;
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        if let Some(phone_number) = changes.phone_number {
            self.phone_number = phone_number;
        }
        if let Some(website) = changes.website {
            self.website = website;
        }
        self.touch();
        handle_changed
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn handle(&self) -> &str {
        &self.company_name
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn credentials_mut(&mut self) -> &mut Credentials {
        &mut self.credentials
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

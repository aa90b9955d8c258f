use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::account::{Account, ActorKind, Credentials};

/// Identity fields supplied at signup.
#[derive(Debug, Clone, Validate)]
pub struct VolunteerProfile {
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
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volunteer {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    pub phone_number: String,
    pub credentials: Credentials,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Allow-listed profile changes. Credentials are handled separately.
#[derive(Debug, Clone, Default)]
pub struct VolunteerChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

/// Censored projection safe to hand to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerView {
    pub volunteer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    pub email: String,
    pub phone_number: String,
}

impl Volunteer {
    pub fn new(profile: VolunteerProfile, credentials: Credentials) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            first_name: profile.first_name,
            last_name: profile.last_name,
            user_name: profile.user_name,
            email: profile.email,
            phone_number: profile.phone_number,
            credentials,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn censored(&self) -> VolunteerView {
        VolunteerView::from(self)
    }
}

impl From<&Volunteer> for VolunteerView {
    fn from(v: &Volunteer) -> Self {
        Self {
            volunteer_id: v.id.clone(),
            first_name: v.first_name.clone(),
            last_name: v.last_name.clone(),
            user_name: v.user_name.clone(),
            email: v.email.clone(),
            phone_number: v.phone_number.clone(),
        }
    }
}

impl Account for Volunteer {
    const KIND: ActorKind = ActorKind::Volunteer;
    const COLLECTION: &'static str = "volunteers";
    const HANDLE_FIELD: &'static str = "user_name";

    type Profile = VolunteerProfile;
    type Changes = VolunteerChanges;

    fn from_profile(profile: Self::Profile, credentials: Credentials) -> Self {
        Volunteer::new(profile, credentials)
    }

    fn apply_changes(&mut self, changes: Self::Changes) -> bool {
        let mut handle_changed = false;
        if let Some(first_name) = changes.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = last_name;
        }
        if let Some(user_name) = changes.user_name {
            handle_changed = user_name != self.user_name;
            self.user_name = user_name;
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        if let Some(phone_number) = changes.phone_number {
            self.phone_number = phone_number;
        }
        self.touch();
        handle_changed
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn handle(&self) -> &str {
        &self.user_name
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

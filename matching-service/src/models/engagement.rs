use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::ActorKind;

/// State of a volunteer/company pair. Absence of a record means no relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementStatus {
    Pending,
    Active,
}

impl EngagementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementStatus::Pending => "pending",
            EngagementStatus::Active => "active",
        }
    }
}

/// Join record between one volunteer and one company.
///
/// Both sides' pending/active lists are read from this single record, so the
/// relation cannot drift out of symmetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engagement {
    /// Deterministic `volunteer_id:company_id`; the primary key doubles as the
    /// uniqueness guard for the pair.
    #[serde(rename = "_id")]
    pub id: String,
    pub volunteer_id: String,
    pub company_id: String,
    pub status: EngagementStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Engagement {
    pub fn key(volunteer_id: &str, company_id: &str) -> String {
        format!("{}:{}", volunteer_id, company_id)
    }

    /// A fresh application awaiting the company's decision.
    pub fn pending(volunteer_id: &str, company_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Self::key(volunteer_id, company_id),
            volunteer_id: volunteer_id.to_string(),
            company_id: company_id.to_string(),
            status: EngagementStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Id of the party of the given kind.
    pub fn party(&self, kind: ActorKind) -> &str {
        match kind {
            ActorKind::Volunteer => &self.volunteer_id,
            ActorKind::Company => &self.company_id,
        }
    }

    /// Id of the party on the other side from `kind`.
    pub fn counterpart(&self, kind: ActorKind) -> &str {
        match kind {
            ActorKind::Volunteer => &self.company_id,
            ActorKind::Company => &self.volunteer_id,
        }
    }
}

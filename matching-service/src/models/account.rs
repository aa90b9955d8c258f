//! Behaviour shared by the two actor types.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use validator::Validate;

/// Which side of the marketplace an account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Volunteer,
    Company,
}

impl ActorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorKind::Volunteer => "volunteer",
            ActorKind::Company => "company",
        }
    }

    /// Field on an engagement that references an actor of this kind.
    pub fn engagement_field(&self) -> &'static str {
        match self {
            ActorKind::Volunteer => "volunteer_id",
            ActorKind::Company => "company_id",
        }
    }
}

impl std::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secret material stored alongside an account. Never serialized to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub password_hash: String,
    /// Embedded in every issued token; replacing it revokes them all.
    pub token_seed: String,
}

/// A persisted actor that can sign up, log in and hold sessions.
pub trait Account: Clone + Serialize + DeserializeOwned + Unpin + Send + Sync + 'static {
    const KIND: ActorKind;
    /// MongoDB collection holding this account type.
    const COLLECTION: &'static str;
    /// Document field holding the unique login handle.
    const HANDLE_FIELD: &'static str;

    /// Identity fields collected at signup.
    type Profile: Validate + Send + 'static;
    /// Allow-listed profile changes accepted on update.
    type Changes: Send + 'static;

    fn from_profile(profile: Self::Profile, credentials: Credentials) -> Self;

    /// Apply `changes` in place. Returns true when the login handle changed.
    fn apply_changes(&mut self, changes: Self::Changes) -> bool;

    fn id(&self) -> &str;
    fn handle(&self) -> &str;
    fn email(&self) -> &str;
    fn credentials(&self) -> &Credentials;
    fn credentials_mut(&mut self) -> &mut Credentials;
    /// Bump the modification timestamp.
    fn touch(&mut self);
}

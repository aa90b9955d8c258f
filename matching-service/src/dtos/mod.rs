pub mod company;
pub mod volunteer;

use serde::{Deserialize, Serialize};

/// Session token returned by signup, login and credential-changing updates.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

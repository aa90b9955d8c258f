pub mod credentials;
pub mod database;
pub mod gate;
pub mod ledger;
pub mod memory;
pub mod metrics;
pub mod sms;
pub mod store;
pub mod tokens;

pub use credentials::CredentialStore;
pub use database::MongoDb;
pub use gate::AuthGate;
pub use ledger::RelationshipLedger;
pub use sms::{MockSmsProvider, SmsProvider, TwilioProvider};
pub use store::{AccountStore, AccountsOf, EngagementStore, Store};
pub use tokens::TokenService;

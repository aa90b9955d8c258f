pub mod auth;

pub use auth::{Basic, Bearer};

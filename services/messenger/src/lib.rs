//! Private messaging service
//!
//! Users register, log in for a signed session token, and exchange directed
//! messages. Every protected route runs through the guards in
//! [`middleware`]; per-message rules live in [`messages`].

pub mod config;
pub mod error;
pub mod identity;
pub mod jwt;
pub mod messages;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod validation;

pub use state::AppState;

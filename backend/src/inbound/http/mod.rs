//! HTTP inbound adapter exposing the REST surface.

pub mod auth;
pub mod books;
pub mod error;
pub mod guilds;
pub mod health;
pub mod notes;
pub mod progress;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

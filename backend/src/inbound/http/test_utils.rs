//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::web;

use crate::inbound::http::state::HttpState;
use crate::server::state_builders::in_memory_services;

/// Session middleware for tests: fresh key, `session` cookie, no `Secure`
/// flag so plain HTTP test requests carry it.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// HTTP state over fresh in-memory adapters.
pub fn test_http_state() -> web::Data<HttpState> {
    web::Data::new(in_memory_services().http)
}

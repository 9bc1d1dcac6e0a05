//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on domain ports and stay testable without real adapters behind them.

use std::sync::Arc;

use crate::domain::catalog::BookCatalog;
use crate::domain::ports::{
    MembershipCommand, MembershipQuery, NoteCommand, NoteQuery, ProgressCommand, ProgressQuery,
    UserDirectory,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub directory: Arc<dyn UserDirectory>,
    pub membership: Arc<dyn MembershipCommand>,
    pub membership_query: Arc<dyn MembershipQuery>,
    pub progress: Arc<dyn ProgressCommand>,
    pub progress_query: Arc<dyn ProgressQuery>,
    pub notes: Arc<dyn NoteCommand>,
    pub notes_query: Arc<dyn NoteQuery>,
    pub catalog: Arc<dyn BookCatalog>,
}

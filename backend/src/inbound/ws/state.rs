//! Shared WebSocket adapter state.
//!
//! The WebSocket entry point and per-connection handler depend only on
//! domain query ports plus the change hub, so snapshots are always computed
//! through the same gated paths the REST surface uses.

use std::sync::Arc;

use crate::domain::ports::{MembershipQuery, NoteQuery, ProgressQuery};
use crate::domain::sync::SyncHub;

/// Dependency bundle for WebSocket handlers.
#[derive(Clone)]
pub struct WsState {
    pub membership: Arc<dyn MembershipQuery>,
    pub progress: Arc<dyn ProgressQuery>,
    pub notes: Arc<dyn NoteQuery>,
    pub hub: SyncHub,
}

impl WsState {
    /// Construct state from explicit port implementations.
    pub fn new(
        membership: Arc<dyn MembershipQuery>,
        progress: Arc<dyn ProgressQuery>,
        notes: Arc<dyn NoteQuery>,
        hub: SyncHub,
    ) -> Self {
        Self {
            membership,
            progress,
            notes,
            hub,
        }
    }
}

//! Builders assembling domain services over the in-memory adapters.

use std::sync::Arc;

use crate::domain::catalog::BookCatalog;
use crate::domain::ports::{
    MembershipCommand, MembershipQuery, NoteCommand, NoteQuery, ProgressCommand, ProgressQuery,
    UserDirectory,
};
use crate::domain::sync::SyncHub;
use crate::domain::{MembershipService, NoteService, ProgressService};
use crate::inbound::http::state::HttpState;
use crate::inbound::ws::state::WsState;
use crate::outbound::catalog::StaticCatalog;
use crate::outbound::persistence::{
    InMemoryGuildRepository, InMemoryNoteRepository, InMemoryProgressRepository,
    InMemoryUserDirectory,
};

/// Fully wired dependency bundles for the HTTP and WebSocket surfaces.
///
/// Both bundles share one set of adapters and one [`SyncHub`], so a command
/// accepted over HTTP is observable on every WebSocket subscription.
pub struct AppServices {
    pub http: HttpState,
    pub ws: WsState,
    pub hub: SyncHub,
}

/// Wire the domain services over fresh in-memory adapters and the seeded
/// book catalog.
pub fn in_memory_services() -> AppServices {
    let guilds = Arc::new(InMemoryGuildRepository::new());
    let directory = Arc::new(InMemoryUserDirectory::new());
    let progress_repo = Arc::new(InMemoryProgressRepository::new());
    let notes_repo = Arc::new(InMemoryNoteRepository::new());
    let catalog = Arc::new(StaticCatalog::seeded());
    let hub = SyncHub::new();

    let membership = Arc::new(MembershipService::new(
        guilds.clone(),
        directory.clone(),
        hub.clone(),
    ));
    let progress = Arc::new(ProgressService::new(
        guilds.clone(),
        directory.clone(),
        progress_repo.clone(),
        catalog.clone(),
        hub.clone(),
    ));
    let notes = Arc::new(NoteService::new(
        guilds,
        directory.clone(),
        notes_repo,
        progress_repo,
        hub.clone(),
    ));

    let http = HttpState {
        directory: directory as Arc<dyn UserDirectory>,
        membership: membership.clone() as Arc<dyn MembershipCommand>,
        membership_query: membership.clone() as Arc<dyn MembershipQuery>,
        progress: progress.clone() as Arc<dyn ProgressCommand>,
        progress_query: progress.clone() as Arc<dyn ProgressQuery>,
        notes: notes.clone() as Arc<dyn NoteCommand>,
        notes_query: notes.clone() as Arc<dyn NoteQuery>,
        catalog: catalog as Arc<dyn BookCatalog>,
    };
    let ws = WsState::new(
        membership as Arc<dyn MembershipQuery>,
        progress as Arc<dyn ProgressQuery>,
        notes as Arc<dyn NoteQuery>,
        hub.clone(),
    );

    AppServices { http, ws, hub }
}

//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] generates the OpenAPI specification for the REST API. It
//! registers every HTTP endpoint from the inbound layer, the domain schemas
//! those endpoints exchange, and the session cookie security scheme.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    Book, Chapter, Error, ErrorCode, GhostProgress, Guild, GuildOverview, InvitePreview, Member,
    MemberRole, Note, NoteTimeline, Progress, UserProfile,
};
use crate::inbound::http::auth::SignInRequest;
use crate::inbound::http::guilds::{CreateGuildRequest, JoinGuildRequest};
use crate::inbound::http::notes::PostNoteRequest;
use crate::inbound::http::progress::UpdateProgressRequest;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/session.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Guildbook backend API",
        description = "HTTP interface for guild membership, listening progress, \
                       spoiler-gated notes, and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::sign_in,
        crate::inbound::http::auth::current_session,
        crate::inbound::http::auth::sign_out,
        crate::inbound::http::guilds::create_guild,
        crate::inbound::http::guilds::join_guild,
        crate::inbound::http::guilds::leave_guild,
        crate::inbound::http::guilds::current_guild,
        crate::inbound::http::guilds::invite_preview,
        crate::inbound::http::books::list_books,
        crate::inbound::http::books::get_book,
        crate::inbound::http::progress::update_progress,
        crate::inbound::http::progress::get_progress,
        crate::inbound::http::progress::get_guild_progress,
        crate::inbound::http::notes::post_note,
        crate::inbound::http::notes::get_notes,
        crate::inbound::http::notes::delete_note,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Book,
        Chapter,
        Error,
        ErrorCode,
        GhostProgress,
        Guild,
        GuildOverview,
        InvitePreview,
        Member,
        MemberRole,
        Note,
        NoteTimeline,
        Progress,
        UserProfile,
        SignInRequest,
        CreateGuildRequest,
        JoinGuildRequest,
        UpdateProgressRequest,
        PostNoteRequest,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use utoipa::OpenApi;

    use super::ApiDoc;

    #[rstest]
    fn document_lists_every_rest_path() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for expected in [
            "/api/v1/session",
            "/api/v1/guilds",
            "/api/v1/guilds/join",
            "/api/v1/guilds/leave",
            "/api/v1/guilds/current",
            "/api/v1/invites/{code}",
            "/api/v1/books",
            "/api/v1/books/{bookId}",
            "/api/v1/books/{bookId}/progress",
            "/api/v1/books/{bookId}/progress/guild",
            "/api/v1/books/{bookId}/notes",
            "/api/v1/notes/{noteId}",
            "/health/ready",
            "/health/live",
        ] {
            assert!(paths.contains_key(expected), "missing path {expected}");
        }
    }

    #[rstest]
    fn document_declares_session_cookie_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}

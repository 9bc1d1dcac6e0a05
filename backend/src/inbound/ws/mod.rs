//! WebSocket inbound adapter.
//!
//! Responsibilities:
//! - authenticate upgrade requests via the session cookie
//! - resolve the reader's guild before any subscription exists
//! - hand the connection to the per-session handler

use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use serde::Deserialize;
use tracing::error;

use crate::inbound::http::session::SessionContext;
use crate::inbound::http::validation::parse_book_id;

mod session;

pub mod messages;
pub mod state;

/// Query parameters for the `/ws` upgrade.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsQuery {
    /// Book whose progress and note snapshots this connection follows.
    pub book_id: String,
}

/// Handle the WebSocket upgrade for `GET /ws?bookId=...`.
///
/// Membership is checked before the upgrade completes, so a reader outside
/// a guild never holds a subscription.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<state::WsState>,
    http_session: SessionContext,
    req: HttpRequest,
    stream: Payload,
    query: web::Query<WsQuery>,
) -> actix_web::Result<HttpResponse> {
    let reader = http_session.require_user_id()?;
    let book_id = parse_book_id(&query.book_id)?;
    let overview = state.membership.overview(&reader).await?;

    let (response, session, msg_stream) = actix_ws::handle(&req, stream).map_err(|err| {
        error!(error = %err, "websocket upgrade failed");
        err
    })?;
    actix_web::rt::spawn(session::handle_ws_session(
        state.into_inner(),
        reader,
        overview.guild.id,
        book_id,
        session,
        msg_stream,
    ));
    Ok(response)
}

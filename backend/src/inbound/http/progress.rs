//! Listening-progress API handlers.
//!
//! ```text
//! PUT /api/v1/books/{bookId}/progress {"positionSeconds":3725.0}
//! GET /api/v1/books/{bookId}/progress
//! GET /api/v1/books/{bookId}/progress/guild
//! ```

use actix_web::{get, put, web};
use serde::Deserialize;

use crate::domain::progress::{GhostProgress, Progress};
use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_book_id;

/// Request body for `PUT /api/v1/books/{bookId}/progress`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    pub position_seconds: f64,
}

/// Record the signed-in reader's position. The reported position replaces
/// the stored one, including seeks backwards.
#[utoipa::path(
    put,
    path = "/api/v1/books/{bookId}/progress",
    params(("bookId" = String, Path, description = "Catalog book id")),
    request_body = UpdateProgressRequest,
    responses(
        (status = 200, description = "Progress recorded", body = Progress),
        (status = 400, description = "Malformed position", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not a guild member", body = Error),
        (status = 404, description = "Unknown book", body = Error)
    ),
    tag = "progress",
    operation_id = "updateProgress"
)]
#[put("/books/{book_id}/progress")]
pub async fn update_progress(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateProgressRequest>,
) -> ApiResult<web::Json<Progress>> {
    let user_id = session.require_user_id()?;
    let book_id = parse_book_id(&path)?;
    let record = state
        .progress
        .update_progress(&user_id, &book_id, payload.position_seconds)
        .await?;
    Ok(web::Json(record))
}

/// The signed-in reader's own progress; zeroes when never started.
#[utoipa::path(
    get,
    path = "/api/v1/books/{bookId}/progress",
    params(("bookId" = String, Path, description = "Catalog book id")),
    responses(
        (status = 200, description = "Progress", body = Progress),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not a guild member", body = Error)
    ),
    tag = "progress",
    operation_id = "getProgress"
)]
#[get("/books/{book_id}/progress")]
pub async fn get_progress(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Progress>> {
    let user_id = session.require_user_id()?;
    let book_id = parse_book_id(&path)?;
    let record = state.progress_query.progress(&user_id, &book_id).await?;
    Ok(web::Json(record))
}

/// Guildmates' positions for the ghost markers, furthest behind first.
#[utoipa::path(
    get,
    path = "/api/v1/books/{bookId}/progress/guild",
    params(("bookId" = String, Path, description = "Catalog book id")),
    responses(
        (status = 200, description = "Peer progress", body = [GhostProgress]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not a guild member", body = Error)
    ),
    tag = "progress",
    operation_id = "getGuildProgress"
)]
#[get("/books/{book_id}/progress/guild")]
pub async fn get_guild_progress(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<GhostProgress>>> {
    let user_id = session.require_user_id()?;
    let book_id = parse_book_id(&path)?;
    let ghosts = state
        .progress_query
        .ghost_progress(&user_id, &book_id)
        .await?;
    Ok(web::Json(ghosts))
}

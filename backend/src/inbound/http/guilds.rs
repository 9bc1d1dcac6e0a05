//! Guild membership API handlers.
//!
//! ```text
//! POST /api/v1/guilds {"name":"Night Shift"}
//! POST /api/v1/guilds/join {"inviteCode":"AB23CD"}
//! POST /api/v1/guilds/leave
//! GET  /api/v1/guilds/current
//! GET  /api/v1/invites/{code}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;

use crate::domain::ports::{GuildOverview, InvitePreview};
use crate::domain::{Error, Guild};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/guilds`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGuildRequest {
    pub name: String,
}

/// Request body for `POST /api/v1/guilds/join`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinGuildRequest {
    pub invite_code: String,
}

/// Create a guild owned by the signed-in user.
#[utoipa::path(
    post,
    path = "/api/v1/guilds",
    request_body = CreateGuildRequest,
    responses(
        (status = 201, description = "Guild created", body = Guild),
        (status = 400, description = "Invalid name", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 409, description = "Already in a guild", body = Error),
        (status = 503, description = "Creation could not complete", body = Error)
    ),
    tag = "guilds",
    operation_id = "createGuild"
)]
#[post("/guilds")]
pub async fn create_guild(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateGuildRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let guild = state.membership.create_guild(&user_id, &payload.name).await?;
    Ok(HttpResponse::Created().json(guild))
}

/// Join the guild matching an invite code.
#[utoipa::path(
    post,
    path = "/api/v1/guilds/join",
    request_body = JoinGuildRequest,
    responses(
        (status = 200, description = "Joined", body = Guild),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "Unknown invite code", body = Error),
        (status = 409, description = "Already in a guild", body = Error)
    ),
    tag = "guilds",
    operation_id = "joinGuild"
)]
#[post("/guilds/join")]
pub async fn join_guild(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<JoinGuildRequest>,
) -> ApiResult<web::Json<Guild>> {
    let user_id = session.require_user_id()?;
    let guild = state
        .membership
        .join_guild(&user_id, &payload.invite_code)
        .await?;
    Ok(web::Json(guild))
}

/// Leave the current guild.
#[utoipa::path(
    post,
    path = "/api/v1/guilds/leave",
    responses(
        (status = 204, description = "Left the guild"),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Owners cannot leave", body = Error),
        (status = 409, description = "Not in a guild", body = Error)
    ),
    tag = "guilds",
    operation_id = "leaveGuild"
)]
#[post("/guilds/leave")]
pub async fn leave_guild(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    state.membership.leave_guild(&user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// The current guild with its ordered roster.
#[utoipa::path(
    get,
    path = "/api/v1/guilds/current",
    responses(
        (status = 200, description = "Current guild", body = GuildOverview),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "Not in a guild", body = Error)
    ),
    tag = "guilds",
    operation_id = "currentGuild"
)]
#[get("/guilds/current")]
pub async fn current_guild(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<GuildOverview>> {
    let user_id = session.require_user_id()?;
    let overview = state.membership_query.overview(&user_id).await?;
    Ok(web::Json(overview))
}

/// Preview the guild behind an invite code. Public: joiners see what they
/// are joining before signing in.
#[utoipa::path(
    get,
    path = "/api/v1/invites/{code}",
    params(("code" = String, Path, description = "Invite code, case-insensitive")),
    responses(
        (status = 200, description = "Invite preview", body = InvitePreview),
        (status = 404, description = "Unknown invite code", body = Error)
    ),
    tag = "guilds",
    operation_id = "invitePreview",
    security(())
)]
#[get("/invites/{code}")]
pub async fn invite_preview(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<InvitePreview>> {
    let preview = state.membership_query.invite_preview(&path).await?;
    Ok(web::Json(preview))
}

#[cfg(test)]
#[path = "guilds_tests.rs"]
mod guilds_tests;

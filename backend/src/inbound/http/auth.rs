//! Session API handlers.
//!
//! ```text
//! POST   /api/v1/session {"email":"ana@example.com"}
//! GET    /api/v1/session
//! DELETE /api/v1/session
//! ```
//!
//! Sign-in is email-only: the directory resolves (or creates) the profile
//! and the user id lands in the session cookie. There is no password layer
//! here; a fronting identity provider owns credential checks.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::Deserialize;

use crate::domain::ports::UserProfile;
use crate::domain::{Error, ErrorCode};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Sign-in request body for `POST /api/v1/session`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
}

/// Establish a session for the given email.
#[utoipa::path(
    post,
    path = "/api/v1/session",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = UserProfile,
         headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid email", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tag = "session",
    operation_id = "signIn",
    security(())
)]
#[post("/session")]
pub async fn sign_in(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignInRequest>,
) -> ApiResult<web::Json<UserProfile>> {
    let profile = state
        .directory
        .authenticate(&payload.email)
        .await
        .map_err(map_sign_in_error)?;
    session.persist_user(&profile.user_id)?;
    Ok(web::Json(profile))
}

fn map_sign_in_error(err: crate::domain::ports::DirectoryError) -> Error {
    use crate::domain::ports::DirectoryError;
    match err {
        DirectoryError::InvalidEmail { message } => {
            Error::new(ErrorCode::InvalidRequest, message).with_code_detail("email_invalid")
        }
        DirectoryError::Connection { message } => {
            Error::operation_failed(format!("user directory unavailable: {message}"))
        }
        DirectoryError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
    }
}

/// The signed-in user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    responses(
        (status = 200, description = "Current profile", body = UserProfile),
        (status = 401, description = "Not signed in", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tag = "session",
    operation_id = "currentSession"
)]
#[get("/session")]
pub async fn current_session(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserProfile>> {
    let user_id = session.require_user_id()?;
    let profile = state
        .directory
        .profile(&user_id)
        .await
        .map_err(map_sign_in_error)?
        .ok_or_else(|| Error::unauthorized("unknown user"))?;
    Ok(web::Json(profile))
}

/// Drop the session.
#[utoipa::path(
    delete,
    path = "/api/v1/session",
    responses(
        (status = 204, description = "Signed out"),
        (status = 500, description = "Internal server error")
    ),
    tag = "session",
    operation_id = "signOut",
    security(())
)]
#[delete("/session")]
pub async fn sign_out(session: SessionContext) -> ApiResult<HttpResponse> {
    session.clear();
    Ok(HttpResponse::NoContent().finish())
}

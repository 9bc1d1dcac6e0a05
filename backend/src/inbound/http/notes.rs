//! Note API handlers.
//!
//! ```text
//! POST   /api/v1/books/{bookId}/notes {"text":"!!","positionSeconds":5000.0}
//! GET    /api/v1/books/{bookId}/notes
//! DELETE /api/v1/notes/{noteId}
//! ```
//!
//! The timeline endpoint returns each requester a personal view: notes at
//! or behind their position plus their own, with everything ahead reduced
//! to a count.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::Deserialize;

use crate::domain::note::{Note, NoteTimeline};
use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_book_id, parse_note_id};

/// Request body for `POST /api/v1/books/{bookId}/notes`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostNoteRequest {
    pub text: String,
    pub position_seconds: f64,
}

/// Post a note anchored to a position in the book.
#[utoipa::path(
    post,
    path = "/api/v1/books/{bookId}/notes",
    params(("bookId" = String, Path, description = "Catalog book id")),
    request_body = PostNoteRequest,
    responses(
        (status = 201, description = "Note created", body = Note),
        (status = 400, description = "Empty or oversized note", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not a guild member", body = Error)
    ),
    tag = "notes",
    operation_id = "postNote"
)]
#[post("/books/{book_id}/notes")]
pub async fn post_note(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<PostNoteRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let book_id = parse_book_id(&path)?;
    let note = state
        .notes
        .post_note(&user_id, &book_id, &payload.text, payload.position_seconds)
        .await?;
    Ok(HttpResponse::Created().json(note))
}

/// The requester's spoiler-gated view of a book's notes.
#[utoipa::path(
    get,
    path = "/api/v1/books/{bookId}/notes",
    params(("bookId" = String, Path, description = "Catalog book id")),
    responses(
        (status = 200, description = "Timeline", body = NoteTimeline),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not a guild member", body = Error)
    ),
    tag = "notes",
    operation_id = "getNotes"
)]
#[get("/books/{book_id}/notes")]
pub async fn get_notes(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<NoteTimeline>> {
    let user_id = session.require_user_id()?;
    let book_id = parse_book_id(&path)?;
    let timeline = state.notes_query.timeline(&user_id, &book_id).await?;
    Ok(web::Json(timeline))
}

/// Delete one of the requester's own notes.
#[utoipa::path(
    delete,
    path = "/api/v1/notes/{noteId}",
    params(("noteId" = String, Path, description = "Note id")),
    responses(
        (status = 204, description = "Note deleted"),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not the author", body = Error),
        (status = 404, description = "No such note", body = Error)
    ),
    tag = "notes",
    operation_id = "deleteNote"
)]
#[delete("/notes/{note_id}")]
pub async fn delete_note(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let note_id = parse_note_id(&path)?;
    state.notes.delete_note(&user_id, &note_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

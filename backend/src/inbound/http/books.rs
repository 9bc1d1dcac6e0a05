//! Catalog API handlers.
//!
//! ```text
//! GET /api/v1/books
//! GET /api/v1/books/{bookId}
//! ```
//!
//! The catalog is read-only and public: book metadata carries no guild or
//! reader state.

use actix_web::{get, web};

use crate::domain::catalog::Book;
use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_book_id;

/// List the catalog.
#[utoipa::path(
    get,
    path = "/api/v1/books",
    responses(
        (status = 200, description = "All books", body = [Book])
    ),
    tag = "books",
    operation_id = "listBooks",
    security(())
)]
#[get("/books")]
pub async fn list_books(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<Book>>> {
    let books = state
        .catalog
        .books()
        .iter()
        .map(|book| Book::clone(book))
        .collect();
    Ok(web::Json(books))
}

/// Fetch one book with its chapter layout.
#[utoipa::path(
    get,
    path = "/api/v1/books/{bookId}",
    params(("bookId" = String, Path, description = "Catalog book id")),
    responses(
        (status = 200, description = "Book", body = Book),
        (status = 400, description = "Malformed id", body = Error),
        (status = 404, description = "Unknown book", body = Error)
    ),
    tag = "books",
    operation_id = "getBook",
    security(())
)]
#[get("/books/{book_id}")]
pub async fn get_book(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Book>> {
    let book_id = parse_book_id(&path)?;
    let book = state.catalog.book(&book_id).ok_or_else(|| {
        Error::not_found(format!("book {book_id} is not in the catalog"))
            .with_code_detail("unknown_book")
    })?;
    Ok(web::Json(Book::clone(&book)))
}

//! Whole-surface tests driving the REST API the way a client would: two or
//! three readers share one app instance and interact purely through requests
//! and session cookies.

use actix_http::Request;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};

use crate::inbound::http::test_utils::{test_http_state, test_session_middleware};
use crate::inbound::http::{auth, books, guilds, notes, progress};

async fn test_app() -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .wrap(test_session_middleware())
            .app_data(test_http_state())
            .service(
                web::scope("/api/v1")
                    .service(auth::sign_in)
                    .service(auth::current_session)
                    .service(auth::sign_out)
                    .service(guilds::create_guild)
                    .service(guilds::join_guild)
                    .service(guilds::leave_guild)
                    .service(guilds::current_guild)
                    .service(guilds::invite_preview)
                    .service(books::list_books)
                    .service(books::get_book)
                    .service(progress::update_progress)
                    .service(progress::get_progress)
                    .service(progress::get_guild_progress)
                    .service(notes::post_note)
                    .service(notes::get_notes)
                    .service(notes::delete_note),
            ),
    )
    .await
}

async fn sign_in<S>(app: &S, email: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/session")
            .set_json(json!({ "email": email }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}

async fn create_guild<S>(app: &S, cookie: &Cookie<'static>, name: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/guilds")
            .cookie(cookie.clone())
            .set_json(json!({ "name": name }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    test::read_body_json(res).await
}

async fn join_guild<S>(app: &S, cookie: &Cookie<'static>, invite_code: &str)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/guilds/join")
            .cookie(cookie.clone())
            .set_json(json!({ "inviteCode": invite_code }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

async fn first_book_id<S>(app: &S) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::get().uri("/api/v1/books").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    body[0]["id"].as_str().expect("book id").to_owned()
}

async fn set_progress<S>(
    app: &S,
    cookie: &Cookie<'static>,
    book_id: &str,
    position_seconds: f64,
) where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/books/{book_id}/progress"))
            .cookie(cookie.clone())
            .set_json(json!({ "positionSeconds": position_seconds }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

async fn post_note<S>(
    app: &S,
    cookie: &Cookie<'static>,
    book_id: &str,
    text: &str,
    position_seconds: f64,
) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/books/{book_id}/notes"))
            .cookie(cookie.clone())
            .set_json(json!({ "text": text, "positionSeconds": position_seconds }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    test::read_body_json(res).await
}

async fn timeline<S>(app: &S, cookie: &Cookie<'static>, book_id: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/books/{book_id}/notes"))
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    test::read_body_json(res).await
}

fn visible_texts(timeline: &Value) -> Vec<String> {
    timeline["visible"]
        .as_array()
        .expect("visible notes")
        .iter()
        .map(|note| note["text"].as_str().expect("note text").to_owned())
        .collect()
}

#[actix_web::test]
async fn spoiler_gate_follows_each_readers_own_progress() {
    let app = test_app().await;
    let ana = sign_in(&app, "ana@example.com").await;
    let bo = sign_in(&app, "bo@example.com").await;

    let guild = create_guild(&app, &ana, "Night Shift").await;
    let code = guild["inviteCode"].as_str().expect("invite code");
    join_guild(&app, &bo, code).await;

    let book_id = first_book_id(&app).await;
    set_progress(&app, &ana, &book_id, 5000.0).await;
    post_note(&app, &ana, &book_id, "early aside", 1000.0).await;
    post_note(&app, &ana, &book_id, "the reveal", 4500.0).await;

    // Bo is only at 2000s, so the reveal stays hidden.
    set_progress(&app, &bo, &book_id, 2000.0).await;
    let view = timeline(&app, &bo, &book_id).await;
    assert_eq!(visible_texts(&view), ["early aside"]);
    assert_eq!(view["hiddenCount"], 1);

    // Catching up past the note position reveals it on the next read.
    set_progress(&app, &bo, &book_id, 4600.0).await;
    let view = timeline(&app, &bo, &book_id).await;
    assert_eq!(visible_texts(&view), ["early aside", "the reveal"]);
    assert_eq!(view["hiddenCount"], 0);

    // Authors always see their own notes regardless of position.
    let view = timeline(&app, &ana, &book_id).await;
    assert_eq!(visible_texts(&view), ["early aside", "the reveal"]);
}

#[actix_web::test]
async fn ghost_progress_lists_peers_sorted_and_never_the_requester() {
    let app = test_app().await;
    let ana = sign_in(&app, "ana@example.com").await;
    let bo = sign_in(&app, "bo@example.com").await;
    let cora = sign_in(&app, "cora@example.com").await;

    let guild = create_guild(&app, &ana, "Listeners").await;
    let code = guild["inviteCode"].as_str().expect("invite code");
    join_guild(&app, &bo, code).await;
    join_guild(&app, &cora, code).await;

    let book_id = first_book_id(&app).await;
    set_progress(&app, &ana, &book_id, 300.0).await;
    set_progress(&app, &bo, &book_id, 9000.0).await;
    set_progress(&app, &cora, &book_id, 1200.0).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/books/{book_id}/progress/guild"))
            .cookie(ana.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let ghosts: Value = test::read_body_json(res).await;
    let ghosts = ghosts.as_array().expect("ghost list");

    assert_eq!(ghosts.len(), 2);
    assert_eq!(ghosts[0]["displayName"], "cora");
    assert_eq!(ghosts[1]["displayName"], "bo");
    let slower = ghosts[0]["percent"].as_f64().expect("percent");
    let faster = ghosts[1]["percent"].as_f64().expect("percent");
    assert!(slower < faster);
}

#[actix_web::test]
async fn note_deletion_is_restricted_to_the_author() {
    let app = test_app().await;
    let ana = sign_in(&app, "ana@example.com").await;
    let bo = sign_in(&app, "bo@example.com").await;

    let guild = create_guild(&app, &ana, "Night Shift").await;
    let code = guild["inviteCode"].as_str().expect("invite code");
    join_guild(&app, &bo, code).await;

    let book_id = first_book_id(&app).await;
    let note = post_note(&app, &bo, &book_id, "mine to remove", 10.0).await;
    let note_id = note["id"].as_str().expect("note id");

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/notes/{note_id}"))
            .cookie(ana.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/notes/{note_id}"))
            .cookie(bo.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let view = timeline(&app, &bo, &book_id).await;
    assert!(visible_texts(&view).is_empty());
}

#[actix_web::test]
async fn failed_join_leaves_the_reader_guildless() {
    let app = test_app().await;
    let bo = sign_in(&app, "bo@example.com").await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/guilds/join")
            .cookie(bo.clone())
            .set_json(json!({ "inviteCode": "ZZZZ99" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/guilds/current")
            .cookie(bo.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn sign_out_invalidates_the_session() {
    let app = test_app().await;
    let ana = sign_in(&app, "ana@example.com").await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/session")
            .cookie(ana.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/v1/session")
            .cookie(ana.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

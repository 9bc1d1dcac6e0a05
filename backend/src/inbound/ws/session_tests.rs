//! WebSocket session handler tests.
//!
//! These drive a real listener so the session cookie handshake, the upgrade,
//! and the push loop are exercised end to end.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{App, HttpServer, web};
use awc::error::WsClientError;
use awc::{BoxedSocket, ws::Codec, ws::Frame, ws::Message};
use futures_util::{SinkExt, StreamExt};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use crate::inbound::http::{auth, books, guilds, progress};
use crate::inbound::ws;
use crate::server::state_builders::in_memory_services;

struct TestServer {
    url: String,
    handle: ServerHandle,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        drop(self.handle.stop(false));
    }
}

#[fixture]
async fn server() -> TestServer {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let services = in_memory_services();
    let http_state = web::Data::new(services.http);
    let ws_state = web::Data::new(services.ws);
    let key = Key::generate();
    let server = HttpServer::new(move || {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_name("session".to_owned())
            .cookie_secure(false)
            .build();
        App::new()
            .app_data(http_state.clone())
            .app_data(ws_state.clone())
            .wrap(session)
            .service(
                web::scope("/api/v1")
                    .service(auth::sign_in)
                    .service(guilds::create_guild)
                    .service(guilds::join_guild)
                    .service(books::list_books)
                    .service(progress::update_progress),
            )
            .service(ws::ws_entry)
    })
    .listen(listener)
    .expect("bind test server")
    .disable_signals()
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    TestServer {
        url: format!("http://{addr}"),
        handle,
    }
}

async fn sign_in(url: &str, email: &str) -> Cookie<'static> {
    let client = awc::Client::default();
    let resp = client
        .post(format!("{url}/api/v1/session"))
        .send_json(&json!({ "email": email }))
        .await
        .expect("sign-in request");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.cookie("session").expect("session cookie").into_owned()
}

async fn create_guild(url: &str, cookie: &Cookie<'static>, name: &str) -> Value {
    let client = awc::Client::default();
    let mut resp = client
        .post(format!("{url}/api/v1/guilds"))
        .cookie(cookie.clone())
        .send_json(&json!({ "name": name }))
        .await
        .expect("create guild request");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("guild body")
}

async fn first_book_id(url: &str) -> String {
    let client = awc::Client::default();
    let mut resp = client
        .get(format!("{url}/api/v1/books"))
        .send()
        .await
        .expect("books request");
    assert_eq!(resp.status(), StatusCode::OK);
    let books: Value = resp.json().await.expect("books body");
    books[0]["id"].as_str().expect("book id").to_owned()
}

async fn connect_ws(
    url: &str,
    cookie: &Cookie<'static>,
    book_id: &str,
) -> actix_codec::Framed<BoxedSocket, Codec> {
    let (_resp, socket) = awc::Client::default()
        .ws(format!("{url}/ws?bookId={book_id}"))
        .cookie(cookie.clone())
        .connect()
        .await
        .expect("websocket connect");
    socket
}

/// Read the next text frame, keeping the heartbeat alive by answering pings.
async fn next_text_frame(socket: &mut actix_codec::Framed<BoxedSocket, Codec>) -> Value {
    loop {
        let frame = socket.next().await.expect("frame").expect("frame");
        match frame {
            Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json frame"),
            Frame::Ping(payload) => {
                socket.send(Message::Pong(payload)).await.expect("pong");
            }
            Frame::Pong(_) => {}
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

#[rstest]
#[actix_rt::test]
async fn connection_opens_with_guild_ghosts_and_notes_snapshots(#[future] server: TestServer) {
    let server = server.await;
    let cookie = sign_in(&server.url, "ana@example.com").await;
    create_guild(&server.url, &cookie, "Night Shift").await;
    let book_id = first_book_id(&server.url).await;

    let mut socket = connect_ws(&server.url, &cookie, &book_id).await;

    let guild = next_text_frame(&mut socket).await;
    assert_eq!(guild["type"], "guild");
    assert_eq!(guild["guild"]["memberCount"], 1);
    assert_eq!(guild["members"].as_array().map(Vec::len), Some(1));

    let ghosts = next_text_frame(&mut socket).await;
    assert_eq!(ghosts["type"], "ghostProgress");
    assert_eq!(ghosts["bookId"], book_id.as_str());
    assert_eq!(ghosts["ghosts"].as_array().map(Vec::len), Some(0));

    let notes = next_text_frame(&mut socket).await;
    assert_eq!(notes["type"], "notes");
    assert_eq!(
        notes["timeline"]["visible"].as_array().map(Vec::len),
        Some(0)
    );
    assert_eq!(notes["timeline"]["hiddenCount"], 0);
}

#[rstest]
#[actix_rt::test]
async fn peer_join_and_progress_reach_an_open_socket(#[future] server: TestServer) {
    let server = server.await;
    let owner = sign_in(&server.url, "owner@example.com").await;
    let created = create_guild(&server.url, &owner, "Listeners").await;
    let invite_code = created["inviteCode"].as_str().expect("invite code");
    let book_id = first_book_id(&server.url).await;

    let mut socket = connect_ws(&server.url, &owner, &book_id).await;
    for _ in 0..3 {
        next_text_frame(&mut socket).await;
    }

    let peer = sign_in(&server.url, "peer@example.com").await;
    let client = awc::Client::default();
    let resp = client
        .post(format!("{}/api/v1/guilds/join", server.url))
        .cookie(peer.clone())
        .send_json(&json!({ "inviteCode": invite_code }))
        .await
        .expect("join request");
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = client
        .put(format!("{}/api/v1/books/{book_id}/progress", server.url))
        .cookie(peer.clone())
        .send_json(&json!({ "positionSeconds": 120.0 }))
        .await
        .expect("progress request");
    assert_eq!(resp.status(), StatusCode::OK);

    let mut saw_roster = false;
    let mut saw_ghost = false;
    for _ in 0..6 {
        let frame = next_text_frame(&mut socket).await;
        match frame["type"].as_str() {
            Some("guild") => {
                assert_eq!(frame["guild"]["memberCount"], 2);
                saw_roster = true;
            }
            Some("ghostProgress") => {
                let ghosts = frame["ghosts"].as_array().expect("ghosts array");
                if ghosts.len() == 1 {
                    assert_eq!(ghosts[0]["displayName"], "peer");
                    saw_ghost = true;
                }
            }
            _ => {}
        }
        if saw_roster && saw_ghost {
            break;
        }
    }
    assert!(saw_roster, "roster push after peer join");
    assert!(saw_ghost, "ghost push after peer progress");
}

#[rstest]
#[actix_rt::test]
async fn upgrade_without_a_guild_is_rejected(#[future] server: TestServer) {
    let server = server.await;
    let cookie = sign_in(&server.url, "drifter@example.com").await;
    let book_id = first_book_id(&server.url).await;

    let error = awc::Client::default()
        .ws(format!("{}/ws?bookId={book_id}", server.url))
        .cookie(cookie)
        .connect()
        .await
        .err()
        .expect("upgrade must fail");
    match error {
        WsClientError::InvalidResponseStatus(status) => {
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[rstest]
#[actix_rt::test]
async fn upgrade_without_a_session_is_rejected(#[future] server: TestServer) {
    let server = server.await;
    let book_id = first_book_id(&server.url).await;

    let error = awc::Client::default()
        .ws(format!("{}/ws?bookId={book_id}", server.url))
        .connect()
        .await
        .err()
        .expect("upgrade must fail");
    match error {
        WsClientError::InvalidResponseStatus(status) => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

use actix_http::Request;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};

use super::*;
use crate::inbound::http::auth;
use crate::inbound::http::test_utils::{test_http_state, test_session_middleware};

async fn test_app() -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .wrap(test_session_middleware())
            .app_data(test_http_state())
            .service(
                web::scope("/api/v1")
                    .service(auth::sign_in)
                    .service(create_guild)
                    .service(join_guild)
                    .service(leave_guild)
                    .service(current_guild)
                    .service(invite_preview),
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

#[actix_web::test]
async fn creating_a_guild_requires_a_session() {
    let app = test_app().await;
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/guilds")
            .set_json(json!({ "name": "Night Shift" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn create_join_and_leave_round_trip() {
    let app = test_app().await;
    let ana = sign_in(&app, "ana@example.com").await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/guilds")
            .cookie(ana.clone())
            .set_json(json!({ "name": "Night Shift" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let guild: Value = test::read_body_json(res).await;
    let code = guild["inviteCode"].as_str().expect("invite code").to_owned();

    let bo = sign_in(&app, "bo@example.com").await;
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/guilds/join")
            .cookie(bo.clone())
            .set_json(json!({ "inviteCode": code.to_lowercase() }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let joined: Value = test::read_body_json(res).await;
    assert_eq!(joined["memberCount"], json!(2));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/guilds/current")
            .cookie(bo.clone())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let overview: Value = test::read_body_json(res).await;
    let members = overview["members"].as_array().expect("roster");
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["role"], json!("owner"));

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/guilds/leave")
            .cookie(bo)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // The owner stays pinned to the guild.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/guilds/leave")
            .cookie(ana)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn joining_with_an_unknown_code_is_not_found() {
    let app = test_app().await;
    let bo = sign_in(&app, "bo@example.com").await;
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/guilds/join")
            .cookie(bo)
            .set_json(json!({ "inviteCode": "ZZZZ99" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["details"]["code"], json!("invite_code_invalid"));
}

#[actix_web::test]
async fn a_second_guild_is_a_conflict() {
    let app = test_app().await;
    let ana = sign_in(&app, "ana@example.com").await;
    for (expected, name) in [
        (StatusCode::CREATED, "First Crew"),
        (StatusCode::CONFLICT, "Second Crew"),
    ] {
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/guilds")
                .cookie(ana.clone())
                .set_json(json!({ "name": name }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
    }
}

#[actix_web::test]
async fn invite_preview_needs_no_session() {
    let app = test_app().await;
    let ana = sign_in(&app, "ana@example.com").await;
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/guilds")
            .cookie(ana)
            .set_json(json!({ "name": "Night Shift" }))
            .to_request(),
    )
    .await;
    let guild: Value = test::read_body_json(res).await;
    let code = guild["inviteCode"].as_str().expect("invite code");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/invites/{code}"))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let preview: Value = test::read_body_json(res).await;
    assert_eq!(preview["guildName"], json!("Night Shift"));
    assert_eq!(preview["memberCount"], json!(1));
    assert!(preview.get("id").is_none());
}

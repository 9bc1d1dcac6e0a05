//! Server construction and middleware wiring.

pub mod config;
pub mod state_builders;

pub use config::ServerConfig;
pub use state_builders::{AppServices, in_memory_services};

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::auth::{current_session, sign_in, sign_out};
use crate::inbound::http::books::{get_book, list_books};
use crate::inbound::http::guilds::{
    create_guild, current_guild, invite_preview, join_guild, leave_guild,
};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::notes::{delete_note, get_notes, post_note};
use crate::inbound::http::progress::{get_guild_progress, get_progress, update_progress};
use crate::inbound::http::state::HttpState;
use crate::inbound::ws;
use crate::inbound::ws::state::WsState;
use crate::middleware::Trace;
#[cfg(debug_assertions)]
use utoipa::OpenApi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

/// Session cookie middleware shared by the REST and WebSocket surfaces.
fn session_middleware(
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build()
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let api = web::scope("/api/v1")
        .service(sign_in)
        .service(current_session)
        .service(sign_out)
        .service(create_guild)
        .service(join_guild)
        .service(leave_guild)
        .service(current_guild)
        .service(invite_preview)
        .service(list_books)
        .service(get_book)
        .service(update_progress)
        .service(get_progress)
        .service(get_guild_progress)
        .service(post_note)
        .service(get_notes)
        .service(delete_note);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        // Session middleware sits at app level because the WebSocket entry
        // authenticates with the same cookie as the REST surface.
        .wrap(session_middleware(key, cookie_secure, same_site))
        .wrap(Trace)
        .service(api)
        .service(ws::ws_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.route(
        "/api-docs/openapi.json",
        web::get().to(|| async { web::Json(ApiDoc::openapi()) }),
    );
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and
/// configuration.
///
/// The WebSocket entry shares its session middleware-issued identity with the
/// REST surface because both sit behind the same cookie.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let services = in_memory_services();
    let http_state = web::Data::new(services.http);
    let ws_state = web::Data::new(services.ws);
    let server_health_state = health_state.clone();
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

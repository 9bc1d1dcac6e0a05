//! Backend entry-point: wires REST endpoints, the WebSocket entry, and
//! OpenAPI docs behind one listener.

use std::env;
use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use actix_web::web;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::server::{ServerConfig, create_server};

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "guildbook", about = "Guild sync backend for shared audiobook listening")]
struct Cli {
    /// Socket address to listen on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,
}

/// Load the session signing key from `SESSION_KEY_FILE`.
///
/// Falls back to an ephemeral key in debug builds, or when
/// `SESSION_ALLOW_EPHEMERAL=1`, so local development works without secrets.
fn load_session_key() -> std::io::Result<Key> {
    let key_path =
        env::var("SESSION_KEY_FILE").unwrap_or_else(|_| "/var/run/secrets/session_key".into());
    match std::fs::read(&key_path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(e) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {key_path}: {e}"
                )))
            }
        }
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let key = load_session_key()?;
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .map(|v| v != "0")
        .unwrap_or(true);

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(key, cookie_secure, SameSite::Lax, cli.bind);
    let server = create_server(health_state, config)?;
    server.await
}

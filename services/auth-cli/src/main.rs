//! Bearer-auth CLI
//!
//! Single-binary client that:
//! 1. Loads the API base URL, login and static headers from TOML
//! 2. Logs in (or resumes a session from AUTH_ACCESS_TOKEN/AUTH_REFRESH_TOKEN)
//! 3. GETs one path, transparently refreshing an expired token
//! 4. Prints the JSON payload to stdout (logs go to stderr)

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bearer_auth::{AuthClient, StaticHeaders};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::HttpTransport;

use crate::config::Config;

/// Value following `flag` in the argument list, if any.
fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn build_client(config: &Config) -> Result<AuthClient> {
    let transport = HttpTransport::new(
        config.api.base_url.as_str(),
        Duration::from_secs(config.api.timeout_secs),
    )
    .context("failed to build HTTP transport")?;
    info!(base_url = transport.base_url(), "HTTP transport ready");

    let mut builder =
        AuthClient::builder(Arc::new(transport)).transform(StaticHeaders::new(&config.headers));
    if let Some(ref session) = config.auth.session {
        builder = builder.credentials(session.clone());
    }
    Ok(builder.build())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = Config::resolve_path(arg_value(&args, "--config"));
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        timeout_secs = config.api.timeout_secs,
        headers = config.headers.len(),
        resumed_session = config.auth.session.is_some(),
        "configuration loaded"
    );

    let client = build_client(&config)?;

    match (&config.auth.login, &config.auth.password) {
        (Some(login), Some(password)) => {
            client
                .login(login, password.expose())
                .await
                .with_context(|| format!("login as {login} failed"))?;
        }
        _ if client.is_authenticated() => info!("using resumed session"),
        _ => warn!("no login or session configured, sending unauthenticated request"),
    }

    let path = arg_value(&args, "--path").unwrap_or(&config.api.path);
    let payload: serde_json::Value = client
        .get_json(path)
        .await
        .with_context(|| format!("GET {path} failed"))?;

    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

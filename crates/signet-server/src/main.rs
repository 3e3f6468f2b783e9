// crates/signet-server/src/main.rs
// ============================================================================
// Module: Signet Server Entry Point
// Description: Binary entry point for the Signet HTTP server.
// Purpose: Load configuration, initialize tracing, and serve requests.
// Dependencies: signet-server, tokio, tracing-subscriber
// ============================================================================

//! ## Overview
//! Binary entry point. Configuration is loaded from the first command-line
//! argument, the `SIGNET_CONFIG` environment variable, or `signet.toml` in
//! the working directory; absent all three the server runs with defaults
//! (loopback bind, in-memory storage).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use signet_server::SignetConfig;
use signet_server::SignetServer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Initializes tracing with an environment-driven filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer()).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match SignetConfig::load_optional(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    let server = match SignetServer::from_config(config) {
        Ok(server) => server,
        Err(err) => {
            tracing::error!(error = %err, "failed to initialize server");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = server.serve().await {
        tracing::error!(error = %err, "server terminated");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

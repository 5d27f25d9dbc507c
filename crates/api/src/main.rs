use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notebridge_api::config::{CredentialBundle, ServerConfig};
use notebridge_api::router::build_app_router;
use notebridge_api::state::AppState;
use notebridge_google::auth::{DRIVE_SCOPE, SPREADSHEETS_SCOPE};
use notebridge_google::{DriveClient, ServiceAccountAuth, SheetsClient};
use notebridge_shotgrid::auth::ScriptCredentials;
use notebridge_shotgrid::ShotgridClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "notebridge_api=debug,notebridge_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let bundle = CredentialBundle::load(&config.credentials_path)
        .expect("Failed to load credential bundle");
    tracing::info!(
        path = %config.credentials_path.display(),
        client_email = %bundle.service_account.client_email,
        "Loaded credentials"
    );

    // --- Remote clients ---
    let http = reqwest::Client::new();

    let google_auth = Arc::new(
        ServiceAccountAuth::with_client(
            http.clone(),
            bundle.service_account,
            &[SPREADSHEETS_SCOPE, DRIVE_SCOPE],
        )
        .expect("Invalid service-account private key"),
    );

    let shotgrid = ShotgridClient::with_client(
        http.clone(),
        &config.shotgrid_url,
        ScriptCredentials {
            script_name: config.shotgrid_script_name.clone(),
            api_key: bundle.sg_api_key,
        },
    );
    tracing::info!(site = %config.shotgrid_url, "ShotGrid client ready");

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        review: Arc::new(shotgrid),
        sheets: Arc::new(SheetsClient::new(http.clone(), Arc::clone(&google_auth))),
        files: Arc::new(DriveClient::new(http, google_auth)),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

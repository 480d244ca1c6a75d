//! Command implementations for the search daemon.

use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use search_bridge::{IndexingPipeline, QueryRequest, QueryResponse, SearchService};
use search_client::{HttpTransportConfig, MatrixClient};
use search_index::{EventSearcher, SearchIndex, SearchIndexConfig, TantivyEngine};
use search_types::Settings;

use crate::server::{run_server_with_shutdown, AppState};

/// Install the global tracing subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

fn load_settings(config_path: Option<&str>, log_level_override: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    Ok(settings)
}

fn open_index(settings: &Settings) -> Result<SearchIndex> {
    let index_path = settings.expanded_index_path();
    fs::create_dir_all(&index_path)
        .with_context(|| format!("Failed to create index directory {:?}", index_path))?;

    let config = SearchIndexConfig::new(&index_path).with_memory_mb(settings.writer_memory_mb);
    SearchIndex::open_or_create(config).context("Failed to open search index")
}

/// Open (or create) the on-disk index named by `settings` for writing.
pub fn open_engine(settings: &Settings) -> Result<Arc<TantivyEngine>> {
    let index = open_index(settings)?;
    let engine = TantivyEngine::new(&index).context("Failed to create index engine")?;
    Ok(Arc::new(engine))
}

/// Query the index named by `settings` without taking its writer lock.
pub fn query_index(settings: &Settings, request: &QueryRequest) -> Result<QueryResponse> {
    let index = open_index(settings)?;
    let searcher = EventSearcher::new(&index).context("Failed to open index reader")?;

    let search_request = request.to_search_request(settings.default_limit)?;
    let hits = searcher.search(&search_request).context("Query failed")?;
    Ok(QueryResponse::from_hits(&hits, &search_request.effective_fields()))
}

/// Homeserver client from `settings`.
pub fn build_client(settings: &Settings) -> Result<MatrixClient> {
    let mut config = HttpTransportConfig::new(&settings.homeserver_url)
        .with_timeout(Duration::from_secs(settings.request_timeout_secs))
        .with_accept_invalid_certs(settings.accept_invalid_certs);
    if let Some(token) = &settings.access_token {
        config = config.with_access_token(token.clone());
    }
    if settings.accept_invalid_certs {
        warn!("TLS certificate verification is disabled for homeserver requests");
    }
    MatrixClient::from_config(config).context("Failed to build homeserver client")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

/// Start the daemon.
///
/// 1. Load configuration (defaults -> file -> env -> CLI)
/// 2. Open the index and build the homeserver client
/// 3. Check the account against the homeserver
/// 4. Serve HTTP until SIGINT/SIGTERM
pub async fn start_daemon(
    config_path: Option<&str>,
    port_override: Option<u16>,
    index_path_override: Option<&str>,
    homeserver_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<()> {
    let mut settings = load_settings(config_path, log_level_override)?;
    if let Some(port) = port_override {
        settings.bind_port = port;
    }
    if let Some(index_path) = index_path_override {
        settings.index_path = index_path.to_string();
    }
    if let Some(homeserver) = homeserver_override {
        settings.homeserver_url = homeserver.to_string();
    }
    settings.validate().context("Invalid configuration")?;

    init_logging(&settings.log_level)?;

    info!("Search daemon starting...");
    info!("Configuration:");
    info!("  Homeserver: {}", settings.homeserver_url);
    info!("  Index path: {:?}", settings.expanded_index_path());
    info!("  HTTP address: {}", settings.bind_addr());
    info!("  Log level: {}", settings.log_level);

    let engine = open_engine(&settings)?;
    info!(documents = engine.num_docs(), "Search index ready");

    let client = build_client(&settings)?;
    match client.whoami().await {
        Ok(user_id) => info!(user_id = %user_id, "Authenticated with homeserver"),
        Err(e) => warn!(error = %e, "Could not verify homeserver account"),
    }
    match client.joined_rooms().await {
        Ok(rooms) => info!(rooms = rooms.len(), "Joined rooms"),
        Err(e) => warn!(error = %e, "Could not list joined rooms"),
    }

    let pipeline = Arc::new(IndexingPipeline::new(engine.clone()));
    let service = SearchService::new(engine, client, settings.default_limit);
    let state = AppState::new(pipeline, service).with_hs_token(settings.hs_token.clone());

    let addr: SocketAddr = settings
        .bind_addr()
        .parse()
        .context("Invalid HTTP address")?;

    run_server_with_shutdown(addr, state, shutdown_signal())
        .await
        .context("Server error")
}

/// Run a query against the local index and print the JSON response.
pub fn handle_query(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    request: QueryRequest,
) -> Result<()> {
    let settings = load_settings(config_path, log_level_override)?;
    init_logging(&settings.log_level)?;

    let response = query_index(&settings, &request)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Print the rooms the configured account has joined.
pub async fn handle_rooms(config_path: Option<&str>, log_level_override: Option<&str>) -> Result<()> {
    let settings = load_settings(config_path, log_level_override)?;
    init_logging(&settings.log_level)?;

    let client = build_client(&settings)?;
    let rooms = client.joined_rooms().await.context("Failed to list joined rooms")?;
    if rooms.is_empty() {
        println!("No joined rooms");
    }
    for room in rooms {
        println!("{}", room);
    }
    Ok(())
}

//! Slotwise API server binary.
//!
//! Wires the availability, subscribe, and confirm endpoints to the
//! production boundaries (HTTP busy feeds, CRM contact store, DoH domain
//! verification) and owns the background cleanup tasks.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

use slotwise_api::config::ApiConfig;
use slotwise_core::busy::FeedBusySource;
use slotwise_core::clock::SystemClock;
use slotwise_core::contacts::HttpContactStore;
use slotwise_core::verify::{AllowAllVerifier, DohDomainVerifier, DomainVerifier};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "slotwise_server", about = "Slotwise API server")]
struct Args {
    /// Port to listen on (overrides BIND_ADDR's port; 0 = ephemeral).
    #[arg(long)]
    port: Option<u16>,

    /// DNS-over-HTTPS resolver endpoint for MX verification.
    #[arg(long, env = "DOH_ENDPOINT", default_value = DohDomainVerifier::DEFAULT_ENDPOINT)]
    doh_endpoint: Url,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,slotwise_api=debug,slotwise_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let mut config = ApiConfig::from_env();
    if let Some(port) = args.port {
        let host = config
            .bind_addr
            .rsplit_once(':')
            .map_or("127.0.0.1", |(host, _)| host)
            .to_string();
        config.bind_addr = format!("{host}:{port}");
    }

    info!(
        bind_addr = %config.bind_addr,
        tz = %config.service_tz,
        slot_minutes = config.slot_duration_min,
        feeds = config.feed_urls.len(),
        "starting slotwise_server"
    );
    if config.feed_urls.is_empty() {
        warn!("no busy feeds configured; availability will answer 503");
    }

    let clock = Arc::new(SystemClock);
    let http = Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;

    let busy = Arc::new(FeedBusySource::new(
        http.clone(),
        config.feed_urls.clone(),
        chrono::Duration::seconds(config.feed_cache_ttl_secs),
        clock.clone(),
    ));
    let contacts = Arc::new(HttpContactStore::new(
        http.clone(),
        config.contact_api_url.clone(),
        config.contact_api_key.clone(),
    ));
    let verifier: Arc<dyn DomainVerifier> = if config.verify_mx {
        Arc::new(DohDomainVerifier::new(http, args.doh_endpoint))
    } else {
        warn!("MX verification disabled; accepting every domain");
        Arc::new(AllowAllVerifier)
    };

    let state = slotwise_api::AppState::new(config.clone(), clock, busy, contacts, verifier);

    // Lazy expiry bounds correctness; these sweeps bound memory.
    let limiter_sweep = state.limiter.spawn_cleanup_task();
    let token_sweep = state.tokens.spawn_cleanup_task();

    let app = slotwise_api::router(state)
        .into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    limiter_sweep.abort();
    token_sweep.abort();

    Ok(())
}

use std::net::SocketAddr;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use route_viewer::geometry::{GeometryResolver, OsrmClient, OsrmConfig, ResolverConfig};
use route_viewer::schedule::ServiceTimeModel;
use route_viewer::session::{HttpSolveTransport, SolverClientConfig};
use route_viewer::web::{AppState, create_router};

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// Non-empty value of an environment variable.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let solver_config = match env_var("SOLVER_URL") {
        Some(url) => SolverClientConfig::new(url),
        None => SolverClientConfig::default(),
    };
    let osrm_config = match env_var("OSRM_URL") {
        Some(url) => OsrmConfig::new(url),
        None => OsrmConfig::default(),
    };
    let addr: SocketAddr = env_var("ROUTE_VIEWER_ADDR")
        .unwrap_or_else(|| DEFAULT_ADDR.to_string())
        .parse()
        .expect("ROUTE_VIEWER_ADDR must be a socket address");

    info!(solver = %solver_config.base_url, osrm = %osrm_config.base_url, "configured upstreams");
    if osrm_config.base_url.contains("router.project-osrm.org") {
        warn!("using the public OSRM demo server; set OSRM_URL for anything beyond light use");
    }

    let transport =
        HttpSolveTransport::new(solver_config).expect("Failed to create solve transport");
    let osrm = OsrmClient::new(osrm_config).expect("Failed to create OSRM client");
    let resolver = GeometryResolver::new(osrm, ResolverConfig::default());

    let state = AppState::new(transport, resolver, ServiceTimeModel::default());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    info!(%addr, "route viewer listening");

    axum::serve(listener, app).await.expect("Server error");
}

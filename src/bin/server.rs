use std::{
    env,
    fs::{self, OpenOptions},
    net::SocketAddr,
    path::PathBuf,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt,
};

use budget_api::{
    AppState, AuthConfig, ReportConfig, build_router, graceful_shutdown, logging_middleware,
};

/// The REST API server for budget_api.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Directory with an SSL certificate `cert.pem` and key `key.pem`.
    /// The server uses plain HTTP when this is not given.
    #[arg(long)]
    cert_path: Option<String>,

    /// The number of months in the history report when a request does not say.
    #[arg(long, default_value_t = 6)]
    history_months: u32,

    /// Only accept tokens issued for this audience.
    #[arg(long)]
    jwt_audience: Option<String>,

    /// Only accept tokens from this issuer.
    #[arg(long)]
    jwt_issuer: Option<String>,

    /// File path to the identity provider's RSA public key in PEM format.
    /// Tokens are verified with the `JWT_SECRET` environment variable when this is not given.
    #[arg(long)]
    jwt_public_key: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    let auth_config = get_auth_config(&args);
    let report_config = ReportConfig {
        history_months: args.history_months,
    };

    let conn = Connection::open(&args.db_path).expect("Could not open database.");
    let state =
        AppState::new(conn, auth_config, report_config).expect("Could not create app state.");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    match args.cert_path {
        Some(cert_path) => {
            let tls_config = RustlsConfig::from_pem_file(
                PathBuf::from(&cert_path).join("cert.pem"),
                PathBuf::from(&cert_path).join("key.pem"),
            )
            .await
            .expect("Could not open TLS certificates.");

            tracing::info!("HTTPS server listening on {}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(router.into_make_service())
                .await
                .expect("Server stopped unexpectedly.");
        }
        None => {
            tracing::info!("HTTP server listening on {}", addr);
            axum_server::bind(addr)
                .handle(handle)
                .serve(router.into_make_service())
                .await
                .expect("Server stopped unexpectedly.");
        }
    }
}

fn get_auth_config(args: &Args) -> AuthConfig {
    let auth_config = match &args.jwt_public_key {
        Some(path) => {
            let pem = fs::read(path).expect("Could not read the JWT public key.");
            AuthConfig::from_rsa_pem(&pem).expect("Could not load the JWT public key.")
        }
        None => {
            let secret = env::var("JWT_SECRET").expect(
                "The environment variable 'JWT_SECRET' must be set when --jwt-public-key is not given",
            );
            AuthConfig::from_secret(secret.as_bytes())
        }
    };

    let auth_config = match &args.jwt_audience {
        Some(audience) => auth_config.with_audience(audience),
        None => auth_config,
    };

    match &args.jwt_issuer {
        Some(issuer) => auth_config.with_issuer(issuer),
        None => auth_config,
    }
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(filter::LevelFilter::INFO);

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with(stdout_log)
        .with(debug_log)
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}

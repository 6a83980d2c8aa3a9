mod auth;
mod config;
mod contract;
mod controllers;
mod dao;
mod db;
mod errors;
mod models;
mod payload;
mod routes;
mod state;
mod storage;
mod validation;

#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::TokenService;
use crate::config::Config;
use crate::contract::Logo;
use crate::dao::{PgJobDao, PgUserDao};
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::S3Store;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PaRapido API v{}", env!("CARGO_PKG_VERSION"));

    // Postgres (runs pending migrations)
    let pool = create_pool(&config.database_url).await?;

    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.aws_bucket_name);

    // A missing or unreadable logo only drops the image from contracts
    let contract_logo = match &config.contract_logo_path {
        Some(path) => match Logo::load(path) {
            Ok(logo) => {
                info!("Contract logo loaded from {}", path.display());
                Some(Arc::new(logo))
            }
            Err(e) => {
                warn!("Contract logo unavailable: {e:#}");
                None
            }
        },
        None => None,
    };

    let tokens = TokenService::new(
        &config.jwt_secret_key,
        chrono::Duration::days(config.jwt_access_token_expires_days),
    );

    let state = AppState {
        users: Arc::new(PgUserDao::new(pool.clone())),
        jobs: Arc::new(PgJobDao::new(pool)),
        storage: Arc::new(S3Store::new(s3, config.aws_bucket_name.clone())),
        tokens,
        config: config.clone(),
        contract_logo,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// S3 client for AWS, or for MinIO when `S3_ENDPOINT` is set.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "parapido-static",
    );

    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()))
        .credentials_provider(credentials);
    if let Some(endpoint) = &config.s3_endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let sdk_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(config.s3_endpoint.is_some())
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}

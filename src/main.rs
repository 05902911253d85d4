//! Shop backend server

use std::sync::Arc;

use anyhow::{Context, Result};
use shop_backend::config::Config;
use shop_backend::http::{self, AppState};
use shop_backend::repository::{create_pool, PgStore, Store};
use shop_backend::services::notify::{EventPublisher, LogMailer, Mailer};
use shop_backend::services::ReminderService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // `.env` must be loaded before the filter reads RUST_LOG.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("loading configuration")?;
    if config.payment.skip_signature {
        tracing::warn!("payment callback signature checks are DISABLED");
    }

    let pool = create_pool(&config.database_url).await.context("connecting to database")?;
    sqlx::migrate!("./migrations").run(&pool).await.context("running migrations")?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable; domain events disabled");
                None
            }
        },
        None => None,
    };
    let events = EventPublisher::new(nats);
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);

    ReminderService::new(store.clone(), mailer.clone(), events.clone()).spawn();

    let state = AppState::new(store, &config.jwt_secret, config.payment.clone(), config.delivery.clone(), mailer, events)?;
    let app = http::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%addr, environment = ?config.environment, "shop backend listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

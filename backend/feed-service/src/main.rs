use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::info;

use db_pool::DbConfig;
use feed_service::cache::{KeyValueStore, RedisStore};
use feed_service::repository::{PgRecordStore, RecordStore};
use feed_service::services::{
    CounterService, EngagementService, FanoutService, FeedIndex, HomeFeedService,
};
use feed_service::Config;

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "feed-service",
    }))
}

async fn ready() -> impl Responder {
    HttpResponse::Ok().body("READY")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("🔧 Starting feed-service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "✅ Configuration loaded: env={}, http_port={}",
        config.app.env, config.app.http_port
    );

    // Initialize database pool
    let db_config = DbConfig {
        service_name: "feed-service".to_string(),
        database_url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        ..DbConfig::default()
    };
    db_config.log_config();

    let pg_pool = db_pool::create_pool(db_config)
        .await
        .context("Failed to create database pool")?;

    // Run database migrations
    sqlx::migrate!("./migrations")
        .run(&pg_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("✅ Database migrations completed");

    // Initialize the key-value store
    let redis_store = RedisStore::connect(&config.redis.url)
        .await
        .context("Failed to connect to Redis")?;
    let store: Arc<dyn KeyValueStore> = Arc::new(redis_store);
    info!("✅ Redis connection established");

    // Wire the feed engine
    let records: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(pg_pool.clone()));
    let counters = CounterService::new(store.clone(), records.clone());
    let index = FeedIndex::new(store.clone());
    let fanout = FanoutService::new(index.clone(), records.clone(), config.feed.fanout_batch_size);
    let home_feed = HomeFeedService::new(
        index,
        records.clone(),
        config.feed.default_limit,
        config.feed.max_limit,
    );
    let engagement = EngagementService::new(pg_pool.clone(), records, counters, fanout);
    info!("✅ Feed engine initialized");

    let http_addr = format!("{}:{}", config.app.host, config.app.http_port);
    info!("🚀 HTTP server listening on http://{}", http_addr);

    let mut join_set = JoinSet::new();

    // The transport layer mounts its routes on top of this app; the
    // service itself only exposes health probes.
    let engagement_data = web::Data::new(engagement);
    let home_feed_data = web::Data::new(home_feed);
    let http_server = HttpServer::new(move || {
        App::new()
            .app_data(engagement_data.clone())
            .app_data(home_feed_data.clone())
            .route("/health", web::get().to(health))
            .route("/ready", web::get().to(ready))
    })
    .bind(&http_addr)
    .context("Failed to bind HTTP server")?
    .run();

    join_set.spawn(async move {
        tokio::select! {
            result = http_server => result.map_err(|e| anyhow::anyhow!("HTTP server error: {}", e)),
            _ = shutdown_signal() => Ok(()),
        }
    });

    info!("🎉 feed-service is running");

    while let Some(result) = join_set.join_next().await {
        match result {
            Ok(Ok(())) => {
                info!("Task completed successfully");
            }
            Err(e) => {
                tracing::error!("Task panicked: {:#}", e);
                return Err(anyhow::anyhow!("Task panicked: {}", e));
            }
            Ok(Err(e)) => {
                tracing::error!("Task failed: {:#}", e);
                return Err(e);
            }
        }
    }

    info!("🛑 feed-service shutting down");
    Ok(())
}

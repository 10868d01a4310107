use std::{env, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokend_storage::{
    connection_manager, redis_url, revocation::Revocation, MemoryImpl,
    RedisImpl,
};

use tokend_server::{
    load, shutdown_signal, version, App, AppConfig, AppRouter, AppState,
    Denylist,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = env::args().collect::<Vec<_>>();
    let config =
        if args.len() == 3 && (args[1] == "-c" || args[1] == "--config") {
            load(&args[2])?
        } else {
            AppConfig::parse()
        };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    debug!("{:#?}", &config);
    info!("{}", version());
    run_server(config).await
}

async fn denylist(config: &AppConfig) -> Result<Denylist> {
    match config.redis_addr.as_deref() {
        Some(addr) => {
            info!("connecting to the denylist redis at {}", addr);
            let url = redis_url(
                addr,
                config.redis_db,
                config.redis_password.as_deref(),
            );
            let conn = connection_manager(&url)
                .await
                .context("could not initialize the redis connection")?;
            Ok(Arc::new(RedisImpl::<Revocation>::new(conn)))
        }
        None => {
            warn!(
                "no redis address configured, revocations are kept in memory"
            );
            Ok(Arc::new(MemoryImpl::<Revocation>::new()))
        }
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    info!("environment loaded and configuration parsed, initializing denylist store...");
    let denylist = denylist(&config).await?;

    let app = Arc::new(App::new(config.clone(), denylist)?);

    let router = AppRouter::build(AppState(app))
        .context("could not initialize application routes")?;
    let host = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&host)
        .await
        .context("could not bind to endpoint")?;

    info!("api server, listening on {}", host);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("error while starting API server")?;

    Ok(())
}

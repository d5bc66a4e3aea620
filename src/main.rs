use std::sync::Arc;

use elsewhere::{
    AppState,
    cache::MemoryCache,
    config::Config,
    db,
    host::HostRegistry,
    res::IconRoute,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "elsewhere=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let db_pool = db::connect(&config).await?;

    let mut hosts = HostRegistry::new();
    for table in &config.host_tables {
        info!(kind = %table.kind, table = %table.table, "registered host kind");
        hosts.register(table.kind.clone(), table.resolver(db_pool.clone()));
    }

    let app_state = AppState {
        db_pool,
        cache: Arc::new(MemoryCache::new()),
        icons: IconRoute::new(&config.icon_route),
        hosts: Arc::new(hosts),
    };

    let app = elsewhere::app(app_state, &config.icon_dir);
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!(bind = %config.bind, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

pub mod appresult;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod host;
pub mod networks;
pub mod profiles;
pub mod res;

use std::sync::Arc;

use axum::{Router, extract::FromRef, http::Method};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};

pub use appresult::{AppError, AppResult};
pub use error::{Error, Result};

use cache::CacheStore;
use host::HostRegistry;
use res::IconRoute;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub cache: Arc<dyn CacheStore>,
    pub icons: IconRoute,
    pub hosts: Arc<HostRegistry>,
}

/// Admin CRUD under `/admin`, public read routes, and the icon files under the icon route.
pub fn app(state: AppState, icon_dir: impl AsRef<std::path::Path>) -> Router {
    let icon_route = state.icons.prefix().to_owned();

    let public = Router::new()
        .nest("/networks", networks::router())
        .nest("/hosts", profiles::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        );

    let admin = Router::new()
        .merge(networks::admin_router())
        .nest("/profiles", profiles::admin_router());

    Router::new()
        .merge(public)
        .nest("/admin", admin)
        .nest_service(&icon_route, IconRoute::service(icon_dir))
        .with_state(state)
}

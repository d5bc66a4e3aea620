use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppResult, cache::CacheStore, res::IconRoute};

use super::{CatalogNetwork, NetworkKind};

#[derive(Debug, Serialize)]
pub struct NetworkView {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub identifier: String,
    pub icon: Option<String>,
    pub icon_url: String,
}

impl NetworkView {
    pub fn new<K>(network: &CatalogNetwork<K>, icons: &IconRoute) -> Self {
        NetworkView {
            id: network.id,
            name: network.name.clone(),
            url: network.url.clone(),
            identifier: network.identifier.clone(),
            icon: network.icon.clone(),
            icon_url: network.icon_url(icons),
        }
    }
}

pub(crate) async fn networks<K: NetworkKind>(
    State(db_pool): State<SqlitePool>,
    State(cache): State<Arc<dyn CacheStore>>,
    State(icons): State<IconRoute>,
) -> AppResult<Json<Vec<NetworkView>>> {
    let networks = CatalogNetwork::<K>::cached_all(&db_pool, cache.as_ref()).await?;

    Ok(Json(
        networks
            .iter()
            .map(|network| NetworkView::new(network, &icons))
            .collect(),
    ))
}

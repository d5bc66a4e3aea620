use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{AppResult, AppState, Error, cache::CacheStore, res::IconRoute};

use super::{CatalogNetwork, Network, NetworkKind, NetworkView};

#[derive(Debug, Deserialize)]
pub struct NetworkBody {
    pub name: String,
    pub url: String,
    pub identifier: String,
    #[serde(default)]
    pub icon: Option<String>,
}

impl From<NetworkBody> for Network {
    fn from(NetworkBody { name, url, identifier, icon }: NetworkBody) -> Self {
        Network {
            name,
            url,
            identifier,
            icon,
        }
    }
}

pub(crate) fn router<K: NetworkKind>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<K>).post(create::<K>))
        .route("/{uuid}", get(show::<K>).put(update::<K>).delete(remove::<K>))
}

async fn list<K: NetworkKind>(
    State(db_pool): State<SqlitePool>,
    State(icons): State<IconRoute>,
) -> AppResult<Json<Vec<NetworkView>>> {
    let networks = CatalogNetwork::<K>::all(&db_pool).await?;

    Ok(Json(
        networks
            .iter()
            .map(|network| NetworkView::new(network, &icons))
            .collect(),
    ))
}

async fn show<K: NetworkKind>(
    Path(id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    State(icons): State<IconRoute>,
) -> AppResult<Json<NetworkView>> {
    let network = CatalogNetwork::<K>::get(&db_pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{} {id}", K::LABEL)))?;

    Ok(Json(NetworkView::new(&network, &icons)))
}

async fn create<K: NetworkKind>(
    State(db_pool): State<SqlitePool>,
    State(cache): State<Arc<dyn CacheStore>>,
    State(icons): State<IconRoute>,
    Json(body): Json<NetworkBody>,
) -> AppResult<(StatusCode, Json<NetworkView>)> {
    let network = CatalogNetwork::<K>::new(body.into());
    network.save(&db_pool, cache.as_ref()).await?;

    Ok((StatusCode::CREATED, Json(NetworkView::new(&network, &icons))))
}

async fn update<K: NetworkKind>(
    Path(id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    State(cache): State<Arc<dyn CacheStore>>,
    State(icons): State<IconRoute>,
    Json(body): Json<NetworkBody>,
) -> AppResult<Json<NetworkView>> {
    if CatalogNetwork::<K>::get(&db_pool, id).await?.is_none() {
        return Err(Error::NotFound(format!("{} {id}", K::LABEL)))?;
    }

    let network = CatalogNetwork::<K>::with_id(id, body.into());
    network.save(&db_pool, cache.as_ref()).await?;

    Ok(Json(NetworkView::new(&network, &icons)))
}

async fn remove<K: NetworkKind>(
    Path(id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    State(cache): State<Arc<dyn CacheStore>>,
) -> AppResult<StatusCode> {
    if CatalogNetwork::<K>::delete(&db_pool, cache.as_ref(), id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound(format!("{} {id}", K::LABEL)))?
    }
}

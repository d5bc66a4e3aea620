use std::sync::Arc;

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AppResult, AppState, Error, Result,
    host::{HostRef, HostRegistry},
    networks::{CatalogNetwork, Messenger, NetworkKind, Social},
    res::IconRoute,
};

use super::{NetworkProfile, ProfileMeta, ProfileRecord, ProfileView, WebsiteProfile};

#[derive(Debug, Deserialize)]
pub(crate) struct NetworkProfileBody {
    host: HostRef,
    network: Uuid,
    username: String,
    #[serde(default)]
    is_verified: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    date_verified: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WebsiteProfileBody {
    host: HostRef,
    name: String,
    url: String,
    #[serde(default)]
    is_verified: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    date_verified: Option<OffsetDateTime>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .merge(network_router::<Social>())
        .merge(network_router::<Messenger>())
        .route("/website", post(create_website))
        .route(
            "/website/{uuid}",
            get(show_website)
                .put(update_website)
                .delete(remove::<WebsiteProfile>),
        )
        .route("/website/{uuid}/verify", post(verify_website))
}

fn network_router<K: NetworkKind>() -> Router<AppState> {
    Router::new()
        .route(&format!("/{}", K::SLUG), post(create_network::<K>))
        .route(
            &format!("/{}/{{uuid}}", K::SLUG),
            get(show_network::<K>)
                .put(update_network::<K>)
                .delete(remove::<NetworkProfile<K>>),
        )
        .route(
            &format!("/{}/{{uuid}}/verify", K::SLUG),
            post(verify_network::<K>),
        )
}

fn known_host(hosts: &HostRegistry, host: &HostRef) -> Result<()> {
    hosts.ensure_known(host).inspect_err(|err| {
        warn!(host = %host, "rejected profile host: {err}");
    })
}

/// Turning verification on stamps `date_verified`; an explicit date wins.
fn set_verification(
    meta: &mut ProfileMeta,
    is_verified: bool,
    date_verified: Option<OffsetDateTime>,
) {
    if is_verified && !meta.is_verified {
        meta.verify();
    }
    meta.is_verified = is_verified;
    if let Some(date_verified) = date_verified {
        meta.date_verified = date_verified;
    }
}

async fn load_network<K: NetworkKind>(db_pool: &SqlitePool, id: Uuid) -> Result<CatalogNetwork<K>> {
    CatalogNetwork::<K>::get(db_pool, id)
        .await?
        .ok_or(Error::MissingNetwork { kind: K::LABEL, id })
}

async fn load_profile<P: ProfileRecord>(db_pool: &SqlitePool, id: Uuid, label: &str) -> Result<P> {
    P::objects(db_pool)
        .get(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{label} profile {id}")))
}

fn network_view<K: NetworkKind>(profile: &NetworkProfile<K>, icons: &IconRoute) -> ProfileView {
    ProfileView::network(profile, icons, &profile.host.to_string())
}

async fn create_network<K: NetworkKind>(
    State(db_pool): State<SqlitePool>,
    State(hosts): State<Arc<HostRegistry>>,
    State(icons): State<IconRoute>,
    Json(body): Json<NetworkProfileBody>,
) -> AppResult<(StatusCode, Json<ProfileView>)> {
    known_host(&hosts, &body.host)?;
    let network = load_network::<K>(&db_pool, body.network).await?;

    let mut profile = NetworkProfile::new(body.host, network, &body.username)?;
    set_verification(&mut profile.meta, body.is_verified, body.date_verified);
    profile.save(&db_pool).await?;
    info!(id = %profile.id, "added {profile}");

    Ok((StatusCode::CREATED, Json(network_view(&profile, &icons))))
}

async fn show_network<K: NetworkKind>(
    Path(id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    State(icons): State<IconRoute>,
) -> AppResult<Json<ProfileView>> {
    let profile = load_profile::<NetworkProfile<K>>(&db_pool, id, K::LABEL).await?;
    Ok(Json(network_view(&profile, &icons)))
}

async fn update_network<K: NetworkKind>(
    Path(id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    State(hosts): State<Arc<HostRegistry>>,
    State(icons): State<IconRoute>,
    Json(body): Json<NetworkProfileBody>,
) -> AppResult<Json<ProfileView>> {
    let mut profile = load_profile::<NetworkProfile<K>>(&db_pool, id, K::LABEL).await?;
    known_host(&hosts, &body.host)?;
    if profile.network.id != body.network {
        profile.network = load_network::<K>(&db_pool, body.network).await?;
    }

    profile.host = body.host;
    profile.username = body.username;
    set_verification(&mut profile.meta, body.is_verified, body.date_verified);
    profile.save(&db_pool).await?;
    info!(id = %profile.id, "updated {profile}");

    Ok(Json(network_view(&profile, &icons)))
}

#[debug_handler(state = AppState)]
async fn create_website(
    State(db_pool): State<SqlitePool>,
    State(hosts): State<Arc<HostRegistry>>,
    Json(body): Json<WebsiteProfileBody>,
) -> AppResult<(StatusCode, Json<ProfileView>)> {
    known_host(&hosts, &body.host)?;

    let mut profile = WebsiteProfile::new(body.host, &body.name, &body.url)?;
    set_verification(&mut profile.meta, body.is_verified, body.date_verified);
    profile.save(&db_pool).await?;
    info!(id = %profile.id, url = %profile, "added website profile");

    Ok((StatusCode::CREATED, Json(ProfileView::website(&profile))))
}

#[debug_handler(state = AppState)]
async fn show_website(
    Path(id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Json<ProfileView>> {
    let profile = load_profile::<WebsiteProfile>(&db_pool, id, "website").await?;
    Ok(Json(ProfileView::website(&profile)))
}

#[debug_handler(state = AppState)]
async fn update_website(
    Path(id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    State(hosts): State<Arc<HostRegistry>>,
    Json(body): Json<WebsiteProfileBody>,
) -> AppResult<Json<ProfileView>> {
    let mut profile = load_profile::<WebsiteProfile>(&db_pool, id, "website").await?;
    known_host(&hosts, &body.host)?;

    profile.set_url(&body.url)?;
    profile.host = body.host;
    profile.name = body.name;
    set_verification(&mut profile.meta, body.is_verified, body.date_verified);
    profile.save(&db_pool).await?;
    info!(id = %profile.id, url = %profile, "updated website profile");

    Ok(Json(ProfileView::website(&profile)))
}

async fn verify_network<K: NetworkKind>(
    Path(id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    State(icons): State<IconRoute>,
) -> AppResult<Json<ProfileView>> {
    let mut profile = load_profile::<NetworkProfile<K>>(&db_pool, id, K::LABEL).await?;

    profile.meta.verify();
    profile.save(&db_pool).await?;

    Ok(Json(network_view(&profile, &icons)))
}

#[debug_handler(state = AppState)]
async fn verify_website(
    Path(id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Json<ProfileView>> {
    let mut profile = load_profile::<WebsiteProfile>(&db_pool, id, "website").await?;

    profile.meta.verify();
    profile.save(&db_pool).await?;

    Ok(Json(ProfileView::website(&profile)))
}

async fn remove<P: ProfileRecord>(
    Path(id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<StatusCode> {
    if P::objects(&db_pool).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound(format!("profile {id}")))?
    }
}

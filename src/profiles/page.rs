use std::sync::Arc;

use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use serde::Serialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    AppResult, AppState, Result,
    host::{HostRef, HostRegistry},
    networks::{Messenger, NetworkKind, Social},
    res::IconRoute,
};

use super::{NetworkProfile, ProfileMeta, ProfileRecord, WebsiteProfile};

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub kind: &'static str,
    pub label: String,
    pub name: String,
    pub url: String,
    pub icon_url: String,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub date_added: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub date_verified: OffsetDateTime,
}

impl ProfileView {
    fn new(
        id: Uuid,
        kind: &'static str,
        label: String,
        name: String,
        url: String,
        icon_url: String,
        meta: &ProfileMeta,
    ) -> Self {
        ProfileView {
            id,
            kind,
            label,
            name,
            url,
            icon_url,
            is_verified: meta.is_verified,
            date_added: meta.date_added(),
            date_verified: meta.date_verified,
        }
    }

    /// `host_label` replaces the bare host reference in the display label.
    pub fn network<K: NetworkKind>(
        profile: &NetworkProfile<K>,
        icons: &IconRoute,
        host_label: &str,
    ) -> Self {
        Self::new(
            profile.id,
            K::SLUG,
            format!("{} profile for {}", profile.network, host_label),
            profile.network.name.clone(),
            profile.url(),
            profile.network.icon_url(icons),
            &profile.meta,
        )
    }

    pub fn website(profile: &WebsiteProfile) -> Self {
        Self::new(
            profile.id,
            "website",
            profile.to_string(),
            profile.name.clone(),
            profile.url().to_owned(),
            profile.icon_url(),
            &profile.meta,
        )
    }
}

/// Every profile of a host, social networks first, then messengers, then websites.
#[derive(Debug, Serialize)]
pub struct HostProfiles {
    pub host: HostRef,
    pub label: String,
    pub profiles: Vec<ProfileView>,
}

impl HostProfiles {
    pub async fn load(
        db_pool: &SqlitePool,
        hosts: &HostRegistry,
        icons: &IconRoute,
        host: HostRef,
    ) -> Result<HostProfiles> {
        let label = hosts.resolve(&host).await?;

        let mut profiles = Vec::new();
        for profile in NetworkProfile::<Social>::objects(db_pool)
            .get_for_object(&host)
            .all()
            .await?
        {
            profiles.push(ProfileView::network(&profile, icons, &label));
        }
        for profile in NetworkProfile::<Messenger>::objects(db_pool)
            .get_for_object(&host)
            .all()
            .await?
        {
            profiles.push(ProfileView::network(&profile, icons, &label));
        }
        for profile in WebsiteProfile::objects(db_pool)
            .get_for_object(&host)
            .all()
            .await?
        {
            profiles.push(ProfileView::website(&profile));
        }

        Ok(HostProfiles {
            host,
            label,
            profiles,
        })
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn host_profiles(
    Path((kind, id)): Path<(String, i64)>,
    State(db_pool): State<SqlitePool>,
    State(hosts): State<Arc<HostRegistry>>,
    State(icons): State<IconRoute>,
) -> AppResult<Json<HostProfiles>> {
    let profiles = HostProfiles::load(&db_pool, &hosts, &icons, HostRef::new(kind, id)).await?;
    Ok(Json(profiles))
}

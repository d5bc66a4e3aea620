//! Catalogs of known third-party networks.

mod admin;
#[cfg(test)]
pub(crate) mod fixtures;
mod page;

use std::{fmt, marker::PhantomData, ops::Deref};

use axum::{Router, routing::get};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState, Result,
    cache::{CacheStore, IM_CACHE_KEY, SN_CACHE_KEY},
    error::{check_len, check_url},
    res::{IconRoute, favicon_url},
};

pub use admin::NetworkBody;
pub use page::NetworkView;

/// Distinguishes the network catalogs: where rows live, which profiles point
/// at them and which cache entry their listing is stored under.
pub trait NetworkKind: fmt::Debug + Clone + Send + Sync + Unpin + 'static {
    const TABLE: &'static str;
    const PROFILE_TABLE: &'static str;
    const CACHE_KEY: &'static str;
    const LABEL: &'static str;
    /// Path segment used by the HTTP routes.
    const SLUG: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Social;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messenger;

impl NetworkKind for Social {
    const TABLE: &'static str = "social_networks";
    const PROFILE_TABLE: &'static str = "social_network_profiles";
    const CACHE_KEY: &'static str = SN_CACHE_KEY;
    const LABEL: &'static str = "social network";
    const SLUG: &'static str = "social";
}

impl NetworkKind for Messenger {
    const TABLE: &'static str = "instant_messengers";
    const PROFILE_TABLE: &'static str = "instant_messenger_profiles";
    const CACHE_KEY: &'static str = IM_CACHE_KEY;
    const LABEL: &'static str = "instant messenger network";
    const SLUG: &'static str = "im";
}

/// Fields shared by every network catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub url: String,
    pub identifier: String,
    #[serde(default)]
    pub icon: Option<String>,
}

impl Network {
    /// Local icon route when an icon is set, the favicon service otherwise.
    pub fn icon_url(&self, icons: &IconRoute) -> String {
        match self.icon.as_deref().filter(|icon| !icon.is_empty()) {
            Some(icon) => icons.reverse(icon),
            None => favicon_url(&self.url),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_len("name", &self.name, 100)?;
        check_len("identifier", &self.identifier, 100)?;
        check_url(&self.url)?;
        if let Some(icon) = self.icon.as_deref().filter(|icon| !icon.is_empty()) {
            check_len("icon", icon, 100)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct CatalogNetwork<K> {
    pub id: Uuid,
    #[serde(flatten)]
    pub network: Network,
    #[serde(skip)]
    kind: PhantomData<K>,
}

pub type SocialNetwork = CatalogNetwork<Social>;
pub type InstantMessenger = CatalogNetwork<Messenger>;

#[derive(sqlx::FromRow)]
pub(crate) struct NetworkRow {
    pub(crate) uuid: String,
    pub(crate) name: String,
    pub(crate) url: String,
    pub(crate) identifier: String,
    pub(crate) icon: Option<String>,
}

impl<K> CatalogNetwork<K> {
    pub(crate) fn from_row(row: NetworkRow) -> Result<Self> {
        Ok(CatalogNetwork {
            id: Uuid::parse_str(&row.uuid)?,
            network: Network {
                name: row.name,
                url: row.url,
                identifier: row.identifier,
                icon: row.icon,
            },
            kind: PhantomData,
        })
    }
}

impl<K: NetworkKind> CatalogNetwork<K> {
    pub fn new(network: Network) -> Self {
        Self::with_id(Uuid::now_v7(), network)
    }

    pub fn with_id(id: Uuid, network: Network) -> Self {
        CatalogNetwork {
            id,
            network,
            kind: PhantomData,
        }
    }

    /// Inserts or updates the row, then evicts the cached listing for this kind.
    pub async fn save(&self, db_pool: &SqlitePool, cache: &dyn CacheStore) -> Result<()> {
        self.network.validate()?;

        let sql = format!(
            "INSERT INTO {} (uuid,name,url,identifier,icon) VALUES (?,?,?,?,?)
             ON CONFLICT(uuid) DO UPDATE SET
                name=excluded.name, url=excluded.url,
                identifier=excluded.identifier, icon=excluded.icon",
            K::TABLE
        );
        sqlx::query(&sql)
            .bind(self.id.to_string())
            .bind(&self.network.name)
            .bind(&self.network.url)
            .bind(&self.network.identifier)
            .bind(self.network.icon.as_deref().filter(|icon| !icon.is_empty()))
            .execute(db_pool)
            .await?;

        cache.delete(K::CACHE_KEY);
        info!(id = %self.id, name = %self.network.name, "saved {}", K::LABEL);
        Ok(())
    }

    /// Deletes the row and, through the foreign key, its profiles.
    pub async fn delete(db_pool: &SqlitePool, cache: &dyn CacheStore, id: Uuid) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE uuid=?", K::TABLE);
        let deleted = sqlx::query(&sql)
            .bind(id.to_string())
            .execute(db_pool)
            .await?
            .rows_affected()
            > 0;

        cache.delete(K::CACHE_KEY);
        if deleted {
            info!(%id, "deleted {}", K::LABEL);
        }
        Ok(deleted)
    }

    pub async fn get(db_pool: &SqlitePool, id: Uuid) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT uuid,name,url,identifier,icon FROM {} WHERE uuid=?",
            K::TABLE
        );
        sqlx::query_as::<_, NetworkRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(db_pool)
            .await?
            .map(Self::from_row)
            .transpose()
    }

    pub async fn by_identifier(db_pool: &SqlitePool, identifier: &str) -> Result<Option<Self>> {
        let sql = format!(
            "SELECT uuid,name,url,identifier,icon FROM {} WHERE identifier=? ORDER BY rowid LIMIT 1",
            K::TABLE
        );
        sqlx::query_as::<_, NetworkRow>(&sql)
            .bind(identifier)
            .fetch_optional(db_pool)
            .await?
            .map(Self::from_row)
            .transpose()
    }

    pub async fn all(db_pool: &SqlitePool) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT uuid,name,url,identifier,icon FROM {} ORDER BY name, rowid",
            K::TABLE
        );
        sqlx::query_as::<_, NetworkRow>(&sql)
            .fetch_all(db_pool)
            .await?
            .into_iter()
            .map(Self::from_row)
            .collect()
    }

    /// Listing served from the cache, repopulated from the store after a write evicted it.
    pub async fn cached_all(db_pool: &SqlitePool, cache: &dyn CacheStore) -> Result<Vec<Self>> {
        if let Some(cached) = cache.get(K::CACHE_KEY) {
            return Ok(serde_json::from_value(cached)?);
        }

        let networks = Self::all(db_pool).await?;
        cache.set(K::CACHE_KEY, serde_json::to_value(&networks)?);
        Ok(networks)
    }
}

impl<K> Deref for CatalogNetwork<K> {
    type Target = Network;

    fn deref(&self) -> &Network {
        &self.network
    }
}

impl<K> fmt::Display for CatalogNetwork<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.network.name)
    }
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .nest(&format!("/{}", Social::SLUG), admin::router::<Social>())
        .nest(&format!("/{}", Messenger::SLUG), admin::router::<Messenger>())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(&format!("/{}", Social::SLUG), get(page::networks::<Social>))
        .route(&format!("/{}", Messenger::SLUG), get(page::networks::<Messenger>))
}

#[cfg(test)]
mod tests {
    use super::{fixtures::twitter, *};
    use crate::{cache::MemoryCache, db};

    #[test]
    fn icon_url_falls_back_to_favicon_service() {
        let icons = IconRoute::default();
        let mut network = twitter();
        assert_eq!(
            network.icon_url(&icons),
            "http://www.google.com/s2/favicons?domain_url=http://twitter.com/"
        );

        network.icon = Some(String::new());
        assert_eq!(
            network.icon_url(&icons),
            "http://www.google.com/s2/favicons?domain_url=http://twitter.com/"
        );

        network.icon = Some("twitter.png".to_owned());
        assert_eq!(network.icon_url(&icons), icons.reverse("twitter.png"));
        assert_eq!(network.icon_url(&icons), "/elsewhere/img/twitter.png");
    }

    #[test]
    fn displays_as_name() {
        assert_eq!(SocialNetwork::new(twitter()).to_string(), "Twitter");
    }

    #[tokio::test]
    async fn save_evicts_only_own_cache_key() {
        let db_pool = db::memory_pool().await;
        let cache = MemoryCache::new();
        cache.set(SN_CACHE_KEY, serde_json::json!([]));
        cache.set(IM_CACHE_KEY, serde_json::json!([]));

        SocialNetwork::new(twitter()).save(&db_pool, &cache).await.unwrap();
        assert!(!cache.contains(SN_CACHE_KEY));
        assert!(cache.contains(IM_CACHE_KEY));

        cache.set(SN_CACHE_KEY, serde_json::json!([]));
        let jabber = Network {
            name: "Jabber".to_owned(),
            url: "xmpp://jabber.org/".to_owned(),
            identifier: "jabber".to_owned(),
            icon: Some("jabber.png".to_owned()),
        };
        InstantMessenger::new(jabber).save(&db_pool, &cache).await.unwrap();
        assert!(cache.contains(SN_CACHE_KEY));
        assert!(!cache.contains(IM_CACHE_KEY));
    }

    #[tokio::test]
    async fn save_updates_in_place() {
        let db_pool = db::memory_pool().await;
        let cache = MemoryCache::new();

        let mut network = SocialNetwork::new(twitter());
        network.save(&db_pool, &cache).await.unwrap();
        network.network.name = "X".to_owned();
        network.save(&db_pool, &cache).await.unwrap();

        let all = SocialNetwork::all(&db_pool).await.unwrap();
        assert_eq!(all, vec![network.clone()]);
        assert_eq!(
            SocialNetwork::by_identifier(&db_pool, "twitter").await.unwrap(),
            Some(network)
        );
        assert!(InstantMessenger::all(&db_pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_url_is_not_saved() {
        let db_pool = db::memory_pool().await;
        let cache = MemoryCache::new();
        cache.set(SN_CACHE_KEY, serde_json::json!([]));

        let mut network = twitter();
        network.url = "twitter".to_owned();
        let result = SocialNetwork::new(network).save(&db_pool, &cache).await;

        assert!(matches!(result, Err(crate::Error::InvalidUrl { .. })));
        assert!(cache.contains(SN_CACHE_KEY));
        assert!(SocialNetwork::all(&db_pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cached_listing_is_repopulated_after_write() {
        let db_pool = db::memory_pool().await;
        let cache = MemoryCache::new();

        assert!(SocialNetwork::cached_all(&db_pool, &cache).await.unwrap().is_empty());
        assert!(cache.contains(SN_CACHE_KEY));

        let network = SocialNetwork::new(twitter());
        network.save(&db_pool, &cache).await.unwrap();
        assert!(!cache.contains(SN_CACHE_KEY));

        let listed = SocialNetwork::cached_all(&db_pool, &cache).await.unwrap();
        assert_eq!(listed, vec![network.clone()]);

        // served from the cache now, even though the row is gone underneath
        sqlx::query("DELETE FROM social_networks")
            .execute(&db_pool)
            .await
            .unwrap();
        assert_eq!(
            SocialNetwork::cached_all(&db_pool, &cache).await.unwrap(),
            vec![network]
        );
    }

    #[tokio::test]
    async fn delete_evicts_cache() {
        let db_pool = db::memory_pool().await;
        let cache = MemoryCache::new();

        let network = SocialNetwork::new(twitter());
        network.save(&db_pool, &cache).await.unwrap();
        SocialNetwork::cached_all(&db_pool, &cache).await.unwrap();

        assert!(SocialNetwork::delete(&db_pool, &cache, network.id).await.unwrap());
        assert!(!cache.contains(SN_CACHE_KEY));
        assert!(SocialNetwork::get(&db_pool, network.id).await.unwrap().is_none());
        assert!(!SocialNetwork::delete(&db_pool, &cache, network.id).await.unwrap());
    }
}

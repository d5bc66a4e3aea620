use std::fmt;

use serde::Serialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    Result,
    error::check_len,
    host::{HostRef, HostRegistry},
    networks::{CatalogNetwork, Messenger, NetworkKind, NetworkRow, Social},
};

use super::{ProfileMeta, ProfileRecord};

/// A username on a catalogued network. The network row is always loaded with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "")]
pub struct NetworkProfile<K> {
    pub id: Uuid,
    pub host: HostRef,
    #[serde(flatten)]
    pub meta: ProfileMeta,
    pub username: String,
    pub network: CatalogNetwork<K>,
}

pub type SocialNetworkProfile = NetworkProfile<Social>;
pub type InstantMessengerProfile = NetworkProfile<Messenger>;

#[derive(sqlx::FromRow)]
pub struct NetworkProfileRow {
    uuid: String,
    host_kind: String,
    host_id: i64,
    username: String,
    date_added: OffsetDateTime,
    date_verified: OffsetDateTime,
    is_verified: bool,
    network_uuid: String,
    name: String,
    url: String,
    identifier: String,
    icon: Option<String>,
}

impl<K: NetworkKind> NetworkProfile<K> {
    pub fn new(host: HostRef, network: CatalogNetwork<K>, username: &str) -> Result<Self> {
        check_len("username", username, 64)?;

        Ok(NetworkProfile {
            id: Uuid::now_v7(),
            host,
            meta: ProfileMeta::new(),
            username: username.to_owned(),
            network,
        })
    }

    /// Network URL with the username appended, no separator.
    pub fn url(&self) -> String {
        format!("{}{}", self.network.url, self.username)
    }

    /// Like `Display`, with the host's own label instead of its reference.
    pub async fn describe(&self, hosts: &HostRegistry) -> Result<String> {
        let host = hosts.resolve(&self.host).await?;
        Ok(format!("{} profile for {}", self.network, host))
    }

    /// Inserts or updates the row. `date_added` is only written on insert.
    pub async fn save(&self, db_pool: &SqlitePool) -> Result<()> {
        check_len("username", &self.username, 64)?;

        let sql = format!(
            "INSERT INTO {} (uuid,host_kind,host_id,network_id,username,date_added,date_verified,is_verified)
             VALUES (?,?,?,?,?,?,?,?)
             ON CONFLICT(uuid) DO UPDATE SET
                host_kind=excluded.host_kind, host_id=excluded.host_id,
                network_id=excluded.network_id, username=excluded.username,
                date_verified=excluded.date_verified, is_verified=excluded.is_verified",
            K::PROFILE_TABLE
        );
        sqlx::query(&sql)
            .bind(self.id.to_string())
            .bind(&self.host.kind)
            .bind(self.host.id)
            .bind(self.network.id.to_string())
            .bind(&self.username)
            .bind(self.meta.date_added())
            .bind(self.meta.date_verified)
            .bind(self.meta.is_verified)
            .execute(db_pool)
            .await?;

        Ok(())
    }
}

impl<K: NetworkKind> ProfileRecord for NetworkProfile<K> {
    type Row = NetworkProfileRow;

    const TABLE: &'static str = K::PROFILE_TABLE;

    fn select_sql() -> String {
        format!(
            "SELECT p.uuid, p.host_kind, p.host_id, p.username,
                    p.date_added, p.date_verified, p.is_verified,
                    n.uuid AS network_uuid, n.name, n.url, n.identifier, n.icon
             FROM {} p JOIN {} n ON n.uuid = p.network_id",
            K::PROFILE_TABLE,
            K::TABLE
        )
    }

    fn from_row(row: NetworkProfileRow) -> Result<Self> {
        Ok(NetworkProfile {
            id: Uuid::parse_str(&row.uuid)?,
            host: HostRef::new(row.host_kind, row.host_id),
            meta: ProfileMeta::from_parts(row.date_added, row.date_verified, row.is_verified),
            username: row.username,
            network: CatalogNetwork::from_row(NetworkRow {
                uuid: row.network_uuid,
                name: row.name,
                url: row.url,
                identifier: row.identifier,
                icon: row.icon,
            })?,
        })
    }
}

impl<K> fmt::Display for NetworkProfile<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} profile for {}", self.network, self.host)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::future::BoxFuture;

    use super::*;
    use crate::{
        Error,
        cache::MemoryCache,
        db,
        host::HostResolver,
        networks::{InstantMessenger, Network, SocialNetwork, fixtures::twitter},
    };

    struct Users;

    impl HostResolver for Users {
        fn resolve(&self, id: i64) -> BoxFuture<'_, Result<Option<String>>> {
            Box::pin(async move { Ok((id == 1).then(|| "alice".to_owned())) })
        }
    }

    #[test]
    fn url_concatenates_without_separator() {
        let network = SocialNetwork::new(twitter());
        let profile = SocialNetworkProfile::new(HostRef::new("user", 1), network, "alice").unwrap();
        assert_eq!(profile.url(), "http://twitter.com/alice");

        let mut network = twitter();
        network.url = "http://twitter.com".to_owned();
        let profile =
            SocialNetworkProfile::new(HostRef::new("user", 1), SocialNetwork::new(network), "alice")
                .unwrap();
        assert_eq!(profile.url(), "http://twitter.comalice");
    }

    #[test]
    fn username_limits() {
        let network = SocialNetwork::new(twitter());
        let host = HostRef::new("user", 1);
        assert!(SocialNetworkProfile::new(host.clone(), network.clone(), "").is_err());
        assert!(SocialNetworkProfile::new(host, network, &"a".repeat(65)).is_err());
    }

    #[tokio::test]
    async fn display_and_describe() {
        let network = SocialNetwork::new(twitter());
        let profile =
            SocialNetworkProfile::new(HostRef::new("user", 1), network.clone(), "alice").unwrap();
        assert_eq!(profile.to_string(), "Twitter profile for user #1");

        let mut hosts = HostRegistry::new();
        hosts.register("user", Users);
        assert_eq!(
            profile.describe(&hosts).await.unwrap(),
            "Twitter profile for alice"
        );

        let orphan = SocialNetworkProfile::new(HostRef::new("user", 2), network, "bob").unwrap();
        assert!(matches!(orphan.describe(&hosts).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn date_added_survives_updates() {
        let db_pool = db::memory_pool().await;
        let network = SocialNetwork::new(twitter());
        network.save(&db_pool, &MemoryCache::new()).await.unwrap();

        let profile =
            SocialNetworkProfile::new(HostRef::new("user", 1), network, "alice").unwrap();
        profile.save(&db_pool).await.unwrap();

        let objects = SocialNetworkProfile::objects(&db_pool);
        let mut stored = objects.get(profile.id).await.unwrap().unwrap();
        let added = stored.meta.date_added();

        stored.username = "alice2".to_owned();
        stored.meta.verify();
        stored.save(&db_pool).await.unwrap();

        // a fresh record under the same id must not move date_added either
        let mut impostor =
            SocialNetworkProfile::new(HostRef::new("user", 1), stored.network.clone(), "alice3")
                .unwrap();
        impostor.id = profile.id;
        impostor.save(&db_pool).await.unwrap();

        let reloaded = objects.get(profile.id).await.unwrap().unwrap();
        assert_eq!(reloaded.meta.date_added(), added);
        assert_eq!(reloaded.username, "alice3");
        assert_eq!(reloaded.url(), "http://twitter.com/alice3");
    }

    #[tokio::test]
    async fn messenger_profiles_load_their_network() {
        let db_pool = db::memory_pool().await;
        let icq = InstantMessenger::new(Network {
            name: "ICQ".to_owned(),
            url: "http://icq.com/people/".to_owned(),
            identifier: "icq".to_owned(),
            icon: Some("icq.png".to_owned()),
        });
        icq.save(&db_pool, &MemoryCache::new()).await.unwrap();

        let profile =
            InstantMessengerProfile::new(HostRef::new("user", 1), icq.clone(), "12345").unwrap();
        profile.save(&db_pool).await.unwrap();

        let loaded = InstantMessengerProfile::objects(&db_pool)
            .get_for_object(&HostRef::new("user", 1))
            .all()
            .await
            .unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].network, icq);
        assert_eq!(loaded[0].url(), "http://icq.com/people/12345");

        assert!(
            SocialNetworkProfile::objects(&db_pool)
                .get_for_object(&HostRef::new("user", 1))
                .all()
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn profile_needs_a_stored_network() {
        let db_pool = db::memory_pool().await;
        let unsaved = SocialNetwork::new(twitter());
        let profile = SocialNetworkProfile::new(HostRef::new("user", 1), unsaved, "alice").unwrap();

        assert!(matches!(profile.save(&db_pool).await, Err(Error::Database(_))));
    }
}

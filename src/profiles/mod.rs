//! Profiles attaching external presence to host objects.

mod admin;
mod network;
mod page;
mod website;

use std::marker::PhantomData;

use axum::{Router, routing::get};
use futures_util::{StreamExt, TryStreamExt, stream::BoxStream};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool, sqlite::SqliteRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    AppState, Result,
    host::{Host, HostRef},
};

pub use network::{InstantMessengerProfile, NetworkProfile, SocialNetworkProfile};
pub use page::{HostProfiles, ProfileView};
pub use website::{WEBSITE_PROFILES, WebsiteProfile};

/// Verification metadata common to every profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileMeta {
    #[serde(with = "time::serde::rfc3339")]
    date_added: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub date_verified: OffsetDateTime,
    pub is_verified: bool,
}

impl ProfileMeta {
    pub fn new() -> Self {
        let now = OffsetDateTime::now_utc();
        ProfileMeta {
            date_added: now,
            date_verified: now,
            is_verified: false,
        }
    }

    pub(crate) fn from_parts(
        date_added: OffsetDateTime,
        date_verified: OffsetDateTime,
        is_verified: bool,
    ) -> Self {
        ProfileMeta {
            date_added,
            date_verified,
            is_verified,
        }
    }

    /// Set once when the record is created.
    pub fn date_added(&self) -> OffsetDateTime {
        self.date_added
    }

    pub fn verify(&mut self) {
        self.is_verified = true;
        self.date_verified = OffsetDateTime::now_utc();
    }
}

impl Default for ProfileMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// A concrete, stored profile type.
pub trait ProfileRecord: Sized + Send + Unpin + 'static {
    type Row: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static;

    const TABLE: &'static str;

    /// `SELECT ... FROM <table> p` yielding [`Self::Row`], without a `WHERE` clause.
    fn select_sql() -> String;

    fn from_row(row: Self::Row) -> Result<Self>;

    fn objects(db_pool: &SqlitePool) -> ProfileManager<Self> {
        ProfileManager::new(db_pool.clone())
    }
}

pub struct ProfileManager<P> {
    db_pool: SqlitePool,
    record: PhantomData<fn() -> P>,
}

impl<P: ProfileRecord> ProfileManager<P> {
    pub fn new(db_pool: SqlitePool) -> Self {
        ProfileManager {
            db_pool,
            record: PhantomData,
        }
    }

    /// All profiles of this type attached to `host`. Nothing runs until the query is read.
    pub fn get_for_object(&self, host: &impl Host) -> ProfileQuery<P> {
        ProfileQuery {
            db_pool: self.db_pool.clone(),
            host: HostRef::of(host),
            sql: format!(
                "{} WHERE p.host_kind=? AND p.host_id=? ORDER BY p.rowid",
                P::select_sql()
            ),
            record: PhantomData,
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<P>> {
        let sql = format!("{} WHERE p.uuid=?", P::select_sql());
        sqlx::query_as::<_, P::Row>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.db_pool)
            .await?
            .map(P::from_row)
            .transpose()
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE uuid=?", P::TABLE);
        let result = sqlx::query(&sql)
            .bind(id.to_string())
            .execute(&self.db_pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Restartable read over the profiles of one host.
pub struct ProfileQuery<P> {
    db_pool: SqlitePool,
    host: HostRef,
    sql: String,
    record: PhantomData<fn() -> P>,
}

impl<P: ProfileRecord> ProfileQuery<P> {
    pub fn host(&self) -> &HostRef {
        &self.host
    }

    /// Streams matching rows in insertion order; each call runs the query afresh.
    pub fn fetch(&self) -> BoxStream<'_, Result<P>> {
        sqlx::query_as::<_, P::Row>(&self.sql)
            .bind(&self.host.kind)
            .bind(self.host.id)
            .fetch(&self.db_pool)
            .map(|row| P::from_row(row?))
            .boxed()
    }

    pub async fn all(&self) -> Result<Vec<P>> {
        self.fetch().try_collect().await
    }

    pub async fn count(&self) -> Result<usize> {
        self.fetch()
            .try_fold(0, |count, _| async move { Ok::<_, crate::Error>(count + 1) })
            .await
    }
}

pub fn admin_router() -> Router<AppState> {
    admin::router()
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{kind}/{id}/profiles", get(page::host_profiles))
}

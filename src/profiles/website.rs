use std::fmt;

use serde::Serialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    Result,
    error::{check_len, check_url},
    host::HostRef,
    res::favicon_url,
};

use super::{ProfileMeta, ProfileRecord};

pub const WEBSITE_PROFILES: &str = "website_profiles";

/// A site that is not in any network catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebsiteProfile {
    pub id: Uuid,
    pub host: HostRef,
    #[serde(flatten)]
    pub meta: ProfileMeta,
    pub name: String,
    url: String,
}

#[derive(sqlx::FromRow)]
pub struct WebsiteProfileRow {
    uuid: String,
    host_kind: String,
    host_id: i64,
    name: String,
    url: String,
    date_added: OffsetDateTime,
    date_verified: OffsetDateTime,
    is_verified: bool,
}

impl WebsiteProfile {
    pub fn new(host: HostRef, name: &str, url: &str) -> Result<Self> {
        check_len("name", name, 64)?;
        check_url(url)?;

        Ok(WebsiteProfile {
            id: Uuid::now_v7(),
            host,
            meta: ProfileMeta::new(),
            name: name.to_owned(),
            url: url.to_owned(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: &str) -> Result<()> {
        check_url(url)?;
        self.url = url.to_owned();
        Ok(())
    }

    /// Always the favicon service; there are no local icons for arbitrary sites.
    pub fn icon_url(&self) -> String {
        favicon_url(&self.url)
    }

    /// Inserts or updates the row. `date_added` is only written on insert.
    pub async fn save(&self, db_pool: &SqlitePool) -> Result<()> {
        check_len("name", &self.name, 64)?;

        sqlx::query(
            "INSERT INTO website_profiles (uuid,host_kind,host_id,name,url,date_added,date_verified,is_verified)
             VALUES (?,?,?,?,?,?,?,?)
             ON CONFLICT(uuid) DO UPDATE SET
                host_kind=excluded.host_kind, host_id=excluded.host_id,
                name=excluded.name, url=excluded.url,
                date_verified=excluded.date_verified, is_verified=excluded.is_verified",
        )
        .bind(self.id.to_string())
        .bind(&self.host.kind)
        .bind(self.host.id)
        .bind(&self.name)
        .bind(&self.url)
        .bind(self.meta.date_added())
        .bind(self.meta.date_verified)
        .bind(self.meta.is_verified)
        .execute(db_pool)
        .await?;

        Ok(())
    }
}

impl ProfileRecord for WebsiteProfile {
    type Row = WebsiteProfileRow;

    const TABLE: &'static str = WEBSITE_PROFILES;

    fn select_sql() -> String {
        format!(
            "SELECT p.uuid, p.host_kind, p.host_id, p.name, p.url,
                    p.date_added, p.date_verified, p.is_verified
             FROM {WEBSITE_PROFILES} p"
        )
    }

    fn from_row(row: WebsiteProfileRow) -> Result<Self> {
        Ok(WebsiteProfile {
            id: Uuid::parse_str(&row.uuid)?,
            host: HostRef::new(row.host_kind, row.host_id),
            meta: ProfileMeta::from_parts(row.date_added, row.date_verified, row.is_verified),
            name: row.name,
            url: row.url,
        })
    }
}

impl fmt::Display for WebsiteProfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.url)
    }
}

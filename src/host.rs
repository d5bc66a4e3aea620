//! Tagged references to arbitrary host objects.
//!
//! A profile points at its owner through a `(kind, id)` pair. Kinds are plain
//! strings registered with a [`HostRegistry`], which knows how to turn an id of
//! that kind back into something displayable.

use std::{collections::HashMap, fmt, sync::Arc};

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{Error, Result};

/// Any object profiles can be attached to.
pub trait Host {
    fn kind(&self) -> &str;
    fn host_id(&self) -> i64;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostRef {
    pub kind: String,
    pub id: i64,
}

impl HostRef {
    pub fn new(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }

    pub fn of(host: &impl Host) -> Self {
        Self::new(host.kind(), host.host_id())
    }
}

impl Host for HostRef {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn host_id(&self) -> i64 {
        self.id
    }
}

impl fmt::Display for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} #{}", self.kind, self.id)
    }
}

/// Looks up the display label of a host by id. `Ok(None)` means no such host.
pub trait HostResolver: Send + Sync {
    fn resolve(&self, id: i64) -> BoxFuture<'_, Result<Option<String>>>;
}

#[derive(Default, Clone)]
pub struct HostRegistry {
    resolvers: HashMap<String, Arc<dyn HostResolver>>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: impl Into<String>, resolver: impl HostResolver + 'static) {
        self.resolvers.insert(kind.into(), Arc::new(resolver));
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.resolvers.keys().map(String::as_str)
    }

    /// Checks a reference before it is stored: registered kind, non-negative id.
    pub fn ensure_known(&self, host: &HostRef) -> Result<()> {
        if !self.resolvers.contains_key(&host.kind) {
            return Err(Error::UnknownHostKind(host.kind.clone()));
        }
        if host.id < 0 {
            return Err(Error::InvalidField {
                field: "host id",
                reason: format!("{} is negative", host.id),
            });
        }
        Ok(())
    }

    pub async fn resolve(&self, host: &HostRef) -> Result<String> {
        let resolver = self
            .resolvers
            .get(&host.kind)
            .ok_or_else(|| Error::UnknownHostKind(host.kind.clone()))?;

        resolver
            .resolve(host.id)
            .await?
            .ok_or_else(|| Error::NotFound(host.to_string()))
    }
}

/// Host kind backed by a table of the host application, e.g. `user=users.username`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTable {
    pub kind: String,
    pub table: String,
    pub label_column: String,
}

impl HostTable {
    /// Parses a comma separated list of `kind=table.column` entries.
    pub fn parse_list(list: &str) -> Result<Vec<HostTable>> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let bad = || Error::Config(format!("bad host table entry {entry:?}"));
                let (kind, target) = entry.split_once('=').ok_or_else(bad)?;
                let (table, column) = target.split_once('.').ok_or_else(bad)?;
                let (kind, table, column) = (kind.trim(), table.trim(), column.trim());
                if !is_identifier(table) || !is_identifier(column) || kind.is_empty() {
                    return Err(bad());
                }

                Ok(HostTable {
                    kind: kind.to_owned(),
                    table: table.to_owned(),
                    label_column: column.to_owned(),
                })
            })
            .collect()
    }

    pub fn resolver(&self, db_pool: SqlitePool) -> TableResolver {
        TableResolver {
            db_pool,
            sql: format!(
                "SELECT CAST({} AS TEXT) FROM {} WHERE id=?",
                self.label_column, self.table
            ),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub struct TableResolver {
    db_pool: SqlitePool,
    sql: String,
}

impl HostResolver for TableResolver {
    fn resolve(&self, id: i64) -> BoxFuture<'_, Result<Option<String>>> {
        Box::pin(async move {
            let label: Option<(Option<String>,)> = sqlx::query_as(&self.sql)
                .bind(id)
                .fetch_optional(&self.db_pool)
                .await?;

            Ok(label.map(|(label,)| label.unwrap_or_default()))
        })
    }
}

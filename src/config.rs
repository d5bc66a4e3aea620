use std::path::PathBuf;

use crate::{Error, Result, host::HostTable};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind: String,
    pub icon_dir: PathBuf,
    pub icon_route: String,
    pub max_connections: u32,
    pub host_tables: Vec<HostTable>,
}

impl Config {
    /// Reads the environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Config> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| Error::Config("DATABASE_URL is not set".to_owned()))?;

        let max_connections = match lookup("ELSEWHERE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|_| {
                Error::Config(format!("ELSEWHERE_MAX_CONNECTIONS={raw:?} is not a number"))
            })?,
            None => 16,
        };

        let icon_route = lookup("ELSEWHERE_ICON_ROUTE").unwrap_or("/elsewhere/img".to_owned());
        if icon_route.trim_matches('/').is_empty() {
            return Err(Error::Config(format!(
                "ELSEWHERE_ICON_ROUTE={icon_route:?} must name a path below the root"
            )));
        }

        let host_tables = match lookup("ELSEWHERE_HOST_TABLES") {
            Some(raw) => HostTable::parse_list(&raw)?,
            None => Vec::new(),
        };

        Ok(Config {
            database_url,
            bind: lookup("ELSEWHERE_BIND").unwrap_or("0.0.0.0:8080".to_owned()),
            icon_dir: lookup("ELSEWHERE_ICON_DIR")
                .unwrap_or("icons".to_owned())
                .into(),
            icon_route,
            max_connections,
            host_tables,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::res::IconRoute;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(env(&[("DATABASE_URL", "sqlite://elsewhere.db")])).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.icon_route, "/elsewhere/img");
        assert_eq!(config.icon_dir, PathBuf::from("icons"));
        assert_eq!(config.max_connections, 16);
        assert!(config.host_tables.is_empty());
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(
            Config::from_lookup(env(&[])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn rejects_bad_pool_size() {
        let lookup = env(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("ELSEWHERE_MAX_CONNECTIONS", "lots"),
        ]);
        assert!(matches!(Config::from_lookup(lookup), Err(Error::Config(_))));
    }

    #[test]
    fn icon_route_must_not_be_the_root() {
        for route in ["/", "", "//"] {
            let lookup = env(&[
                ("DATABASE_URL", "sqlite::memory:"),
                ("ELSEWHERE_ICON_ROUTE", route),
            ]);
            assert!(matches!(Config::from_lookup(lookup), Err(Error::Config(_))));
        }

        let lookup = env(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("ELSEWHERE_ICON_ROUTE", "static/icons/"),
        ]);
        let config = Config::from_lookup(lookup).unwrap();
        assert_eq!(
            IconRoute::new(&config.icon_route).reverse("x.png"),
            "/static/icons/x.png"
        );
    }

    #[test]
    fn reads_host_tables() {
        let lookup = env(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("ELSEWHERE_HOST_TABLES", "user=users.username"),
        ]);
        let config = Config::from_lookup(lookup).unwrap();
        assert_eq!(config.host_tables[0].kind, "user");
    }
}

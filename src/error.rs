use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
    #[error("no {kind} with id {id}")]
    MissingNetwork { kind: &'static str, id: Uuid },
    #[error("unknown host kind {0:?}")]
    UnknownHostKind(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("malformed row id: {0}")]
    Id(#[from] uuid::Error),
    #[error("cache payload: {0}")]
    Cache(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
}

/// Checks that `url` parses as an absolute URL. The stored value stays as typed.
pub(crate) fn check_url(url: &str) -> Result<()> {
    url::Url::parse(url)
        .map(|_| ())
        .map_err(|source| Error::InvalidUrl {
            url: url.to_owned(),
            source,
        })
}

pub(crate) fn check_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidField {
            field,
            reason: "must not be empty".to_owned(),
        });
    }
    if value.chars().count() > max {
        return Err(Error::InvalidField {
            field,
            reason: format!("longer than {max} characters"),
        });
    }
    Ok(())
}

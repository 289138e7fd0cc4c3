//! Error management.

use crate::front_end::error::PathError;
use derive_more::Display;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display)]
pub enum Error {
    #[display(fmt = "no record `{}` in table `{}`", key, table)]
    NotFound { table: String, key: String },
    #[display(fmt = "malformed ontological path: {}", _0)]
    Path(PathError),
    #[display(fmt = "upstream unavailable: {}", _0)]
    Upstream(String),
    #[display(fmt = "upstream returned HTTP {}: {}", _0, _1)]
    Status(u16, String),
    #[display(fmt = "rate limited by upstream (HTTP {})", _0)]
    RateLimited(u16),
    #[display(fmt = "xml: {}", _0)]
    Xml(String),
    #[display(fmt = "pdf: {}", _0)]
    Pdf(String),
    #[display(fmt = "sqlite: {}", _0)]
    Sqlite(rusqlite::Error),
    #[display(fmt = "yaml: {}", _0)]
    Yaml(serde_yaml::Error),
    #[display(fmt = "json: {}", _0)]
    Json(serde_json::Error),
    #[display(fmt = "io: {}", _0)]
    Io(std::io::Error),
    #[display(fmt = "configuration: {}", _0)]
    Config(String),
    #[display(fmt = "invalid argument: {}", _0)]
    InvalidArgument(String),
}

impl Error {
    pub fn not_found(table: &str, key: &str) -> Self {
        Error::NotFound {
            table: String::from(table),
            key: String::from(key),
        }
    }

    /// Whether the failure came from an unreachable or throttling collaborator.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Upstream(_) | Error::Status(..) | Error::RateLimited(_)
        )
    }
}

impl std::error::Error for Error {}

impl From<PathError> for Error {
    fn from(e: PathError) -> Self {
        Error::Path(e)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Sqlite(e)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Yaml(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(status @ 429) | ureq::Error::StatusCode(status @ 503) => {
                Error::RateLimited(status)
            }
            ureq::Error::StatusCode(status) => Error::Status(status, String::new()),
            other => Error::Upstream(other.to_string()),
        }
    }
}

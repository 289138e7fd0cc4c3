//! The configured databases and their pattern schemas, stored in SQLite.
//!
//! ```sql
//! CREATE TABLE databases (api_key TEXT PRIMARY KEY, name TEXT, ...);
//! CREATE TABLE schemas (api_key TEXT, name TEXT, yaml TEXT,
//!                       PRIMARY KEY (api_key, name));
//! ```

use crate::{
    airtable::{Connector, HttpConnector, Session},
    grouping::PatternSchema,
    Error, Result,
};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS databases (
    api_key TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    account TEXT NOT NULL DEFAULT '',
    token TEXT NOT NULL DEFAULT '',
    sparql_endpoint TEXT,
    github_token TEXT,
    github_repo TEXT,
    github_organization TEXT,
    field_base TEXT,
    collection_base TEXT
);
CREATE TABLE IF NOT EXISTS schemas (
    api_key TEXT NOT NULL,
    name TEXT NOT NULL,
    yaml TEXT NOT NULL,
    PRIMARY KEY (api_key, name)
);
";

const COLUMNS: &str = "api_key, name, account, token, sparql_endpoint, github_token, \
                       github_repo, github_organization, field_base, collection_base";

/// A configured Airtable base.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Database {
    /// The base id.
    pub api_key: String,
    pub name: String,
    /// Owner shown as the index authority.
    pub account: String,
    pub token: String,
    pub sparql_endpoint: Option<String>,
    pub github_token: Option<String>,
    pub github_repo: Option<String>,
    /// Repository owner when it is an organisation.
    pub github_organization: Option<String>,
    /// Base holding the canonical `Field` table.
    pub field_base: Option<String>,
    /// Base holding the canonical `Collection` table.
    pub collection_base: Option<String>,
}

impl Database {
    pub fn new(api_key: &str, name: &str, token: &str) -> Self {
        Self {
            api_key: String::from(api_key),
            name: String::from(name),
            token: String::from(token),
            ..Default::default()
        }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            api_key: row.get(0)?,
            name: row.get(1)?,
            account: row.get(2)?,
            token: row.get(3)?,
            sparql_endpoint: row.get(4)?,
            github_token: row.get(5)?,
            github_repo: row.get(6)?,
            github_organization: row.get(7)?,
            field_base: row.get(8)?,
            collection_base: row.get(9)?,
        })
    }

    /// A session on the main base, with the collection base attached when
    /// one is configured.
    pub fn session(&self, connector: &dyn Connector) -> Result<Session> {
        let session = Session::new(connector.open(&self.api_key)?);
        Ok(match non_empty(&self.collection_base) {
            Some(base) => session.with_collection_base(connector.open(base)?),
            None => session,
        })
    }

    pub fn http_connector(&self, api_root: &str) -> HttpConnector {
        HttpConnector::new(api_root, &self.token)
    }

    pub fn field_base(&self) -> Option<&str> {
        non_empty(&self.field_base)
    }

    pub fn sparql_endpoint(&self) -> Option<&str> {
        non_empty(&self.sparql_endpoint)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

pub struct Registry {
    conn: Connection,
}

impl Registry {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        debug!("opening registry {}", path.as_ref().display());
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Inserts or replaces a database.
    pub fn save(&self, db: &Database) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO databases ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                COLUMNS
            ),
            params![
                db.api_key,
                db.name,
                db.account,
                db.token,
                db.sparql_endpoint,
                db.github_token,
                db.github_repo,
                db.github_organization,
                db.field_base,
                db.collection_base,
            ],
        )?;
        info!("saved database {} ({})", db.name, db.api_key);
        Ok(())
    }

    pub fn get(&self, api_key: &str) -> Result<Option<Database>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM databases WHERE api_key = ?1", COLUMNS),
                params![api_key],
                Database::from_row,
            )
            .optional()?)
    }

    pub fn require(&self, api_key: &str) -> Result<Database> {
        self.get(api_key)?
            .ok_or_else(|| Error::not_found("databases", api_key))
    }

    pub fn list(&self) -> Result<Vec<Database>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM databases ORDER BY name", COLUMNS))?;
        let rows = stmt.query_map([], Database::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Removes a database and its schemas.
    pub fn remove(&self, api_key: &str) -> Result<bool> {
        self.conn
            .execute("DELETE FROM schemas WHERE api_key = ?1", params![api_key])?;
        let removed = self
            .conn
            .execute("DELETE FROM databases WHERE api_key = ?1", params![api_key])?;
        Ok(removed > 0)
    }

    pub fn save_schema(&self, api_key: &str, schema: &PatternSchema) -> Result<()> {
        self.require(api_key)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO schemas (api_key, name, yaml) VALUES (?1, ?2, ?3)",
            params![api_key, schema.name, schema.to_yaml()?],
        )?;
        info!("saved schema {} of {}", schema.name, api_key);
        Ok(())
    }

    pub fn schema(&self, api_key: &str, name: &str) -> Result<PatternSchema> {
        let yaml: Option<String> = self
            .conn
            .query_row(
                "SELECT yaml FROM schemas WHERE api_key = ?1 AND name = ?2",
                params![api_key, name],
                |row| row.get(0),
            )
            .optional()?;
        match yaml {
            Some(yaml) => PatternSchema::from_yaml(&yaml),
            None => Err(Error::not_found("schemas", name)),
        }
    }

    /// All schemas of a database, by name.
    pub fn schemas(&self, api_key: &str) -> Result<Vec<PatternSchema>> {
        let mut stmt = self
            .conn
            .prepare("SELECT yaml FROM schemas WHERE api_key = ?1 ORDER BY name")?;
        let rows = stmt.query_map(params![api_key], |row| row.get::<_, String>(0))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
            .iter()
            .map(|yaml| PatternSchema::from_yaml(yaml))
            .collect()
    }
}

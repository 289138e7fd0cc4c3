//! Access to Airtable bases.

pub use formula::{Formula, Operand};
pub use http::{AirtableClient, HttpConnector, DEFAULT_API_ROOT};
pub use memory::{MemoryBase, MemoryConnector};
pub use session::Session;
pub(crate) use session::find_in;

pub mod formula;

mod http;
mod memory;
mod session;

use crate::{
    types::{Fields, Record},
    Result,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Parameters of a listing request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub formula: Option<Formula>,
    /// Columns to return; all when empty.
    pub fields: Vec<String>,
    pub max_records: Option<usize>,
}

impl Query {
    pub fn formula(formula: Formula) -> Self {
        Self {
            formula: Some(formula),
            ..Default::default()
        }
    }

    pub fn fields<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.fields = fields.iter().map(|f| String::from(f.as_ref())).collect();
        self
    }

    pub fn max_records(mut self, max_records: usize) -> Self {
        self.max_records = Some(max_records);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldOptions {
    #[serde(
        rename = "linkedTableId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub linked_table_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub options: Option<FieldOptions>,
}

impl FieldSchema {
    pub fn linked_table_id(&self) -> Option<&str> {
        self.options.as_ref()?.linked_table_id.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl TableSchema {
    /// The table a link column points at.
    pub fn linked_table_id(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == column)
            .and_then(FieldSchema::linked_table_id)
    }
}

/// A single base of the tabular API.
pub trait Tabular: Send + Sync {
    fn base_id(&self) -> &str;

    /// Fetches by record id; `None` when the id is unknown.
    fn record(&self, table: &str, id: &str) -> Result<Option<Record>>;

    /// Lists records, following pagination to the end.
    fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>>;

    fn schema(&self, table: &str) -> Result<TableSchema>;

    fn update(&self, table: &str, id: &str, fields: Fields) -> Result<Record>;

    fn first(&self, table: &str, formula: &Formula) -> Result<Option<Record>> {
        let query = Query::formula(formula.clone()).max_records(1);
        Ok(self.select(table, &query)?.into_iter().next())
    }

    fn all(&self, table: &str) -> Result<Vec<Record>> {
        self.select(table, &Query::default())
    }
}

/// Opens bases by id.
pub trait Connector: Send + Sync {
    fn open(&self, base_id: &str) -> Result<Arc<dyn Tabular>>;
}

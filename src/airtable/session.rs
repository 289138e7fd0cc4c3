use super::{Formula, Query, Tabular};
use crate::{
    types::{is_record_id, Record},
    Error, Result,
};
use log::{debug, warn};
use serde_json::Value;
use std::{cell::RefCell, collections::HashMap, sync::Arc};

/// Lookup context for one request.
///
/// Holds the table and collection caches; both are dropped with the
/// session.
pub struct Session {
    base: Arc<dyn Tabular>,
    collection_base: Option<Arc<dyn Tabular>>,
    tables: RefCell<HashMap<String, Vec<Record>>>,
    collections: RefCell<HashMap<String, Record>>,
}

impl Session {
    pub fn new(base: Arc<dyn Tabular>) -> Self {
        Self {
            base,
            collection_base: None,
            tables: RefCell::new(HashMap::new()),
            collections: RefCell::new(HashMap::new()),
        }
    }

    /// Collections are looked up in `base` instead of the main base.
    pub fn with_collection_base(mut self, base: Arc<dyn Tabular>) -> Self {
        self.collection_base = Some(base);
        self
    }

    pub fn base(&self) -> &dyn Tabular {
        self.base.as_ref()
    }

    pub fn base_id(&self) -> &str {
        self.base.base_id()
    }

    /// All records of a table, fetched once per session.
    pub fn all(&self, table: &str) -> Result<Vec<Record>> {
        if let Some(records) = self.tables.borrow().get(table) {
            return Ok(records.clone());
        }
        let records = self.base.all(table)?;
        self.tables
            .borrow_mut()
            .insert(String::from(table), records.clone());
        Ok(records)
    }

    pub fn select(&self, table: &str, formula: Formula) -> Result<Vec<Record>> {
        self.base.select(table, &Query::formula(formula))
    }

    pub fn first(&self, table: &str, formula: &Formula) -> Result<Option<Record>> {
        self.base.first(table, formula)
    }

    /// Finds a record by its `ID` column, falling back to the record id.
    pub fn find(&self, table: &str, key: &str) -> Result<Option<Record>> {
        find_in(self.base.as_ref(), table, key)
    }

    pub fn require(&self, table: &str, key: &str) -> Result<Record> {
        self.find(table, key)?
            .ok_or_else(|| Error::not_found(table, key))
    }

    /// Records named by a column value: `"A, B"` is a list of `ID`s, a
    /// `rec…` string a record id, any other string one `ID`, and a list a
    /// list of record ids. Missing references are skipped.
    pub fn records(&self, item: &Value, table: &str) -> Result<Vec<Record>> {
        records_in(self.base.as_ref(), item, table)
    }

    pub fn records_by_ids<S: AsRef<str>>(&self, table: &str, ids: &[S]) -> Result<Vec<Record>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        self.select(table, Formula::record_ids(ids))
    }

    /// The `ID` of the one collection a column value points at; empty when
    /// it resolves to none or several.
    pub fn collection_name(&self, item: &Value) -> Result<String> {
        let key = match item {
            Value::Array(values) => values.first().and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        };
        let key = match key {
            Some(key) if !key.is_empty() => String::from(key),
            _ => return Ok(String::new()),
        };
        if let Some(record) = self.collections.borrow().get(&key) {
            return Ok(String::from(record.key()));
        }
        let base = self.collection_base.as_ref().unwrap_or(&self.base);
        let mut found = records_in(base.as_ref(), item, "Collection")?;
        if found.len() == 1 {
            let record = found.remove(0);
            let name = String::from(record.key());
            self.collections.borrow_mut().insert(key, record);
            Ok(name)
        } else {
            debug!("collection `{}` resolved to {} records", key, found.len());
            Ok(String::new())
        }
    }

    /// Unwraps an optional enrichment lookup, logging and defaulting on
    /// failure.
    pub fn optional<T: Default>(&self, what: &str, result: Result<T>) -> T {
        result.unwrap_or_else(|e| {
            warn!("{}: {}", what, e);
            T::default()
        })
    }
}

pub(crate) fn find_in(base: &dyn Tabular, table: &str, key: &str) -> Result<Option<Record>> {
    if let Some(record) = base.first(table, &Formula::by_key(key))? {
        return Ok(Some(record));
    }
    if is_record_id(key) {
        base.record(table, key)
    } else {
        Ok(None)
    }
}

fn records_in(base: &dyn Tabular, item: &Value, table: &str) -> Result<Vec<Record>> {
    let mut out = vec![];
    match item {
        Value::String(s) if s.contains(',') => {
            for key in s.split(", ") {
                out.extend(base.first(table, &Formula::by_key(key.trim()))?);
            }
        }
        Value::String(s) if is_record_id(s) => out.extend(base.record(table, s)?),
        Value::String(s) if !s.is_empty() => out.extend(base.first(table, &Formula::by_key(s))?),
        Value::Array(values) => {
            for id in values.iter().filter_map(Value::as_str) {
                out.extend(base.record(table, id)?);
            }
        }
        _ => {}
    }
    Ok(out)
}

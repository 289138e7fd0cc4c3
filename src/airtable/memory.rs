use super::{Connector, FieldOptions, FieldSchema, Query, TableSchema, Tabular};
use crate::{
    types::{is_record_id, Fields, Record},
    Error, Result,
};
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
    sync::{Arc, RwLock},
};

/// JSON layout of a base snapshot.
#[derive(Debug, Default, Deserialize)]
struct Snapshot {
    id: String,
    #[serde(default)]
    tables: BTreeMap<String, Vec<Record>>,
    #[serde(default)]
    schemas: BTreeMap<String, TableSchema>,
}

/// A base held in memory; used offline and by the tests.
pub struct MemoryBase {
    id: String,
    tables: RwLock<BTreeMap<String, Vec<Record>>>,
    schemas: BTreeMap<String, TableSchema>,
}

impl MemoryBase {
    pub fn new(id: &str) -> Self {
        Self {
            id: String::from(id),
            tables: RwLock::new(BTreeMap::new()),
            schemas: BTreeMap::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(Self {
            id: snapshot.id,
            tables: RwLock::new(snapshot.tables),
            schemas: snapshot.schemas,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn with_record(self, table: &str, record: Record) -> Self {
        self.insert(table, record);
        self
    }

    pub fn insert(&self, table: &str, record: Record) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.entry(String::from(table)).or_default().push(record);
    }

    fn table_name<'a>(&'a self, table: &'a str) -> &'a str {
        self.schemas
            .iter()
            .find(|(_, schema)| schema.id == table)
            .map_or(table, |(name, _)| name.as_str())
    }

    /// The primary value of any record in the base.
    fn primary_value(&self, tables: &BTreeMap<String, Vec<Record>>, id: &str) -> Option<String> {
        tables
            .values()
            .flatten()
            .find(|r| r.id == id)
            .and_then(|r| r.first_text(&["ID", "Name"]))
            .map(String::from)
    }

    fn infer_schema(&self, tables: &BTreeMap<String, Vec<Record>>, table: &str) -> TableSchema {
        let mut fields: Vec<FieldSchema> = vec![];
        for record in tables.get(table).into_iter().flatten() {
            for (column, value) in &record.fields {
                if fields.iter().any(|f| &f.name == column) {
                    continue;
                }
                let linked = match value {
                    Value::Array(values) => values
                        .iter()
                        .filter_map(Value::as_str)
                        .find(|s| is_record_id(s))
                        .and_then(|id| {
                            tables
                                .iter()
                                .find(|(_, records)| records.iter().any(|r| r.id == id))
                                .map(|(name, _)| name.clone())
                        }),
                    _ => None,
                };
                fields.push(FieldSchema {
                    id: column.clone(),
                    name: column.clone(),
                    kind: String::from(if linked.is_some() {
                        "multipleRecordLinks"
                    } else {
                        "singleLineText"
                    }),
                    options: linked.map(|linked_table_id| FieldOptions {
                        linked_table_id: Some(linked_table_id),
                    }),
                });
            }
        }
        TableSchema {
            id: String::from(table),
            name: String::from(table),
            fields,
        }
    }
}

fn project(record: &Record, fields: &[String]) -> Record {
    if fields.is_empty() {
        return record.clone();
    }
    let projected: Fields = record
        .fields
        .iter()
        .filter(|(column, _)| fields.contains(column))
        .map(|(column, value)| (column.clone(), value.clone()))
        .collect();
    Record {
        id: record.id.clone(),
        fields: projected,
        created_time: record.created_time.clone(),
    }
}

impl Tabular for MemoryBase {
    fn base_id(&self) -> &str {
        &self.id
    }

    fn record(&self, table: &str, id: &str) -> Result<Option<Record>> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        Ok(tables
            .get(self.table_name(table))
            .and_then(|records| records.iter().find(|r| r.id == id))
            .cloned())
    }

    fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let resolve = |id: &str| self.primary_value(&tables, id);
        let mut out: Vec<Record> = tables
            .get(self.table_name(table))
            .into_iter()
            .flatten()
            .filter(|r| query.formula.as_ref().map_or(true, |f| f.eval(r, &resolve)))
            .map(|r| project(r, &query.fields))
            .collect();
        if let Some(max) = query.max_records {
            out.truncate(max);
        }
        debug!("{}/{}: {} records", self.id, table, out.len());
        Ok(out)
    }

    fn schema(&self, table: &str) -> Result<TableSchema> {
        let name = self.table_name(table);
        if let Some(schema) = self.schemas.get(name) {
            return Ok(schema.clone());
        }
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        if !tables.contains_key(name) {
            return Err(Error::not_found("tables", table));
        }
        Ok(self.infer_schema(&tables, name))
    }

    fn update(&self, table: &str, id: &str, fields: Fields) -> Result<Record> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let name = String::from(self.table_name(table));
        let record = tables
            .get_mut(&name)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| Error::not_found(table, id))?;
        record.fields.extend(fields);
        Ok(record.clone())
    }
}

/// Hands out in-memory bases by id.
#[derive(Default)]
pub struct MemoryConnector {
    bases: HashMap<String, Arc<MemoryBase>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base: MemoryBase) -> Self {
        self.add(Arc::new(base));
        self
    }

    pub fn add(&mut self, base: Arc<MemoryBase>) {
        self.bases.insert(String::from(base.base_id()), base);
    }

    pub fn base(&self, base_id: &str) -> Option<Arc<MemoryBase>> {
        self.bases.get(base_id).cloned()
    }
}

impl Connector for MemoryConnector {
    fn open(&self, base_id: &str) -> Result<Arc<dyn Tabular>> {
        match self.bases.get(base_id) {
            Some(base) => Ok(base.clone()),
            None => Err(Error::not_found("bases", base_id)),
        }
    }
}

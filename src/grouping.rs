//! Pattern schemas and the grouped views built from them.
//!
//! A schema pairs a *high* table (models or collections) with a *low*
//! table whose `GroupBy` column links each row to its high record. Columns
//! are remapped to schema keys on the way out.

use crate::{
    airtable::{Formula, Query, Session, TableSchema},
    registry::Database,
    task::ModelTables,
    tools::GroupBy,
    types::{display_value, is_record_id, Record},
    Error, Result,
};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const GROUP_BY: &str = "GroupBy";
pub const KEY_FIELD: &str = "KeyField";
pub const CONTAINS: &str = "Contains";
pub const DEFAULT_GROUP: &str = "default";

/// A record with its columns renamed to schema keys.
pub type Row = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub key: String,
    pub column: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub table: String,
    pub columns: Vec<Column>,
}

impl TableSpec {
    pub fn new(table: &str, columns: &[(&str, &str)]) -> Self {
        Self {
            table: String::from(table),
            columns: columns
                .iter()
                .map(|(key, column)| Column {
                    key: String::from(*key),
                    column: String::from(*column),
                })
                .collect(),
        }
    }

    pub fn column(&self, key: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.column.as_str())
    }

    fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column.as_str()).collect()
    }
}

/// Display and export options of one schema key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnOptions {
    pub key: String,
    pub exportable: bool,
    pub groupable: bool,
    pub hideable: bool,
    pub sortable: bool,
    /// Table the column links into; linked rows are embedded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// `UI_Name`, `Identifier` or `Description` in pattern documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ColumnOptions {
    pub fn new(key: &str) -> Self {
        Self {
            key: String::from(key),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSort {
    pub table: String,
    /// Column of `table` holding the position of a group.
    pub order: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSchema {
    pub name: String,
    pub high: TableSpec,
    pub low: TableSpec,
    #[serde(default)]
    pub prefill: Vec<ColumnOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_sort: Option<GroupSort>,
}

impl PatternSchema {
    /// Models and their `Model_Fields` rows.
    pub fn model() -> Self {
        Self {
            name: String::from("Model"),
            high: TableSpec::new(
                "Model",
                &[
                    (KEY_FIELD, "ID"),
                    ("Name", "UI_Name"),
                    ("Description", "Description"),
                    ("Ontology", "Ontology_Scope"),
                    ("Turtle RDF", "Model_Turtle_Prefix"),
                ],
            ),
            low: TableSpec::new(
                "Model_Fields",
                &[
                    (KEY_FIELD, "ID"),
                    (GROUP_BY, "Model"),
                    ("Field", "Field"),
                    ("Name", "Field_UI_Name"),
                    ("Description", "Model_Specific_Description"),
                    ("Group", "Field_Group"),
                    ("Order", "Model_Specific_Field_Order"),
                    ("CRM Path", "Ontological_Long_Path"),
                ],
            ),
            prefill: vec![
                ColumnOptions {
                    exportable: true,
                    role: Some(String::from("Identifier")),
                    ..ColumnOptions::new(KEY_FIELD)
                },
                ColumnOptions {
                    exportable: true,
                    role: Some(String::from("UI_Name")),
                    ..ColumnOptions::new("Name")
                },
                ColumnOptions {
                    exportable: true,
                    role: Some(String::from("Description")),
                    ..ColumnOptions::new("Description")
                },
                ColumnOptions {
                    groupable: true,
                    ..ColumnOptions::new("Group")
                },
                ColumnOptions {
                    hideable: true,
                    sortable: true,
                    ..ColumnOptions::new("Order")
                },
                ColumnOptions {
                    exportable: true,
                    hideable: true,
                    ..ColumnOptions::new("Field")
                },
            ],
            group_sort: None,
        }
    }

    /// Collections and their `Collection_Fields` rows.
    pub fn collection() -> Self {
        let mut schema = Self::model();
        schema.name = String::from("Collection");
        schema.high.table = String::from("Collection");
        schema.low = TableSpec::new(
            "Collection_Fields",
            &[
                (KEY_FIELD, "ID"),
                (GROUP_BY, "Collection"),
                ("Field", "Field"),
                ("Name", "Field_UI_Name"),
                ("Description", "Collection_Specific_Description"),
                ("Group", "Field_Group"),
                ("Order", "Collection_Specific_Field_Order"),
                ("CRM Path", "Ontological_Long_Path"),
            ],
        );
        schema
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let schema: Self = serde_yaml::from_str(text)?;
        schema.group_by()?;
        Ok(schema)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The low-table column linking a row to its group.
    pub fn group_by(&self) -> Result<&str> {
        self.low.column(GROUP_BY).ok_or_else(|| {
            Error::Config(format!(
                "schema `{}`: table `{}` has no {} column",
                self.name, self.low.table, GROUP_BY
            ))
        })
    }

    pub fn tables(&self) -> Result<ModelTables> {
        Ok(ModelTables::new(&self.high.table, &self.low.table, self.group_by()?))
    }

    pub fn options(&self, key: &str) -> Option<&ColumnOptions> {
        self.prefill.iter().find(|o| o.key == key)
    }

    /// The first groupable key.
    pub fn group_key(&self) -> Option<&str> {
        self.prefill
            .iter()
            .find(|o| o.groupable)
            .map(|o| o.key.as_str())
    }

    pub fn hidden_keys(&self) -> Vec<&str> {
        self.prefill
            .iter()
            .filter(|o| o.hideable)
            .map(|o| o.key.as_str())
            .collect()
    }

    /// The key whose role in pattern documents is `role`.
    pub fn role_key(&self, role: &str) -> Option<&str> {
        self.prefill
            .iter()
            .find(|o| o.exportable && o.role.as_deref() == Some(role))
            .map(|o| o.key.as_str())
    }
}

/// Replaces a list of record ids with the `ID`s (or `Name`s) of the
/// records, joined with ", ". Anything else passes through.
fn resolve_links(session: &Session, schema: Option<&TableSchema>, column: &str, value: Value) -> Value {
    let ids: Vec<&str> = match &value {
        Value::Array(values) => values.iter().filter_map(Value::as_str).collect(),
        _ => return value,
    };
    if !ids.iter().any(|id| is_record_id(id)) {
        return value;
    }
    let table = match schema.and_then(|s| s.linked_table_id(column)) {
        Some(table) => table,
        None => {
            warn!("no linked table for column `{}`", column);
            return value;
        }
    };
    let names = session
        .optional("linked records", session.all(table))
        .iter()
        .filter(|r| ids.contains(&r.id.as_str()))
        .filter_map(|r| r.first_text(&["ID", "Name"]))
        .collect::<Vec<_>>()
        .join(", ");
    Value::String(names)
}

fn table_schema(session: &Session, table: &str) -> Option<TableSchema> {
    session.optional("table schema", session.base().schema(table).map(Some))
}

/// Every high record, remapped, with a `Contains` column listing its low
/// records.
pub fn list_groups(session: &Session, schema: &PatternSchema) -> Result<Vec<Row>> {
    let mut columns: Vec<(String, String)> = schema
        .high
        .columns
        .iter()
        .map(|c| (c.key.clone(), c.column.clone()))
        .collect();
    if !columns.iter().any(|(key, _)| key == CONTAINS) {
        columns.push((String::from(CONTAINS), schema.low.table.clone()));
    }
    let names: Vec<&str> = columns.iter().map(|(_, column)| column.as_str()).collect();
    let records = session
        .base()
        .select(&schema.high.table, &Query::default().fields(&names))?;
    let table_schema = table_schema(session, &schema.high.table);
    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|(key, column)| {
                    let value = record
                        .get(column)
                        .cloned()
                        .unwrap_or_else(|| Value::String(String::new()));
                    (key.clone(), resolve_links(session, table_schema.as_ref(), column, value))
                })
                .collect::<Row>()
        })
        .collect::<Vec<_>>();
    debug!("{}: {} groups", schema.name, rows.len());
    Ok(rows)
}

/// One high record and the low records grouped under it.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupedItem {
    pub id: String,
    pub header: Row,
    /// `(record id, row)` in table order.
    pub rows: Vec<(String, Row)>,
}

fn embed(record: &Record, table: &str) -> Value {
    let mut object = Map::new();
    object.insert(String::from("id"), Value::String(record.id.clone()));
    object.insert(String::from("fields"), Value::Object(record.fields.clone()));
    object.insert(String::from("table"), Value::String(String::from(table)));
    Value::Object(object)
}

/// Replaces linked ids with the records of `table`; unknown ids are
/// dropped.
fn enrich(session: &Session, value: &Value, table: &str) -> Value {
    let records = session.optional("linked records", session.all(table));
    let ids: Vec<&str> = match value {
        Value::Array(values) => values.iter().filter_map(Value::as_str).collect(),
        Value::String(s) => vec![s.as_str()],
        _ => vec![],
    };
    Value::Array(
        ids.iter()
            .filter_map(|id| records.iter().find(|r| r.id == *id))
            .map(|r| embed(r, table))
            .collect(),
    )
}

/// Looks up the high record whose `ID` (or record id) is `key`.
pub fn grouped_item(session: &Session, schema: &PatternSchema, key: &str) -> Result<Option<GroupedItem>> {
    let mut names = schema.high.column_names();
    names.push("ID");
    let record = session
        .base()
        .select(&schema.high.table, &Query::default().fields(&names))?
        .into_iter()
        .find(|r| r.key() == key || r.id == key);
    let record = match record {
        Some(record) => record,
        None => return Ok(None),
    };
    let id = String::from(record.key());
    let table_schema = table_schema(session, &schema.high.table);
    let mut header = Row::new();
    header.insert(String::from("ID"), Value::String(id.clone()));
    for column in &schema.high.columns {
        let value = record
            .get(&column.column)
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()));
        header.insert(
            column.key.clone(),
            resolve_links(session, table_schema.as_ref(), &column.column, value),
        );
    }

    let query = Query::formula(Formula::search(&id, schema.group_by()?))
        .fields(&schema.low.column_names());
    let mut rows = vec![];
    for low in session.base().select(&schema.low.table, &query)? {
        let mut row = Row::new();
        for column in &schema.low.columns {
            let value = match low.get(&column.column) {
                Some(value) => value,
                None => continue,
            };
            let options = schema.options(&column.key);
            let link = match (options, &schema.group_sort) {
                (Some(o), Some(sort)) if o.groupable => Some(sort.table.as_str()),
                (Some(o), _) => o.link.as_deref(),
                (None, _) => None,
            };
            let value = match link {
                Some(table) => enrich(session, value, table),
                None => value.clone(),
            };
            row.insert(column.key.clone(), value);
        }
        rows.push((low.id.clone(), row));
    }
    info!("{} `{}` groups {} rows", schema.high.table, id, rows.len());
    Ok(Some(GroupedItem { id, header, rows }))
}

/// Name of the group a row belongs to under `key`.
fn group_name(row: &Row, key: &str) -> String {
    match row.get(key) {
        Some(Value::Array(values)) => match values.first() {
            Some(Value::Object(linked)) => linked
                .get("fields")
                .and_then(|fields| fields.get("ID"))
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| String::from(DEFAULT_GROUP)),
            Some(Value::String(s)) => s.clone(),
            _ => String::from(DEFAULT_GROUP),
        },
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => String::from(DEFAULT_GROUP),
    }
}

/// Position of a group from the first linked record of its first row.
fn group_position(row: &Row, key: &str, order: &str) -> Option<f64> {
    let linked = row.get(key)?.as_array()?.first()?;
    match linked.get("fields")?.get(order)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Groups the rows of `item` by `key` in order of first appearance, then by
/// the group-sort order when given. Without a key all rows form one
/// `default` group.
pub fn group_fields(item: &GroupedItem, key: Option<&str>, group_sort: Option<&GroupSort>) -> Vec<(String, Vec<Row>)> {
    let key = match key {
        Some(key) => key,
        None => {
            let rows = item.rows.iter().map(|(_, row)| row.clone()).collect();
            return vec![(String::from(DEFAULT_GROUP), rows)];
        }
    };
    let mut seen: Vec<String> = vec![];
    let mut keyed: Vec<(usize, &Row)> = item
        .rows
        .iter()
        .map(|(_, row)| {
            let name = group_name(row, key);
            let position = match seen.iter().position(|s| *s == name) {
                Some(position) => position,
                None => {
                    seen.push(name);
                    seen.len() - 1
                }
            };
            (position, row)
        })
        .collect();
    keyed.sort_by_key(|(position, _)| *position);
    let mut groups: Vec<(String, Vec<Row>)> = GroupBy::new(&keyed, |(position, _)| *position)
        .map(|(position, rows)| {
            (
                seen[position].clone(),
                rows.iter().map(|(_, row)| (*row).clone()).collect(),
            )
        })
        .collect();
    if let Some(sort) = group_sort {
        groups.sort_by(|(_, a), (_, b)| {
            let a = a.first().and_then(|row| group_position(row, key, &sort.order));
            let b = b.first().and_then(|row| group_position(row, key, &sort.order));
            match (a, b) {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
    }
    groups
}

/// Turns the sortable keys of `item` into numbers when every row holds a
/// string of digits there.
pub fn coerce_sortable(item: &mut GroupedItem, schema: &PatternSchema) {
    for options in schema.prefill.iter().filter(|o| o.sortable) {
        let numeric = item.rows.iter().all(|(_, row)| {
            row.get(&options.key)
                .and_then(Value::as_str)
                .map_or(false, |s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        });
        if !numeric {
            continue;
        }
        for (_, row) in item.rows.iter_mut() {
            let number = row
                .get(&options.key)
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<u64>().ok());
            if let Some(number) = number {
                row.insert(options.key.clone(), Value::from(number));
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryField {
    pub id: String,
    pub ui_name: String,
}

/// A grouped item ready for display: its groups and the sample categories
/// of their fields.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemView {
    pub item: GroupedItem,
    pub groups: Vec<(String, Vec<Row>)>,
    /// Fields by deployment collection, over all groups.
    pub categories: Vec<(String, Vec<CategoryField>)>,
}

fn category_name(session: &Session, field: &Record) -> String {
    match field.links("Collection_Deployed").first() {
        Some(name) if is_record_id(name) => {
            let collection = session.optional("collection", session.base().record("Collection", name));
            match collection {
                Some(collection) => format!("{}: Sample", collection.text_or_default("UI_Name")),
                None => String::new(),
            }
        }
        Some(name) => name.clone(),
        None => format!("{}: Sample", field.text_or_default("UI_Name")),
    }
}

/// The display view of the item `key`.
pub fn display(session: &Session, schema: &PatternSchema, key: &str) -> Result<Option<ItemView>> {
    let mut item = match grouped_item(session, schema, key)? {
        Some(item) => item,
        None => return Ok(None),
    };
    coerce_sortable(&mut item, schema);
    let groups = group_fields(&item, schema.group_key(), schema.group_sort.as_ref());
    let mut categories: Vec<(String, Vec<CategoryField>)> = vec![];
    for (_, rows) in &groups {
        let ids: Vec<String> = rows
            .iter()
            .filter_map(|row| row.get("Field"))
            .filter_map(|field| match field {
                Value::Array(values) => values.first().and_then(Value::as_str).map(String::from),
                Value::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        for field in session.records_by_ids("Field", &ids)? {
            let name = category_name(session, &field);
            if name.is_empty() {
                continue;
            }
            let entry = CategoryField {
                id: field.id.clone(),
                ui_name: String::from(field.text_or_default("UI_Name")),
            };
            match categories.iter_mut().find(|(n, _)| *n == name) {
                Some((_, fields)) => fields.push(entry),
                None => categories.push((name, vec![entry])),
            }
        }
    }
    Ok(Some(ItemView {
        item,
        groups,
        categories,
    }))
}

/// A database together with its pattern schemas.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchTarget {
    pub database: Database,
    pub schemas: Vec<PatternSchema>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "apikey")]
    pub api_key: String,
    pub name: String,
    pub id: String,
    pub db: String,
    pub authority: String,
}

fn hits<F>(targets: &[SearchTarget], open: F, needle: Option<&str>) -> Result<Vec<SearchHit>>
where
    F: Fn(&Database) -> Result<Session> + Sync,
{
    let needle = needle.map(str::to_lowercase);
    let found = targets
        .par_iter()
        .map(|target| {
            let session = open(&target.database)?;
            let mut hits = vec![];
            for schema in &target.schemas {
                for row in list_groups(&session, schema)? {
                    let name = match row.get("Name") {
                        Some(Value::String(name)) if !name.is_empty() => name,
                        _ => continue,
                    };
                    if let Some(needle) = &needle {
                        if !name.to_lowercase().contains(needle.as_str()) {
                            continue;
                        }
                    }
                    if row.get(CONTAINS).map_or(true, |c| display_value(c).is_empty()) {
                        continue;
                    }
                    hits.push(SearchHit {
                        kind: schema.name.clone(),
                        api_key: target.database.api_key.clone(),
                        name: name.clone(),
                        id: row.get(KEY_FIELD).map(display_value).unwrap_or_default(),
                        db: target.database.name.clone(),
                        authority: target.database.account.clone(),
                    });
                }
            }
            debug!("{}: {} hits", target.database.name, hits.len());
            Ok(hits)
        })
        .collect::<Result<Vec<Vec<SearchHit>>>>()?;
    Ok(found.into_iter().flatten().collect())
}

/// Groups whose name contains `needle`, ignoring case, across all
/// databases. One failing database fails the search.
pub fn search<F>(targets: &[SearchTarget], open: F, needle: &str) -> Result<Vec<SearchHit>>
where
    F: Fn(&Database) -> Result<Session> + Sync,
{
    let hits = hits(targets, open, Some(needle))?;
    info!("search `{}`: {} hits in {} databases", needle, hits.len(), targets.len());
    Ok(hits)
}

/// Every non-empty group of every database, by the lowercase first letter
/// of its name.
pub fn index<F>(targets: &[SearchTarget], open: F) -> Result<BTreeMap<String, Vec<SearchHit>>>
where
    F: Fn(&Database) -> Result<Session> + Sync,
{
    let mut index: BTreeMap<String, Vec<SearchHit>> = BTreeMap::new();
    for hit in hits(targets, open, None)? {
        let letter = hit
            .name
            .chars()
            .next()
            .map(|c| c.to_lowercase().collect::<String>())
            .unwrap_or_default();
        index.entry(letter).or_default().push(hit);
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airtable::MemoryBase;
    use serde_json::json;
    use std::sync::Arc;

    fn base() -> MemoryBase {
        MemoryBase::from_json(
            &json!({
                "id": "appMain",
                "tables": {
                    "Model": [
                        {"id": "recM1", "fields": {"ID": "M1", "UI_Name": "Object", "Ontology_Scope": ["recE22"], "Model_Fields": ["recMF1", "recMF2"]}},
                        {"id": "recM2", "fields": {"ID": "M2", "UI_Name": "Empty"}},
                        {"id": "recM3", "fields": {"ID": "M3", "UI_Name": "Person", "Model_Fields": ["recMF3"]}}
                    ],
                    "Model_Fields": [
                        {"id": "recMF1", "fields": {"ID": "M1.F1", "Model": "M1", "Field": ["recF1"], "Field_UI_Name": "Title", "Field_Group": ["recG2"], "Model_Specific_Field_Order": "10"}},
                        {"id": "recMF2", "fields": {"ID": "M1.F2", "Model": "M1", "Field": ["recF2"], "Field_UI_Name": "Maker", "Field_Group": ["recG1"], "Model_Specific_Field_Order": "2"}},
                        {"id": "recMF3", "fields": {"ID": "M3.F1", "Model": "M3", "Field": ["recF1"], "Field_UI_Name": "Title"}}
                    ],
                    "Field_Group": [
                        {"id": "recG1", "fields": {"ID": "Production", "Order": 1}},
                        {"id": "recG2", "fields": {"ID": "Identification", "Order": 2}}
                    ],
                    "Field": [
                        {"id": "recF1", "fields": {"ID": "F1", "UI_Name": "Title", "Collection_Deployed": ["recC1"]}},
                        {"id": "recF2", "fields": {"ID": "F2", "UI_Name": "Maker"}}
                    ],
                    "Collection": [{"id": "recC1", "fields": {"ID": "C1", "UI_Name": "Titles"}}],
                    "CRM Class": [{"id": "recE22", "fields": {"ID": "E22_Human-Made_Object"}}]
                }
            })
            .to_string(),
        )
        .unwrap()
    }

    fn session() -> Session {
        Session::new(Arc::new(base()))
    }

    #[test]
    fn test_schema_yaml() {
        let schema = PatternSchema::model();
        let parsed = PatternSchema::from_yaml(&schema.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, schema);
        assert_eq!(parsed.tables().unwrap(), ModelTables::default());
        assert_eq!(parsed.group_key(), Some("Group"));
        assert_eq!(parsed.role_key("UI_Name"), Some("Name"));

        let broken = "name: X\nhigh: {table: A, columns: []}\nlow: {table: B, columns: []}\n";
        assert!(matches!(PatternSchema::from_yaml(broken), Err(Error::Config(_))));
    }

    #[test]
    fn test_list_groups() {
        let rows = list_groups(&session(), &PatternSchema::model()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["Ontology"], json!("E22_Human-Made_Object"));
        assert_eq!(rows[0][CONTAINS], json!("M1.F1, M1.F2"));
        assert_eq!(rows[1][CONTAINS], json!(""));
    }

    #[test]
    fn test_grouped_item_and_groups() {
        let mut schema = PatternSchema::model();
        let session = session();
        assert!(grouped_item(&session, &schema, "M9").unwrap().is_none());

        let item = grouped_item(&session, &schema, "M1").unwrap().unwrap();
        assert_eq!(item.header["ID"], json!("M1"));
        assert_eq!(item.rows.len(), 2);
        let groups = group_fields(&item, None, None);
        assert_eq!(groups[0].0, DEFAULT_GROUP);
        assert_eq!(groups[0].1.len(), 2);

        schema.prefill[3].link = Some(String::from("Field_Group"));
        let item = grouped_item(&session, &schema, "recM1").unwrap().unwrap();
        let names: Vec<String> = group_fields(&item, Some("Group"), None)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["Identification", "Production"]);

        let sort = GroupSort {
            table: String::from("Field_Group"),
            order: String::from("Order"),
        };
        let names: Vec<String> = group_fields(&item, Some("Group"), Some(&sort))
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["Production", "Identification"]);
    }

    #[test]
    fn test_display() {
        let view = display(&session(), &PatternSchema::model(), "M1").unwrap().unwrap();
        assert_eq!(view.item.rows[0].1["Order"], json!(10));
        assert_eq!(
            view.categories,
            vec![
                (
                    String::from("Titles: Sample"),
                    vec![CategoryField {
                        id: String::from("recF1"),
                        ui_name: String::from("Title"),
                    }]
                ),
                (
                    String::from("Maker: Sample"),
                    vec![CategoryField {
                        id: String::from("recF2"),
                        ui_name: String::from("Maker"),
                    }]
                ),
            ]
        );
    }

    #[test]
    fn test_search_and_index() {
        let targets = vec![SearchTarget {
            database: Database {
                account: String::from("Museum"),
                ..Database::new("appMain", "Main", "")
            },
            schemas: vec![PatternSchema::model()],
        }];
        let open = |_: &Database| Ok(session());
        let hits = search(&targets, open, "OBJ").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "M1");
        assert_eq!(hits[0].db, "Main");
        assert!(search(&targets, open, "empty").unwrap().is_empty());

        let index = index(&targets, open).unwrap();
        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["o", "p"]);
        assert_eq!(index["p"][0].authority, "Museum");

        let failing = |_: &Database| -> Result<Session> { Err(Error::Upstream(String::from("down"))) };
        assert!(search(&targets, failing, "obj").is_err());
    }
}

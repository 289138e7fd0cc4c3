//! Records and typed views over them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The Airtable record id type (`rec…`).
pub type RecordId = String;

/// The column map of a record.
pub type Fields = Map<String, Value>;

/// A raw record as returned by the tabular API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub fields: Fields,
    #[serde(
        rename = "createdTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_time: Option<String>,
}

impl Record {
    pub fn new(id: &str, fields: Fields) -> Self {
        Self {
            id: String::from(id),
            fields,
            created_time: None,
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Text of a column; for list columns the first element.
    pub fn text(&self, column: &str) -> Option<&str> {
        match self.fields.get(column)? {
            Value::String(s) => Some(s.as_str()),
            Value::Array(values) => values.first().and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn text_or_default(&self, column: &str) -> &str {
        self.text(column).unwrap_or("")
    }

    /// Non-empty text of the first column that has one.
    pub fn first_text(&self, columns: &[&str]) -> Option<&str> {
        columns
            .iter()
            .filter_map(|column| self.text(column))
            .find(|s| !s.is_empty())
    }

    /// Column rendered the way a report cell shows it.
    pub fn display(&self, column: &str) -> String {
        self.fields.get(column).map(display_value).unwrap_or_default()
    }

    /// Ids or names held by a link column; a plain string counts as one.
    pub fn links(&self, column: &str) -> Vec<String> {
        match self.fields.get(column) {
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
            _ => vec![],
        }
    }

    /// The `ID` column, which every pattern table carries.
    pub fn key(&self) -> &str {
        self.text_or_default("ID")
    }
}

/// Renders a column value as plain text.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(values) => values
            .iter()
            .map(display_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .get("fields")
            .and_then(|fields| fields.get("UI_Name").or_else(|| fields.get("ID")))
            .map(display_value)
            .unwrap_or_default(),
        other => other.to_string(),
    }
}

/// Whether a string looks like an Airtable record id.
pub fn is_record_id(s: &str) -> bool {
    s.starts_with("rec")
}

/// Outcome of a lookup that should match exactly one record.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution<T> {
    Found(T),
    NotFound,
    Ambiguous(Vec<T>),
}

impl<T> Default for Resolution<T> {
    fn default() -> Self {
        Resolution::NotFound
    }
}

impl<T> Resolution<T> {
    pub fn from_vec(mut items: Vec<T>) -> Self {
        match items.len() {
            0 => Resolution::NotFound,
            1 => Resolution::Found(items.remove(0)),
            _ => Resolution::Ambiguous(items),
        }
    }

    /// The unique match, if any.
    pub fn found(self) -> Option<T> {
        match self {
            Resolution::Found(item) => Some(item),
            _ => None,
        }
    }

    /// The unique match, or the first of several.
    pub fn first(self) -> Option<T> {
        match self {
            Resolution::Found(item) => Some(item),
            Resolution::Ambiguous(mut items) => Some(items.remove(0)),
            Resolution::NotFound => None,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> Resolution<U> {
        match self {
            Resolution::Found(item) => Resolution::Found(f(item)),
            Resolution::NotFound => Resolution::NotFound,
            Resolution::Ambiguous(items) => Resolution::Ambiguous(items.into_iter().map(f).collect()),
        }
    }
}

/// Expected value type of a field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueType {
    Date,
    Integer,
    String,
    Uri,
    Concept,
    Collection,
    ReferenceModel,
    Other(String),
}

impl ValueType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "date" => ValueType::Date,
            "integer" => ValueType::Integer,
            "string" => ValueType::String,
            "uri" => ValueType::Uri,
            "concept" => ValueType::Concept,
            "collection" => ValueType::Collection,
            "reference model" => ValueType::ReferenceModel,
            _ => ValueType::Other(String::from(s)),
        }
    }

    /// Scalar values carry no `rdfs:label`.
    pub fn is_scalar(&self) -> bool {
        matches!(self, ValueType::Date | ValueType::Integer)
    }

    pub fn xsd_datatype(&self) -> &'static str {
        match self {
            ValueType::Integer => "xsd:integer",
            ValueType::Date => "xsd:date",
            ValueType::String => "xsd:string",
            _ => "xsd:anyURI",
        }
    }

    pub fn datatype_uri(&self) -> Option<&'static str> {
        match self {
            ValueType::Date => Some("http://www.w3.org/2001/XMLSchema#date"),
            ValueType::Integer => Some("http://www.w3.org/2001/XMLSchema#integer"),
            ValueType::String => Some("http://www.w3.org/2001/XMLSchema#string"),
            ValueType::Uri
            | ValueType::Concept
            | ValueType::Collection
            | ValueType::ReferenceModel => Some("http://www.w3.org/2001/XMLSchema#anyURI"),
            ValueType::Other(_) => None,
        }
    }
}

/// Typed view over a `Field` record.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    record: Record,
    value_type: ValueType,
}

impl Field {
    pub fn new(record: Record) -> Self {
        let value_type = ValueType::parse(record.text_or_default("Expected_Value_Type"));
        Self { record, value_type }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn record_id(&self) -> &str {
        &self.record.id
    }

    /// The human identifier (`ID` column).
    pub fn id(&self) -> &str {
        self.record.key()
    }

    pub fn system_name(&self) -> &str {
        self.record.text_or_default("System_Name")
    }

    pub fn ui_name(&self) -> &str {
        self.record.text_or_default("UI_Name")
    }

    pub fn description(&self) -> &str {
        self.record.text_or_default("Description")
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn expected_value_type(&self) -> &str {
        self.record.text_or_default("Expected_Value_Type")
    }

    pub fn long_path(&self) -> Option<&str> {
        self.record.first_text(&[
            "Ontology_Long_Path",
            "Ontological_Long_Path",
            "Ontological_Path",
        ])
    }

    /// Fixed value configured on the field, if any.
    pub fn set_value(&self) -> Option<&str> {
        self.record.text("Set_Value").filter(|s| !s.is_empty())
    }

    pub fn ontology_scope(&self) -> Option<&str> {
        self.record.text("Ontology_Scope").filter(|s| !s.is_empty())
    }

    pub fn collections_deployed(&self) -> Vec<String> {
        self.record.links("Collection_Deployed")
    }

    /// The SPARQL variable naming this field's value.
    pub fn variable(&self) -> String {
        crate::tools::normalize(self.id())
    }

    /// File stem derived from the system name.
    pub fn file_stem(&self) -> String {
        crate::tools::file_stem(self.system_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_and_links() {
        let r = record(json!({
            "id": "rec1",
            "fields": {"ID": "F1", "Ontology_Scope": ["recC"], "Collection_Deployed": "recX"}
        }));
        assert_eq!(r.key(), "F1");
        assert_eq!(r.text("Ontology_Scope"), Some("recC"));
        assert_eq!(r.links("Collection_Deployed"), vec!["recX"]);
        assert_eq!(r.links("Missing"), Vec::<String>::new());
    }

    #[test]
    fn test_resolution() {
        assert_eq!(Resolution::<i32>::from_vec(vec![]), Resolution::NotFound);
        assert_eq!(Resolution::from_vec(vec![1]).found(), Some(1));
        assert_eq!(Resolution::from_vec(vec![1, 2]).clone().found(), None);
        assert_eq!(Resolution::from_vec(vec![1, 2]).first(), Some(1));
    }

    #[test]
    fn test_field_view() {
        let field = Field::new(record(json!({
            "id": "rec1",
            "fields": {
                "ID": "F1.a-b",
                "System_Name": "Object Identifier",
                "Expected_Value_Type": "Date",
                "Ontological_Long_Path": "->P1->E42[1_1]"
            }
        })));
        assert_eq!(field.variable(), "F1_a_b");
        assert_eq!(field.file_stem(), "Object_Identifier");
        assert!(field.value_type().is_scalar());
        assert_eq!(field.long_path(), Some("->P1->E42[1_1]"));
        assert_eq!(field.set_value(), None);
    }
}

//! ResearchSpace field definitions.

use super::Namespaces;
use crate::{types::Field, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectQueryEntry {
    pub select: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResearchSpaceField {
    pub id: String,
    pub label: String,
    pub description: String,
    pub datatype: String,
    pub queries: Vec<SelectQueryEntry>,
}

impl ResearchSpaceField {
    pub fn new(field: &Field, sparql: String) -> Self {
        Self {
            id: String::from(field.system_name()),
            label: String::from(field.ui_name()),
            description: String::from(field.description()),
            datatype: String::from(field.value_type().xsd_datatype()),
            queries: vec![SelectQueryEntry { select: sparql }],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResearchSpaceConfig {
    pub prefix: String,
    pub container: String,
    pub namespaces: Mapping,
    pub fields: Vec<ResearchSpaceField>,
}

impl ResearchSpaceConfig {
    pub fn new(namespaces: &Namespaces, fields: Vec<ResearchSpaceField>) -> Self {
        let mut mapping = Mapping::new();
        for (prefix, uri) in namespaces.iter() {
            mapping.insert(Value::from(prefix), Value::from(uri));
        }
        Self {
            prefix: String::new(),
            container: String::new(),
            namespaces: mapping,
            fields,
        }
    }

    /// The document, with an explicit start marker.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(format!("---\n{}", serde_yaml::to_string(self)?))
    }
}

use serde_json::{json, Value};
use std::sync::Arc;
use zellij_docs::airtable::{MemoryBase, Session};

pub const ROOTED: &str =
    "E22_Human-Made_Object->P1_is_identified_by->E42_Identifier[9_1]->P2_has_type->E55_Type[10_1]";
pub const LITERAL: &str =
    "->P1_is_identified_by->E42_Identifier[9_1]->P190_has_symbolic_content->rdf:literal";
pub const TYPED: &str =
    "->P1_is_identified_by->E42_Identifier[9_1]->P2_has_type->E55_Type[9_2]";
pub const SELF: &str =
    "->P1_is_identified_by->xsl:self->P190_has_symbolic_content->rdf:literal";
pub const TYPE_IRI: &str = "http://vocab.getty.edu/aat/300404670";

/// Every field of the snapshot.
pub const FIELDS: [&str; 6] = ["F1", "F2", "F3", "F4", "F5", "F6"];

fn field(id: &str, record: &str, value_type: &str, path: &str) -> Value {
    json!({"id": record, "fields": {
        "ID": id,
        "System_Name": format!("Field {}", id),
        "UI_Name": format!("Field {}", id),
        "Identifier": format!("z.{}", id),
        "Expected_Value_Type": value_type,
        "Ontology_Scope": ["recE22"],
        "Ontology_Long_Path": path,
        "Collection_Deployed": ["recC1"]
    }})
}

fn typed_field() -> Value {
    let mut record = field("F5", "recF5", "Concept", TYPED);
    record["fields"]["Set_Value"] = json!(TYPE_IRI);
    record
}

/// A small documentation base: one project, one model with three of its six fields,
/// one collection.
pub fn snapshot() -> Value {
    json!({
        "id": "appMain",
        "tables": {
            "Project": [{"id": "recP1", "fields": {"ID": "P1", "UI_Name": "Zellij", "Namespace": "https://example.org/"}}],
            "Field": [
                field("F1", "recF1", "Concept", ROOTED),
                field("F2", "recF2", "String", LITERAL),
                field("F3", "recF3", "Date", "->P4_has_time-span->E52_Time-Span[4_1]"),
                field("F4", "recF4", "Integer", "->P43_has_dimension->E54_Dimension[5_1]"),
                typed_field(),
                field("F6", "recF6", "String", SELF)
            ],
            "CRM Class": [{"id": "recE22", "fields": {
                "ID": "E22_Human-Made_Object",
                "URI": "http://www.cidoc-crm.org/cidoc-crm/E22_Human-Made_Object"
            }}],
            "Collection": [{"id": "recC1", "fields": {"ID": "C1", "UI_Name": "Identifiers"}}],
            "Model": [{"id": "recM1", "fields": {
                "ID": "M1",
                "UI_Name": "Object",
                "System_Name": "Object Model",
                "Model_Fields": ["recMF1", "recMF2", "recMF3"]
            }}],
            "Model_Fields": [
                {"id": "recMF1", "fields": {"ID": "M1.F1", "Model": "M1", "Field": ["recF1"], "Field_UI_Name": "Type",
                    "Field_Group": "Identification", "Model_Specific_Field_Order": "1"}},
                {"id": "recMF2", "fields": {"ID": "M1.F2", "Model": "M1", "Field": ["recF2"], "Field_UI_Name": "Identifier",
                    "Field_Group": "Identification", "Model_Specific_Field_Order": "2"}},
                {"id": "recMF3", "fields": {"ID": "M1.F3", "Model": "M1", "Field": ["recF3"], "Field_UI_Name": "Date",
                    "Field_Group": "Production", "Model_Specific_Field_Order": "3"}}
            ],
            "Ontology": [{"id": "recO", "fields": {"Prefix": "crm", "Namespace": "http://www.cidoc-crm.org/cidoc-crm/"}}]
        }
    })
}

pub fn base() -> Arc<MemoryBase> {
    Arc::new(MemoryBase::from_json(&snapshot().to_string()).unwrap())
}

pub fn session() -> Session {
    Session::new(base())
}

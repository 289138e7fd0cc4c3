use super::{aat, leaf, term, PatternDocument, ENGLISH};
use crate::{
    airtable::Session,
    grouping::PatternSchema,
    tools::sanitize_file_name,
    types::{Record, ValueType},
    xml::Element,
    Error, Result,
};
use log::info;
use serde_json::Value;

const UNIQUE_IDENTIFIERS: (&str, &str) = ("300404012", "Unique Identifiers");
const LOW_TABLE_NAMES: [&str; 3] = ["Field_UI_Name", "Field_UI_Name_Inverse", "Model_Specific_Field_Name"];

fn linked(session: &Session, record: &Record, column: &str, table: &str) -> Vec<Record> {
    match record.get(column) {
        Some(value) => session.optional(table, session.records(value, table)),
        None => vec![],
    }
}

fn identifier(name: &str, content: &str) -> Element {
    Element::new(name)
        .with_child(Element::leaf("identifier_content", content))
        .with_child(aat("identifier_type", UNIQUE_IDENTIFIERS.0, UNIQUE_IDENTIFIERS.1))
}

fn names(field: &Record, low: &Record) -> Element {
    let mut names = Element::new("names");
    names.push(
        Element::new("system_name")
            .with_child(leaf("name_content", field.text("System_Name")))
            .with_child(aat("name_type", "300456630", "System Name")),
    );
    for column in LOW_TABLE_NAMES.iter() {
        let content = match low.get(column) {
            Some(Value::Null) | None => continue,
            Some(_) => low.text_or_default(column),
        };
        let (id, label) = if *column == "Field_UI_Name_Inverse" {
            ("300456629", "Inverse UI Name")
        } else {
            ("300456628", "UI Name")
        };
        names.push(
            Element::new("name")
                .with_child(Element::leaf("name_content", content))
                .with_child(aat("name_type", id, label))
                .with_child(aat("name_language", "300388277", ENGLISH)),
        );
    }
    names
}

fn descriptions(low: &Record) -> Element {
    let content = low.first_text(&["Model_Specific_Description", "Description"]);
    Element::new("descriptions").with_child(
        Element::new("description")
            .with_child(leaf("description_content", content))
            .with_child(aat("description_type", "300456631", "Scope Note"))
            .with_child(aat("description_language", "300388277", ENGLISH)),
    )
}

fn ontological_scopes(session: &Session, field: &Record) -> Element {
    let mut scopes = Element::new("ontological_scopes");
    for id in field.links("Ontology_Scope") {
        let class = ["CRM Class", "Ontology_Class"]
            .iter()
            .find_map(|table| session.optional(table, session.base().record(table, &id)));
        if let Some(class) = class {
            scopes.push(term(
                "ontology_class",
                class.text_or_default("Subject"),
                class.text_or_default("ID"),
            ));
        }
    }
    scopes
}

fn reference_patterns(session: &Session, field: &Record, kind: &str) -> Option<Element> {
    let (column, table, id, label, closing) = match kind {
        "Collection" => (
            "Expected_Collection_Model",
            "Collection",
            "300456626",
            "Reference Collection",
            "Collection",
        ),
        "Reference Model" => (
            "Expected_Resource_Model",
            "Model",
            "300456625",
            "Reference Model",
            "Model",
        ),
        _ => return None,
    };
    let mut patterns = Element::new("reference_patterns");
    for record in linked(session, field, column, table) {
        patterns.push(
            term(
                "reference_pattern",
                record.text_or_default("URI"),
                record.text_or_default("UI_Name"),
            )
            .with_child(aat("reference_pattern_type", id, label)),
        );
    }
    patterns.push(Element::leaf("reference_pattern_type", closing));
    Some(patterns)
}

fn expected_data(session: &Session, field: &Record) -> Element {
    let expected = field.text_or_default("Expected_Value_Type");
    let mut data = Element::new("expected_data");
    data.push(
        Element::new("data_type")
            .with_child(leaf("uri", ValueType::parse(expected).datatype_uri()))
            .with_child(Element::leaf("label", expected)),
    );
    for set in linked(session, field, "Expected_ConceptSet", "ConceptSet") {
        data.push(
            Element::new("control_set")
                .with_child(Element::leaf("uri", set.text_or_default("Name")))
                .with_child(Element::new("label")),
        );
    }
    data.push(leaf("reference_control", field.text("Set_Value")));
    if let Some(patterns) = reference_patterns(session, field, expected) {
        data.push(patterns);
    }
    data
}

fn semantic_context(session: &Session, field: &Record) -> Element {
    let mut ontologies = Element::new("ontologies");
    for ontology in linked(session, field, "Ontology_Context", "Ontology") {
        ontologies.push(
            Element::new("ontology")
                .with_child(Element::leaf("ontology_URI", ontology.text_or_default("Namespace")))
                .with_child(leaf("ontology_prefix", ontology.text("Prefix")))
                .with_child(leaf("ontology_name", ontology.text("UI_Name")))
                .with_child(leaf("ontology_version", ontology.text("Version"))),
        );
    }
    Element::new("semantic_context").with_child(ontologies)
}

fn pattern_context(session: &Session, field: &Record) -> Element {
    let mut context = Element::new("pattern_context");
    for project in linked(session, field, "Project", "Project") {
        context.push(term(
            "semantic_pattern_space",
            project.text_or_default("Namespace"),
            project.text_or_default("ID"),
        ));
    }
    let mut deployed = Element::new("composite_semantic_patterns_deployed_in");
    let kinds = [
        ("Model_Deployed", "Model", "300456625", "Reference Model"),
        ("Collection_Deployed", "Collection", "300456626", "Collection Model"),
    ];
    for (column, table, id, label) in kinds.iter() {
        let ids = field.links(column);
        for record in session.optional(table, session.records_by_ids(table, &ids)) {
            deployed.push(
                term(
                    "composite_semantic_pattern",
                    record.text_or_default("URI"),
                    record.text_or_default("UI_Name"),
                )
                .with_child(aat("composite_semantic_pattern_type", id, label)),
            );
        }
    }
    context.push(deployed);
    context
}

fn encoding(content: &str, kind: (&str, &str), format: (&str, &str)) -> Element {
    Element::new("encoding")
        .with_child(Element::leaf("encoding_content", content))
        .with_child(aat("encoding_type", kind.0, kind.1))
        .with_child(aat("encoding_format", format.0, format.1))
}

fn serialization(field: &Record) -> Element {
    let mut encodings = Element::new("encodings");
    if let Some(x3ml) = field.text("x3ml").filter(|s| !s.is_empty()) {
        encodings.push(encoding(x3ml, ("300266654", "x3ml"), ("300266654", "xml")));
    }
    if let Some(sparql) = field.text("Total_SparQL").filter(|s| !s.is_empty()) {
        encodings.push(encoding(sparql, ("300456634", "rdf"), ("300456635", "sparql")));
    }
    if let Some(turtle) = field.text("Total_Turtle").filter(|s| !s.is_empty()) {
        encodings.push(encoding(turtle, ("300456634", "rdf"), ("300456635", "turtle")));
    }
    Element::new("serialization").with_child(encodings)
}

fn provenance(session: &Session, field: &Record) -> Element {
    let version = Element::new("version_data")
        .with_child(
            Element::new("version_number")
                .with_child(Element::leaf("version_content", &field.display("Version")))
                .with_child(aat("version_type", "300456598", "Version Numbers")),
        )
        .with_child(leaf("version_publication_date", field.text("Version_Date")))
        .with_child(leaf("post_version_modification_date", field.text("Last_Modified")));

    let mut creators = Element::new("creators");
    let authors = field.links("Author");
    for actor in session.optional("Actors", session.records_by_ids("Actors", &authors)) {
        creators.push(term(
            "creator",
            actor.text_or_default("URI"),
            actor.text_or_default("Name"),
        ));
    }

    let mut funding = Element::new("funding");
    for actor in linked(session, field, "Funder", "Actors") {
        funding.push(term(
            "funder",
            actor.text_or_default("URI"),
            actor.text_or_default("Name"),
        ));
    }
    let mut projects = Element::new("funding_project");
    for project in linked(session, field, "Project", "Project") {
        projects.push(
            Element::new("project")
                .with_child(leaf("label", project.text("UI_Name")))
                .with_child(leaf("uri", project.text("Namespace"))),
        );
    }
    funding.push(projects);

    Element::new("provenance")
        .with_child(version)
        .with_child(Element::new("creation_data").with_child(creators))
        .with_child(funding)
}

/// The atomic pattern of the low-table row `item` (by `ID` or record id)
/// and the field it deploys.
pub fn field_pattern(session: &Session, schema: &PatternSchema, item: &str) -> Result<PatternDocument> {
    let low = session.require(&schema.low.table, item)?;
    let field_id = low
        .links("Field")
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found("Field", item))?;
    let field = session
        .base()
        .record("Field", &field_id)?
        .ok_or_else(|| Error::not_found("Field", &field_id))?;

    let name = field
        .first_text(&["Identifier", "Identifer"])
        .map(|identifier| identifier.replace('.', "_"))
        .unwrap_or_else(|| sanitize_file_name(item));

    let mut root = Element::new("atomic_semantic_pattern");
    root.push(leaf("uri", field.text("URI")));
    let exportable = schema.options("Field").map_or(false, |o| o.exportable);
    if !exportable {
        root.push(Element::new("definition"));
        return Ok(PatternDocument { name, root });
    }

    let mut identifiers = Element::new("identifiers");
    identifiers.push(identifier("identifier", field.key()));
    let definition = Element::new("definition")
        .with_child(identifier("system_identifier", low.key()))
        .with_child(identifiers)
        .with_child(names(&field, &low))
        .with_child(descriptions(&low))
        .with_child(ontological_scopes(session, &field))
        .with_child(leaf("semantic_path", field.text("Ontological_Path")))
        .with_child(leaf(
            "semantic_path_total",
            field.text("Total_Ontological_Path").or_else(|| {
                low.first_text(&[
                    "Total_Ontological_Path",
                    "Model_Fields_Total_Ontological_Path",
                ])
            }),
        ))
        .with_child(expected_data(session, &field))
        .with_child(semantic_context(session, &field));

    root.push(definition);
    root.push(pattern_context(session, &field));
    root.push(serialization(&field));
    root.push(provenance(session, &field));
    info!("atomic pattern `{}` for {} `{}`", name, schema.low.table, low.key());
    Ok(PatternDocument { name, root })
}

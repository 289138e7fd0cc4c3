use super::{leaf, PatternDocument, ENGLISH};
use crate::{airtable::Session, tools::sanitize_file_name, types::Record, xml::Element, Error, Result};
use log::info;

/// The first project record carrying an `ID`.
pub(crate) fn project_record(session: &Session) -> Result<Record> {
    session
        .all("Project")?
        .into_iter()
        .find(|r| !r.key().is_empty())
        .ok_or_else(|| Error::not_found("Project", "ID"))
}

fn definition(project: &Record) -> Element {
    Element::new("definition")
        .with_child(leaf("system_name", project.text("UI_Name")))
        .with_child(leaf("system_identifier", project.text("ID")))
        .with_child(
            Element::new("descriptions").with_child(
                Element::new("description")
                    .with_child(leaf("description_content", project.text("Description")))
                    .with_child(Element::leaf("description_type", "Scope Note"))
                    .with_child(Element::leaf("description_language", ENGLISH)),
            ),
        )
        .with_child(leaf("namespace", project.text("Namespace")))
}

fn semantic_context(session: &Session) -> Element {
    let mut ontologies = Element::new("ontologies");
    for class in session.optional("CRM Class", session.all("CRM Class")) {
        ontologies.push(
            Element::new("ontology")
                .with_child(leaf("ontology_name", class.text("ID")))
                .with_child(leaf("ontology_URI", class.text("Subject")))
                .with_child(leaf("ontology_version", class.text("CRM Version"))),
        );
    }
    let mut namespaces = Element::new("namespaces");
    for namespace in session.optional("NameSpaces", session.all("NameSpaces")) {
        namespaces.push(
            Element::new("namespace")
                .with_child(leaf("namespace_prefix", namespace.text("Abbreviation")))
                .with_child(leaf("namespace_URI", namespace.text("Namespace"))),
        );
    }
    Element::new("semantic_context")
        .with_child(ontologies)
        .with_child(namespaces)
}

fn components(session: &Session) -> Result<Element> {
    let mut atoms = Element::new("atomic_semantic_patterns");
    for field in session.all("Field")? {
        atoms.push(
            Element::new("atomic_semantic_pattern")
                .with_child(leaf("atomic_semantic_pattern_name", field.text("UI_Name")))
                .with_child(leaf("atomic_semantic_pattern_URI", field.text("URI"))),
        );
    }
    let mut composites = Element::new("composite_semantic_patterns");
    let mut records = session.all("Model")?;
    records.extend(session.optional("Collection", session.all("Collection")));
    for record in records {
        composites.push(
            Element::new("composite_semantic_pattern")
                .with_child(leaf("composite_semantic_pattern_name", record.text("UI_Name")))
                .with_child(leaf("composite_semantic_pattern_URI", record.text("URI"))),
        );
    }
    Ok(Element::new("components")
        .with_child(atoms)
        .with_child(composites))
}

/// The pattern space of the whole base: the project's definition, its
/// ontologies and namespaces, and every field, model and collection.
pub fn project_pattern(session: &Session) -> Result<PatternDocument> {
    let project = project_record(session)?;
    let root = Element::new("composite_semantic_pattern")
        .with_child(definition(&project))
        .with_child(semantic_context(session))
        .with_child(components(session)?);
    info!("project pattern `{}`", project.key());
    Ok(PatternDocument {
        name: sanitize_file_name(project.key()),
        root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airtable::MemoryBase;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_project_pattern() {
        let base = MemoryBase::from_json(
            &json!({
                "id": "appMain",
                "tables": {
                    "Project": [
                        {"id": "recP0", "fields": {"UI_Name": "Draft"}},
                        {"id": "recP1", "fields": {"ID": "P1", "UI_Name": "Zellij", "Namespace": "https://example.org/"}}
                    ],
                    "CRM Class": [{"id": "recE22", "fields": {"ID": "E22", "Subject": "http://www.cidoc-crm.org/cidoc-crm/E22", "CRM Version": "7.1"}}],
                    "NameSpaces": [{"id": "recN1", "fields": {"Abbreviation": "crm", "Namespace": "http://www.cidoc-crm.org/cidoc-crm/"}}],
                    "Field": [{"id": "recF1", "fields": {"UI_Name": "Title", "URI": "https://example.org/F1"}}],
                    "Model": [{"id": "recM1", "fields": {"UI_Name": "Object"}}],
                    "Collection": [{"id": "recC1", "fields": {"UI_Name": "Titles"}}]
                }
            })
            .to_string(),
        )
        .unwrap();
        let doc = project_pattern(&Session::new(Arc::new(base))).unwrap();
        let root = &doc.root;
        assert_eq!(doc.name, "P1");
        assert_eq!(root.at("definition/system_name").and_then(Element::text), Some("Zellij"));
        assert_eq!(
            root.at("semantic_context/ontologies/ontology/ontology_version").and_then(Element::text),
            Some("7.1")
        );
        assert_eq!(
            root.at("semantic_context/namespaces/namespace/namespace_prefix").and_then(Element::text),
            Some("crm")
        );
        assert_eq!(
            root.at("components/composite_semantic_patterns")
                .map(|e| e.children().len()),
            Some(2)
        );
    }

    #[test]
    fn test_no_project() {
        let session = Session::new(Arc::new(MemoryBase::new("appEmpty")));
        assert!(project_pattern(&session).is_err());
    }
}

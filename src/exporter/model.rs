use super::{PatternDocument, ENGLISH};
use crate::{
    airtable::Session,
    grouping::{list_groups, PatternSchema, KEY_FIELD},
    tools::sanitize_file_name,
    types::display_value,
    xml::Element,
    Error, Result,
};
use log::info;

/// The composite pattern of the high record `item`, built from its
/// exportable columns.
pub fn model_pattern(session: &Session, schema: &PatternSchema, item: &str) -> Result<PatternDocument> {
    let row = list_groups(session, schema)?
        .into_iter()
        .find(|row| row.get(KEY_FIELD).map(display_value).as_deref() == Some(item))
        .ok_or_else(|| Error::not_found(&schema.high.table, item))?;

    let mut root = Element::new("composite_semantic_pattern");
    let mut names = Element::new("names");
    let mut rest = vec![];
    for (key, value) in &row {
        let role = match schema.options(key) {
            Some(options) if options.exportable => options.role.as_deref(),
            _ => continue,
        };
        let text = display_value(value);
        match role {
            Some("UI_Name") => {
                names.push(
                    Element::new("name")
                        .with_child(Element::leaf("name_content", &text))
                        .with_child(Element::leaf("name_type", "UI_Name"))
                        .with_child(Element::leaf("name_language", ENGLISH)),
                );
            }
            Some("Identifier") => rest.push(Element::leaf("system_identifier", &text)),
            Some("Description") => rest.push(
                Element::new("descriptions").with_child(
                    Element::new("description")
                        .with_child(Element::leaf("description_content", &text))
                        .with_child(Element::leaf("description_type", "Scope Note"))
                        .with_child(Element::leaf("description_language", ENGLISH))
                        .with_child(Element::leaf("description_preference", "Preferred")),
                ),
            ),
            _ => {}
        }
    }
    root.push(names);
    for element in rest {
        root.push(element);
    }
    info!("composite pattern for {} `{}`", schema.high.table, item);
    Ok(PatternDocument {
        name: sanitize_file_name(item),
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
    fn test_model_pattern() {
        let base = MemoryBase::from_json(
            &json!({
                "id": "appMain",
                "tables": {
                    "Model": [
                        {"id": "recM1", "fields": {"ID": "M1", "UI_Name": "Object", "Description": "A made thing"}},
                        {"id": "recM2", "fields": {"ID": "M2", "UI_Name": "Person"}}
                    ]
                }
            })
            .to_string(),
        )
        .unwrap();
        let session = Session::new(Arc::new(base));
        let doc = model_pattern(&session, &PatternSchema::model(), "M1").unwrap();
        assert_eq!(doc.name, "M1");
        assert_eq!(doc.root.at("names/name/name_content").and_then(Element::text), Some("Object"));
        assert_eq!(doc.root.at("system_identifier").and_then(Element::text), Some("M1"));
        assert_eq!(
            doc.root
                .at("descriptions/description/description_preference")
                .and_then(Element::text),
            Some("Preferred")
        );

        assert!(model_pattern(&session, &PatternSchema::model(), "M9").is_err());
    }
}

use super::{Block, Report, Section, Table};
use crate::{
    airtable::Session,
    exporter::project::project_record,
    grouping::{coerce_sortable, group_fields, grouped_item, PatternSchema, DEFAULT_GROUP, GROUP_BY},
    tools::truncate,
    types::{display_value, Record},
    Error, Result,
};
use log::info;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

const CELL_LIMIT: usize = 100;

/// `(label, column)` pairs of the project-level listings.
const MODEL_COLUMNS: [(&str, &str); 7] = [
    ("Name", "UI_Name"),
    ("ID", "Identifier"),
    ("Ontology", "Ontology_Scope"),
    ("Description", "Description"),
    ("Version", "Version"),
    ("URI", "URI"),
    ("URL", "URL"),
];
const ONTOLOGY_COLUMNS: [(&str, &str); 5] = [
    ("Name", "UI_Name"),
    ("ID", "ID"),
    ("Description", "Description"),
    ("Version", "Version"),
    ("Namespace", "Namespace"),
];

/// Names of the actors a column links to; other values pass through.
fn actors(session: &Session, record: &Record, column: &str) -> String {
    let value = match record.get(column) {
        Some(value) => value,
        None => return String::new(),
    };
    let linked = session.optional("Actors", session.records(value, "Actors"));
    if linked.is_empty() {
        return display_value(value);
    }
    linked
        .iter()
        .map(|actor| actor.text_or_default("Name"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn metadata(rows: Vec<(&str, String)>) -> Section {
    let mut table = Table::new(&["Property", "Value"]);
    for (label, value) in rows {
        table.push(vec![String::from(label), value]);
    }
    Section::new("Metadata", vec![Block::Table(table)])
}

fn listing(title: &str, records: &[Record], columns: &[(&str, &str)]) -> Section {
    let mut blocks = vec![Block::Paragraph(format!("Total: {}", records.len()))];
    if records.is_empty() {
        blocks.push(Block::Paragraph(String::from("No models found.")));
    } else {
        let headers: Vec<&str> = columns.iter().map(|(label, _)| *label).collect();
        let mut table = Table::new(&headers);
        for record in records {
            table.push(
                columns
                    .iter()
                    .map(|(_, column)| truncate(&record.display(column), CELL_LIMIT))
                    .collect(),
            );
        }
        blocks.push(Block::Table(table));
    }
    Section::new(title, blocks)
}

/// Overview of the project: its metadata, then every model, collection,
/// field and ontology.
pub fn project_report(session: &Session) -> Result<Report> {
    let project = project_record(session)?;
    let mut report = Report::new(project.text_or_default("UI_Name"), "Project report");
    report.section(metadata(vec![
        ("KeyField", project.display("ID")),
        ("Names", project.display("UI_Name")),
        ("System Name", project.display("System_Name")),
        ("Description", project.display("Description")),
        ("Version", project.display("Version")),
        ("Version Date", project.display("Version_Date")),
        ("Last Modified", project.display("Last_Modified")),
        ("Authors", actors(session, &project, "Author")),
        ("Funders", actors(session, &project, "Funder")),
        ("Funding Project", project.display("Funding_Project")),
        ("Namespace", project.display("Namespace")),
    ]));

    let mut field_columns = MODEL_COLUMNS.to_vec();
    field_columns.insert(3, ("Path", "Ontology_Long_Path"));
    let listings: [(&str, &str, &[(&str, &str)]); 4] = [
        ("Models", "Model", &MODEL_COLUMNS),
        ("Collections", "Collection", &MODEL_COLUMNS),
        ("Fields", "Field", &field_columns),
        ("Ontologies", "Ontology", &ONTOLOGY_COLUMNS),
    ];
    for (title, table, columns) in listings.iter() {
        let records = session.optional(table, session.all(table));
        report.section(listing(title, &records, columns));
    }
    info!("project report `{}`", project.key());
    Ok(report)
}

/// Address of the item's page on the documentation site.
fn item_url(public_url: &str, api_key: &str, pattern: &str, key: &str) -> String {
    let selected = format!("/docs/display/{}/{}?search={}", api_key, pattern, key);
    format!(
        "{}/docs/list/{}?scraper={}&selectedMenuItem={}",
        public_url.trim_end_matches('/'),
        api_key,
        pattern,
        utf8_percent_encode(&selected, NON_ALPHANUMERIC)
    )
}

/// Report on one model or collection: its metadata, then one section per
/// field group.
pub fn model_report(session: &Session, schema: &PatternSchema, key: &str, public_url: &str) -> Result<Report> {
    let project = project_record(session)?;
    let model = session.require(&schema.high.table, key)?;
    let mut item = grouped_item(session, schema, key)?
        .ok_or_else(|| Error::not_found(&schema.high.table, key))?;
    coerce_sortable(&mut item, schema);
    let groups = group_fields(&item, schema.group_key(), schema.group_sort.as_ref());

    let name = model.first_text(&["UI_Name", "ID"]).unwrap_or(key);
    let mut report = Report::new(name, project.text_or_default("UI_Name"));
    report.section(metadata(vec![
        ("KeyField", model.display("ID")),
        ("Identifier", model.display("Identifier")),
        ("Names", model.display("UI_Name")),
        ("System Name", model.display("System_Name")),
        ("Description", model.display("Description")),
        ("Version", model.display("Version")),
        ("Version Date", model.display("Version_Date")),
        ("Last Modified", model.display("Last_Modified")),
        ("Authors", actors(session, &project, "Author")),
        ("Funders", actors(session, &project, "Funder")),
        ("Funding Project", model.display("Funding_Project")),
        ("Ontology", model.display("Ontology_Scope_URI")),
        ("URI", model.display("URI")),
        ("URL", item_url(public_url, session.base_id(), &schema.name, item.id.as_str())),
    ]));

    let hidden = schema.hidden_keys();
    let keys: Vec<&str> = schema
        .low
        .columns
        .iter()
        .map(|c| c.key.as_str())
        .filter(|k| *k != GROUP_BY && !hidden.contains(k))
        .collect();
    for (group, rows) in &groups {
        let title = if group == DEFAULT_GROUP { name } else { group.as_str() };
        let mut table = Table::new(&keys);
        for row in rows {
            table.push(
                keys.iter()
                    .map(|k| truncate(&row.get(*k).map(display_value).unwrap_or_default(), CELL_LIMIT))
                    .collect(),
            );
        }
        report.section(Section::new(
            title,
            vec![
                Block::Subheading(format!("{}: Fields", title)),
                Block::Table(table),
            ],
        ));
    }
    info!("model report `{}`: {} groups", key, groups.len());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airtable::MemoryBase;
    use serde_json::json;
    use std::sync::Arc;

    fn session() -> Session {
        let base = MemoryBase::from_json(
            &json!({
                "id": "appMain",
                "tables": {
                    "Project": [{"id": "recP1", "fields": {"ID": "P1", "UI_Name": "Zellij", "Author": ["recA1"], "Funder": "Museum fund"}}],
                    "Actors": [{"id": "recA1", "fields": {"Name": "Ada"}}],
                    "Model": [{"id": "recM1", "fields": {"ID": "M1", "UI_Name": "Object", "Ontology_Scope_URI": "http://www.cidoc-crm.org/cidoc-crm/E22"}}],
                    "Model_Fields": [
                        {"id": "recMF1", "fields": {"ID": "M1.F1", "Model": "M1", "Field_UI_Name": "Title", "Field_Group": "Identification", "Model_Specific_Field_Order": "1"}},
                        {"id": "recMF2", "fields": {"ID": "M1.F2", "Model": "M1", "Field_UI_Name": "Maker", "Field_Group": "Production",
                            "Model_Specific_Description": "x".repeat(150)}}
                    ],
                    "Field": [{"id": "recF1", "fields": {"UI_Name": "Title", "Identifier": "F1", "Ontology_Long_Path": "->P102_has_title->E35_Title"}}]
                }
            })
            .to_string(),
        )
        .unwrap();
        Session::new(Arc::new(base))
    }

    fn table(section: &Section) -> &Table {
        section
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_project_report() {
        let report = project_report(&session()).unwrap();
        assert_eq!(report.title, "Zellij");
        let titles: Vec<&str> = report.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Metadata", "Models", "Collections", "Fields", "Ontologies"]);
        let meta = table(&report.sections[0]);
        assert!(meta.rows.contains(&vec![String::from("Authors"), String::from("Ada")]));
        assert!(meta.rows.contains(&vec![String::from("Funders"), String::from("Museum fund")]));
        assert_eq!(
            report.sections[2].blocks,
            vec![
                Block::Paragraph(String::from("Total: 0")),
                Block::Paragraph(String::from("No models found.")),
            ]
        );
        let fields = table(&report.sections[3]);
        assert_eq!(fields.headers[3], "Path");
        assert_eq!(fields.rows[0][3], "->P102_has_title->E35_Title");
        assert_eq!(fields.rows[0][2], "N/A");
    }

    #[test]
    fn test_model_report() {
        let report = model_report(&session(), &PatternSchema::model(), "M1", "http://localhost:8000/").unwrap();
        assert_eq!(report.title, "Object");
        assert_eq!(report.subtitle, "Zellij");
        let titles: Vec<&str> = report.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Metadata", "Identification", "Production"]);

        let meta = table(&report.sections[0]);
        let url = &meta.rows.iter().find(|r| r[0] == "URL").unwrap()[1];
        assert_eq!(
            url,
            "http://localhost:8000/docs/list/appMain?scraper=Model&selectedMenuItem=%2Fdocs%2Fdisplay%2FappMain%2FModel%3Fsearch%3DM1"
        );

        let fields = table(&report.sections[2]);
        assert!(!fields.headers.iter().any(|h| h == "Order" || h == GROUP_BY));
        let description = fields.headers.iter().position(|h| h == "Description").unwrap();
        assert_eq!(fields.rows[0][description].chars().count(), CELL_LIMIT);
        assert!(fields.rows[0][description].ends_with("..."));

        assert!(model_report(&session(), &PatternSchema::model(), "M9", "").is_err());
    }
}

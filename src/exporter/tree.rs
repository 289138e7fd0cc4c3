use super::{field_pattern, model_pattern, project_pattern, PatternDocument};
use crate::{
    airtable::Session,
    grouping::{grouped_item, list_groups, PatternSchema, CONTAINS, KEY_FIELD},
    publish::Publisher,
    types::display_value,
    Error, Result,
};
use log::{debug, info};

/// Where an export tree starts.
#[derive(Clone, Copy, Debug)]
pub enum TreeRoot<'a> {
    /// The project, every group of every schema and all their fields.
    Project,
    /// One model or collection and its fields.
    Item {
        schema: &'a PatternSchema,
        key: &'a str,
    },
}

struct Tree<'p> {
    publishers: &'p [&'p dyn Publisher],
    paths: Vec<String>,
}

impl<'p> Tree<'p> {
    fn add(&mut self, directory: &str, name: &str, doc: &PatternDocument) -> Result<()> {
        let path = format!("{}/{}.xml", directory, name);
        let xml = doc.to_xml()?;
        for publisher in self.publishers {
            publisher.publish(&path, xml.as_bytes())?;
        }
        debug!("exported {}", path);
        self.paths.push(path);
        Ok(())
    }

    fn fields<'k, I>(&mut self, session: &Session, schema: &PatternSchema, model: &str, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = &'k str>,
    {
        for key in keys {
            let doc = field_pattern(session, schema, key)?;
            self.add("atom", &format!("{}_{}", model, doc.name), &doc)?;
        }
        Ok(())
    }
}

/// Exports a tree of pattern documents under `space/`, `composite/` and
/// `atom/` to every publisher and returns the paths written.
pub fn export_tree(
    session: &Session,
    schemas: &[PatternSchema],
    root: TreeRoot,
    publishers: &[&dyn Publisher],
) -> Result<Vec<String>> {
    let mut tree = Tree {
        publishers,
        paths: vec![],
    };
    match root {
        TreeRoot::Project => {
            let project = project_pattern(session)?;
            tree.add("space", &project.name, &project)?;
            for schema in schemas {
                for row in list_groups(session, schema)? {
                    let key = row.get(KEY_FIELD).map(display_value).unwrap_or_default();
                    if key.is_empty() {
                        continue;
                    }
                    let model = model_pattern(session, schema, &key)?;
                    tree.add("composite", &model.name, &model)?;
                    let contains = row.get(CONTAINS).map(display_value).unwrap_or_default();
                    let fields = contains.split(", ").filter(|s| !s.is_empty());
                    tree.fields(session, schema, &model.name, fields)?;
                }
            }
        }
        TreeRoot::Item { schema, key } => {
            let model = model_pattern(session, schema, key)?;
            tree.add("space", &model.name, &model)?;
            let item = grouped_item(session, schema, key)?
                .ok_or_else(|| Error::not_found(&schema.high.table, key))?;
            let keys: Vec<String> = item
                .rows
                .iter()
                .map(|(id, row)| match row.get(KEY_FIELD).map(display_value) {
                    Some(key) if !key.is_empty() => key,
                    _ => id.clone(),
                })
                .collect();
            tree.fields(session, schema, &model.name, keys.iter().map(String::as_str))?;
        }
    }
    info!("exported {} documents", tree.paths.len());
    Ok(tree.paths)
}

//! Export tasks: one field, or one model or collection with its fields.

use crate::{
    airtable::{find_in, Formula, Session, Tabular},
    binder::{bind, resolve_collection, Bindings, ModelContext},
    front_end::{parse, Path},
    pattern::{build, BuildOptions, GraphPattern},
    serializer::{
        load_namespaces, load_ontology_namespaces, x3ml, Form, ResearchSpaceConfig,
        ResearchSpaceField, SelectQuery, Turtle, X3mlField, X3mlSubject,
    },
    types::{is_record_id, Field, Record},
    Error, Result,
};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::{
    cmp::Ordering,
    fs,
    path::{Path as FsPath, PathBuf},
};

/// A generated file.
#[derive(Clone, Debug, PartialEq)]
pub struct Export {
    pub file_name: String,
    pub content: String,
    pub media_type: &'static str,
}

impl Export {
    pub fn new(file_name: String, content: String, media_type: &'static str) -> Self {
        Self {
            file_name,
            content,
            media_type,
        }
    }

    /// Writes the file under `directory`, creating it when missing.
    pub fn write_to<P: AsRef<FsPath>>(&self, directory: P) -> Result<PathBuf> {
        fs::create_dir_all(directory.as_ref())?;
        let path = directory.as_ref().join(&self.file_name);
        fs::write(&path, &self.content)?;
        info!("wrote {}", path.display());
        Ok(path)
    }
}

/// The tables a pattern schema groups fields with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelTables {
    /// Models or collections.
    pub model: String,
    /// Rows linking fields to their model.
    pub fields: String,
    /// Link column of `fields` naming the model.
    pub group_by: String,
}

impl ModelTables {
    pub fn new(model: &str, fields: &str, group_by: &str) -> Self {
        Self {
            model: String::from(model),
            fields: String::from(fields),
            group_by: String::from(group_by),
        }
    }
}

impl Default for ModelTables {
    fn default() -> Self {
        Self::new("Model", "Model_Fields", "Model")
    }
}

/// The ontology class a field is scoped to. Required: a field without one
/// cannot be exported.
fn ontology_class(session: &Session, field: &Field) -> Result<Record> {
    let scope = field.ontology_scope().unwrap_or("");
    if !scope.is_empty() {
        let by_key = session.first("Ontology_Class", &Formula::by_key(scope));
        if let Some(record) = session.optional("ontology class", by_key) {
            return Ok(record);
        }
        if is_record_id(scope) {
            let by_id = session.base().record("CRM Class", scope);
            if let Some(record) = session.optional("crm class", by_id) {
                return Ok(record);
            }
        }
    }
    Err(Error::not_found("CRM Class", scope))
}

/// Class IRI of a model context, from its scope URI or its ontology scope.
fn class_uri(session: &Session, context: &ModelContext) -> Result<Option<String>> {
    let records = session.records(&Value::String(context.id.clone()), &context.table)?;
    let record = match records.first() {
        Some(record) => record,
        None => {
            debug!("no {} `{}` for class lookup", context.table, context.id);
            return Ok(None);
        }
    };
    if let Some(uri) = record.text("Ontological_Scope_URI") {
        return Ok(Some(String::from(uri)));
    }
    let scope = match record.get("Ontology_Scope") {
        Some(scope) => scope,
        None => return Ok(None),
    };
    let classes = match session.records(scope, "Ontology_Class") {
        Ok(classes) => classes,
        Err(e) => {
            debug!("Ontology_Class: {}", e);
            session.records(scope, "CRM Class")?
        }
    };
    Ok(classes
        .first()
        .and_then(|class| class.text("URI"))
        .map(String::from))
}

/// Finds the record to upload to: first in `preferred`, then in the main
/// base.
fn upload_target<'b>(
    session: &'b Session,
    preferred: Option<&'b dyn Tabular>,
    table: &str,
    key: &str,
) -> Result<(&'b dyn Tabular, Record)> {
    if let Some(base) = preferred {
        match base.first(table, &Formula::by_key(key)) {
            Ok(Some(record)) => return Ok((base, record)),
            Ok(None) => debug!("`{}` not in {} of base {}", key, table, base.base_id()),
            Err(e) => warn!("{} of base {}: {}", table, base.base_id(), e),
        }
    }
    let record = find_in(session.base(), table, key)?.ok_or_else(|| Error::not_found(table, key))?;
    Ok((session.base(), record))
}

fn upload(base: &dyn Tabular, table: &str, record: &Record, column: &str, content: String) -> Result<Record> {
    let mut fields = Map::new();
    fields.insert(String::from(column), Value::String(content));
    let updated = base.update(table, &record.id, fields)?;
    info!("uploaded {} of {} `{}` to base {}", column, table, record.key(), base.base_id());
    Ok(updated)
}

/// Exports of a single field.
pub struct FieldTask<'s> {
    session: &'s Session,
    field: Field,
    class: Record,
}

impl<'s> FieldTask<'s> {
    /// Loads the field by `ID` or record id together with its ontology
    /// class.
    pub fn new(session: &'s Session, key: &str) -> Result<Self> {
        let field = Field::new(session.require("Field", key)?);
        let class = ontology_class(session, &field)?;
        debug!("field `{}` scoped to `{}`", field.id(), class.key());
        Ok(Self {
            session,
            field,
            class,
        })
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn class(&self) -> &Record {
        &self.class
    }

    pub fn path(&self) -> Result<Path> {
        Ok(parse(self.field.long_path().unwrap_or(""))?)
    }

    /// Bindings of `path` in `context`; a failed collection lookup binds as
    /// if there were no collection.
    pub fn bindings(&self, path: &Path, context: Option<&ModelContext>) -> Bindings {
        let collection = self.session.optional(
            "collection",
            resolve_collection(self.session, &self.field, context),
        );
        bind(path, &self.field, &collection)
    }

    pub fn where_pattern(
        &self,
        context: Option<&ModelContext>,
        optional: bool,
        start: usize,
    ) -> Result<GraphPattern> {
        let path = self.path()?;
        let bindings = self.bindings(&path, context);
        let class_uri = match context {
            Some(context) => self
                .session
                .optional("class uri", class_uri(self.session, context)),
            None => None,
        };
        let options = BuildOptions {
            start,
            optional,
            label: context.is_none(),
            class_uri,
        };
        Ok(build(&path, &bindings, &self.field, &options))
    }

    pub fn query(&self, count: bool, context: Option<&ModelContext>, limit: usize) -> Result<SelectQuery> {
        let prefixes = load_namespaces(self.session);
        let pattern = self.where_pattern(context, false, 0)?;
        Ok(if count {
            SelectQuery::count(prefixes, pattern)
        } else {
            SelectQuery::new(prefixes, pattern, limit)
        })
    }

    /// Query for up to `size` distinct values of the field.
    pub fn sample_query(&self, size: usize) -> Result<SelectQuery> {
        let prefixes = load_namespaces(self.session);
        Ok(SelectQuery::sample(prefixes, self.where_pattern(None, false, 0)?, size))
    }

    pub fn sparql(&self, count: bool, context: Option<&ModelContext>, limit: usize) -> Result<Export> {
        let query = self.query(count, context, limit)?;
        info!("generated sparql for field `{}`", self.field.id());
        Ok(Export::new(
            format!(
                "{}{}.sparql",
                self.field.file_stem(),
                if count { "_count" } else { "" }
            ),
            query.to_string(),
            "text/plain",
        ))
    }

    pub fn turtle(&self, base: &str) -> Result<Export> {
        let path = self.path()?;
        let bindings = self.bindings(&path, None);
        let turtle = Turtle::new(
            &path,
            &bindings,
            self.field.system_name(),
            &load_namespaces(self.session),
            base,
        );
        info!("generated turtle for field `{}`", self.field.id());
        Ok(Export::new(
            format!("{}.ttl", self.field.file_stem()),
            turtle.to_string(),
            "text/turtle",
        ))
    }

    /// Stores the WHERE body of the field's query in its `SparQL` column,
    /// preferring the field base when one is configured.
    pub fn upload_sparql(&self, field_base: Option<&dyn Tabular>) -> Result<Record> {
        let query = self.query(false, None, crate::serializer::sparql::DEFAULT_LIMIT)?;
        let (base, record) = upload_target(self.session, field_base, "Field", self.field.id())?;
        upload(base, "Field", &record, "SparQL", query.where_body())
    }
}

fn order_key(row: &Record) -> Option<f64> {
    let value = row
        .get("Canonical_Field_Order")
        .or_else(|| row.get("Model_Specific_Field_Order"))?;
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Array(values) => values.first().and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }),
        _ => None,
    }
}

/// Exports of a model (or collection) and of fields within it.
pub struct ModelTask<'s> {
    session: &'s Session,
    tables: ModelTables,
    model: Option<Record>,
    field: Option<Field>,
}

fn no_subject() -> Error {
    Error::InvalidArgument(String::from("neither a model nor a field is selected"))
}

impl<'s> ModelTask<'s> {
    /// `field_key` restricts the export to one field; `model_id` is then
    /// optional except for form `b` mappings.
    pub fn new(
        session: &'s Session,
        tables: ModelTables,
        model_id: Option<&str>,
        field_key: Option<&str>,
    ) -> Result<Self> {
        let field = match field_key {
            Some(key) => Some(Field::new(session.require("Field", key)?)),
            None => None,
        };
        let model = match model_id {
            Some(id) => {
                let models = session.records(&Value::String(String::from(id)), &tables.model)?;
                if models.len() == 1 {
                    models.into_iter().next()
                } else {
                    debug!("{} `{}` resolved to {} records", tables.model, id, models.len());
                    None
                }
            }
            None => None,
        };
        if field.is_none() && model.is_none() {
            return Err(Error::not_found(&tables.model, model_id.unwrap_or("")));
        }
        Ok(Self {
            session,
            tables,
            model,
            field,
        })
    }

    pub fn model(&self) -> Option<&Record> {
        self.model.as_ref()
    }

    fn file_stem(&self) -> String {
        match (&self.field, &self.model) {
            (Some(field), _) => field.file_stem(),
            (None, Some(model)) => crate::tools::file_stem(model.text_or_default("System_Name")),
            (None, None) => String::new(),
        }
    }

    /// The model's fields in field-order, restricted to those deployed in
    /// a collection.
    pub fn model_fields(&self) -> Result<Vec<Record>> {
        let model = match &self.model {
            Some(model) => model,
            None => return Ok(vec![]),
        };
        let mut rows = self.session.select(
            &self.tables.fields,
            Formula::search(model.key(), &self.tables.group_by),
        )?;
        rows.sort_by(|a, b| {
            order_key(a)
                .partial_cmp(&order_key(b))
                .unwrap_or(Ordering::Equal)
        });
        let ids: Vec<String> = rows
            .iter()
            .filter_map(|row| row.links("Field").into_iter().next())
            .collect();
        let mut fields: Vec<Record> = self
            .session
            .records_by_ids("Field", &ids)?
            .into_iter()
            .filter(|field| !field.links("Collection_Deployed").is_empty())
            .collect();
        fields.sort_by_key(|field| ids.iter().position(|id| *id == field.id));
        debug!("{} `{}` has {} deployed fields", self.tables.model, model.key(), fields.len());
        Ok(fields)
    }

    fn x3ml_field(&self, record: &Record) -> Result<X3mlField> {
        let collection = record
            .get("Collection_Deployed")
            .cloned()
            .unwrap_or(Value::Null);
        let collection = self
            .session
            .optional("collection name", self.session.collection_name(&collection));
        let path = match Field::new(record.clone()).long_path() {
            Some(path) => Some(parse(path)?),
            None => None,
        };
        Ok(X3mlField {
            id: String::from(record.key()),
            collection,
            path,
        })
    }

    pub fn x3ml_subject(&self) -> Result<X3mlSubject> {
        match (&self.field, &self.model) {
            (Some(field), model) => Ok(X3mlSubject::Field {
                field: self.x3ml_field(field.record())?,
                model: model.as_ref().map(|m| String::from(m.key())),
            }),
            (None, Some(model)) => Ok(X3mlSubject::Model {
                id: String::from(model.key()),
                fields: self
                    .model_fields()?
                    .iter()
                    .map(|record| self.x3ml_field(record))
                    .collect::<Result<Vec<_>>>()?,
            }),
            (None, None) => Err(no_subject()),
        }
    }

    pub fn x3ml(&self, form: Form) -> Result<Export> {
        let namespaces = load_ontology_namespaces(self.session);
        let document = x3ml::document(&namespaces, &self.x3ml_subject()?, form)?;
        Ok(Export::new(
            format!("{}.x3ml", self.file_stem()),
            document.to_xml()?,
            "application/xml",
        ))
    }

    /// Stores the mapping in the `x3ml_a`/`x3ml_b` column of the field, or
    /// of the model when no field is selected.
    pub fn upload_x3ml(&self, form: Form, field_base: Option<&dyn Tabular>) -> Result<Record> {
        let export = self.x3ml(form)?;
        let (table, key) = match (&self.field, &self.model) {
            (Some(field), _) => ("Field", field.id()),
            (None, Some(model)) => (self.tables.model.as_str(), model.key()),
            (None, None) => return Err(no_subject()),
        };
        let (base, record) = upload_target(self.session, field_base, table, key)?;
        upload(base, table, &record, form.column(), export.content)
    }

    /// ResearchSpace field definitions with each field's SPARQL.
    pub fn research_space(&self, limit: usize) -> Result<Export> {
        let records = match &self.field {
            Some(field) => vec![field.record().clone()],
            None => self.model_fields()?,
        };
        let mut fields = vec![];
        for record in &records {
            let task = FieldTask::new(self.session, &record.id)?;
            let sparql = task.query(false, None, limit)?.to_string();
            fields.push(ResearchSpaceField::new(task.field(), sparql));
        }
        let config = ResearchSpaceConfig::new(&load_ontology_namespaces(self.session), fields);
        Ok(Export::new(
            format!("{}.yml", self.file_stem()),
            config.to_yaml()?,
            "text/yaml",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airtable::MemoryBase;
    use serde_json::json;
    use std::sync::Arc;

    fn base() -> Arc<MemoryBase> {
        Arc::new(
            MemoryBase::from_json(
                &json!({
                    "id": "appMain",
                    "tables": {
                        "Field": [
                            {"id": "recF1", "fields": {
                                "ID": "F1",
                                "System_Name": "Object Identifier",
                                "UI_Name": "Identifier",
                                "Description": "An identifier",
                                "Expected_Value_Type": "String",
                                "Ontology_Scope": ["recE22"],
                                "Ontology_Long_Path": "->P1_is_identified_by->E42_Identifier[9_1]->P190_has_symbolic_content->rdf:literal",
                                "Collection_Deployed": ["recC1"]
                            }},
                            {"id": "recF2", "fields": {
                                "ID": "F2",
                                "System_Name": "Object Type",
                                "Expected_Value_Type": "Concept",
                                "Ontology_Scope": ["recE22"],
                                "Ontology_Long_Path": "->P2_has_type->E55_Type[10_1]",
                                "Collection_Deployed": ["recC1"]
                            }},
                            {"id": "recF3", "fields": {"ID": "F3", "System_Name": "Loose"}}
                        ],
                        "CRM Class": [
                            {"id": "recE22", "fields": {"ID": "E22_Human-Made_Object", "URI": "http://www.cidoc-crm.org/cidoc-crm/E22_Human-Made_Object"}}
                        ],
                        "Collection": [{"id": "recC1", "fields": {"ID": "C1"}}],
                        "Model": [{"id": "recM1", "fields": {
                            "ID": "M1",
                            "System_Name": "Object Model",
                            "Ontological_Scope_URI": "http://www.cidoc-crm.org/cidoc-crm/E22_Human-Made_Object"
                        }}],
                        "Model_Fields": [
                            {"id": "recMF2", "fields": {"Model": "M1", "Field": ["recF2"], "Model_Specific_Field_Order": 2}},
                            {"id": "recMF1", "fields": {"Model": "M1", "Field": ["recF1"], "Model_Specific_Field_Order": 1, "Model_Specific_Part_of_Collection": ["recC1"]}},
                            {"id": "recMF3", "fields": {"Model": "M1", "Field": ["recF3"], "Model_Specific_Field_Order": 3}}
                        ],
                        "Ontology": [{"id": "recO", "fields": {"Prefix": "crm", "Namespace": "http://www.cidoc-crm.org/cidoc-crm/"}}]
                    }
                })
                .to_string(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_field_requires_class() {
        let session = Session::new(base());
        assert!(matches!(
            FieldTask::new(&session, "F3"),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            FieldTask::new(&session, "F9"),
            Err(Error::NotFound { .. })
        ));
        assert_eq!(FieldTask::new(&session, "F1").unwrap().class().id, "recE22");
    }

    #[test]
    fn test_sparql_export() {
        let session = Session::new(base());
        let task = FieldTask::new(&session, "F1").unwrap();
        let export = task.sparql(false, None, 100).unwrap();
        assert_eq!(export.file_name, "Object_Identifier.sparql");
        assert!(export.content.starts_with("PREFIX crm: <http://www.cidoc-crm.org/cidoc-crm/>\nPREFIX rdf: "));
        assert!(export.content.contains("?F1 crm:P190_has_symbolic_content ?F1 ."));
        assert!(!export.content.contains("rdfs:label"));

        let count = task.sparql(true, None, 100).unwrap();
        assert_eq!(count.file_name, "Object_Identifier_count.sparql");
        assert!(count.content.ends_with("LIMIT 1\n"));
    }

    #[test]
    fn test_model_context() {
        let session = Session::new(base());
        let task = FieldTask::new(&session, "F2").unwrap();
        let free = task.where_pattern(None, false, 0).unwrap();
        assert_eq!(free.nested.len(), 1);

        let context = ModelContext::new("Model", "M1");
        let pattern = task.where_pattern(Some(&context), false, 0).unwrap();
        assert!(pattern.nested.is_empty());
        assert_eq!(
            pattern.triples[0].object.to_string(),
            "<http://www.cidoc-crm.org/cidoc-crm/E22_Human-Made_Object>"
        );
    }

    #[test]
    fn test_upload_sparql_falls_back_to_main_base() {
        let main = base();
        let session = Session::new(main.clone());
        let field_base = MemoryBase::new("appFields");
        let task = FieldTask::new(&session, "F2").unwrap();
        let updated = task.upload_sparql(Some(&field_base as &dyn Tabular)).unwrap();
        assert_eq!(updated.id, "recF2");
        let stored = main.record("Field", "recF2").unwrap().unwrap();
        assert!(stored.text_or_default("SparQL").contains("?subject crm:P2_has_type ?F2 ."));
        assert!(!stored.text_or_default("SparQL").starts_with('{'));
    }

    #[test]
    fn test_model_fields_order_and_filter() {
        let session = Session::new(base());
        let task = ModelTask::new(&session, ModelTables::default(), Some("M1"), None).unwrap();
        let ids: Vec<String> = task.model_fields().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["recF1", "recF2"]);

        let export = task.x3ml(Form::A).unwrap();
        assert_eq!(export.file_name, "Object_Model.x3ml");
        assert!(export.content.contains("<link template=\"F1\">"));
    }

    #[test]
    fn test_upload_x3ml_on_model() {
        let main = base();
        let session = Session::new(main.clone());
        let task = ModelTask::new(&session, ModelTables::default(), Some("M1"), None).unwrap();
        task.upload_x3ml(Form::B, None).unwrap();
        let stored = main.record("Model", "recM1").unwrap().unwrap();
        assert!(stored.text_or_default("x3ml_b").contains("<x3ml>"));
    }

    #[test]
    fn test_x3ml_without_subject() {
        let main = base();
        let session = Session::new(main.clone());
        let task = ModelTask {
            session: &session,
            tables: ModelTables::default(),
            model: None,
            field: None,
        };
        assert!(matches!(task.x3ml(Form::A), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            task.upload_x3ml(Form::B, None),
            Err(Error::InvalidArgument(_))
        ));
        let stored = main.record("Model", "recM1").unwrap().unwrap();
        assert!(stored.get("x3ml_b").is_none());
    }

    #[test]
    fn test_research_space_export() {
        let session = Session::new(base());
        let task = ModelTask::new(&session, ModelTables::default(), None, Some("F2")).unwrap();
        let export = task.research_space(100).unwrap();
        assert_eq!(export.file_name, "Object_Type.yml");
        let config: ResearchSpaceConfig = serde_yaml::from_str(&export.content).unwrap();
        assert_eq!(config.fields.len(), 1);
        assert_eq!(config.fields[0].datatype, "xsd:anyURI");
        assert!(config.fields[0].queries[0].select.contains("LIMIT 100"));
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let export = Export::new(String::from("a.ttl"), String::from("x"), "text/turtle");
        let path = export.write_to(dir.path().join("out")).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "x");
    }
}

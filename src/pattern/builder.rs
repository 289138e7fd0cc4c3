use super::{
    graph::{GraphPattern, Term, Triple},
    walk::{statements, Object},
};
use crate::{
    binder::{Binding, Bindings},
    front_end::Path,
    types::Field,
};

#[derive(Clone, Debug, PartialEq)]
pub struct BuildOptions {
    /// First token to emit.
    pub start: usize,
    pub optional: bool,
    /// Whether to add the `rdfs:label` lookup.
    pub label: bool,
    /// Class of the model context, asserted on `?subject`.
    pub class_uri: Option<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            start: 0,
            optional: false,
            label: true,
            class_uri: None,
        }
    }
}

fn term(binding: &Binding) -> Term {
    match binding {
        Binding::Constant(iri) => Term::Iri(iri.clone()),
        other => Term::Variable(other.to_string()),
    }
}

/// Builds the WHERE pattern of a field.
pub fn build(path: &Path, bindings: &Bindings, field: &Field, options: &BuildOptions) -> GraphPattern {
    let field_var = bindings.field_variable();
    let mut pattern = GraphPattern::new(options.optional);

    if let Some(class_uri) = &options.class_uri {
        pattern.add_triple(Triple::new(
            Term::var("subject"),
            Term::name("a"),
            Term::Iri(class_uri.clone()),
        ));
    }

    for statement in statements(path, bindings, options.start) {
        let object = match &statement.object {
            Object::Bound(binding) => term(binding),
            Object::Class(class) => Term::Name(class.clone()),
            Object::Value => Term::var(field_var),
        };
        pattern.add_triple(Triple::new(
            term(&statement.subject),
            Term::Name(statement.predicate),
            object,
        ));
    }

    if !bindings.binds_field_variable() && !bindings.has_literal() {
        pattern.add_bind(term(bindings.at(1)), Term::var(field_var));
    }
    if !options.optional {
        pattern.add_bind(Term::var(field_var), Term::var("value"));
    }

    if options.label && !path.ends_in_literal() && !field.value_type().is_scalar() {
        let mut label = GraphPattern::new(!options.optional);
        label.add_triple(Triple::new(
            Term::var(field_var),
            Term::name("rdfs:label"),
            Term::Variable(format!("{}_label", field_var)),
        ));
        pattern.add_nested(label);
    }

    if let Some(value) = field.set_value() {
        if options.start == 0 {
            pattern.add_triple(Triple::new(
                Term::var(field_var),
                Term::name("crm:P2_has_type"),
                Term::Iri(String::from(value)),
            ));
        }
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{binder::bind, front_end::parse, types::{Record, Resolution}};
    use serde_json::{json, Value};

    fn field(fields: Value) -> Field {
        Field::new(serde_json::from_value(json!({"id": "recF", "fields": fields})).unwrap())
    }

    fn build_default(path: &str, field: &Field) -> GraphPattern {
        let path = parse(path).unwrap();
        let bindings = bind(&path, field, &Resolution::NotFound);
        build(&path, &bindings, field, &BuildOptions::default())
    }

    #[test]
    fn test_label_clause() {
        let f = field(json!({"ID": "F1", "Expected_Value_Type": "String"}));
        let pattern = build_default("->P1_is_identified_by->E42_Identifier[9_1]", &f);
        assert_eq!(pattern.nested.len(), 1);
        assert!(pattern.nested[0].optional);

        for value_type in &["Date", "Integer"] {
            let f = field(json!({"ID": "F1", "Expected_Value_Type": value_type}));
            let pattern = build_default("->P1_is_identified_by->E42_Identifier[9_1]", &f);
            assert!(pattern.nested.is_empty());
        }

        let pattern = build_default("->P3_has_note->rdf:literal", &f);
        assert!(pattern.nested.is_empty());
    }

    #[test]
    fn test_alias_bind() {
        let f = field(json!({"ID": "F9"}));
        let path = parse("->P1->E42_Identifier[9_1]").unwrap();
        let collection: Record = serde_json::from_value(json!({"id": "recC", "fields": {"ID": "C1"}})).unwrap();
        let bindings = bind(&path, &f, &Resolution::Found(collection));
        let pattern = build(&path, &bindings, &f, &BuildOptions { label: false, ..Default::default() });
        assert_eq!(
            pattern.body(),
            "?subject crm:P1 ?C1 .\n   ?C1 a crm:E42_Identifier .\n   BIND (?C1 AS ?F9)\n   BIND (?F9 AS ?value)"
        );
    }

    #[test]
    fn test_optional_suffix() {
        let f = field(json!({"ID": "F2", "Set_Value": "http://example.org/t"}));
        let path = parse("->P1->E22[1_1]->P2->E55[2_1]").unwrap();
        let bindings = bind(&path, &f, &Resolution::NotFound);
        let pattern = build(
            &path,
            &bindings,
            &f,
            &BuildOptions {
                start: 2,
                optional: true,
                label: false,
                class_uri: None,
            },
        );
        assert!(pattern.optional);
        assert_eq!(pattern.triples.len(), 2);
        assert!(pattern.binds.is_empty());
    }

    #[test]
    fn test_model_class() {
        let f = field(json!({"ID": "F2", "Set_Value": "http://example.org/t"}));
        let path = parse("->P1->E22[1_1]").unwrap();
        let bindings = bind(&path, &f, &Resolution::NotFound);
        let pattern = build(
            &path,
            &bindings,
            &f,
            &BuildOptions {
                label: false,
                class_uri: Some(String::from("http://example.org/Object")),
                ..Default::default()
            },
        );
        assert_eq!(
            pattern.triples.first().map(|t| t.object.to_string()),
            Some(String::from("<http://example.org/Object>"))
        );
        assert_eq!(
            pattern.triples.last().map(|t| t.predicate.clone()),
            Some(Term::name("crm:P2_has_type"))
        );
    }
}

mod common;

use common::{session, FIELDS, LITERAL, ROOTED, TYPE_IRI};
use std::collections::BTreeSet;
use zellij_docs::{
    binder::{Binding, ModelContext},
    front_end::{error::PathError, parse},
    pattern::{statements, GraphPattern, Term},
    serializer::{load_namespaces, turtle::DEFAULT_BASE, Turtle},
    task::FieldTask,
};

fn variables(pattern: &GraphPattern) -> BTreeSet<String> {
    pattern
        .triples
        .iter()
        .flat_map(|t| vec![&t.subject, &t.object])
        .filter_map(|term| match term {
            Term::Variable(v) => Some(v.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn rooted_path_without_collection() {
    let session = session();
    let task = FieldTask::new(&session, "F1").unwrap();
    let path = task.path().unwrap();
    assert_eq!(path.root().map(|t| t.name()), Some("E22_Human-Made_Object"));

    let bindings = task.bindings(&path, None);
    assert_eq!(
        bindings.iter().collect::<Vec<_>>(),
        vec![
            (-1, &Binding::Subject),
            (1, &Binding::Variable(String::from("F1"))),
            (3, &Binding::Variable(String::from("F1"))),
        ]
    );

    let pattern = task.where_pattern(None, false, 0).unwrap();
    let relations: Vec<_> = pattern
        .triples
        .iter()
        .filter(|t| t.predicate != Term::name("a"))
        .collect();
    assert_eq!(relations.len(), 2);
    assert_eq!(pattern.nested.len(), 1);
    assert!(pattern.nested[0].optional);
    assert_eq!(pattern.nested[0].triples[0].predicate, Term::name("rdfs:label"));
}

#[test]
fn collection_binds_first_entity() {
    let session = session();
    let task = FieldTask::new(&session, "F1").unwrap();
    let path = task.path().unwrap();
    let context = ModelContext::new("Collection", "C1");
    let bindings = task.bindings(&path, Some(&context));
    assert_eq!(bindings.at(1), &Binding::Variable(String::from("C1")));
    assert_eq!(bindings.at(3), &Binding::Variable(String::from("F1")));
}

#[test]
fn literal_terminal() {
    let session = session();
    let task = FieldTask::new(&session, "F2").unwrap();
    let pattern = task.where_pattern(None, false, 0).unwrap();
    let last = pattern.triples.last().unwrap();
    assert_eq!(last.predicate, Term::name("crm:P190_has_symbolic_content"));
    assert_eq!(last.object, Term::var("F2"));
    assert!(!pattern
        .triples
        .iter()
        .any(|t| t.predicate == Term::name("a") && t.object == Term::name("rdf:literal")));
    assert!(pattern.nested.is_empty());
    assert!(!task.sparql(false, None, 100).unwrap().content.contains("rdfs:label"));
}

#[test]
fn scalar_fields_have_no_label() {
    let session = session();
    for key in &["F3", "F4"] {
        let task = FieldTask::new(&session, key).unwrap();
        let pattern = task.where_pattern(None, false, 0).unwrap();
        assert!(pattern.nested.is_empty(), "{} has a label clause", key);
    }
}

#[test]
fn count_mode() {
    let session = session();
    let task = FieldTask::new(&session, "F1").unwrap();
    let query = task.query(true, None, 100).unwrap();
    assert_eq!(query.projection().len(), 1);
    assert_eq!(query.limit(), Some(1));
    assert!(query.to_string().contains("COUNT(?value)"));
}

#[test]
fn dangling_relation() {
    let err = parse("->P1_is_identified_by->E42_Identifier[9_1]->P2_has_type").unwrap_err();
    assert!(matches!(err, PathError::DanglingRelation(_)));
    assert!(err.to_string().contains("P2_has_type"));
}

#[test]
fn rooted_dangling_relation() {
    for path in &[
        "E22_Human-Made_Object->P1_is_identified_by->E42_Identifier->P2_has_type",
        "E22_Human-Made_Object->P1_is_identified_by->E42_Identifier[9_1]->P2_has_type",
    ] {
        let err = parse(path).unwrap_err();
        assert_eq!(err, PathError::DanglingRelation(String::from("P2_has_type")));
    }
}

#[test]
fn entity_bindings_and_type_assertions() {
    let session = session();
    for key in &["F1", "F2"] {
        let task = FieldTask::new(&session, key).unwrap();
        let path = task.path().unwrap();
        let bindings = task.bindings(&path, None);
        assert_eq!(bindings.entity_count(), path.len() / 2);
        let skipped = bindings
            .iter()
            .filter(|(position, b)| *position >= 0 && (b.is_literal() || b.is_constant()))
            .count();
        let types = statements(&path, &bindings, 0)
            .iter()
            .filter(|s| s.is_type_assertion())
            .count();
        assert_eq!(types, bindings.entity_count() - skipped);
    }
}

#[test]
fn binding_is_idempotent() {
    let session = session();
    let task = FieldTask::new(&session, "F1").unwrap();
    let path = task.path().unwrap();
    let context = ModelContext::new("Collection", "C1");
    assert_eq!(
        task.bindings(&path, Some(&context)),
        task.bindings(&path, Some(&context))
    );
    assert_eq!(parse(ROOTED).unwrap(), parse(ROOTED).unwrap());
}

#[test]
fn sparql_and_turtle_share_variables() {
    let session = session();
    let namespaces = load_namespaces(&session);
    for key in &FIELDS {
        let task = FieldTask::new(&session, key).unwrap();
        let sparql = variables(&task.where_pattern(None, false, 0).unwrap());
        let path = task.path().unwrap();
        let turtle = Turtle::new(
            &path,
            &task.bindings(&path, None),
            task.field().system_name(),
            &namespaces,
            DEFAULT_BASE,
        );
        let nodes: BTreeSet<String> = turtle
            .nodes()
            .into_iter()
            .filter_map(|node| node.strip_prefix(&format!("<{}", DEFAULT_BASE)))
            .map(|node| String::from(node.trim_end_matches('>')))
            .collect();
        assert_eq!(sparql, nodes, "{}", key);
        assert_eq!(
            task.turtle(DEFAULT_BASE).unwrap().file_name,
            format!("Field_{}.ttl", key)
        );
    }
}

#[test]
fn constants_stay_iris() {
    let session = session();
    let task = FieldTask::new(&session, "F5").unwrap();
    let iri = Term::Iri(String::from(TYPE_IRI));
    let pattern = task.where_pattern(None, false, 0).unwrap();
    assert!(pattern.triples.iter().any(|t| t.object == iri));
    assert!(!pattern.triples.iter().any(|t| t.subject == iri));

    let path = task.path().unwrap();
    let turtle = Turtle::new(
        &path,
        &task.bindings(&path, None),
        task.field().system_name(),
        &load_namespaces(&session),
        DEFAULT_BASE,
    );
    assert!(turtle.nodes().contains(format!("<{}>", TYPE_IRI).as_str()));
}

#[test]
fn self_placeholder_binds_field() {
    let session = session();
    let task = FieldTask::new(&session, "F6").unwrap();
    let path = task.path().unwrap();
    let bindings = task.bindings(&path, None);
    assert_eq!(bindings.at(1), &Binding::Variable(String::from("F6")));
    assert!(bindings.at(3).is_literal());
    let text = task.turtle(DEFAULT_BASE).unwrap().content;
    assert!(text.contains("\"Field_F6_value\""), "{}", text);
}

#[test]
fn literal_path_parses() {
    let path = parse(LITERAL).unwrap();
    assert!(path.ends_in_literal());
    assert!(path.root().is_none());
}

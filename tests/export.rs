mod common;

use common::{base, session, snapshot};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use zellij_docs::{
    airtable::{MemoryBase, MemoryConnector, Session},
    config::Settings,
    exporter::{
        export_tree,
        pdf::{model_report, project_report},
        TreeRoot,
    },
    grouping::{display, index, search, PatternSchema, SearchTarget},
    publish::MemoryPublisher,
    qa::{QaService, SparqlEndpoint},
    registry::{Database, Registry},
    Result,
};

#[test]
fn project_tree_to_memory() {
    let publisher = MemoryPublisher::new();
    let paths = export_tree(
        &session(),
        &[PatternSchema::model(), PatternSchema::collection()],
        TreeRoot::Project,
        &[&publisher],
    )
    .unwrap();
    assert_eq!(paths[0], "space/P1.xml");
    assert_eq!(paths[1], "composite/M1.xml");
    assert_eq!(paths.iter().filter(|p| p.starts_with("atom/M1_")).count(), 3);
    assert_eq!(paths.last().map(String::as_str), Some("composite/C1.xml"));

    let xml = String::from_utf8(publisher.get("space/P1.xml").unwrap()).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<system_name>Zellij</system_name>"));
    assert_eq!(publisher.paths().len(), paths.len());
}

#[test]
fn model_tree_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let local = zellij_docs::publish::DirectoryPublisher::new(dir.path());
    let schema = PatternSchema::model();
    let paths = export_tree(
        &session(),
        &[],
        TreeRoot::Item {
            schema: &schema,
            key: "M1",
        },
        &[&local],
    )
    .unwrap();
    assert_eq!(paths.len(), 4);
    for path in &paths {
        assert!(dir.path().join(path).is_file(), "{} missing", path);
    }
}

#[test]
fn reports_render() {
    let session = session();
    let project = project_report(&session).unwrap();
    assert_eq!(project.title, "Zellij");
    assert!(project.to_pdf().unwrap().starts_with(b"%PDF"));

    let model = model_report(&session, &PatternSchema::model(), "M1", "http://localhost:8000").unwrap();
    let titles: Vec<&str> = model.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Metadata", "Identification", "Production"]);
    assert!(model.to_pdf().unwrap().starts_with(b"%PDF"));
}

#[test]
fn display_from_snapshot_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", snapshot()).unwrap();
    let session = Session::new(Arc::new(MemoryBase::load(file.path()).unwrap()));
    let view = display(&session, &PatternSchema::model(), "M1").unwrap().unwrap();
    let groups: Vec<(&str, usize)> = view
        .groups
        .iter()
        .map(|(name, rows)| (name.as_str(), rows.len()))
        .collect();
    assert_eq!(groups, vec![("Identification", 2), ("Production", 1)]);
    assert_eq!(view.groups[0].1[0]["Order"], json!(1));
    assert!(display(&session, &PatternSchema::model(), "M9").unwrap().is_none());
}

#[test]
fn search_registered_databases() {
    let registry = Registry::in_memory().unwrap();
    let mut db = Database::new("appMain", "Main", "");
    db.account = String::from("Museum");
    registry.save(&db).unwrap();

    let connector = MemoryConnector::new().with_base(MemoryBase::from_json(&snapshot().to_string()).unwrap());
    let targets: Vec<SearchTarget> = registry
        .list()
        .unwrap()
        .into_iter()
        .map(|database| SearchTarget {
            database,
            schemas: vec![PatternSchema::model(), PatternSchema::collection()],
        })
        .collect();

    let hits = search(&targets, |db| db.session(&connector), "obj").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "M1");
    assert_eq!(hits[0].authority, "Museum");

    let index = index(&targets, |db| db.session(&connector)).unwrap();
    assert_eq!(index.keys().collect::<Vec<_>>(), vec!["o"]);

    let mut missing = db.clone();
    missing.api_key = String::from("appGone");
    let broken = vec![SearchTarget {
        database: missing,
        schemas: vec![PatternSchema::model()],
    }];
    assert!(search(&broken, |db| db.session(&connector), "obj").is_err());
}

struct Counting {
    calls: Arc<AtomicUsize>,
}

impl SparqlEndpoint for Counting {
    fn select(&self, _endpoint: &str, query: &str) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(query.contains("COUNT(?value)"));
        Ok(json!({"results": {"bindings": [{"count": {"type": "literal", "value": "42"}}]}}))
    }
}

#[test]
fn count_is_memoized() {
    let calls = Arc::new(AtomicUsize::new(0));
    let shared = base();
    let service = QaService::new(
        &Settings::default(),
        move |_db| Ok(Session::new(shared.clone())),
        Box::new(Counting {
            calls: calls.clone(),
        }),
    );
    let mut db = Database::new("appMain", "Main", "");
    db.sparql_endpoint = Some(String::from("http://localhost:7200/repositories/main"));

    for _ in 0..2 {
        let response = service.count(Some(&db), "F1");
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"count": 42}));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.cached(), (1, 0));

    let unknown = service.count(Some(&db), "F9");
    assert_eq!(unknown.status, 404);
    assert_eq!(service.count(None, "F1").status, 400);
}

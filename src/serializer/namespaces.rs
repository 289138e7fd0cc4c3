use crate::{airtable::Session, types::Record};
use log::debug;

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const CRM: &str = "http://www.cidoc-crm.org/cidoc-crm/";

/// Prefix declarations in insertion order; the first declaration of a
/// prefix wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Namespaces(Vec<(String, String)>);

impl Namespaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, prefix: &str, namespace: &str) -> bool {
        if self.get(prefix).is_some() {
            return false;
        }
        self.0.push((String::from(prefix), String::from(namespace)));
        true
    }

    pub fn with(mut self, prefix: &str, namespace: &str) -> Self {
        self.add(prefix, namespace);
        self
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, ns)| ns.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds one declaration per `NameSpaces`/`Ontology` record.
    pub fn extend_from_records(&mut self, records: &[Record]) {
        for record in records {
            let prefix = record.first_text(&["Abbreviation", "Prefix"]).unwrap_or("");
            let namespace = record.text_or_default("Namespace");
            if namespace.is_empty() {
                debug!("namespace record {} has no URI", record.id);
                continue;
            }
            self.add(prefix, namespace);
        }
    }
}

/// Namespaces declared in the base plus the fixed `rdf` prefix.
pub fn load_namespaces(session: &Session) -> Namespaces {
    let mut namespaces = Namespaces::new();
    namespaces.extend_from_records(&session.optional("namespaces", session.all("NameSpaces")));
    namespaces.extend_from_records(&session.optional("ontologies", session.all("Ontology")));
    namespaces.add("rdf", RDF);
    namespaces
}

/// Namespaces of the `Ontology` table only.
pub fn load_ontology_namespaces(session: &Session) -> Namespaces {
    let mut namespaces = Namespaces::new();
    namespaces.extend_from_records(&session.optional("ontologies", session.all("Ontology")));
    namespaces
}

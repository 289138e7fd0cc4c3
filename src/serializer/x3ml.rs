//! X3ML mapping documents.
//!
//! Form `a` maps a field (or each field of a model) from its collection in
//! one mapping. Form `b` splits every path after its first relation/entity
//! pair: the model maps to the collection, and the collection maps to the
//! rest of the path.

use super::Namespaces;
use crate::{front_end::Path, front_end::Token, xml::Element, Error, Result};
use std::str::FromStr;

const LITERAL_TYPES: [(&str, &str); 4] = [
    ("rdf:literal", "http://www.w3.org/2001/XMLSchema#string"),
    ("xsd:date", "http://www.w3.org/2001/XMLSchema#dateTime"),
    ("xsd:dateTime", "http://www.w3.org/2001/XMLSchema#dateTime"),
    ("xsd:time", "http://www.w3.org/2001/XMLSchema#time"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Form {
    A,
    B,
}

impl Form {
    /// Record column holding the uploaded document.
    pub fn column(self) -> &'static str {
        match self {
            Form::A => "x3ml_a",
            Form::B => "x3ml_b",
        }
    }
}

impl FromStr for Form {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "a" | "A" => Ok(Form::A),
            "b" | "B" => Ok(Form::B),
            _ => Err(Error::InvalidArgument(format!(
                "form must be either 'a' or 'b', not `{}`",
                s
            ))),
        }
    }
}

/// A field as the mapping sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct X3mlField {
    pub id: String,
    /// `ID` of the collection the field is deployed in; may be empty.
    pub collection: String,
    /// `None` when the field has no usable path.
    pub path: Option<Path>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum X3mlSubject {
    Field {
        field: X3mlField,
        /// `ID` of the model; required by form `b`.
        model: Option<String>,
    },
    Model {
        id: String,
        fields: Vec<X3mlField>,
    },
}

fn literal_type(name: &str) -> Option<&'static str> {
    LITERAL_TYPES
        .iter()
        .find(|(marker, _)| *marker == name)
        .map(|(_, uri)| *uri)
}

fn arg(name: &str, kind: &str, content: &str) -> Element {
    Element::leaf("arg", content)
        .with_attr("name", name)
        .with_attr("type", kind)
}

fn entity(token: &Token) -> Element {
    let name = token.head();
    match literal_type(name) {
        Some(uri) => Element::new("entity")
            .with_child(Element::leaf("type", uri))
            .with_child(
                Element::new("instance_generator")
                    .with_attr("name", "Literal")
                    .with_child(arg("text", "xpath", "text()"))
                    .with_child(arg("language", "constant", "en")),
            ),
        None => Element::new("entity")
            .with_attr("variable", token.discriminator().unwrap_or(""))
            .with_child(Element::leaf("type", name))
            .with_child(Element::new("instance_generator").with_attr("name", "UUID")),
    }
}

fn domain(template: &str, head: &[Token]) -> Element {
    let mut source_node = Element::new("source_node");
    let mut target_entity = Element::new("entity").with_child(Element::leaf("type", template));
    match (head.first(), head.last()) {
        (Some(relation), Some(last)) => {
            source_node.push(Element::leaf("relationship", relation.head()));
            target_entity.push(entity(last));
        }
        _ => {
            target_entity.push(Element::new("instance_generator").with_attr("name", "UUID"));
        }
    }
    Element::new("domain")
        .with_attr("template", template)
        .with_child(source_node)
        .with_child(Element::new("target_node").with_child(target_entity))
}

/// Appends the link of `field` to `mapping` and returns the tokens it maps.
fn link(mapping: &mut Element, field: &X3mlField, form: Form, first_part: bool) -> Vec<Token> {
    let template = if form == Form::B && first_part {
        field.collection.as_str()
    } else {
        field.id.as_str()
    };
    let link = mapping.push(Element::new("link").with_attr("template", template));
    let mut target_relation = Element::new("target_relation");
    let tokens: Vec<Token> = match &field.path {
        Some(path) => {
            let tokens = path.tokens();
            match form {
                Form::A => tokens.to_vec(),
                Form::B if first_part => tokens.iter().take(2).cloned().collect(),
                Form::B => tokens.iter().skip(2).cloned().collect(),
            }
        }
        None => vec![],
    };
    let mut range = None;
    for (idx, token) in tokens.iter().enumerate() {
        if idx % 2 == 0 {
            target_relation.push(Element::leaf("relationship", token.head()));
        } else if idx == tokens.len() - 1 {
            range = Some(
                Element::new("range")
                    .with_child(Element::new("source_node"))
                    .with_child(Element::new("target_node").with_child(entity(token))),
            );
        } else {
            target_relation.push(entity(token));
        }
    }
    link.push(
        Element::new("path")
            .with_child(Element::new("source_relation").with_child(Element::new("relation")))
            .with_child(target_relation),
    );
    if let Some(range) = range {
        link.push(range);
    }
    tokens
}

/// Builds the complete `x3ml` document.
pub fn document(namespaces: &Namespaces, subject: &X3mlSubject, form: Form) -> Result<Element> {
    let mut namespace_list = Element::new("namespaces");
    for (prefix, uri) in namespaces.iter() {
        namespace_list.push(
            Element::new("namespace")
                .with_attr("prefix", prefix)
                .with_attr("uri", uri),
        );
    }
    let mut mappings = Element::new("mappings");
    match (form, subject) {
        (Form::A, X3mlSubject::Field { field, .. }) => {
            let mapping = mappings.push(Element::new("mapping"));
            mapping.push(domain(&field.collection, &[]));
            link(mapping, field, form, true);
        }
        (Form::A, X3mlSubject::Model { id, fields }) => {
            let mapping = mappings.push(Element::new("mapping"));
            mapping.push(domain(id, &[]));
            for field in fields {
                link(mapping, field, form, true);
            }
        }
        (Form::B, X3mlSubject::Field { field, model }) => {
            let model = model.as_deref().ok_or_else(|| {
                Error::InvalidArgument(String::from("form b of a field needs its model"))
            })?;
            let mut first = Element::new("mapping").with_child(domain(model, &[]));
            let head = link(&mut first, field, form, true);
            let mut second = Element::new("mapping").with_child(domain(&field.collection, &head));
            link(&mut second, field, form, false);
            mappings.push(first);
            mappings.push(second);
        }
        (Form::B, X3mlSubject::Model { id, fields }) => {
            let mut first = Element::new("mapping").with_child(domain(id, &[]));
            let mut collections: Vec<(String, Element)> = vec![];
            for field in fields {
                let idx = match collections.iter().position(|(c, _)| *c == field.collection) {
                    Some(idx) => idx,
                    None => {
                        let head = link(&mut first, field, form, true);
                        let mapping = Element::new("mapping").with_child(domain(&field.collection, &head));
                        collections.push((field.collection.clone(), mapping));
                        collections.len() - 1
                    }
                };
                link(&mut collections[idx].1, field, form, false);
            }
            mappings.push(first);
            for (_, mapping) in collections {
                mappings.push(mapping);
            }
        }
    }
    Ok(Element::new("x3ml")
        .with_child(namespace_list)
        .with_child(mappings))
}

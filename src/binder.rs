//! Assigns a variable, the literal marker or a constant to every entity
//! position of a path.

use crate::{
    airtable::{Formula, Session},
    front_end::{Path, LITERAL},
    tools::normalize,
    types::{Field, Record, Resolution},
    Result,
};
use log::debug;
use serde_json::Value;
use std::{collections::BTreeMap, fmt};

/// Position of the implicit subject.
pub const SUBJECT: i32 = -1;

static SUBJECT_BINDING: Binding = Binding::Subject;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    Subject,
    Literal,
    Variable(String),
    Constant(String),
}

impl Binding {
    pub fn is_constant(&self) -> bool {
        matches!(self, Binding::Constant(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Binding::Literal)
    }

    /// The variable name, `subject` included.
    pub fn variable(&self) -> Option<&str> {
        match self {
            Binding::Subject => Some("subject"),
            Binding::Variable(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Subject => write!(f, "subject"),
            Binding::Literal => write!(f, "{}", LITERAL),
            Binding::Variable(v) => write!(f, "{}", v),
            Binding::Constant(c) => write!(f, "<{}>", c),
        }
    }
}

/// Bindings by token position. Once bound, a position keeps its value.
#[derive(Clone, Debug, PartialEq)]
pub struct Bindings {
    positions: BTreeMap<i32, Binding>,
    field_variable: String,
}

impl Bindings {
    fn new(field_variable: String) -> Self {
        let mut positions = BTreeMap::new();
        positions.insert(SUBJECT, Binding::Subject);
        Self {
            positions,
            field_variable,
        }
    }

    fn bind(&mut self, position: usize, binding: Binding) {
        let position = position as i32;
        if self.positions.contains_key(&position) {
            debug!("position {} already bound", position);
            return;
        }
        self.positions.insert(position, binding);
    }

    pub fn get(&self, position: i32) -> Option<&Binding> {
        self.positions.get(&position)
    }

    /// The binding of an entity position; unbound positions read as the
    /// subject.
    pub fn at(&self, position: i32) -> &Binding {
        self.positions.get(&position).unwrap_or(&SUBJECT_BINDING)
    }

    pub fn field_variable(&self) -> &str {
        &self.field_variable
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &Binding)> {
        self.positions.iter().map(|(&k, v)| (k, v))
    }

    /// Bound entity positions, the subject excluded.
    pub fn entity_count(&self) -> usize {
        self.positions.len() - 1
    }

    pub fn binds_field_variable(&self) -> bool {
        self.positions
            .values()
            .any(|b| b.variable() == Some(self.field_variable.as_str()))
    }

    pub fn has_literal(&self) -> bool {
        self.positions.values().any(Binding::is_literal)
    }
}

/// Binds every entity position of `path`, in order.
///
/// `collection` is the collection the field is deployed in for the current
/// model context.
pub fn bind(path: &Path, field: &Field, collection: &Resolution<Record>) -> Bindings {
    let field_variable = field.variable();
    let mut bindings = Bindings::new(field_variable.clone());
    let len = path.len();
    for idx in path.entity_positions() {
        let token = &path.tokens()[idx];
        let binding = if token.is_literal() {
            Binding::Literal
        } else if token.is_self_placeholder() {
            Binding::Variable(field_variable.clone())
        } else if let Some(value) = field
            .set_value()
            .filter(|_| idx > 2 && path.tokens()[idx - 2].major_number() == token.major_number())
        {
            Binding::Constant(String::from(value))
        } else if idx == 1 {
            match collection {
                Resolution::Found(record) => Binding::Variable(normalize(record.key())),
                _ => Binding::Variable(field_variable.clone()),
            }
        } else if idx < len - 1 {
            Binding::Variable(normalize(&token.group_variable()))
        } else {
            Binding::Variable(field_variable.clone())
        };
        bindings.bind(idx, binding);
    }
    bindings
}

/// The model or collection a field is exported for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelContext {
    /// `Collection`, or the model table of the pattern.
    pub table: String,
    pub id: String,
}

impl ModelContext {
    pub fn new(table: &str, id: &str) -> Self {
        Self {
            table: String::from(table),
            id: String::from(id),
        }
    }

    pub fn is_collection(&self) -> bool {
        self.table == "Collection"
    }
}

/// Resolves the collection of `field` within the model context. A
/// collection context is its own collection; a model context goes through
/// the field's `Model_Fields` row.
pub fn resolve_collection(
    session: &Session,
    field: &Field,
    context: Option<&ModelContext>,
) -> Result<Resolution<Record>> {
    let context = match context {
        Some(context) => context,
        None => return Ok(Resolution::NotFound),
    };
    if context.is_collection() {
        let records = session.records(&Value::String(context.id.clone()), "Collection")?;
        return Ok(Resolution::from_vec(records));
    }
    let formula = Formula::Or(vec![
        Formula::matches(vec![("Field", field.record_id()), ("Model", context.id.as_str())]),
        Formula::matches(vec![("Field", field.id()), ("Model", context.id.as_str())]),
    ]);
    let row = match session.first("Model_Fields", &formula)? {
        Some(row) => row,
        None => return Ok(Resolution::NotFound),
    };
    let ids = row
        .get("Model_Specific_Part_of_Collection")
        .cloned()
        .unwrap_or_else(|| Value::Array(vec![]));
    Ok(Resolution::from_vec(session.records(&ids, "Collection")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::front_end::parse;
    use serde_json::json;

    fn field(fields: Value) -> Field {
        Field::new(serde_json::from_value(json!({"id": "recF", "fields": fields})).unwrap())
    }

    fn collection(id: &str) -> Record {
        serde_json::from_value(json!({"id": "recC", "fields": {"ID": id}})).unwrap()
    }

    #[test]
    fn test_root_prefixed_path() {
        let path = parse(
            "E22_Object->P1_is_identified_by->E42_Identifier[9_1]->P2_has_type->E55_Type[10_1]",
        )
        .unwrap();
        let bindings = bind(&path, &field(json!({"ID": "F1"})), &Resolution::NotFound);
        assert_eq!(
            bindings.iter().collect::<Vec<_>>(),
            vec![
                (-1, &Binding::Subject),
                (1, &Binding::Variable(String::from("F1"))),
                (3, &Binding::Variable(String::from("F1"))),
            ]
        );
        assert_eq!(bindings.entity_count(), path.len() / 2);
    }

    #[test]
    fn test_collection_binding() {
        let path = parse("->P1_is_identified_by->E42_Identifier[9_1]->P2_has_type->E55_Type[10_1]")
            .unwrap();
        let f = field(json!({"ID": "F1"}));
        let bindings = bind(&path, &f, &Resolution::Found(collection("C1.x")));
        assert_eq!(bindings.at(1), &Binding::Variable(String::from("C1_x")));
        let bindings = bind(
            &path,
            &f,
            &Resolution::Ambiguous(vec![collection("C1"), collection("C2")]),
        );
        assert_eq!(bindings.at(1), &Binding::Variable(String::from("F1")));
    }

    #[test]
    fn test_middle_and_constant_positions() {
        let path = parse(
            "->P108i_was_produced_by->E12_Production[3_1]->P14_carried_out_by->E39_Actor[4_1]->P2_has_type->E55_Type[4_2]",
        )
        .unwrap();
        let plain = bind(&path, &field(json!({"ID": "F2.a"})), &Resolution::NotFound);
        assert_eq!(plain.at(1), &Binding::Variable(String::from("F2_a")));
        assert_eq!(plain.at(3), &Binding::Variable(String::from("4_1")));
        assert_eq!(plain.at(5), &Binding::Variable(String::from("F2_a")));

        let fixed = bind(
            &path,
            &field(json!({"ID": "F2.a", "Set_Value": "http://vocab.getty.edu/aat/300404670"})),
            &Resolution::NotFound,
        );
        assert_eq!(
            fixed.at(5),
            &Binding::Constant(String::from("http://vocab.getty.edu/aat/300404670"))
        );
        assert_eq!(fixed.at(3), &Binding::Variable(String::from("4_1")));
    }

    #[test]
    fn test_literal_and_placeholder() {
        let path = parse("->P1_is_identified_by->xsl:self->P190_has_symbolic_content->rdf:literal")
            .unwrap();
        let bindings = bind(&path, &field(json!({"ID": "F3"})), &Resolution::NotFound);
        assert_eq!(bindings.at(1), &Binding::Variable(String::from("F3")));
        assert_eq!(bindings.at(3), &Binding::Literal);
        assert!(bindings.has_literal());
    }

    #[test]
    fn test_binding_is_idempotent() {
        let path = parse("->P1->E42_Identifier[9_1]->P2->E55_Type[9_2]->P3->E41[11_1]").unwrap();
        let f = field(json!({"ID": "F4", "Set_Value": "http://example.org/t"}));
        assert_eq!(
            bind(&path, &f, &Resolution::NotFound),
            bind(&path, &f, &Resolution::NotFound)
        );
    }
}

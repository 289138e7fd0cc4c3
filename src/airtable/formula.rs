//! Airtable formula expressions.
//!
//! A formula is rendered to text for the HTTP API and evaluated directly by
//! the in-memory base.

use crate::types::{display_value, Record};
use itertools::Itertools;
use serde_json::Value;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// `STR_VALUE(x)`: a quoted string constant.
    Str(String),
    /// `RECORD_ID()`
    RecordId,
    /// `{Column}`
    Column(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Formula {
    /// Every column equals its value; one pair renders without `AND`.
    Match(Vec<(String, String)>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Equal(Operand, Operand),
    /// `SEARCH("needle",{Column})`
    Search(String, String),
}

impl Formula {
    pub fn matches<K: Into<String>, V: Into<String>>(pairs: Vec<(K, V)>) -> Self {
        Formula::Match(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// `{ID}='key'`
    pub fn by_key(key: &str) -> Self {
        Formula::matches(vec![("ID", key)])
    }

    /// `OR('rec1'=RECORD_ID(), ...)`
    pub fn record_ids<S: AsRef<str>>(ids: &[S]) -> Self {
        Formula::Or(
            ids.iter()
                .map(|id| {
                    Formula::Equal(Operand::Str(String::from(id.as_ref())), Operand::RecordId)
                })
                .collect(),
        )
    }

    pub fn search(needle: &str, column: &str) -> Self {
        Formula::Search(String::from(needle), String::from(column))
    }

    /// Evaluates the formula against one record. `resolve` turns a linked
    /// record id into its primary value, which is what Airtable compares.
    pub fn eval<R>(&self, record: &Record, resolve: &R) -> bool
    where
        R: Fn(&str) -> Option<String>,
    {
        match self {
            Formula::Match(pairs) => pairs
                .iter()
                .all(|(column, value)| column_text(record, column, resolve) == *value),
            Formula::And(args) => args.iter().all(|f| f.eval(record, resolve)),
            Formula::Or(args) => args.iter().any(|f| f.eval(record, resolve)),
            Formula::Equal(lhs, rhs) => {
                operand_text(lhs, record, resolve) == operand_text(rhs, record, resolve)
            }
            Formula::Search(needle, column) => {
                column_text(record, column, resolve).contains(needle.as_str())
            }
        }
    }
}

fn operand_text<R>(operand: &Operand, record: &Record, resolve: &R) -> String
where
    R: Fn(&str) -> Option<String>,
{
    match operand {
        Operand::Str(s) => s.clone(),
        Operand::RecordId => record.id.clone(),
        Operand::Column(column) => column_text(record, column, resolve),
    }
}

fn column_text<R>(record: &Record, column: &str, resolve: &R) -> String
where
    R: Fn(&str) -> Option<String>,
{
    match record.get(column) {
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| match v.as_str() {
                Some(s) => resolve(s).unwrap_or_else(|| String::from(s)),
                None => display_value(v),
            })
            .join(", "),
        Some(value) => display_value(value),
        None => String::new(),
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Str(s) => write!(f, "{}", quote(s)),
            Operand::RecordId => write!(f, "RECORD_ID()"),
            Operand::Column(c) => write!(f, "{{{}}}", c),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Match(pairs) => {
                let mut terms = pairs.iter().map(|(c, v)| format!("{{{}}}={}", c, quote(v)));
                if pairs.len() == 1 {
                    write!(f, "{}", terms.join(""))
                } else {
                    write!(f, "AND({})", terms.join(","))
                }
            }
            Formula::And(args) => write!(f, "AND({})", args.iter().join(",")),
            Formula::Or(args) => write!(f, "OR({})", args.iter().join(",")),
            Formula::Equal(lhs, rhs) => write!(f, "{}={}", lhs, rhs),
            Formula::Search(needle, column) => {
                write!(f, "SEARCH(\"{}\",{{{}}})", needle.replace('"', "\\\""), column)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Record {
        serde_json::from_value(json!({
            "id": "recF",
            "fields": {"ID": "F1", "Model": ["recM"], "Name": "O'Brien"}
        }))
        .unwrap()
    }

    fn resolve(id: &str) -> Option<String> {
        if id == "recM" {
            Some(String::from("M1"))
        } else {
            None
        }
    }

    #[test]
    fn test_render() {
        assert_eq!(Formula::by_key("F1").to_string(), "{ID}='F1'");
        assert_eq!(
            Formula::matches(vec![("Field", "F1"), ("Model", "M1")]).to_string(),
            "AND({Field}='F1',{Model}='M1')"
        );
        assert_eq!(
            Formula::record_ids(&["rec1", "rec2"]).to_string(),
            "OR('rec1'=RECORD_ID(),'rec2'=RECORD_ID())"
        );
        assert_eq!(
            Formula::search("M1", "Model").to_string(),
            "SEARCH(\"M1\",{Model})"
        );
        assert_eq!(Formula::by_key("O'B").to_string(), "{ID}='O\\'B'");
    }

    #[test]
    fn test_eval() {
        let record = record();
        assert!(Formula::by_key("F1").eval(&record, &resolve));
        assert!(Formula::matches(vec![("ID", "F1"), ("Model", "M1")]).eval(&record, &resolve));
        assert!(Formula::record_ids(&["recX", "recF"]).eval(&record, &resolve));
        assert!(Formula::search("M1", "Model").eval(&record, &resolve));
        assert!(!Formula::search("M2", "Model").eval(&record, &resolve));
        assert!(!Formula::by_key("O'Brien").eval(&record, &resolve));
        assert!(Formula::matches(vec![("Name", "O'Brien")]).eval(&record, &resolve));
    }
}

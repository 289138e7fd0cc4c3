use super::Namespaces;
use crate::pattern::GraphPattern;
use std::fmt;

pub const DEFAULT_LIMIT: usize = 100;
pub const COUNT_PROJECTION: &str = "(COUNT(?value) as ?count)";
pub const SAMPLE_PROJECTION: &str = "DISTINCT ?value";

/// A `SELECT` query over one graph pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectQuery {
    prefixes: Namespaces,
    projection: Vec<String>,
    pattern: GraphPattern,
    limit: Option<usize>,
}

impl SelectQuery {
    /// `SELECT *` limited to `limit` rows.
    pub fn new(prefixes: Namespaces, pattern: GraphPattern, limit: usize) -> Self {
        Self {
            prefixes,
            projection: vec![],
            pattern,
            limit: Some(limit),
        }
    }

    /// Counts the values of the pattern in a single row.
    pub fn count(prefixes: Namespaces, pattern: GraphPattern) -> Self {
        Self {
            prefixes,
            projection: vec![String::from(COUNT_PROJECTION)],
            pattern,
            limit: Some(1),
        }
    }

    /// The distinct values of the pattern, at most `limit` of them.
    pub fn sample(prefixes: Namespaces, pattern: GraphPattern, limit: usize) -> Self {
        Self {
            prefixes,
            projection: vec![String::from(SAMPLE_PROJECTION)],
            pattern,
            limit: Some(limit),
        }
    }

    pub fn pattern(&self) -> &GraphPattern {
        &self.pattern
    }

    pub fn projection(&self) -> &[String] {
        &self.projection
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// The WHERE body as stored on the field record.
    pub fn where_body(&self) -> String {
        self.pattern.body()
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (prefix, namespace) in self.prefixes.iter() {
            writeln!(f, "PREFIX {}: <{}>", prefix, namespace)?;
        }
        writeln!(f)?;
        if self.projection.is_empty() {
            writeln!(f, "SELECT *")?;
        } else {
            writeln!(f, "SELECT {}", self.projection.join(" "))?;
        }
        write!(f, "WHERE {}", self.pattern.render(0))?;
        if let Some(limit) = self.limit {
            writeln!(f, "LIMIT {}", limit)?;
        }
        Ok(())
    }
}

//! Semantic pattern documentation for Airtable-hosted ontology mappings.

pub mod airtable;
pub mod binder;
pub mod cache;
pub mod config;
pub mod error;
pub mod exporter;
pub mod front_end;
pub mod grouping;
pub mod pattern;
pub mod publish;
pub mod qa;
pub mod registry;
pub mod serializer;
pub mod task;
pub mod types;
pub mod xml;

pub(crate) mod tools;

pub use error::{Error, Result};

//! Output formats for a bound path.

pub use namespaces::{load_namespaces, load_ontology_namespaces, Namespaces, CRM, RDF};
pub use research_space::{ResearchSpaceConfig, ResearchSpaceField};
pub use sparql::SelectQuery;
pub use turtle::Turtle;
pub use x3ml::{Form, X3mlField, X3mlSubject};

pub mod research_space;
pub mod sparql;
pub mod turtle;
pub mod x3ml;

mod namespaces;

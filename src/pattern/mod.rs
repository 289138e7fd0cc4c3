//! Graph patterns built from a bound path.

pub use builder::{build, BuildOptions};
pub use graph::{Bind, GraphPattern, Term, Triple};
pub use walk::{statements, Object, Statement};

mod builder;
mod graph;
mod walk;

//! The ontological path language: `A->B-->C[n]`.

pub use ast::{Path, Separator, Token, DEFAULT_PREFIX, LITERAL};
pub use checker::check;
pub use parser::{parse, parse_segments, Segments};

pub mod error;

mod ast;
mod checker;
mod parser;

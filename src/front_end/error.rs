use derive_more::Display;

pub type Result<T> = std::result::Result<T, PathError>;

#[derive(Clone, Debug, Display, PartialEq)]
pub enum PathError {
    #[display(fmt = "syntax error\n{}", _0)]
    Syntax(String),
    #[display(fmt = "path has no relation")]
    Empty,
    #[display(fmt = "empty token at position {}", _0)]
    EmptyToken(usize),
    #[display(fmt = "path ends with dangling relation `{}`", _0)]
    DanglingRelation(String),
    #[display(fmt = "relation `{}` carries a group discriminator", _0)]
    DiscriminatorOnRelation(String),
    #[display(fmt = "`rdf:literal` used as a relation at position {}", _0)]
    LiteralAtRelation(usize),
    #[display(fmt = "`rdf:literal` must be the last entity, found at position {}", _0)]
    LiteralNotTerminal(usize),
}

impl std::error::Error for PathError {}

use std::fmt;

/// The literal terminal marker.
pub const LITERAL: &str = "rdf:literal";

/// Namespace assumed for tokens without a prefix.
pub const DEFAULT_PREFIX: &str = "crm";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Separator {
    /// `->`
    Step,
    /// `-->`
    Hop,
}

impl Separator {
    pub fn as_str(self) -> &'static str {
        match self {
            Separator::Step => "->",
            Separator::Hop => "-->",
        }
    }
}

/// One relation or entity of a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    name: String,
    discriminator: Option<String>,
    separator: Option<Separator>,
}

impl Token {
    pub fn new(name: &str, discriminator: Option<&str>) -> Self {
        Self {
            name: String::from(name.trim()),
            discriminator: discriminator.map(|d| String::from(d.trim())),
            separator: None,
        }
    }

    pub(crate) fn with_separator(mut self, separator: Option<Separator>) -> Self {
        self.separator = separator;
        self
    }

    /// The token as written, discriminator included.
    pub fn raw(&self) -> String {
        match &self.discriminator {
            Some(d) => format!("{}[{}]", self.name, d),
            None => self.name.clone(),
        }
    }

    /// The token without its discriminator.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator.as_deref()
    }

    /// The separator written before this token.
    pub fn separator(&self) -> Option<Separator> {
        self.separator
    }

    pub fn prefix(&self) -> &str {
        match self.name.find(':') {
            Some(i) => &self.name[..i],
            None => DEFAULT_PREFIX,
        }
    }

    pub fn local_name(&self) -> &str {
        match self.name.find(':') {
            Some(i) => self.name[i + 1..].trim(),
            None => &self.name,
        }
    }

    /// `prefix:LocalName`, with the default prefix filled in.
    pub fn qname(&self) -> String {
        format!("{}:{}", self.prefix(), self.local_name())
    }

    /// First word of the name; annotated tokens such as
    /// `a 'integer'` keep only `a`.
    pub fn head(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }

    /// The leading number of the discriminator; the whole token when there
    /// is none.
    pub fn major_number(&self) -> String {
        match &self.discriminator {
            Some(d) => String::from(d.split('_').next().unwrap_or("")),
            None => self.raw(),
        }
    }

    /// Variable name derived from the discriminator; the whole token when
    /// there is none.
    pub fn group_variable(&self) -> String {
        match &self.discriminator {
            Some(d) => d.replace('.', "_"),
            None => self.raw(),
        }
    }

    pub fn is_literal(&self) -> bool {
        self.name == LITERAL && self.discriminator.is_none()
    }

    /// `xsl…` tokens stand for the field itself.
    pub fn is_self_placeholder(&self) -> bool {
        self.name.starts_with("xsl")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// A checked path: relations at even positions, entities at odd positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    root: Option<Token>,
    tokens: Vec<Token>,
}

impl Path {
    pub(crate) fn new(root: Option<Token>, tokens: Vec<Token>) -> Self {
        Self { root, tokens }
    }

    /// The class of the implicit subject, when the path names one.
    pub fn root(&self) -> Option<&Token> {
        self.root.as_ref()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Token> {
        self.tokens.get(idx)
    }

    /// Odd positions, in order.
    pub fn entity_positions(&self) -> impl Iterator<Item = usize> {
        (1..self.tokens.len()).step_by(2)
    }

    pub fn is_last(&self, idx: usize) -> bool {
        idx + 1 == self.tokens.len()
    }

    pub fn ends_in_literal(&self) -> bool {
        self.tokens.last().map_or(false, Token::is_literal)
    }

    /// A copy restricted to `range`; the root is kept only when the range
    /// starts at the beginning.
    pub fn slice(&self, range: std::ops::Range<usize>) -> Path {
        let end = range.end.min(self.tokens.len());
        let start = range.start.min(end);
        Path {
            root: if start == 0 { self.root.clone() } else { None },
            tokens: self.tokens[start..end].to_vec(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(root) = &self.root {
            write!(f, "{}", root)?;
        }
        for (idx, token) in self.tokens.iter().enumerate() {
            if idx > 0 || self.root.is_some() {
                write!(f, "{}", token.separator.unwrap_or(Separator::Step).as_str())?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}

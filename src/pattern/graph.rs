use std::{collections::BTreeSet, fmt};

const INDENT: &str = "   ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Term {
    /// `?name`
    Variable(String),
    /// `<iri>`
    Iri(String),
    /// A prefixed name or the `a` keyword, written as is.
    Name(String),
}

impl Term {
    pub fn var(name: &str) -> Self {
        Term::Variable(String::from(name))
    }

    pub fn name(name: &str) -> Self {
        Term::Name(String::from(name))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(v) => write!(f, "?{}", v),
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::Name(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

/// `BIND (expression AS ?variable)`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bind {
    pub expression: Term,
    pub variable: Term,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphPattern {
    pub optional: bool,
    pub triples: Vec<Triple>,
    pub nested: Vec<GraphPattern>,
    pub binds: Vec<Bind>,
}

impl GraphPattern {
    pub fn new(optional: bool) -> Self {
        Self {
            optional,
            ..Default::default()
        }
    }

    pub fn add_triple(&mut self, triple: Triple) {
        self.triples.push(triple);
    }

    pub fn add_bind(&mut self, expression: Term, variable: Term) {
        self.binds.push(Bind {
            expression,
            variable,
        });
    }

    pub fn add_nested(&mut self, pattern: GraphPattern) {
        self.nested.push(pattern);
    }

    /// Every variable mentioned, nested patterns included.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        let terms = self
            .triples
            .iter()
            .flat_map(|t| vec![&t.subject, &t.predicate, &t.object])
            .chain(self.binds.iter().flat_map(|b| vec![&b.expression, &b.variable]));
        for term in terms {
            if let Term::Variable(v) = term {
                out.insert(v.clone());
            }
        }
        for nested in &self.nested {
            nested.collect_variables(out);
        }
    }

    /// Triples of this pattern and all nested ones.
    pub fn triple_count(&self) -> usize {
        self.triples.len() + self.nested.iter().map(GraphPattern::triple_count).sum::<usize>()
    }

    /// Renders the pattern at `depth` levels of indentation.
    pub fn render(&self, depth: usize) -> String {
        let outer = INDENT.repeat(depth);
        let inner = INDENT.repeat(depth + 1);
        let mut text = format!(
            "{}{}\n",
            outer,
            if self.optional { "OPTIONAL {" } else { "{" }
        );
        for triple in &self.triples {
            text.push_str(&format!(
                "{}{} {} {} .\n",
                inner, triple.subject, triple.predicate, triple.object
            ));
        }
        for nested in &self.nested {
            text.push_str(&nested.render(depth + 1));
        }
        for bind in &self.binds {
            text.push_str(&format!(
                "{}BIND ({} AS {})\n",
                inner, bind.expression, bind.variable
            ));
        }
        text.push_str(&format!("{}}}\n", outer));
        text
    }

    /// The rendered body without its enclosing braces.
    pub fn body(&self) -> String {
        let text = self.render(0);
        let text = text.trim_matches('\n');
        let text = text.strip_prefix("OPTIONAL ").unwrap_or(text);
        let text = text.strip_prefix('{').unwrap_or(text);
        let text = text.strip_suffix('}').unwrap_or(text);
        String::from(text.trim_matches(|c| c == '\n' || c == ' '))
    }
}

impl fmt::Display for GraphPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(0))
    }
}

use super::{
    ast::{Path, Separator, Token},
    checker::check,
    error::{PathError, Result},
};
use pest::{iterators::Pair, Parser};
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "front_end/grammar.pest"]
struct PathParser;

/// Tokens in written order, before the relation/entity layout is checked.
#[derive(Debug, PartialEq)]
pub struct Segments {
    /// Whether the path opened with a separator.
    pub leading: bool,
    pub tokens: Vec<Token>,
}

/// Parses and checks an ontological path.
pub fn parse(input: &str) -> Result<Path> {
    check(parse_segments(input)?)
}

/// Splits a path on `-->` and `->` without checking the layout.
pub fn parse_segments(input: &str) -> Result<Segments> {
    let input = input.trim();
    if input.is_empty() {
        return Err(PathError::Empty);
    }
    let path = PathParser::parse(Rule::path, input)
        .map_err(|e| PathError::Syntax(e.to_string()))?
        .next()
        .ok_or(PathError::Empty)?;
    let mut segments = Segments {
        leading: false,
        tokens: vec![],
    };
    let mut separator = None;
    for pair in path.into_inner() {
        match pair.as_rule() {
            Rule::hop | Rule::step => {
                let current = if pair.as_rule() == Rule::hop {
                    Separator::Hop
                } else {
                    Separator::Step
                };
                if segments.tokens.is_empty() {
                    segments.leading = true;
                }
                separator = Some(current);
            }
            Rule::token => {
                segments
                    .tokens
                    .push(parse_token(pair).with_separator(separator.take()));
            }
            Rule::EOI => {}
            _ => unreachable!(),
        }
    }
    Ok(segments)
}

fn parse_token(pair: Pair<Rule>) -> Token {
    let mut inner = pair.into_inner();
    let name = inner.next().map_or("", |p| p.as_str());
    let discriminator = inner.next().map(|p| p.as_str());
    Token::new(name, discriminator)
}

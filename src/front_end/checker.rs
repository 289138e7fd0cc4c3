use super::{
    ast::{Path, Token},
    error::{PathError, Result},
    parser::Segments,
};

/// `E<digits>_` class names, or any token carrying a group discriminator.
fn is_entity_class(token: &Token) -> bool {
    if token.discriminator().is_some() {
        return true;
    }
    let digits = token.name().strip_prefix('E').map(|rest| {
        rest.chars().take_while(char::is_ascii_digit).count()
    });
    match digits {
        Some(n) if n > 0 => token.name()[1 + n..].starts_with('_'),
        _ => false,
    }
}

fn dangling(tokens: &[Token]) -> PathError {
    PathError::DanglingRelation(tokens.last().map(Token::raw).unwrap_or_default())
}

fn check_root(segments: Segments) -> Result<(Option<Token>, Vec<Token>)> {
    let Segments { leading, mut tokens } = segments;
    if tokens.len() % 2 == 0 {
        // A root class followed by relation/entity pairs with the last
        // entity missing.
        if !leading && tokens.first().map_or(false, is_entity_class) {
            return Err(dangling(&tokens));
        }
        return Ok((None, tokens));
    }
    if leading {
        Err(dangling(&tokens))
    } else {
        let root = tokens.remove(0);
        Ok((Some(root), tokens))
    }
}

fn check_token(idx: usize, token: &Token, last: bool) -> Result<()> {
    if token.name().is_empty() {
        return Err(PathError::EmptyToken(idx));
    }
    if idx % 2 == 0 {
        if token.discriminator().is_some() {
            return Err(PathError::DiscriminatorOnRelation(token.raw()));
        }
        if token.is_literal() {
            return Err(PathError::LiteralAtRelation(idx));
        }
    } else if token.is_literal() && !last {
        return Err(PathError::LiteralNotTerminal(idx));
    }
    Ok(())
}

/// Lays the segments out as relation/entity pairs.
///
/// An odd token count without a leading separator names the root entity
/// class, which is set aside. With a leading separator it leaves a
/// relation without an object, as does an even count whose first token is
/// an entity class.
pub fn check(segments: Segments) -> Result<Path> {
    let (root, tokens) = check_root(segments)?;
    if let Some(root) = &root {
        if root.name().is_empty() {
            return Err(PathError::EmptyToken(0));
        }
    }
    if tokens.is_empty() {
        return Err(PathError::Empty);
    }
    let len = tokens.len();
    for (idx, token) in tokens.iter().enumerate() {
        check_token(idx, token, idx + 1 == len)?;
    }
    Ok(Path::new(root, tokens))
}

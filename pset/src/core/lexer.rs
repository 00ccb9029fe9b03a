//! Tokens of the configuration text form.
//!
//! Keywords (`process`, `untracked`, type names, roles) are plain
//! identifiers here; the parser gives them meaning by position.

use logos::Logos;

use crate::core::error::ConfigError;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"([ \t\r\n\f]+|#[^\n]*)")]
pub enum Token<'src> {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Ident(&'src str),

    #[regex(r"-?[0-9]+", |lex| lex.slice())]
    Integer(&'src str),

    #[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"-?[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice())]
    Float(&'src str),

    /// Quoted string, quotes stripped, escapes still raw.
    #[regex(r#""([^"\\]|\\.)*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    Str(&'src str),

    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token("=")]
    Equals,
    #[token(",")]
    Comma,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("&")]
    Ampersand,
}

/// A token with the byte offset it starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spanned<'src> {
    pub token: Token<'src>,
    pub offset: usize,
}

/// Tokenize `source`, failing on the first unrecognized character.
pub fn lex(source: &str) -> Result<Vec<Spanned<'_>>, ConfigError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => tokens.push(Spanned {
                token,
                offset: span.start,
            }),
            Err(()) => {
                return Err(parse_error(
                    source,
                    span.start,
                    format!("unexpected character(s) {:?}", &source[span]),
                ));
            }
        }
    }
    Ok(tokens)
}

/// Build a `Parse` error with 1-based line/column for byte `offset`.
pub fn parse_error(source: &str, offset: usize, message: impl Into<String>) -> ConfigError {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
        + 1;
    ConfigError::Parse {
        line,
        column,
        message: message.into(),
    }
}

/// Resolve backslash escapes inside a string token.
pub fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => return Err(format!("unknown escape '\\{other}'")),
            None => return Err("dangling escape".to_string()),
        }
    }
    Ok(out)
}

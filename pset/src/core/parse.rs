//! Recursive-descent parser for the text form produced by
//! [`crate::core::render`].
//!
//! Syntax problems come back as [`ConfigError::Parse`] with a line and
//! column; structural problems (duplicate names, role mismatches) keep their
//! own variants so callers can match on them.

use crate::core::error::ConfigError;
use crate::core::input_tag::InputTag;
use crate::core::lexer::{Spanned, Token, lex, parse_error, unescape};
use crate::core::module::{ModuleDescriptor, ModuleRole, PathDef, PathKind};
use crate::core::path::{element, join};
use crate::core::process::Process;
use crate::core::pset::ParameterSet;
use crate::core::value::{Entry, Kind, Value};

/// Parse a bare list of entries (the output of [`crate::core::render::resolve`]).
pub fn parse_pset(source: &str) -> Result<ParameterSet, ConfigError> {
    let mut parser = Parser::new(source)?;
    parser.entries("", Until::End)
}

/// Parse a process file. Without a `process NAME` header the result is a
/// fragment.
pub fn parse_process(source: &str) -> Result<Process, ConfigError> {
    let mut parser = Parser::new(source)?;
    let mut process = Process::fragment();
    while !parser.at_end() {
        parser.statement(&mut process)?;
    }
    Ok(process)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Until {
    End,
    BraceClose,
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Spanned<'src>>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str) -> Result<Self, ConfigError> {
        Ok(Self {
            source,
            tokens: lex(source)?,
            pos: 0,
        })
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).map(|spanned| spanned.token)
    }

    fn advance(&mut self) -> Option<Token<'src>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Byte offset of the next token (end of input once exhausted).
    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |spanned| spanned.offset)
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> ConfigError {
        parse_error(self.source, offset, message)
    }

    fn unexpected(&self, expected: &str) -> ConfigError {
        let found = match self.peek() {
            Some(token) => format!("{token:?}"),
            None => "end of input".to_string(),
        };
        self.error_at(self.offset(), format!("expected {expected}, found {found}"))
    }

    fn expect(&mut self, expected: Token<'_>, what: &str) -> Result<(), ConfigError> {
        if self.peek() == Some(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn ident(&mut self, what: &str) -> Result<&'src str, ConfigError> {
        match self.peek() {
            Some(Token::Ident(word)) => {
                self.advance();
                Ok(word)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn statement(&mut self, process: &mut Process) -> Result<(), ConfigError> {
        let start = self.offset();
        let keyword = self.ident("a statement")?;

        if keyword == "process" {
            let name = self.ident("a process name")?;
            if !process.is_fragment() {
                return Err(self.error_at(start, "process name declared twice"));
            }
            return process
                .set_name(name)
                .map_err(|err| self.error_at(start, err.to_string()));
        }

        if keyword == "pset" {
            let name = self.ident("a parameter set name")?;
            self.expect(Token::Equals, "'='")?;
            self.expect(Token::BraceOpen, "'{'")?;
            let set = self.entries(name, Until::BraceClose)?;
            return process.add_pset(name, set);
        }

        if keyword == "source" {
            self.expect(Token::Equals, "'='")?;
            let type_name = self.ident("a module type")?;
            self.expect(Token::BraceOpen, "'{'")?;
            let params = self.entries(keyword, Until::BraceClose)?;
            return process.set_source(ModuleDescriptor::source(type_name, params));
        }

        if let Some(role) = ModuleRole::from_keyword(keyword) {
            let label = self.ident("a module label")?;
            self.expect(Token::Equals, "'='")?;
            let type_name = self.ident("a module type")?;
            self.expect(Token::BraceOpen, "'{'")?;
            let params = self.entries(label, Until::BraceClose)?;
            return process.add_module(label, ModuleDescriptor::new(role, type_name, params));
        }

        if let Some(kind) = PathKind::from_keyword(keyword) {
            let name = self.ident("a path name")?;
            self.expect(Token::Equals, "'='")?;
            self.expect(Token::BraceOpen, "'{'")?;
            let entries = self.path_entries()?;
            return process.add_path(PathDef::new(kind, name, entries));
        }

        Err(self.error_at(start, format!("unknown statement '{keyword}'")))
    }

    /// Module labels joined by any of `, * + &`.
    fn path_entries(&mut self) -> Result<Vec<&'src str>, ConfigError> {
        let mut labels = Vec::new();
        loop {
            if self.peek() == Some(Token::BraceClose) {
                self.advance();
                return Ok(labels);
            }
            labels.push(self.ident("a module label")?);
            match self.peek() {
                Some(Token::Comma | Token::Star | Token::Plus | Token::Ampersand) => {
                    self.advance();
                }
                Some(Token::BraceClose) => {}
                _ => return Err(self.unexpected("a separator or '}'")),
            }
        }
    }

    /// Entries of a set whose path is `prefix`, up to the end of input or the
    /// closing brace (which is consumed).
    fn entries(&mut self, prefix: &str, until: Until) -> Result<ParameterSet, ConfigError> {
        let mut set = ParameterSet::new();
        loop {
            match (until, self.peek()) {
                (Until::End, None) => return Ok(set),
                (Until::BraceClose, Some(Token::BraceClose)) => {
                    self.advance();
                    return Ok(set);
                }
                (Until::BraceClose, None) => return Err(self.unexpected("'}'")),
                _ => self.entry(&mut set, prefix)?,
            }
        }
    }

    /// `[untracked] <type> <name> = <value>`
    fn entry(&mut self, set: &mut ParameterSet, prefix: &str) -> Result<(), ConfigError> {
        let start = self.offset();
        let mut tracked = true;
        let mut keyword = self.ident("a parameter type")?;
        if keyword == "untracked" {
            tracked = false;
            keyword = self.ident("a parameter type")?;
        }
        let kind = Kind::from_keyword(keyword)
            .ok_or_else(|| self.error_at(start, format!("unknown parameter type '{keyword}'")))?;
        let name = self.ident("a parameter name")?;
        self.expect(Token::Equals, "'='")?;

        let value = self.value(kind, &join(prefix, name))?;
        set.insert(name, Entry { tracked, value })
            .map_err(|err| err.under(prefix))
    }

    fn value(&mut self, kind: Kind, path: &str) -> Result<Value, ConfigError> {
        match kind {
            Kind::PSet => {
                self.expect(Token::BraceOpen, "'{'")?;
                Ok(Value::PSet(self.entries(path, Until::BraceClose)?))
            }
            Kind::VPSet => {
                self.expect(Token::BraceOpen, "'{'")?;
                let sets = self.list(|parser, idx| {
                    parser.expect(Token::BraceOpen, "'{'")?;
                    parser.entries(&element(path, idx), Until::BraceClose)
                })?;
                Ok(Value::VPSet(sets))
            }
            Kind::VString => {
                self.expect(Token::BraceOpen, "'{'")?;
                let values = self.list(|parser, _| parser.string())?;
                Ok(Value::VString(values))
            }
            Kind::String => Ok(Value::String(self.string()?)),
            Kind::InputTag => {
                let start = self.offset();
                let encoded = self.string()?;
                InputTag::parse(&encoded)
                    .map(Value::InputTag)
                    .map_err(|err| self.error_at(start, err.to_string()))
            }
            Kind::Bool | Kind::Int32 | Kind::UInt32 | Kind::Double => {
                let start = self.offset();
                let literal = self.scalar(kind)?;
                Value::leaf(kind, &[literal.as_str()])
                    .map_err(|err| self.error_at(start, err.to_string()))
            }
        }
    }

    /// Comma-separated items up to `}` (trailing comma allowed). The opening
    /// brace has already been consumed.
    fn list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self, usize) -> Result<T, ConfigError>,
    ) -> Result<Vec<T>, ConfigError> {
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(Token::BraceClose) {
                self.advance();
                return Ok(items);
            }
            items.push(item(self, items.len())?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::BraceClose) => {}
                _ => return Err(self.unexpected("',' or '}'")),
            }
        }
    }

    fn string(&mut self) -> Result<String, ConfigError> {
        let start = self.offset();
        match self.peek() {
            Some(Token::Str(raw)) => {
                self.advance();
                unescape(raw).map_err(|msg| self.error_at(start, msg))
            }
            _ => Err(self.unexpected("a quoted string")),
        }
    }

    /// Unquoted literal text for a numeric or boolean entry.
    fn scalar(&mut self, kind: Kind) -> Result<String, ConfigError> {
        match self.peek() {
            Some(Token::Integer(text) | Token::Float(text) | Token::Ident(text)) => {
                self.advance();
                Ok(text.to_string())
            }
            Some(Token::Minus) if kind == Kind::Double => {
                self.advance();
                match self.ident("inf")? {
                    "inf" => Ok("-inf".to_string()),
                    other => Err(self.error_at(self.offset(), format!("unexpected '-{other}'"))),
                }
            }
            _ => Err(self.unexpected(&format!("a {kind} value"))),
        }
    }
}

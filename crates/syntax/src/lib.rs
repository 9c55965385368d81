//! Lexer, parser and AST for the gcx dialect: G-code statements whose
//! fields may embed `{ ... }` expressions evaluated against a host
//! environment.
//!
//! The three pieces are deliberately kept in one crate: the lexer feeds
//! the parser one token at a time (see [`lexer::Lexer::feed`]), and the
//! parser's grammar is defined directly in terms of [`lexer::Token`].

pub mod ast;
pub mod lexer;
pub mod parser;

use beef::lean::Cow;
use span::Span;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A lexical or syntactic error, carrying the source location it was
/// detected at. Both the lexer and the parser report errors through this
/// type; callers distinguish the two only by `kind` if they care to.
#[derive(Clone, Debug)]
pub struct Error {
  pub message: Cow<'static, str>,
  pub span: Span,
  pub kind: ErrorKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
  Lexical,
  Syntactic,
}

impl Error {
  pub fn lexical(message: impl Into<Cow<'static, str>>, span: impl Into<Span>) -> Self {
    Error {
      message: message.into(),
      span: span.into(),
      kind: ErrorKind::Lexical,
    }
  }

  pub fn syntactic(message: impl Into<Cow<'static, str>>, span: impl Into<Span>) -> Self {
    Error {
      message: message.into(),
      span: span.into(),
      kind: ErrorKind::Syntactic,
    }
  }
}

impl Error {
  /// Render this error as a one-shot snippet report against `source`.
  pub fn report<'a>(&self, source: impl Into<diag::Source<'a>>) -> String {
    diag::Report::error()
      .source(source)
      .message(format!("{self}"))
      .span(self.span)
      .build()
      .emit_to_string()
      .unwrap()
  }

  pub fn report_to<'a, W: ?Sized + std::fmt::Write>(&self, source: impl Into<diag::Source<'a>>, w: &mut W) {
    diag::Report::error()
      .source(source)
      .message(format!("{self}"))
      .span(self.span)
      .build()
      .emit(w)
      .unwrap();
  }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.message)
  }
}

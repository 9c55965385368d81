//! Error types for the evaluator and the pipeline's public surface.
//!
//! `syntax::Error` already covers lexical/syntactic failures; this
//! module adds the evaluation-time kind and a top-level enum that
//! unifies all three for callers who want one type to match on.

use span::Span;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EvalError {
  pub message: String,
  pub span: Span,
}

impl EvalError {
  pub fn name_resolution(key: impl Into<String>, span: Span) -> Self {
    EvalError {
      message: format!("unknown parameter `{}`", key.into()),
      span,
    }
  }

  pub fn bad_coercion(message: impl Into<String>, span: Span) -> Self {
    EvalError {
      message: message.into(),
      span,
    }
  }

  pub fn division_by_zero(span: Span) -> Self {
    EvalError {
      message: "division by zero".to_string(),
      span,
    }
  }

  pub fn unknown_function(name: impl Into<String>, span: Span) -> Self {
    EvalError {
      message: format!("unknown function `{}`", name.into()),
      span,
    }
  }

  pub fn host_rejected(span: Span) -> Self {
    EvalError {
      message: "host rejected statement".to_string(),
      span,
    }
  }
}

/// Unifies the three statement-scoped error kinds this pipeline can
/// produce. Fatal errors are reported straight to [`crate::host::Host::fatal`]
/// and never constructed as a value, so they have no variant here.
#[derive(Debug, Clone, Error)]
pub enum Error {
  #[error("{0}")]
  Syntax(#[from] syntax::Error),
  #[error("{0}")]
  Eval(#[from] EvalError),
}

impl Error {
  pub fn message(&self) -> String {
    match self {
      Error::Syntax(e) => e.message.to_string(),
      Error::Eval(e) => e.message.clone(),
    }
  }

  pub fn span(&self) -> Span {
    match self {
      Error::Syntax(e) => e.span,
      Error::Eval(e) => e.span,
    }
  }

  /// Render this error as a one-shot snippet report against `source`,
  /// the same way `syntax::Error` does — evaluation errors get the
  /// identical treatment since they carry a span into the same source
  /// text.
  pub fn report<'a>(&self, source: impl Into<diag::Source<'a>>) -> String {
    diag::Report::error()
      .source(source)
      .message(self.message())
      .span(self.span())
      .build()
      .emit_to_string()
      .unwrap()
  }
}

//! Operator-precedence parser over the token stream produced by
//! [`crate::lexer::Lexer`].
//!
//! The lexer is push-driven: it calls [`lexer::Sink::token`] once per
//! lexeme as it scans. Rather than thread a suspended recursive-descent
//! parse across those calls (which Rust's call stack does not make
//! pleasant), the [`Parser`] buffers the tokens belonging to the
//! statement currently being scanned and runs an ordinary top-down,
//! precedence-climbing parse over that buffer the moment the lexer
//! reports [`lexer::Token::EndOfStatement`]. From the outside this is
//! indistinguishable from a token-at-a-time parser: a statement is
//! only ever available once its lexeme is complete anyway, so nothing
//! is lost by resolving it in one shot instead of one token at a time.

use crate::ast::{BinaryOp, Expr, Statement, UnaryOp};
use crate::lexer::{Keyword, Token};
use crate::{Error, Result};
use span::Span;

/// Receives completed statements and errors as the parser resolves
/// them. The queue implements this to drain results directly off the
/// parser without an intermediate buffer.
pub trait StatementSink {
  fn statement(&mut self, statement: Statement);
  fn error(&mut self, error: Error);
}

#[derive(Debug, Clone)]
struct Buffered {
  token: Token,
  span: Span,
}

/// Push-driven front end: implements [`crate::lexer::Sink`] by
/// buffering one statement's worth of tokens, then parses and drains
/// that buffer into a [`StatementSink`] at each `EndOfStatement`.
pub struct Parser<S> {
  sink: S,
  tokens: Vec<Buffered>,
  /// Set when the lexer has already reported an error for the
  /// statement currently being scanned; the next `EndOfStatement`
  /// (or `Token::Bridge` etc. arriving before it) is ignored rather
  /// than double-reported.
  lexer_error: Option<(String, Span)>,
  suppressed: bool,
}

impl<S: StatementSink> Parser<S> {
  pub fn new(sink: S) -> Self {
    Parser {
      sink,
      tokens: Vec::new(),
      lexer_error: None,
      suppressed: false,
    }
  }

  pub fn into_inner(self) -> S {
    self.sink
  }

  pub fn sink_mut(&mut self) -> &mut S {
    &mut self.sink
  }

  fn resolve_statement(&mut self, end_span: Span) {
    if self.suppressed {
      self.suppressed = false;
      self.tokens.clear();
      return;
    }
    if self.tokens.is_empty() {
      // Blank or comment-only line: no queue entry.
      return;
    }
    let tokens = std::mem::take(&mut self.tokens);
    let start = tokens.first().map(|t| t.span.start).unwrap_or(end_span.start);
    let span = Span { start, end: end_span.start };
    let mut cursor = Cursor { tokens: &tokens, pos: 0 };
    match parse_fields(&mut cursor) {
      Ok(fields) => {
        let mut stmt = Statement::new(span);
        for f in fields {
          stmt.push_field(f);
        }
        self.sink.statement(stmt);
      }
      Err(err) => self.sink.error(err),
    }
  }
}

impl<S: StatementSink> crate::lexer::Sink for Parser<S> {
  fn token(&mut self, token: Token, span: Span) -> bool {
    if matches!(token, Token::EndOfStatement) {
      self.resolve_statement(span);
      return true;
    }
    if self.suppressed {
      return true;
    }
    self.tokens.push(Buffered { token, span });
    true
  }

  fn error(&mut self, message: String, span: Span) {
    self.suppressed = true;
    self.tokens.clear();
    self.sink.error(Error::lexical(message, span));
  }
}

struct Cursor<'a> {
  tokens: &'a [Buffered],
  pos: usize,
}

impl<'a> Cursor<'a> {
  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos).map(|b| &b.token)
  }

  fn peek_span(&self) -> Span {
    self.tokens.get(self.pos).map(|b| b.span).unwrap_or_else(|| {
      self.tokens.last().map(|b| Span { start: b.span.end, end: b.span.end }).unwrap_or_default()
    })
  }

  fn bump(&mut self) -> Option<Buffered> {
    let tok = self.tokens.get(self.pos).cloned();
    if tok.is_some() {
      self.pos += 1;
    }
    tok
  }

  fn at_end(&self) -> bool {
    self.pos >= self.tokens.len()
  }

  fn is_keyword(&self, kw: Keyword) -> bool {
    matches!(self.peek(), Some(Token::Keyword(k)) if *k == kw)
  }

  fn is_bridge(&self) -> bool {
    matches!(self.peek(), Some(Token::Bridge))
  }

  fn expect_keyword(&mut self, kw: Keyword, what: &str) -> Result<Span> {
    if self.is_keyword(kw) {
      Ok(self.bump().unwrap().span)
    } else {
      Err(Error::syntactic(format!("expected {what}"), self.peek_span()))
    }
  }
}

fn parse_fields(cursor: &mut Cursor) -> Result<Vec<Expr>> {
  let mut fields = Vec::new();
  while !cursor.at_end() {
    fields.push(parse_field(cursor)?);
  }
  Ok(fields)
}

fn parse_field(cursor: &mut Cursor) -> Result<Expr> {
  let mut part = parse_field_part(cursor)?;
  while cursor.is_bridge() {
    cursor.bump();
    let next = parse_field_part(cursor)?;
    part = Expr::bridge(part, next);
  }
  Ok(part)
}

fn parse_field_part(cursor: &mut Cursor) -> Result<Expr> {
  match cursor.peek() {
    Some(Token::Str(_)) => {
      let b = cursor.bump().unwrap();
      let Token::Str(s) = b.token else { unreachable!() };
      Ok(Expr::str(b.span, s))
    }
    Some(Token::Keyword(Keyword::LBrace)) => {
      cursor.bump();
      let e = parse_expr(cursor, 1)?;
      cursor.expect_keyword(Keyword::RBrace, "`}`")?;
      Ok(e)
    }
    _ => Err(Error::syntactic("expected a field", cursor.peek_span())),
  }
}

fn binop_prec(op: BinaryOp) -> u8 {
  use BinaryOp::*;
  match op {
    Or => 1,
    And => 2,
    Eq => 3,
    Concat => 4,
    Add | Sub => 5,
    Mul | Div | Mod => 6,
    Lt | Gt | Le | Ge => 7,
    Pow => 9,
  }
}

fn peek_binop(cursor: &Cursor) -> Option<BinaryOp> {
  match cursor.peek() {
    Some(Token::Keyword(kw)) => match kw {
      Keyword::Or => Some(BinaryOp::Or),
      Keyword::And => Some(BinaryOp::And),
      Keyword::Eq => Some(BinaryOp::Eq),
      Keyword::Concat => Some(BinaryOp::Concat),
      Keyword::Plus => Some(BinaryOp::Add),
      Keyword::Minus => Some(BinaryOp::Sub),
      Keyword::Star => Some(BinaryOp::Mul),
      Keyword::Slash => Some(BinaryOp::Div),
      Keyword::Percent => Some(BinaryOp::Mod),
      Keyword::Lt => Some(BinaryOp::Lt),
      Keyword::Gt => Some(BinaryOp::Gt),
      Keyword::Le => Some(BinaryOp::Le),
      Keyword::Ge => Some(BinaryOp::Ge),
      Keyword::Pow => Some(BinaryOp::Pow),
      _ => None,
    },
    _ => None,
  }
}

/// Precedence-climbing entry point. `min_prec` is the lowest binary
/// precedence this call is allowed to consume; the ternary `if/else`
/// form is treated as occupying precedence level 8 between relational
/// operators and `**`.
fn parse_expr(cursor: &mut Cursor, min_prec: u8) -> Result<Expr> {
  maybe_grow(|| parse_expr_inner(cursor, min_prec))
}

fn parse_expr_inner(cursor: &mut Cursor, min_prec: u8) -> Result<Expr> {
  let mut lhs = parse_unary(cursor)?;
  loop {
    if cursor.is_keyword(Keyword::If) && 8 >= min_prec {
      cursor.bump();
      let cond = parse_expr(cursor, 9)?;
      cursor.expect_keyword(Keyword::Else, "`else`")?;
      let otherwise = parse_expr(cursor, 8)?;
      let span = lhs.span.join(otherwise.span);
      lhs = Expr::ternary(span, cond, lhs, otherwise);
      continue;
    }
    let Some(op) = peek_binop(cursor) else { break };
    let prec = binop_prec(op);
    if prec < min_prec {
      break;
    }
    cursor.bump();
    let rhs = parse_expr(cursor, prec + 1)?;
    let span = lhs.span.join(rhs.span);
    lhs = Expr::binary(span, op, lhs, rhs);
  }
  Ok(lhs)
}

fn parse_unary(cursor: &mut Cursor) -> Result<Expr> {
  maybe_grow(|| parse_unary_inner(cursor))
}

fn parse_unary_inner(cursor: &mut Cursor) -> Result<Expr> {
  let op = match cursor.peek() {
    Some(Token::Keyword(Keyword::Bang)) => Some(UnaryOp::Not),
    Some(Token::Keyword(Keyword::Minus)) => Some(UnaryOp::Neg),
    Some(Token::Keyword(Keyword::Plus)) => Some(UnaryOp::Pos),
    _ => None,
  };
  match op {
    Some(op) => {
      let start = cursor.bump().unwrap().span;
      let operand = parse_unary(cursor)?;
      let span = start.join(operand.span);
      Ok(Expr::unary(span, op, operand))
    }
    None => parse_postfix(cursor),
  }
}

fn parse_postfix(cursor: &mut Cursor) -> Result<Expr> {
  let mut expr = parse_primary(cursor)?;
  loop {
    if cursor.is_keyword(Keyword::Dot) {
      cursor.bump();
      let (name, name_span) = match cursor.bump() {
        Some(Buffered { token: Token::Identifier(s), span }) => (s, span),
        other => {
          return Err(Error::syntactic(
            "expected a field name after `.`",
            other.map(|b| b.span).unwrap_or_else(|| cursor.peek_span()),
          ))
        }
      };
      let key = Expr::str(name_span, name);
      let span = expr.span.join(name_span);
      expr = Expr::member(span, expr, key);
    } else if cursor.is_keyword(Keyword::LBracket) {
      cursor.bump();
      let key = parse_expr(cursor, 1)?;
      let end = cursor.expect_keyword(Keyword::RBracket, "`]`")?;
      let span = expr.span.join(end);
      expr = Expr::member(span, expr, key);
    } else {
      break;
    }
  }
  Ok(expr)
}

fn parse_primary(cursor: &mut Cursor) -> Result<Expr> {
  let Some(buffered) = cursor.bump() else {
    return Err(Error::syntactic("expected an expression", cursor.peek_span()));
  };
  let Buffered { token, span } = buffered;
  match token {
    Token::Int(v) => Ok(Expr::int(span, v)),
    Token::Float(v) => Ok(Expr::float(span, v)),
    Token::Str(v) => Ok(Expr::str(span, v)),
    Token::Keyword(Keyword::True) => Ok(Expr::bool(span, true)),
    Token::Keyword(Keyword::False) => Ok(Expr::bool(span, false)),
    Token::Keyword(Keyword::Inf) => Ok(Expr::float(span, f64::INFINITY)),
    Token::Keyword(Keyword::Nan) => Ok(Expr::float(span, f64::NAN)),
    Token::Keyword(Keyword::LParen) => {
      let inner = parse_expr(cursor, 1)?;
      let end = cursor.expect_keyword(Keyword::RParen, "`)`")?;
      Ok(Expr::new(span.join(end), inner.kind))
    }
    Token::Identifier(name) => {
      if cursor.is_keyword(Keyword::LParen) {
        cursor.bump();
        let mut args = Vec::new();
        if !cursor.is_keyword(Keyword::RParen) {
          loop {
            args.push(parse_expr(cursor, 1)?);
            if cursor.is_keyword(Keyword::Comma) {
              cursor.bump();
              continue;
            }
            break;
          }
        }
        let end = cursor.expect_keyword(Keyword::RParen, "`)`")?;
        Ok(Expr::call(span.join(end), name, args))
      } else {
        Ok(Expr::param(span, name))
      }
    }
    _ => Err(Error::syntactic("expected an expression", span)),
  }
}

/// Mirrors the recursion-depth guard the rest of this workspace uses for
/// deeply nested input: bail out with a syntax error instead of
/// overflowing the stack on pathological `(((((...)))))` expressions.
#[cfg(feature = "check-recursion-limit")]
fn maybe_grow<R>(f: impl FnOnce() -> Result<R>) -> Result<R> {
  const RED_ZONE: usize = 64 * 1024;
  const STACK_PER_RECURSION: usize = 1024 * 1024;
  match stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || Some(f())) {
    Some(r) => r,
    None => unreachable!(),
  }
}

#[cfg(not(feature = "check-recursion-limit"))]
fn maybe_grow<R>(f: impl FnOnce() -> Result<R>) -> Result<R> {
  f()
}

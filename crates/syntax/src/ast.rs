//! The abstract syntax tree produced by [`crate::parser`].
//!
//! Every node is owned exclusively by its parent: `Expr` children live in
//! `Box`es or `Vec`s, there is no sharing and no cycles, and dropping a
//! [`Statement`] recursively frees the whole tree for free via `Drop`. The
//! C original this dialect is modeled on manages that by hand with
//! `add_next`/`add_child`/`delete` operations on a sibling-linked node
//! graph; in Rust the ownership tree *is* that discipline, so there is no
//! separate teardown API to get wrong.

use span::Span;

/// One source line's worth of fields, after the line number and any
/// comment have been stripped. This is the node type that crosses from
/// the parser into the queue.
#[derive(Debug)]
pub struct Statement {
  pub span: Span,
  pub fields: Vec<Expr>,
}

impl Statement {
  pub fn new(span: impl Into<Span>) -> Self {
    Statement {
      span: span.into(),
      fields: Vec::new(),
    }
  }

  /// Append a field to the end of the statement. Mirrors the source's
  /// `add_child(statement, field)`.
  pub fn push_field(&mut self, field: Expr) {
    self.fields.push(field);
  }
}

/// A single field or sub-expression. `span` covers the exact source range
/// consumed to produce this node, used for evaluation-error locations.
#[derive(Debug, Clone)]
pub struct Expr {
  pub span: Span,
  pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
  Str(String),
  Int(i64),
  Float(f64),
  Bool(bool),
  /// `inf` / `nan` float keyword constants are folded into `Float` at
  /// parse time; a bare identifier used as a value is `Param`.
  Param(String),
  Unary(UnaryOp, Box<Expr>),
  Binary(BinaryOp, Box<Expr>, Box<Expr>),
  /// `then if cond else otherwise`
  Ternary {
    cond: Box<Expr>,
    then: Box<Expr>,
    otherwise: Box<Expr>,
  },
  /// `target.key` and `target[key]` both reduce to this: the former is
  /// sugar where `key` is a `Str` literal built from the identifier.
  Member { target: Box<Expr>, key: Box<Expr> },
  /// `name(args...)` — one of the four coercion builtins (`str`, `int`,
  /// `bool`, `float`). No user-defined functions exist in this dialect.
  Call { name: String, args: Vec<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Not,
  Neg,
  Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Or,
  And,
  Eq,
  /// `~`, string concatenation. Also the operator implicitly synthesized
  /// by the parser for the lexer's `Bridge` token (`X{x}`, `foo{1}bar`) —
  /// evaluation does not distinguish the two; see `REDESIGN FLAGS`.
  Concat,
  Add,
  Sub,
  Mul,
  Div,
  Mod,
  Pow,
  Lt,
  Gt,
  Le,
  Ge,
}

impl Expr {
  pub fn new(span: impl Into<Span>, kind: ExprKind) -> Self {
    Expr {
      span: span.into(),
      kind,
    }
  }

  pub fn str(span: impl Into<Span>, v: impl Into<String>) -> Self {
    Expr::new(span, ExprKind::Str(v.into()))
  }

  pub fn int(span: impl Into<Span>, v: i64) -> Self {
    Expr::new(span, ExprKind::Int(v))
  }

  pub fn float(span: impl Into<Span>, v: f64) -> Self {
    Expr::new(span, ExprKind::Float(v))
  }

  pub fn bool(span: impl Into<Span>, v: bool) -> Self {
    Expr::new(span, ExprKind::Bool(v))
  }

  pub fn param(span: impl Into<Span>, name: impl Into<String>) -> Self {
    Expr::new(span, ExprKind::Param(name.into()))
  }

  pub fn unary(span: impl Into<Span>, op: UnaryOp, operand: Expr) -> Self {
    Expr::new(span, ExprKind::Unary(op, Box::new(operand)))
  }

  pub fn binary(span: impl Into<Span>, op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
    Expr::new(span, ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)))
  }

  /// Build the synthetic `BRIDGE` concatenation between two adjacent
  /// fields. Never produced by user-written operators, only by the
  /// parser in response to the lexer's `Bridge` token.
  pub fn bridge(lhs: Expr, rhs: Expr) -> Self {
    let span = lhs.span.join(rhs.span);
    Expr::binary(span, BinaryOp::Concat, lhs, rhs)
  }

  pub fn ternary(span: impl Into<Span>, cond: Expr, then: Expr, otherwise: Expr) -> Self {
    Expr::new(
      span,
      ExprKind::Ternary {
        cond: Box::new(cond),
        then: Box::new(then),
        otherwise: Box::new(otherwise),
      },
    )
  }

  pub fn member(span: impl Into<Span>, target: Expr, key: Expr) -> Self {
    Expr::new(
      span,
      ExprKind::Member {
        target: Box::new(target),
        key: Box::new(key),
      },
    )
  }

  pub fn call(span: impl Into<Span>, name: impl Into<String>, args: Vec<Expr>) -> Self {
    Expr::new(
      span,
      ExprKind::Call {
        name: name.into(),
        args,
      },
    )
  }
}

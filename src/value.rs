//! The runtime value type the evaluator reduces expressions to.
//!
//! Five variants, matching the source's tagged union exactly: `Dict` is
//! the only one the core cannot inspect — it is an opaque token minted
//! and owned by the host, threaded back through [`crate::host::Host`]
//! on every lookup.

use crate::error::EvalError;
use crate::host::Host;
use span::Span;

/// An opaque handle into the host's environment tree. The core never
/// reads through it; it only ever passes it back to the host via
/// [`Host::lookup`] or [`Host::serialize`].
pub type DictHandle = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Str(String),
  Bool(bool),
  Int(i64),
  Float(f64),
  Dict(DictHandle),
}

/// Widening rank used to pick a common type for equality and relational
/// comparisons: `Dict < Str < Bool < Int < Float`.
fn rank(v: &Value) -> u8 {
  match v {
    Value::Dict(_) => 0,
    Value::Str(_) => 1,
    Value::Bool(_) => 2,
    Value::Int(_) => 3,
    Value::Float(_) => 4,
  }
}

impl Value {
  /// Coerce to the type with the higher widening rank of `self`/`other`,
  /// used by `=`, `<`, `<=`, `>`, `>=`.
  pub fn widen_pair(self, other: Value, host: &mut dyn Host, span: Span) -> Result<(Value, Value), EvalError> {
    let target = rank(&self).max(rank(&other));
    Ok((self.widen_to(target, host, span)?, other.widen_to(target, host, span)?))
  }

  fn widen_to(self, target: u8, host: &mut dyn Host, span: Span) -> Result<Value, EvalError> {
    if rank(&self) == target {
      return Ok(self);
    }
    match target {
      1 => Ok(Value::Str(self.to_str(host, span)?)),
      2 => Ok(Value::Bool(self.to_bool())),
      3 => Ok(Value::Int(self.to_int(span)?)),
      4 => Ok(Value::Float(self.to_float(span)?)),
      _ => Ok(self),
    }
  }

  pub fn to_str(&self, host: &mut dyn Host, span: Span) -> Result<String, EvalError> {
    Ok(match self {
      Value::Str(s) => s.clone(),
      Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
      Value::Int(i) => i.to_string(),
      Value::Float(f) => format!("{f}"),
      Value::Dict(handle) => host
        .serialize(*handle)
        .unwrap_or_else(|| "<obj>".to_string()),
    })
  }

  pub fn to_bool(&self) -> bool {
    match self {
      Value::Str(s) => !s.is_empty(),
      Value::Bool(b) => *b,
      Value::Int(i) => *i != 0,
      Value::Float(f) => *f != 0.0,
      Value::Dict(_) => true,
    }
  }

  pub fn to_int(&self, span: Span) -> Result<i64, EvalError> {
    match self {
      Value::Bool(b) => Ok(*b as i64),
      Value::Int(i) => Ok(*i),
      Value::Float(f) => Ok(*f as i64),
      Value::Str(s) => s
        .trim()
        .parse()
        .map_err(|_| EvalError::bad_coercion(format!("cannot parse `{s}` as an integer"), span)),
      Value::Dict(_) => Err(EvalError::bad_coercion("cannot coerce a dict to int", span)),
    }
  }

  pub fn to_float(&self, span: Span) -> Result<f64, EvalError> {
    match self {
      Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
      Value::Int(i) => Ok(*i as f64),
      Value::Float(f) => Ok(*f),
      Value::Str(s) => s
        .trim()
        .parse()
        .map_err(|_| EvalError::bad_coercion(format!("cannot parse `{s}` as a float"), span)),
      Value::Dict(_) => Err(EvalError::bad_coercion("cannot coerce a dict to float", span)),
    }
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Str(_) => "str",
      Value::Bool(_) => "bool",
      Value::Int(_) => "int",
      Value::Float(_) => "float",
      Value::Dict(_) => "dict",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct NoHost;
  impl Host for NoHost {
    fn lookup(&mut self, _key: &str, _parent: Option<DictHandle>) -> Option<Value> {
      None
    }
    fn serialize(&mut self, _dict: DictHandle) -> Option<String> {
      None
    }
  }

  #[test]
  fn widen_picks_higher_rank() {
    let mut host = NoHost;
    let span = Span::default();
    let (a, b) = Value::Int(1)
      .widen_pair(Value::Float(2.0), &mut host, span)
      .unwrap();
    assert_eq!(a, Value::Float(1.0));
    assert_eq!(b, Value::Float(2.0));
  }

  #[test]
  fn bool_to_str() {
    assert_eq!(Value::Bool(true).to_str(&mut NoHost, Span::default()).unwrap(), "true");
  }
}

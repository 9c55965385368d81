//! Walks a parsed statement, reducing every field's expression tree to
//! a [`Value`] and serializing it to text.
//!
//! The source resets a scratch string arena at the start of every
//! `exec` call and hands back pointers into it that stay valid until
//! the next call. In Rust, each `exec` simply builds and returns its
//! own owned `Vec<String>` — the borrow checker already gives us the
//! "valid until replaced" discipline for free, so there is no arena to
//! reset by hand. An expression tree can never be deeper than the
//! parser's own recursion guard allowed it to be, so evaluation does
//! not need a second depth check.

use crate::error::EvalError;
use crate::host::Host;
use crate::value::{DictHandle, Value};
use span::Span;
use syntax::ast::{BinaryOp, Expr, ExprKind, Statement, UnaryOp};

/// One fully flattened statement, ready for the host to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
  pub name: String,
  pub fields: Vec<String>,
}

#[derive(Default)]
pub struct Evaluator;

impl Evaluator {
  pub fn new() -> Self {
    Evaluator
  }

  pub fn exec(&mut self, statement: &Statement, host: &mut dyn Host) -> Result<Command, EvalError> {
    let mut rendered = Vec::with_capacity(statement.fields.len());
    for field in &statement.fields {
      let value = self.eval(field, host, None)?;
      rendered.push(value.to_str(host, field.span)?);
    }
    let name = rendered.remove(0);
    Ok(Command { name, fields: rendered })
  }

  fn eval(&mut self, expr: &Expr, host: &mut dyn Host, parent: Option<DictHandle>) -> Result<Value, EvalError> {
    match &expr.kind {
      ExprKind::Str(s) => Ok(Value::Str(s.clone())),
      ExprKind::Int(v) => Ok(Value::Int(*v)),
      ExprKind::Float(v) => Ok(Value::Float(*v)),
      ExprKind::Bool(v) => Ok(Value::Bool(*v)),
      ExprKind::Param(name) => self.lookup(name, parent, host, expr.span),
      ExprKind::Unary(op, operand) => {
        let v = self.eval(operand, host, None)?;
        self.eval_unary(*op, v, expr.span)
      }
      ExprKind::Binary(op, lhs, rhs) => {
        // Neither `and`/`or` short-circuits: both operands are pure
        // lookups against the host environment, so evaluating both is
        // always safe and keeps ordering effects (like M112 detection
        // further up the pipeline) independent of operand values.
        let lv = self.eval(lhs, host, None)?;
        let rv = self.eval(rhs, host, None)?;
        self.eval_binary(*op, lv, rv, host, expr.span)
      }
      ExprKind::Ternary { cond, then, otherwise } => {
        if self.eval(cond, host, None)?.to_bool() {
          self.eval(then, host, None)
        } else {
          self.eval(otherwise, host, None)
        }
      }
      ExprKind::Member { target, key } => {
        let target_val = self.eval(target, host, None)?;
        let Value::Dict(handle) = target_val else {
          return Err(EvalError::bad_coercion(
            format!("cannot index into a {}", target_val.type_name()),
            target.span,
          ));
        };
        let key_str = self.eval(key, host, None)?.to_str(host, key.span)?;
        self.lookup(&key_str, Some(handle), host, expr.span)
      }
      ExprKind::Call { name, args } => self.eval_call(name, args, host, expr.span),
    }
  }

  fn lookup(&mut self, name: &str, parent: Option<DictHandle>, host: &mut dyn Host, span: Span) -> Result<Value, EvalError> {
    host
      .lookup(name, parent)
      .ok_or_else(|| EvalError::name_resolution(name, span))
  }

  fn eval_unary(&mut self, op: UnaryOp, v: Value, span: Span) -> Result<Value, EvalError> {
    match op {
      UnaryOp::Not => Ok(Value::Bool(!v.to_bool())),
      UnaryOp::Neg => match v {
        Value::Float(f) => Ok(Value::Float(-f)),
        Value::Int(i) => Ok(i.checked_neg().map(Value::Int).unwrap_or(Value::Float(-(i as f64)))),
        other => Ok(Value::Int(-other.to_int(span)?)),
      },
      UnaryOp::Pos => match v {
        Value::Float(f) => Ok(Value::Float(f)),
        Value::Int(i) => Ok(Value::Int(i)),
        other => Ok(Value::Int(other.to_int(span)?)),
      },
    }
  }

  fn eval_binary(&mut self, op: BinaryOp, lv: Value, rv: Value, host: &mut dyn Host, span: Span) -> Result<Value, EvalError> {
    match op {
      BinaryOp::Or => Ok(Value::Bool(lv.to_bool() || rv.to_bool())),
      BinaryOp::And => Ok(Value::Bool(lv.to_bool() && rv.to_bool())),
      BinaryOp::Concat => {
        let mut s = lv.to_str(host, span)?;
        s.push_str(&rv.to_str(host, span)?);
        Ok(Value::Str(s))
      }
      BinaryOp::Eq => {
        let (a, b) = lv.widen_pair(rv, host, span)?;
        Ok(Value::Bool(values_equal(&a, &b)))
      }
      BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
        let (a, b) = lv.widen_pair(rv, host, span)?;
        let ord = compare_values(&a, &b);
        Ok(Value::Bool(match op {
          BinaryOp::Lt => ord == Some(std::cmp::Ordering::Less),
          BinaryOp::Gt => ord == Some(std::cmp::Ordering::Greater),
          BinaryOp::Le => matches!(ord, Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)),
          BinaryOp::Ge => matches!(ord, Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)),
          _ => unreachable!(),
        }))
      }
      BinaryOp::Add => numeric_op(lv, rv, span, |a, b| a.checked_add(b), |a, b| a + b),
      BinaryOp::Sub => numeric_op(lv, rv, span, |a, b| a.checked_sub(b), |a, b| a - b),
      BinaryOp::Mul => numeric_op(lv, rv, span, |a, b| a.checked_mul(b), |a, b| a * b),
      BinaryOp::Div => eval_div(lv, rv, span),
      BinaryOp::Mod => eval_mod(lv, rv, span),
      BinaryOp::Pow => eval_pow(lv, rv, span),
    }
  }

  fn eval_call(&mut self, name: &str, args: &[Expr], host: &mut dyn Host, span: Span) -> Result<Value, EvalError> {
    let Some(arg) = args.first() else {
      return Err(EvalError::bad_coercion(format!("`{name}` expects one argument"), span));
    };
    let v = self.eval(arg, host, None)?;
    match name {
      "STR" => Ok(Value::Str(v.to_str(host, span)?)),
      "INT" => Ok(Value::Int(v.to_int(span)?)),
      "BOOL" => Ok(Value::Bool(v.to_bool())),
      "FLOAT" => Ok(Value::Float(v.to_float(span)?)),
      _ => Err(EvalError::unknown_function(name, span)),
    }
  }
}

fn values_equal(a: &Value, b: &Value) -> bool {
  match (a, b) {
    (Value::Str(a), Value::Str(b)) => a == b,
    (Value::Bool(a), Value::Bool(b)) => a == b,
    (Value::Int(a), Value::Int(b)) => a == b,
    (Value::Float(a), Value::Float(b)) => a == b,
    (Value::Dict(a), Value::Dict(b)) => a == b,
    _ => false,
  }
}

fn compare_values(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
  match (a, b) {
    (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
    (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
    (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
    (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
    (Value::Dict(a), Value::Dict(b)) => Some(a.cmp(b)),
    _ => None,
  }
}

fn numeric_op(
  a: Value,
  b: Value,
  span: Span,
  checked: impl Fn(i64, i64) -> Option<i64>,
  float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
  if matches!(a, Value::Float(_)) || matches!(b, Value::Float(_)) {
    Ok(Value::Float(float_op(a.to_float(span)?, b.to_float(span)?)))
  } else {
    let (ai, bi) = (a.to_int(span)?, b.to_int(span)?);
    match checked(ai, bi) {
      Some(v) => Ok(Value::Int(v)),
      None => Ok(Value::Float(float_op(ai as f64, bi as f64))),
    }
  }
}

fn eval_div(a: Value, b: Value, span: Span) -> Result<Value, EvalError> {
  if matches!(a, Value::Float(_)) || matches!(b, Value::Float(_)) {
    Ok(Value::Float(a.to_float(span)? / b.to_float(span)?))
  } else {
    let (ai, bi) = (a.to_int(span)?, b.to_int(span)?);
    if bi == 0 {
      return Err(EvalError::division_by_zero(span));
    }
    match ai.checked_div(bi) {
      Some(v) => Ok(Value::Int(v)),
      None => Ok(Value::Float(ai as f64 / bi as f64)),
    }
  }
}

fn eval_mod(a: Value, b: Value, span: Span) -> Result<Value, EvalError> {
  let (ai, bi) = (a.to_int(span)?, b.to_int(span)?);
  if bi == 0 {
    return Err(EvalError::division_by_zero(span));
  }
  Ok(Value::Int(ai.checked_rem(bi).unwrap_or(0)))
}

fn eval_pow(a: Value, b: Value, span: Span) -> Result<Value, EvalError> {
  if matches!(a, Value::Float(_)) || matches!(b, Value::Float(_)) {
    return Ok(Value::Float(a.to_float(span)?.powf(b.to_float(span)?)));
  }
  let (ai, bi) = (a.to_int(span)?, b.to_int(span)?);
  if bi < 0 {
    return Ok(Value::Float((ai as f64).powf(bi as f64)));
  }
  match u32::try_from(bi).ok().and_then(|e| ai.checked_pow(e)) {
    Some(v) => Ok(Value::Int(v)),
    None => Ok(Value::Float((ai as f64).powf(bi as f64))),
  }
}

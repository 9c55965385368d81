//! A demo [`Host`](crate::host::Host) environment for the reference CLI
//! driver, backed by a `serde_json::Value` tree.
//!
//! The core never needs to know what a `Dict` handle actually points at
//! — it only ever threads the handle back through [`Host::lookup`] and
//! [`Host::serialize`] — so any tree-shaped structure works as the host
//! environment. JSON is a convenient one for a command-line tool: `gcx
//! run program.gcode --env vars.json` loads the file as the root
//! parameter namespace, and `{foo.bar.baz}` / `{foo["bar"]}` walk the
//! resulting object/array tree one key at a time.
//!
//! Handles are assigned lazily, on first encounter of a nested object or
//! array during evaluation, rather than by flattening the whole
//! document up front: `arena` only ever holds the sub-trees a statement
//! actually reached into.

use serde_json::Value as Json;

use crate::host::Host;
use crate::value::{DictHandle, Value};

/// Environment backed by a JSON document. The document's top level must
/// be an object; its keys are the root `Param` namespace.
pub struct JsonHost {
  root: Json,
  arena: Vec<Json>,
}

impl JsonHost {
  pub fn new(root: Json) -> Self {
    JsonHost {
      root,
      arena: Vec::new(),
    }
  }

  pub fn empty() -> Self {
    JsonHost::new(Json::Object(Default::default()))
  }

  fn intern(&mut self, node: Json) -> DictHandle {
    self.arena.push(node);
    (self.arena.len() - 1) as DictHandle
  }

  fn to_value(&mut self, node: Json) -> Value {
    match node {
      Json::Null => Value::Str(String::new()),
      Json::Bool(b) => Value::Bool(b),
      Json::Number(n) => {
        if let Some(i) = n.as_i64() {
          Value::Int(i)
        } else {
          Value::Float(n.as_f64().unwrap_or(f64::NAN))
        }
      }
      Json::String(s) => Value::Str(s),
      Json::Array(_) | Json::Object(_) => Value::Dict(self.intern(node)),
    }
  }
}

impl Host for JsonHost {
  fn lookup(&mut self, key: &str, parent: Option<DictHandle>) -> Option<Value> {
    let container = match parent {
      None => self.root.clone(),
      Some(handle) => self.arena.get(handle as usize)?.clone(),
    };
    let found = match container {
      // Expression identifiers reach here already uppercased by the
      // lexer (§4.2), so a case-sensitive `map.get` would never match a
      // document written in the document author's own casing. Fold
      // both sides instead of requiring all-uppercase JSON keys.
      Json::Object(map) => map.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v.clone()),
      Json::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i).cloned()),
      _ => None,
    }?;
    Some(self.to_value(found))
  }

  fn serialize(&mut self, dict: DictHandle) -> Option<String> {
    self.arena.get(dict as usize).map(|node| node.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn looks_up_root_param() {
    let mut host = JsonHost::new(serde_json::json!({"x": 5}));
    assert_eq!(host.lookup("x", None), Some(Value::Int(5)));
  }

  #[test]
  fn walks_nested_object() {
    let mut host = JsonHost::new(serde_json::json!({"foo": {"bar": {"baz": 5}}}));
    let Some(Value::Dict(foo)) = host.lookup("foo", None) else { panic!("expected dict") };
    let Some(Value::Dict(bar)) = host.lookup("bar", Some(foo)) else { panic!("expected dict") };
    assert_eq!(host.lookup("baz", Some(bar)), Some(Value::Int(5)));
  }

  #[test]
  fn indexes_array_by_string_digit() {
    let mut host = JsonHost::new(serde_json::json!({"xs": [10, 20, 30]}));
    let Some(Value::Dict(xs)) = host.lookup("xs", None) else { panic!("expected dict") };
    assert_eq!(host.lookup("1", Some(xs)), Some(Value::Int(20)));
  }

  #[test]
  fn lookup_is_case_insensitive_against_lowercase_document_keys() {
    // Expression identifiers reach `lookup` already uppercased by the
    // lexer (`foo` becomes `FOO`); a document written in ordinary
    // lowercase JSON must still resolve.
    let mut host = JsonHost::new(serde_json::json!({"foo": {"bar": {"baz": 5}}}));
    let Some(Value::Dict(foo)) = host.lookup("FOO", None) else { panic!("expected dict") };
    let Some(Value::Dict(bar)) = host.lookup("BAR", Some(foo)) else { panic!("expected dict") };
    assert_eq!(host.lookup("BAZ", Some(bar)), Some(Value::Int(5)));
  }

  #[test]
  fn missing_key_is_none() {
    let mut host = JsonHost::new(serde_json::json!({"x": 5}));
    assert_eq!(host.lookup("y", None), None);
  }

  #[test]
  fn serializes_nested_dict() {
    let mut host = JsonHost::new(serde_json::json!({"foo": {"bar": 1}}));
    let Some(Value::Dict(foo)) = host.lookup("foo", None) else { panic!("expected dict") };
    assert_eq!(host.serialize(foo), Some("{\"bar\":1}".to_string()));
  }
}

//! The capability set a host environment provides to a running pipeline.
//!
//! The source wires this up as a struct of C function pointers passed
//! to `executor_new`. The idiomatic equivalent is a trait object: one
//! `dyn Host` threaded through the queue and evaluator, with no global
//! state anywhere in the crate.

use crate::value::{DictHandle, Value};

/// Host-supplied environment lookups, rendering, and pipeline
/// notifications.
///
/// Only `lookup` is required to do anything useful for a pipeline to be
/// minimally functional; the rest have sensible default no-ops so a
/// host that doesn't care about dict serialization or fatal-error
/// reporting doesn't have to implement them.
pub trait Host {
  /// Resolve `key` against `parent` (`None` for a root parameter
  /// lookup, `Some(handle)` for `.`/`[]` access on a dict). Returning
  /// `None` is a name-resolution failure and becomes an evaluation
  /// error naming `key`.
  fn lookup(&mut self, key: &str, parent: Option<DictHandle>) -> Option<Value>;

  /// Render a dict handle to its string form. `None` falls back to the
  /// literal `"<obj>"`.
  fn serialize(&mut self, dict: DictHandle) -> Option<String> {
    let _ = dict;
    None
  }

  /// One statement has been fully evaluated and flattened. `fields[0]`
  /// is the command name; the rest are the remaining fields, all
  /// already serialized to text. Returning `false` rejects the
  /// statement: [`crate::queue::Queue::exec_next`] reports it as an
  /// evaluation error (via [`crate::error::EvalError::host_rejected`])
  /// instead of returning `ExecResult::Command`.
  fn exec(&mut self, command: &str, fields: &[String]) -> bool {
    let _ = (command, fields);
    true
  }

  /// A recoverable error was detected and its statement dropped.
  fn error(&mut self, message: &str) {
    let _ = message;
  }

  /// An allocation failure (or, in this port, an unrecoverable internal
  /// invariant violation) left the pipeline in an undefined state.
  fn fatal(&mut self, message: &str) {
    let _ = message;
  }

  /// `M112` was enqueued. Fired during `feed`, before `exec_next` is
  /// ever called for that entry.
  fn m112(&mut self) {}
}

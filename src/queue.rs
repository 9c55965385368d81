//! The bounded ring of parsed statements and deferred parse errors that
//! sits between the parser and the evaluator.
//!
//! The source hand-rolls a doubling ring buffer with a head index and
//! occupancy count. `VecDeque` already gives the same amortized-O(1)
//! push/pop-front and the same "grow by doubling, never shrink"
//! behavior, so it is used directly instead of reimplementing a ring by
//! hand — see `DESIGN.md` for the full rationale.

use std::collections::VecDeque;

use crate::error::{Error, EvalError};
use crate::eval::{Command, Evaluator};
use crate::host::Host;
use syntax::ast::{ExprKind, Statement};
use syntax::lexer::Lexer;
use syntax::parser::{Parser, StatementSink};

/// Initial ring capacity. Matches the source; `VecDeque` grows by
/// doubling on its own once this is exceeded, and — like the source —
/// never shrinks back down.
const INITIAL_CAPACITY: usize = 32;

enum Entry {
  Statement(Statement),
  Error(Error),
}

/// What popping the oldest queue entry produced.
#[derive(Debug)]
pub enum ExecResult {
  /// The queue was already empty.
  Empty,
  Command(Command),
  Error(Error),
}

struct QueueSink {
  entries: VecDeque<Entry>,
  overflowed: bool,
}

impl QueueSink {
  /// Push an entry, or drop it and flag the overflow if growing the ring
  /// would exceed what the allocator is willing to give us. `feed`/
  /// `feed_finish` turn this flag into a `Host::fatal` notification —
  /// the source's allocation-failure path for queue growth.
  fn push(&mut self, entry: Entry) {
    if self.entries.len() == self.entries.capacity() && self.entries.try_reserve(self.entries.len().max(1)).is_err() {
      self.overflowed = true;
      return;
    }
    self.entries.push_back(entry);
  }
}

impl StatementSink for QueueSink {
  fn statement(&mut self, statement: Statement) {
    self.push(Entry::Statement(statement));
  }

  fn error(&mut self, error: syntax::Error) {
    self.push(Entry::Error(Error::Syntax(error)));
  }
}

/// Owns the lexer, parser, and evaluator for one pipeline instance, plus
/// the host capability set they report to.
pub struct Queue<H: Host> {
  lexer: Lexer,
  parser: Parser<QueueSink>,
  evaluator: Evaluator,
  host: H,
}

impl<H: Host> Queue<H> {
  pub fn new(host: H) -> Self {
    Queue {
      lexer: Lexer::new(),
      parser: Parser::new(QueueSink {
        entries: VecDeque::with_capacity(INITIAL_CAPACITY),
        overflowed: false,
      }),
      evaluator: Evaluator::new(),
      host,
    }
  }

  pub fn host(&mut self) -> &mut H {
    &mut self.host
  }

  /// Feed a chunk of source text. Returns the queue's occupancy after
  /// the new statements (and errors) it produced have been enqueued.
  pub fn feed(&mut self, bytes: &[u8]) -> usize {
    let before = self.parser.sink_mut().entries.len();
    self.lexer.feed(&mut self.parser, bytes);
    self.check_m112(before);
    self.check_overflow();
    self.parser.sink_mut().entries.len()
  }

  /// Flush the lexer as if a trailing newline had been seen.
  pub fn feed_finish(&mut self) -> usize {
    let before = self.parser.sink_mut().entries.len();
    self.lexer.finish(&mut self.parser);
    self.check_m112(before);
    self.check_overflow();
    self.parser.sink_mut().entries.len()
  }

  fn check_overflow(&mut self) {
    let sink = self.parser.sink_mut();
    if std::mem::take(&mut sink.overflowed) {
      self.host.fatal("out of memory growing the statement queue");
    }
  }

  fn check_m112(&mut self, scan_from: usize) {
    let entries = &self.parser.sink_mut().entries;
    let is_m112 = entries
      .iter()
      .skip(scan_from)
      .any(|entry| matches!(entry, Entry::Statement(s) if is_m112_statement(s)));
    if is_m112 {
      self.host.m112();
    }
  }

  /// Pop the oldest entry and, if it is a statement, evaluate and
  /// dispatch it. Returns the outcome and the remaining occupancy.
  pub fn exec_next(&mut self) -> (ExecResult, usize) {
    let Some(entry) = self.parser.sink_mut().entries.pop_front() else {
      return (ExecResult::Empty, 0);
    };
    let remaining = self.parser.sink_mut().entries.len();
    let result = match entry {
      Entry::Error(err) => {
        self.host.error(&err.message());
        ExecResult::Error(err)
      }
      Entry::Statement(stmt) => match self.evaluator.exec(&stmt, &mut self.host) {
        Ok(cmd) => {
          if self.host.exec(&cmd.name, &cmd.fields) {
            ExecResult::Command(cmd)
          } else {
            // §5/§7.5: a host callback signaling failure aborts the
            // current statement and is propagated as an evaluation
            // error, same as any other recoverable error.
            let err = EvalError::host_rejected(stmt.span);
            self.host.error(&err.message);
            ExecResult::Error(Error::Eval(err))
          }
        }
        Err(err) => {
          self.host.error(&err.message);
          ExecResult::Error(Error::Eval(err))
        }
      },
    };
    (result, remaining)
  }
}

fn is_m112_statement(statement: &Statement) -> bool {
  matches!(
    statement.fields.first().map(|f| &f.kind),
    Some(ExprKind::Str(s)) if s == "M112"
  )
}

#[cfg(test)]
mod tests;

use super::*;
use crate::value::{DictHandle, Value};

#[derive(Default)]
struct RecordingHost {
  params: std::collections::HashMap<String, Value>,
  m112_count: usize,
  errors: Vec<String>,
  fatals: Vec<String>,
  executed: Vec<(String, Vec<String>)>,
}

impl Host for RecordingHost {
  fn lookup(&mut self, key: &str, _parent: Option<DictHandle>) -> Option<Value> {
    self.params.get(key).cloned()
  }

  fn exec(&mut self, command: &str, fields: &[String]) -> bool {
    self.executed.push((command.to_string(), fields.to_vec()));
    true
  }

  fn error(&mut self, message: &str) {
    self.errors.push(message.to_string());
  }

  fn fatal(&mut self, message: &str) {
    self.fatals.push(message.to_string());
  }

  fn m112(&mut self) {
    self.m112_count += 1;
  }
}

fn run(src: &str) -> (Queue<RecordingHost>, Vec<ExecResult>) {
  let mut queue = Queue::new(RecordingHost::default());
  queue.feed(src.as_bytes());
  queue.feed_finish();
  let mut results = Vec::new();
  loop {
    let (result, _remaining) = queue.exec_next();
    if matches!(result, ExecResult::Empty) {
      break;
    }
    results.push(result);
  }
  (queue, results)
}

#[test]
fn statements_are_executed_in_source_order() {
  let (_, results) = run("G1 X0\nG1 X1\nG1 X2\n");
  let names: Vec<_> = results
    .iter()
    .map(|r| match r {
      ExecResult::Command(c) => c.name.clone(),
      _ => panic!("expected a command"),
    })
    .collect();
  // All three are the same command name; what matters is that the
  // fields round-trip in the order they were fed.
  assert_eq!(names, vec!["G1", "G1", "G1"]);
  let xs: Vec<_> = results
    .iter()
    .map(|r| match r {
      ExecResult::Command(c) => c.fields[0].clone(),
      _ => unreachable!(),
    })
    .collect();
  assert_eq!(xs, vec!["X0", "X1", "X2"]);
}

#[test]
fn occupancy_tracks_feeds_and_drains() {
  let mut queue = Queue::new(RecordingHost::default());
  let occ = queue.feed(b"G1 X0\nG1 X1\nG1 X2\n");
  assert_eq!(occ, 3);
  let (_, remaining) = queue.exec_next();
  assert_eq!(remaining, 2);
  let (_, remaining) = queue.exec_next();
  assert_eq!(remaining, 1);
}

#[test]
fn m112_notifies_during_feed_before_exec_next_reaches_it() {
  let mut queue = Queue::new(RecordingHost::default());
  queue.feed(b"G1 X0\nM112\nG1 X1\n");
  assert_eq!(queue.host().m112_count, 1);
  // the notification already fired; draining the queue doesn't refire it
  loop {
    let (result, _) = queue.exec_next();
    if matches!(result, ExecResult::Empty) {
      break;
    }
  }
  assert_eq!(queue.host().m112_count, 1);
}

#[test]
fn malformed_statement_does_not_block_later_well_formed_ones() {
  let (_, results) = run("G1 X{1+}\nG1 X9\n");
  assert_eq!(results.len(), 2);
  assert!(matches!(results[0], ExecResult::Error(_)));
  match &results[1] {
    ExecResult::Command(cmd) => assert_eq!(cmd.fields, vec!["X9"]),
    _ => panic!("expected the second statement to execute cleanly"),
  }
}

#[test]
fn eval_error_is_reported_to_host_and_does_not_panic() {
  let (queue, results) = run("G1 X{1/0}\n");
  assert_eq!(results.len(), 1);
  assert!(matches!(results[0], ExecResult::Error(Error::Eval(_))));
  assert_eq!(queue.host.errors.len(), 1);
  assert!(queue.host.errors[0].contains("division by zero"));
}

#[test]
fn unresolved_param_surfaces_as_an_eval_error_not_a_fatal() {
  let (queue, results) = run("G1 X{MISSING}\n");
  assert_eq!(results.len(), 1);
  assert!(matches!(results[0], ExecResult::Error(Error::Eval(_))));
  assert!(queue.host.fatals.is_empty());
}

#[test]
fn blank_and_comment_lines_produce_no_queue_entries() {
  let (_, results) = run("; just a comment\n\nG1 X0\n");
  assert_eq!(results.len(), 1);
}

#[test]
fn param_lookup_reaches_the_host() {
  let mut queue = Queue::new(RecordingHost::default());
  queue.host().params.insert("FEED".to_string(), Value::Int(1500));
  queue.feed(b"G1 F{FEED}\n");
  queue.feed_finish();
  let (result, _) = queue.exec_next();
  match result {
    ExecResult::Command(cmd) => assert_eq!(cmd.fields, vec!["1500"]),
    _ => panic!("expected a command"),
  }
}

#[test]
fn host_rejecting_exec_surfaces_as_an_eval_error() {
  struct Rejecting;
  impl Host for Rejecting {
    fn lookup(&mut self, _key: &str, _parent: Option<DictHandle>) -> Option<Value> {
      None
    }
    fn exec(&mut self, _command: &str, _fields: &[String]) -> bool {
      false
    }
  }
  let mut queue = Queue::new(Rejecting);
  queue.feed(b"G1 X0\n");
  queue.feed_finish();
  let (result, _) = queue.exec_next();
  match result {
    ExecResult::Error(Error::Eval(err)) => assert!(err.message.contains("rejected")),
    other => panic!("expected a host-rejected eval error, got {other:?}"),
  }
}

//! Reference driver: reads a `.gcode` file, feeds it through a
//! [`gcx::Queue`] in small chunks (to exercise the incremental lexer the
//! same way a serial/USB connection would), and prints every flattened
//! `(command, fields[])` tuple to stdout, one field per line, exactly as
//! the specification's external-interface section calls for. It takes no
//! further part in interpreting what a command means — that is the
//! host's job, which here means this file.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use gcx::env::JsonHost;
use gcx::host::Host;
use gcx::queue::{ExecResult, Queue};
use gcx::value::{DictHandle, Value};

/// Size of the chunks the driver feeds to the queue. Deliberately small
/// and not aligned to any token boundary, so a run against real input
/// routinely splits mid-word, mid-escape, and mid-number.
const FEED_CHUNK: usize = 64;

#[derive(Parser)]
#[command(author, version, about = "Compiles and runs a gcx program", long_about = None)]
struct Cli {
  /// Path to the `.gcode` program to run.
  program: PathBuf,

  /// Optional JSON document providing the root parameter environment
  /// (`{foo.bar}` resolves `foo` against this document's top level).
  #[arg(long)]
  env: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
  env_logger::init();
  let cli = Cli::parse();

  let source = std::fs::read(&cli.program)
    .with_context(|| format!("failed to read {}", cli.program.display()))?;

  let env = match &cli.env {
    Some(path) => {
      let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
      serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))?
    }
    None => serde_json::Value::Object(Default::default()),
  };

  let mut queue = Queue::new(ConsoleHost::new(JsonHost::new(env)));

  for chunk in source.chunks(FEED_CHUNK) {
    queue.feed(chunk);
  }
  queue.feed_finish();

  loop {
    let (result, _remaining) = queue.exec_next();
    if matches!(result, ExecResult::Empty) {
      break;
    }
    // Both `Command` and `Error` are already reported by `ConsoleHost`'s
    // `exec`/`error` callbacks, fired from inside `exec_next` itself.
  }

  if queue.host().fatal.get() {
    anyhow::bail!("pipeline aborted after a fatal error");
  }

  Ok(())
}

/// Wraps a [`JsonHost`] with the notification side effects the reference
/// driver needs: printing flattened commands to stdout, errors and
/// `M112` to stderr, and latching a fatal flag `main` checks after the
/// queue drains.
struct ConsoleHost {
  inner: JsonHost,
  fatal: std::cell::Cell<bool>,
}

impl ConsoleHost {
  fn new(inner: JsonHost) -> Self {
    ConsoleHost {
      inner,
      fatal: std::cell::Cell::new(false),
    }
  }
}

impl Host for ConsoleHost {
  fn lookup(&mut self, key: &str, parent: Option<DictHandle>) -> Option<Value> {
    self.inner.lookup(key, parent)
  }

  fn serialize(&mut self, dict: DictHandle) -> Option<String> {
    self.inner.serialize(dict)
  }

  fn exec(&mut self, command: &str, fields: &[String]) -> bool {
    println!("{command}");
    for field in fields {
      println!("{field}");
    }
    println!();
    true
  }

  fn error(&mut self, message: &str) {
    log::warn!("{message}");
    eprintln!("error: {message}");
  }

  fn fatal(&mut self, message: &str) {
    log::error!("{message}");
    eprintln!("fatal: {message}");
    self.fatal.set(true);
  }

  fn m112(&mut self) {
    log::warn!("M112 emergency stop");
    eprintln!("!! M112 emergency stop !!");
  }
}

//! `gcx` compiles a dialect of G-code into a stream of flat `(command,
//! fields[])` records for a host controller to execute.
//!
//! Each source line is a [`syntax::ast::Statement`]: a sequence of
//! fields that are either literal words (`G1`, `X0`) or `{ ... }`
//! expressions evaluated against a caller-supplied [`host::Host`]. The
//! pipeline is built from three stages that each get their own crate or
//! module — [`syntax::lexer`] turns bytes into tokens, [`syntax::parser`]
//! turns tokens into statements, and [`eval`] reduces a statement's
//! expression trees to text — connected by the bounded [`queue::Queue`]
//! that a driver polls at its own pace.
//!
//! ```
//! use gcx::host::Host;
//! use gcx::queue::{ExecResult, Queue};
//! use gcx::value::{DictHandle, Value};
//!
//! struct NoEnv;
//! impl Host for NoEnv {
//!   fn lookup(&mut self, _key: &str, _parent: Option<DictHandle>) -> Option<Value> {
//!     None
//!   }
//! }
//!
//! let mut queue = Queue::new(NoEnv);
//! queue.feed(b"G1 X10 Y20\n");
//! queue.feed_finish();
//! let (result, _remaining) = queue.exec_next();
//! match result {
//!   ExecResult::Command(cmd) => assert_eq!(cmd.name, "G1"),
//!   _ => unreachable!(),
//! }
//! ```

pub mod env;
pub mod error;
pub mod eval;
pub mod host;
pub mod queue;
pub mod value;

pub use error::Error;
pub use eval::Command;
pub use host::Host;
pub use queue::{ExecResult, Queue};
pub use value::{DictHandle, Value};

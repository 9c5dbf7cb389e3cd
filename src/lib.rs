//! A minimal line-oriented command interpreter.
//!
//! A line is partitioned into groups by `;` and runs group by group; inside
//! a group, commands separated by `&` run concurrently and the group ends
//! when the slowest member does. Commands are either builtins (`exit`,
//! `pwd`, `cd`, `cat`, `ls`, `echo`) or external programs resolved through
//! `PATH`, and any command may redirect its output with `>`.

mod builtin;
pub mod command;
mod external;
mod interpreter;
mod io_adapters;
mod lexer;
mod parser;
mod session;

pub use interpreter::Interpreter;
pub use io_adapters::{InheritedOutput, MemWriter};
pub use lexer::tokenize;
pub use parser::{Group, Line, ParsedCommand, split};
pub use session::ShellState;

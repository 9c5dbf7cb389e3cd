use crate::session::ShellState;
use anyhow::Result;
use std::io::Write;
use std::process::Stdio;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Result of executing a single command.
///
/// `error_text` carries diagnostics addressed to the interactive session:
/// the captured stderr of an external process, or a dispatch failure such as
/// an unknown command name. Builtins write their diagnostics to their own
/// output stream (which may be a redirect file) and leave it empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub code: ExitCode,
    pub error_text: Option<String>,
}

impl ExecutionOutcome {
    pub fn success() -> Self {
        Self::from_code(0)
    }

    pub fn from_code(code: ExitCode) -> Self {
        Self {
            code,
            error_text: None,
        }
    }

    pub fn failure(code: ExitCode, text: impl Into<String>) -> Self {
        Self {
            code,
            error_text: Some(text.into()),
        }
    }
}

/// Abstraction over a writable output stream that can also be converted into
/// a [`Stdio`] handle for spawning external processes.
///
/// A blanket implementation exists for any type that implements `Write` and
/// `Into<Stdio>`, which covers both `std::io::Stdout` and `std::fs::File`.
pub trait Stdout: Write {
    /// Convert this output into a [`Stdio`] handle suitable for `std::process::Command`.
    fn stdio(self: Box<Self>) -> Stdio;
}

impl<T: Write + Into<Stdio>> Stdout for T {
    fn stdio(self: Box<Self>) -> Stdio {
        (*self).into()
    }
}

/// Produces the default output stream for one command invocation.
///
/// The interpreter asks for a fresh writer per command, and members of a
/// concurrent group ask from their own threads.
pub trait OutputFactory: Send + Sync {
    fn create(&self) -> Box<dyn Stdout>;
}

/// Object-safe trait for any command the interpreter can execute.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command, consuming it.
    ///
    /// An `Err` is reserved for failures the command cannot report through
    /// its own output; the interpreter turns it into a session diagnostic.
    fn execute(
        self: Box<Self>,
        stdout: Box<dyn Stdout>,
        state: &ShellState,
    ) -> Result<ExecutionOutcome>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`. Factories
/// are queried from several threads while a concurrent group runs.
pub trait CommandFactory: Send + Sync {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}

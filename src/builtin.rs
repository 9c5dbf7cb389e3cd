use crate::command::{
    CommandFactory, ExecutableCommand, ExecutionOutcome, ExitCode, Stdout,
};
use crate::interpreter::Factory;
use crate::session::ShellState;
use anyhow::{Context, Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs;
use std::io::{ErrorKind, Write};

/// Built-in commands with a fixed argument shape.
///
/// These are parsed with [`argh`] (`FromArgs`) and executed in-process;
/// a wrong argument shape draws a usage diagnostic instead of running.
/// Builtins report failure by writing a diagnostic to their own output
/// stream, which follows a redirect when one was given.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "pwd" or "cd".
    fn name() -> &'static str;

    /// Executes the command against the provided output stream.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero when
    /// a diagnostic was emitted.
    fn execute(self, stdout: &mut dyn Write, state: &ShellState) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        mut stdout: Box<dyn Stdout>,
        state: &ShellState,
    ) -> Result<ExecutionOutcome> {
        let code = match T::execute(*self, &mut stdout, state) {
            Ok(code) => code,
            Err(e) => {
                stdout.write_all(format!("{}\n", e).as_bytes())?;
                1
            }
        };
        stdout.flush()?;
        Ok(ExecutionOutcome::from_code(code))
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        mut stdout: Box<dyn Stdout>,
        _state: &ShellState,
    ) -> Result<ExecutionOutcome> {
        stdout.write_all(self.output.as_bytes())?;
        stdout.flush()?;
        Ok(ExecutionOutcome::from_code(if self.is_error { 1 } else { 0 }))
    }
}

impl<T: BuiltinCommand + Send + Sync + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// Print the current working directory.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, _state: &ShellState) -> Result<ExitCode> {
        let dir = env::current_dir().context("pwd: cannot read current directory")?;
        stdout.write_all(format!("{}\n", dir.display()).as_bytes())?;
        Ok(0)
    }
}

/// Change the current working directory.
///
/// The single operand is taken verbatim, so a dash-leading name is attempted
/// as a directory like any other; any other arity is a no-op with a
/// diagnostic. The working directory is process-wide state: changing it also
/// moves every command that runs concurrently with this one.
pub struct Cd {
    pub args: Vec<String>,
}

impl ExecutableCommand for Cd {
    fn execute(
        self: Box<Self>,
        mut stdout: Box<dyn Stdout>,
        _state: &ShellState,
    ) -> Result<ExecutionOutcome> {
        let code = match self.args.as_slice() {
            [target] => match env::set_current_dir(target) {
                Ok(()) => 0,
                Err(e) => {
                    let reason = match e.kind() {
                        ErrorKind::NotFound | ErrorKind::NotADirectory => {
                            "no such file or directory".to_string()
                        }
                        ErrorKind::PermissionDenied => "permission denied".to_string(),
                        _ => format!("cd: {}", e),
                    };
                    stdout.write_all(format!("{}\n", reason).as_bytes())?;
                    1
                }
            },
            _ => {
                stdout.write_all(b"cd: expected exactly one directory\n")?;
                1
            }
        };
        stdout.flush()?;
        Ok(ExecutionOutcome::from_code(code))
    }
}

impl CommandFactory for Factory<Cd> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == "cd" {
            Some(Box::new(Cd {
                args: args.iter().map(|s| s.to_string()).collect(),
            }))
        } else {
            None
        }
    }
}

/// Print file contents, concatenated in argument order.
///
/// Every operand is a filename, dash-leading ones included; reading
/// continues past individual failures.
pub struct Cat {
    pub files: Vec<String>,
}

impl ExecutableCommand for Cat {
    fn execute(
        self: Box<Self>,
        mut stdout: Box<dyn Stdout>,
        _state: &ShellState,
    ) -> Result<ExecutionOutcome> {
        let mut code = 0;
        if self.files.is_empty() {
            stdout.write_all(b"cat: missing file argument\n")?;
            code = 1;
        }
        for filename in &self.files {
            match fs::read(filename) {
                Ok(bytes) => stdout.write_all(decode_file_text(bytes).as_bytes())?,
                Err(e) => {
                    let reason = match e.kind() {
                        ErrorKind::NotFound => "no such file or directory",
                        ErrorKind::PermissionDenied => "permission denied",
                        _ => "cannot read file",
                    };
                    stdout.write_all(format!("cat: {}: {}\n", filename, reason).as_bytes())?;
                    code = 1;
                }
            }
        }
        stdout.flush()?;
        Ok(ExecutionOutcome::from_code(code))
    }
}

impl CommandFactory for Factory<Cat> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == "cat" {
            Some(Box::new(Cat {
                files: args.iter().map(|s| s.to_string()).collect(),
            }))
        } else {
            None
        }
    }
}

/// UTF-8 first; invalid UTF-8 is reinterpreted as Latin-1, which maps every
/// byte to a character and cannot fail.
fn decode_file_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

#[derive(FromArgs)]
/// List the entries of the current directory, hidden ones excluded.
pub struct Ls {}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn execute(self, stdout: &mut dyn Write, _state: &ShellState) -> Result<ExitCode> {
        let entries = read_visible_entries().map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => anyhow!("ls: permission denied"),
            _ => anyhow!("ls: {}", e),
        })?;

        if !entries.is_empty() {
            let mut line = String::new();
            for entry in &entries {
                line.push_str(entry);
                line.push_str("  ");
            }
            line.push('\n');
            stdout.write_all(line.as_bytes())?;
        }
        Ok(0)
    }
}

fn read_visible_entries() -> std::io::Result<Vec<String>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(".")? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            entries.push(name);
        }
    }
    entries.sort();
    Ok(entries)
}

/// Print the arguments joined by single spaces, with a trailing newline.
///
/// Every word is literal, option-looking words included, so this one is not
/// argh-based: the arguments are taken exactly as the tokenizer produced them.
pub struct Echo {
    pub args: Vec<String>,
}

impl ExecutableCommand for Echo {
    fn execute(
        self: Box<Self>,
        mut stdout: Box<dyn Stdout>,
        _state: &ShellState,
    ) -> Result<ExecutionOutcome> {
        stdout.write_all(format!("{}\n", self.args.join(" ")).as_bytes())?;
        stdout.flush()?;
        Ok(ExecutionOutcome::success())
    }
}

impl CommandFactory for Factory<Echo> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == "echo" {
            Some(Box::new(Echo {
                args: args.iter().map(|s| s.to_string()).collect(),
            }))
        } else {
            None
        }
    }
}

/// Request session termination. Arguments are accepted and ignored.
///
/// Only lowers the running flag: commands already started, including
/// concurrent siblings in the same group, run to completion.
pub struct Exit;

impl ExecutableCommand for Exit {
    fn execute(
        self: Box<Self>,
        _stdout: Box<dyn Stdout>,
        state: &ShellState,
    ) -> Result<ExecutionOutcome> {
        state.request_exit();
        Ok(ExecutionOutcome::success())
    }
}

impl CommandFactory for Factory<Exit> {
    fn try_create(&self, name: &str, _args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == "exit" {
            Some(Box::new(Exit))
        } else {
            None
        }
    }
}

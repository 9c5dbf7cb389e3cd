use crate::command::{
    CommandFactory, ExecutableCommand, ExecutionOutcome, Stdout,
};
use crate::interpreter::Factory;
use crate::session::ShellState;
use anyhow::Result;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

/// Command that is not a builtin: a program resolved on disk and run as a
/// child process.
///
/// The child inherits stdin, writes stdout to the provided output handle and
/// gets its stderr piped back so the session can surface it.
pub struct ExternalCommand {
    path: OsString,
    display_name: String,
    args: Vec<OsString>,
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        let search_paths = std::env::var_os("PATH")?;
        let executable = find_command_path(&search_paths, Path::new(name))?;
        Some(Box::new(ExternalCommand {
            path: executable.as_os_str().to_owned(),
            display_name: name.to_string(),
            args: args.iter().map(|x| x.into()).collect(),
        }))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        stdout: Box<dyn Stdout>,
        _state: &ShellState,
    ) -> Result<ExecutionOutcome> {
        let output = match std::process::Command::new(&self.path)
            .args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(stdout.stdio())
            .stderr(Stdio::piped())
            .output()
        {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(ExecutionOutcome::failure(
                    127,
                    format!("{}: command not found", self.display_name),
                ));
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Ok(ExecutionOutcome::failure(
                    126,
                    format!("{}: permission denied", self.display_name),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let code = match output.status.code() {
            Some(x) => x,
            None => terminated_by_signal(output.status),
        };
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        // Stderr text accompanies whatever code the process returned; a
        // clean exit with error output is still a clean exit.
        Ok(ExecutionOutcome {
            code,
            error_text: (!stderr.is_empty()).then(|| stderr.to_string()),
        })
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Absolute paths and paths with more than one component are checked
/// directly; on non-Unix platforms, and for `./`-prefixed paths everywhere,
/// the current directory is consulted first. A bare name is searched for in
/// each directory of `search_paths` (PATH), first match wins. An empty path
/// never resolves.
///
/// Returns a borrowed reference to `path` where possible and an owned
/// `PathBuf` when the result came out of the PATH search.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return existing(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    if path.components().nth(1).is_some() {
        return existing(path).map(Cow::Borrowed);
    }
    match path.components().next() {
        Some(only) => find_in_path(search_paths, only.as_os_str()).map(Cow::Owned),
        None => None,
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| candidate.exists())
}

fn existing(path: &Path) -> Option<&Path> {
    path.exists().then_some(path)
}

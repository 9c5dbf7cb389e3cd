use crate::builtin::{Cat, Cd, Echo, Exit, Ls, Pwd};
use crate::command::{CommandFactory, ExecutionOutcome, OutputFactory, Stdout};
use crate::external::ExternalCommand;
use crate::io_adapters::InheritedOutput;
use crate::parser::{self, Group, Line, ParsedCommand};
use crate::session::ShellState;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs::File;
use std::io::Write;
use std::thread;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports command types defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal line-oriented command interpreter.
///
/// Lines are split into groups sequenced by `;`; within a group, commands
/// joined by `&` run concurrently and the group finishes when all of them
/// have. Commands resolve against a list of [`CommandFactory`] objects,
/// builtins first, and write to streams produced by an [`OutputFactory`],
/// so an embedding test can capture everything a session prints.
///
/// Example
/// ```
/// use minishell::{Interpreter, MemWriter};
/// let output = MemWriter::new();
/// let sh = Interpreter::with_output(Box::new(output.clone()));
/// sh.run_line("echo hello world");
/// assert_eq!(String::from_utf8(output.contents()).unwrap(), "hello world\n");
/// ```
pub struct Interpreter {
    commands: Vec<Box<dyn CommandFactory>>,
    output: Box<dyn OutputFactory>,
    state: ShellState,
}

impl Interpreter {
    /// Create an interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>, output: Box<dyn OutputFactory>) -> Self {
        Self {
            commands,
            output,
            state: ShellState::new(),
        }
    }

    /// Create an interpreter with the default command set writing to `output`.
    pub fn with_output(output: Box<dyn OutputFactory>) -> Self {
        Self::new(
            vec![
                Box::new(Factory::<Exit>::default()),
                Box::new(Factory::<Pwd>::default()),
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<Cat>::default()),
                Box::new(Factory::<Ls>::default()),
                Box::new(Factory::<Echo>::default()),
                Box::new(Factory::<ExternalCommand>::default()),
            ],
            output,
        )
    }

    /// The session context shared with every command this interpreter runs.
    pub fn state(&self) -> &ShellState {
        &self.state
    }

    /// Split one input line and run it. See [`Interpreter::run`].
    pub fn run_line(&self, line: &str) -> Vec<ExecutionOutcome> {
        self.run(parser::split(line))
    }

    /// Run groups strictly in order, one outcome per executed command.
    ///
    /// A `Concurrent` group spawns one thread per member and joins them all
    /// before the next group starts. Once the session stops running, no
    /// further group starts, remaining groups of this line included.
    pub fn run(&self, groups: Line) -> Vec<ExecutionOutcome> {
        let mut outcomes = Vec::new();
        for group in groups {
            if !self.state.is_running() {
                break;
            }
            match group {
                Group::Single(command) => outcomes.push(self.run_command(command)),
                Group::Concurrent(members) => {
                    let joined: Vec<ExecutionOutcome> = thread::scope(|scope| {
                        let handles: Vec<_> = members
                            .into_iter()
                            .map(|command| scope.spawn(move || self.run_command(command)))
                            .collect();
                        handles
                            .into_iter()
                            .map(|handle| match handle.join() {
                                Ok(outcome) => outcome,
                                Err(_) => self.report(ExecutionOutcome::failure(
                                    1,
                                    "command thread panicked",
                                )),
                            })
                            .collect()
                    });
                    outcomes.extend(joined);
                }
            }
        }
        outcomes
    }

    /// The interactive Read-Eval-Print Loop.
    ///
    /// Ctrl-C prints a hint and re-prompts; end of input or the `exit`
    /// builtin ends the session.
    pub fn repl(&self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;
        println!("minishell - type 'exit' to quit");

        while self.state.is_running() {
            match rl.readline("> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line)?;
                    self.run_line(line);
                }
                Err(ReadlineError::Interrupted) => println!("Use 'exit' to quit"),
                Err(ReadlineError::Eof) => {
                    println!("Exiting...");
                    self.state.request_exit();
                }
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }
        Ok(())
    }

    fn run_command(&self, command: ParsedCommand) -> ExecutionOutcome {
        let outcome = self.dispatch(command);
        self.report(outcome)
    }

    /// Resolve and execute one command, applying its redirect.
    ///
    /// Never panics and never aborts the group: every failure becomes an
    /// outcome carrying a diagnostic.
    fn dispatch(&self, command: ParsedCommand) -> ExecutionOutcome {
        if command.argv.is_empty() {
            return ExecutionOutcome::success();
        }

        let stdout: Box<dyn Stdout> = match &command.redirect_target {
            Some(target) => match File::create(target) {
                Ok(file) => Box::new(file),
                Err(e) => {
                    return ExecutionOutcome::failure(
                        1,
                        format!("Error redirecting output: {}", e),
                    );
                }
            },
            None => self.output.create(),
        };

        let name = &command.argv[0];
        let args: Vec<&str> = command.argv[1..].iter().map(String::as_str).collect();
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(name, &args) {
                return match cmd.execute(stdout, &self.state) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        ExecutionOutcome::failure(1, format!("Error executing {}: {}", name, e))
                    }
                };
            }
        }
        ExecutionOutcome::failure(127, format!("{}: command not found", name))
    }

    /// Print the outcome's diagnostic, if any, to a fresh session stream.
    fn report(&self, outcome: ExecutionOutcome) -> ExecutionOutcome {
        if let Some(text) = &outcome.error_text {
            let mut session = self.output.create();
            session.write_all(format!("{}\n", text).as_bytes()).ok();
            session.flush().ok();
        }
        outcome
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands writing to the
    /// process stdout:
    /// - builtins: `exit`, `pwd`, `cd`, `cat`, `ls`, `echo`
    /// - external command launcher
    fn default() -> Self {
        Self::with_output(Box::new(InheritedOutput))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::MemWriter;
    use std::fs;
    use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

    fn captured() -> (Interpreter, MemWriter) {
        let writer = MemWriter::new();
        let interpreter = Interpreter::with_output(Box::new(writer.clone()));
        (interpreter, writer)
    }

    fn text(writer: &MemWriter) -> String {
        String::from_utf8(writer.contents()).unwrap()
    }

    fn unique_temp_path(tag: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "minishell_run_{}_{}_{}",
            tag,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn test_sequential_groups_print_in_order() {
        let (interpreter, writer) = captured();
        let outcomes = interpreter.run_line("echo A ; echo B");

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.code == 0));
        assert_eq!(text(&writer), "A\nB\n");
    }

    #[test]
    fn test_concurrent_members_all_complete() {
        let (interpreter, writer) = captured();
        let outcomes = interpreter.run_line("echo A & echo B");

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.code == 0));
        let output = text(&writer);
        assert!(
            output == "A\nB\n" || output == "B\nA\n",
            "unexpected output {:?}",
            output
        );
    }

    #[test]
    fn test_exit_stops_later_groups_on_the_same_line() {
        let (interpreter, writer) = captured();
        let outcomes = interpreter.run_line("echo A ; exit ; echo B");

        assert_eq!(outcomes.len(), 2);
        assert_eq!(text(&writer), "A\n");
        assert!(!interpreter.state().is_running());
    }

    #[test]
    fn test_exit_in_concurrent_group_lets_siblings_finish() {
        let (interpreter, writer) = captured();
        let outcomes = interpreter.run_line("echo A & exit");

        assert_eq!(outcomes.len(), 2);
        assert_eq!(text(&writer), "A\n");
        assert!(!interpreter.state().is_running());

        // The dead session schedules nothing further
        assert!(interpreter.run_line("echo B").is_empty());
        assert_eq!(text(&writer), "A\n");
    }

    #[test]
    fn test_redirect_goes_to_the_file_not_the_session() {
        let (interpreter, writer) = captured();
        let target = unique_temp_path("redirect");

        let outcomes = interpreter.run_line(&format!("echo hi > {}", target.display()));

        assert_eq!(outcomes, vec![ExecutionOutcome::success()]);
        assert_eq!(fs::read_to_string(&target).unwrap(), "hi\n");
        assert_eq!(text(&writer), "");

        let _ = fs::remove_file(&target);
    }

    #[test]
    fn test_redirect_open_failure_is_reported() {
        let (interpreter, writer) = captured();
        let outcomes = interpreter.run_line("echo hi > /definitely/missing/dir/out");

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].code, 1);
        assert!(text(&writer).starts_with("Error redirecting output:"));
    }

    #[test]
    fn test_unknown_command_reports_not_found() {
        let (interpreter, writer) = captured();
        let outcomes = interpreter.run_line("definitely_not_a_command_1b2c3");

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].code, 127);
        assert_eq!(text(&writer), "definitely_not_a_command_1b2c3: command not found\n");
        assert!(interpreter.state().is_running());
    }

    #[test]
    fn test_builtin_wins_over_path_lookup() {
        // An external echo would swallow "-n"; the builtin keeps it literal
        let (interpreter, writer) = captured();
        interpreter.run_line("echo -n");

        assert_eq!(text(&writer), "-n\n");
    }

    #[test]
    fn test_cat_dash_operand_is_a_file_name() {
        let (interpreter, writer) = captured();
        let outcomes = interpreter.run_line("cat -zzz_no_such_file");

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].code, 1);
        assert_eq!(text(&writer), "cat: -zzz_no_such_file: no such file or directory\n");
    }

    #[test]
    fn test_cd_diagnostic_lands_in_the_capture() {
        let (interpreter, writer) = captured();
        let outcomes = interpreter.run_line("cd /definitely_missing_dir_1b2c3");

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].code, 1);
        assert_eq!(text(&writer), "no such file or directory\n");
    }

    #[test]
    fn test_dead_session_schedules_nothing() {
        let (interpreter, writer) = captured();
        interpreter.state().request_exit();

        assert!(interpreter.run_line("echo A").is_empty());
        assert_eq!(text(&writer), "");
    }

    #[test]
    #[cfg(unix)]
    fn test_external_exit_status_is_reported() {
        let (interpreter, writer) = captured();
        let outcomes = interpreter.run_line("sh -c 'exit 3'");

        assert_eq!(outcomes, vec![ExecutionOutcome::from_code(3)]);
        assert_eq!(text(&writer), "");
    }

    #[test]
    #[cfg(unix)]
    fn test_external_stderr_reaches_the_session() {
        let (interpreter, writer) = captured();
        let outcomes = interpreter.run_line("sh -c 'missing_xyz_tool_1b2c3'");

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].code, 127);
        assert!(
            text(&writer).contains("not found"),
            "unexpected session output {:?}",
            text(&writer)
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_concurrent_group_overlaps_and_joins() {
        let (interpreter, _writer) = captured();
        let started = Instant::now();
        let outcomes = interpreter.run_line("sleep 0.5 & sleep 0.5");
        let elapsed = started.elapsed();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.code == 0));
        assert!(
            elapsed >= Duration::from_millis(450),
            "group returned before its members finished: {:?}",
            elapsed
        );
        assert!(
            elapsed < Duration::from_millis(950),
            "members did not overlap: {:?}",
            elapsed
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_next_group_waits_for_the_concurrent_barrier() {
        let (interpreter, writer) = captured();
        let started = Instant::now();
        interpreter.run_line("sleep 0.3 & echo first ; echo second");
        let elapsed = started.elapsed();

        assert_eq!(text(&writer), "first\nsecond\n");
        assert!(
            elapsed >= Duration::from_millis(250),
            "barrier was released early: {:?}",
            elapsed
        );
    }
}

use minishell::Interpreter;

fn main() -> rustyline::Result<()> {
    Interpreter::default().repl()
}

//! Lexical analysis for a single sub-command: argument words plus an
//! optional output redirection target.

/// Errors that can occur while splitting a command into words.
#[derive(Debug)]
enum LexingError {
    /// A closing quote (single or double) was not found.
    UnfinishedQuote,
    /// The input ended right after a backslash.
    DanglingEscape,
}

/// Split one sub-command into its argument vector and redirection target.
///
/// The text before the first unquoted, unescaped `>` is split into words;
/// the text after it, trimmed, names the redirect target. A missing or empty
/// target yields `None`, so a bare trailing `>` does not redirect.
///
/// Word splitting understands single quotes (everything literal), double
/// quotes (whitespace preserved; backslash escapes only `"` and `\`) and
/// backslash escapes outside quotes. Malformed quoting never fails the call:
/// the command text degrades to plain whitespace splitting.
///
/// Empty or whitespace-only input produces an empty argument vector, a
/// result callers skip entirely.
pub fn tokenize(raw: &str) -> (Vec<String>, Option<String>) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return (Vec::new(), None);
    }

    let (command_text, redirect_target) = split_redirect(trimmed);
    let argv = match split_words(command_text) {
        Ok(words) => words,
        Err(_) => command_text
            .split_whitespace()
            .map(str::to_string)
            .collect(),
    };
    (argv, redirect_target)
}

/// Scan for the first `>` that sits outside quotes and is not escaped.
fn split_redirect(text: &str) -> (&str, Option<String>) {
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if !in_single => escaped = true,
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '>' if !in_single && !in_double => {
                let target = text[i + 1..].trim();
                let target = if target.is_empty() {
                    None
                } else {
                    Some(target.to_string())
                };
                return (&text[..i], target);
            }
            _ => {}
        }
    }
    (text, None)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
    words: Vec<String>,
}

fn split_words(text: &str) -> Result<Vec<String>, LexingError> {
    let mut lexer = LexingFSM::new(text);
    lexer.make_words()
}

impl LexingFSM {
    fn new(text: &str) -> Self {
        LexingFSM {
            input: text.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
            words: Vec::new(),
        }
    }

    fn make_words(&mut self) -> Result<Vec<String>, LexingError> {
        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch)?,
                LexingState::ReadingWord => self.handle_word(ch)?,
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch)?,
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch)?,
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote | LexingState::ReadingDoubleQuote => {
                return Err(LexingError::UnfinishedQuote);
            }
            // A word is in progress; its buffer may legitimately be empty
            // when the word was an empty quoted string.
            LexingState::ReadingWord => self.words.push(std::mem::take(&mut self.buffer)),
            LexingState::Start => {}
        }

        Ok(std::mem::take(&mut self.words))
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn handle_start(&mut self, ch: char) -> Result<(), LexingError> {
        match ch {
            ' ' | '\t' => {}
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            '\\' => {
                let escaped = self.read_char().ok_or(LexingError::DanglingEscape)?;
                self.buffer.push(escaped);
                self.state = LexingState::ReadingWord;
            }
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
        Ok(())
    }

    fn handle_word(&mut self, ch: char) -> Result<(), LexingError> {
        match ch {
            ' ' | '\t' => {
                self.words.push(std::mem::take(&mut self.buffer));
                self.state = LexingState::Start;
            }
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            '\\' => {
                let escaped = self.read_char().ok_or(LexingError::DanglingEscape)?;
                self.buffer.push(escaped);
            }
            c => self.buffer.push(c),
        }
        Ok(())
    }

    fn handle_single_quote(&mut self, ch: char) -> Result<(), LexingError> {
        match ch {
            '\'' => self.state = LexingState::ReadingWord,
            c => self.buffer.push(c),
        }
        Ok(())
    }

    fn handle_double_quote(&mut self, ch: char) -> Result<(), LexingError> {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            '\\' => match self.peek_char() {
                Some(c @ ('"' | '\\')) => {
                    self.read_char();
                    self.buffer.push(c);
                }
                // Any other backslash stays literal inside double quotes.
                _ => self.buffer.push('\\'),
            },
            c => self.buffer.push(c),
        }
        Ok(())
    }
}

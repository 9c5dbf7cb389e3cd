//! Splits a full input line into ordered command groups.

use crate::lexer;

/// One resolved sub-command: its argument vector and optional redirect target.
///
/// `argv` is never empty; pieces that tokenize to nothing are dropped by
/// [`split`] instead of being represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub argv: Vec<String>,
    pub redirect_target: Option<String>,
}

/// A scheduling unit within a line.
///
/// `Concurrent` members were joined by `&` and run together; the group holds
/// at least one member, and a one-member group behaves like `Single` apart
/// from running on its own thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Group {
    Single(ParsedCommand),
    Concurrent(Vec<ParsedCommand>),
}

/// Groups of one input line, in execution order.
pub type Line = Vec<Group>;

/// Partition a line on `;` into groups, and each group on `&` into
/// concurrent members.
///
/// Separator splitting is textual: a `;` or `&` inside quotes still splits.
/// Empty segments and pieces that tokenize to an empty argument vector are
/// dropped, so a line of separators produces no groups at all.
pub fn split(line: &str) -> Line {
    let mut groups = Vec::new();

    for segment in line.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        if segment.contains('&') {
            let members: Vec<ParsedCommand> = segment
                .split('&')
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .filter_map(parse_piece)
                .collect();
            if !members.is_empty() {
                groups.push(Group::Concurrent(members));
            }
        } else if let Some(command) = parse_piece(segment) {
            groups.push(Group::Single(command));
        }
    }

    groups
}

fn parse_piece(piece: &str) -> Option<ParsedCommand> {
    let (argv, redirect_target) = lexer::tokenize(piece);
    if argv.is_empty() {
        None
    } else {
        Some(ParsedCommand {
            argv,
            redirect_target,
        })
    }
}

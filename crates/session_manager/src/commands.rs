//! Command parser for the UI text surface
//!
//! Plain text is a user turn; `/sw` switches branches, `/nb` opens one.
//! Malformed commands never reach the tree: they parse to `Usage` and
//! the controller reports the hint without mutating anything.

/// Usage hint shown for any malformed or unknown `/` command.
pub const USAGE: &str = "unrecognized / command, try one of these instead:\n\
/sw a b -- switches the level-a message to alternative b\n\
/nb n str -- creates a new branch at level n (str ignored when regenerating assistant replies)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Append as the next user turn and fetch a reply.
    Say(String),
    /// `/sw A B` with 1-based level and branch numbers.
    SwitchBranch { level: usize, branch: usize },
    /// `/nb N [text]` with 1-based level; text optional on assistant
    /// levels (regeneration).
    NewBranch { level: usize, text: Option<String> },
    /// Whitespace-only input; nothing to do.
    Empty,
    /// Anything malformed; carries the hint to show.
    Usage(&'static str),
}

pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    if !trimmed.starts_with('/') {
        return Command::Say(trimmed.to_string());
    }

    let (word, args) = match trimmed.split_once(char::is_whitespace) {
        Some((word, args)) => (word, args.trim()),
        None => (trimmed, ""),
    };

    match word {
        "/sw" => parse_switch(args),
        "/nb" => parse_new_branch(args),
        _ => Command::Usage(USAGE),
    }
}

fn parse_switch(args: &str) -> Command {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() != 2 {
        return Command::Usage(USAGE);
    }
    match (parts[0].parse(), parts[1].parse()) {
        (Ok(level), Ok(branch)) => Command::SwitchBranch { level, branch },
        _ => Command::Usage(USAGE),
    }
}

fn parse_new_branch(args: &str) -> Command {
    if args.is_empty() {
        return Command::Usage(USAGE);
    }
    let (level_str, text) = match args.split_once(char::is_whitespace) {
        Some((level, rest)) => (level, Some(rest.trim())),
        None => (args, None),
    };
    match level_str.parse() {
        Ok(level) => Command::NewBranch {
            level,
            text: text.filter(|t| !t.is_empty()).map(str::to_string),
        },
        Err(_) => Command::Usage(USAGE),
    }
}

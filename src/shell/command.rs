//! Command grammar parser (C7): the single-line commands of the shell.
use crate::err;
use crate::errors::Error;

/// One parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create(String),
    Open(String),
    Insert(u32, u32),
    Search(u32),
    Load(String),
    Print,
    Extract(String),
    Help,
    Quit,
}

/// One-line usage strings, printed verbatim on a malformed command.
pub const USAGE: &[(&str, &str)] = &[
    ("create", "usage: create <path>"),
    ("open", "usage: open <path>"),
    ("insert", "usage: insert <key:uint32> <value:uint32>"),
    ("search", "usage: search <key:uint32>"),
    ("load", "usage: load <path>"),
    ("print", "usage: print"),
    ("extract", "usage: extract <path>"),
];

fn usage_for(name: &str) -> &'static str {
    USAGE
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, u)| *u)
        .unwrap_or("usage error")
}

/// Parse one trimmed, non-empty line. The command name is matched
/// case-insensitively; arguments are taken verbatim (paths are
/// case-sensitive).
pub fn parse(line: &str) -> Result<Command, Error> {
    let mut parts = line.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let rest: Vec<&str> = parts.collect();

    match name.as_str() {
        "create" => match rest.as_slice() {
            [path] => Ok(Command::Create((*path).to_string())),
            _ => Err(err!(MalformedInput, "{}", usage_for("create"))),
        },
        "open" => match rest.as_slice() {
            [path] => Ok(Command::Open((*path).to_string())),
            _ => Err(err!(MalformedInput, "{}", usage_for("open"))),
        },
        "insert" => match rest.as_slice() {
            [key, value] => {
                let key = parse_u32(key).ok_or_else(|| err!(MalformedInput, "{}", usage_for("insert")))?;
                let value =
                    parse_u32(value).ok_or_else(|| err!(MalformedInput, "{}", usage_for("insert")))?;
                Ok(Command::Insert(key, value))
            }
            _ => Err(err!(MalformedInput, "{}", usage_for("insert"))),
        },
        "search" => match rest.as_slice() {
            [key] => {
                let key = parse_u32(key).ok_or_else(|| err!(MalformedInput, "{}", usage_for("search")))?;
                Ok(Command::Search(key))
            }
            _ => Err(err!(MalformedInput, "{}", usage_for("search"))),
        },
        "load" => match rest.as_slice() {
            [path] => Ok(Command::Load((*path).to_string())),
            _ => Err(err!(MalformedInput, "{}", usage_for("load"))),
        },
        "print" => match rest.as_slice() {
            [] => Ok(Command::Print),
            _ => Err(err!(MalformedInput, "{}", usage_for("print"))),
        },
        "extract" => match rest.as_slice() {
            [path] => Ok(Command::Extract((*path).to_string())),
            _ => Err(err!(MalformedInput, "{}", usage_for("extract"))),
        },
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(err!(
            MalformedInput,
            "unrecognized command '{}' — type 'help' for the command list",
            other
        )),
    }
}

fn parse_u32(s: &str) -> Option<u32> {
    s.parse::<u32>().ok()
}

//! The REPL (Read-Eval-Print-Loop) module (C7).
use crate::echo;
use crate::error;
use crate::errors::Error;
use crate::session::Session;
use crate::shell::command::{self, Command};
use std::io::{self, BufRead, Write};
use tracing::{info, info_span};
use uuid::Uuid;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const BANNER: &str = r#"
A persistent on-disk B-tree index manager.
Type 'help' for the command list, 'quit' or 'exit' to leave.
"#;

const HELP: &str = r#"Commands:
  create <path>                    create a new index file
  open   <path>                    open an existing index file
  insert <key> <value>             insert a key/value pair (uint32 each)
  search <key>                     look up a key
  load   <path>                    bulk-load "key,value" lines from a file
  print                            dump all pairs in ascending key order
  extract <path>                   write all pairs to a file, ascending
  help                             show this message
  quit | exit                      leave the shell"#;

/// Run the interactive shell to completion. Returns `Ok(())` on a normal
/// exit (`quit`/`exit`/EOF); every other error is recoverable and handled
/// internally, so this only returns `Err` on an unrecoverable startup
/// condition.
pub fn run(initial_path: Option<String>) -> Result<(), Error> {
    let session_id = Uuid::new_v4();
    let _span = info_span!("repl", session_id = %session_id).entered();
    info!("starting shell session");

    echo!("btreeidx {} — interactive index manager\n", VERSION);
    echo!("{}\n", BANNER);

    let mut session = Session::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    if let Some(path) = initial_path {
        dispatch(&mut session, Command::Open(path), &mut lines);
    }

    loop {
        print_prompt()?;
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                warn_and_print(&Error::from(e));
                continue;
            }
            None => {
                echo!("\n");
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let command = match command::parse(trimmed) {
            Ok(c) => c,
            Err(e) => {
                warn_and_print(&e);
                continue;
            }
        };

        if matches!(command, Command::Quit) {
            echo!("Bye\n");
            break;
        }

        dispatch(&mut session, command, &mut lines);
    }

    Ok(())
}

fn print_prompt() -> Result<(), Error> {
    crate::console::print_prompt()?;
    Ok(())
}

fn warn_and_print(e: &Error) {
    tracing::warn!(error = %e, "shell error");
    error!("{}\n", e);
}

/// Execute one parsed command, printing its result or error. `lines` is only
/// consulted for `create`'s interactive overwrite confirmation.
fn dispatch(
    session: &mut Session,
    command: Command,
    lines: &mut io::Lines<io::StdinLock<'_>>,
) {
    let result = run_command(session, command, lines);
    if let Err(e) = result {
        warn_and_print(&e);
    }
}

fn run_command(
    session: &mut Session,
    command: Command,
    lines: &mut io::Lines<io::StdinLock<'_>>,
) -> Result<(), Error> {
    match command {
        Command::Create(path) => {
            let exists = std::path::Path::new(&path).exists();
            if exists && !confirm_overwrite(&path, lines)? {
                echo!("Cancelled.\n");
                return Ok(());
            }
            session.create(&path, exists)?;
            echo!("Created index '{}'.\n", path);
            Ok(())
        }
        Command::Open(path) => {
            session.open(&path)?;
            echo!("Opened index '{}'.\n", path);
            Ok(())
        }
        Command::Insert(key, value) => {
            session.insert(key, value)?;
            echo!("Inserted {} -> {}.\n", key, value);
            Ok(())
        }
        Command::Search(key) => {
            match session.search(key)? {
                Some(value) => echo!("{}\n", value),
                None => echo!("not found\n"),
            }
            Ok(())
        }
        Command::Load(path) => {
            let report = session.load(&path)?;
            echo!(
                "Loaded {} record(s), skipped {}.\n",
                report.inserted,
                report.skipped.len()
            );
            for (line_no, reason) in &report.skipped {
                echo!("  line {}: {}\n", line_no, reason);
            }
            Ok(())
        }
        Command::Print => {
            let mut out = String::new();
            session.print_all(|k, v| {
                out.push_str(&format!("{},{}\n", k, v));
            })?;
            echo!("{}", out);
            Ok(())
        }
        Command::Extract(path) => {
            session.extract(&path)?;
            echo!("Extracted to '{}'.\n", path);
            Ok(())
        }
        Command::Help => {
            echo!("{}\n", HELP);
            Ok(())
        }
        Command::Quit => unreachable!("Quit is handled by the caller before dispatch"),
    }
}

/// Prompt `y/n` on stdin for overwriting an existing path, mirroring the
/// original tool's interactive confirmation.
fn confirm_overwrite(path: &str, lines: &mut io::Lines<io::StdinLock<'_>>) -> Result<bool, Error> {
    crate::console::echo(format!("'{}' already exists. Overwrite? (y/n) ", path));
    io::stdout().flush().ok();
    match lines.next() {
        Some(Ok(answer)) => Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")),
        Some(Err(e)) => Err(Error::from(e)),
        None => Ok(false),
    }
}

//! Plain stdout/stderr output, colored with `crossterm`.
//!
//! Unlike a full raw-mode REPL, this shell reads lines with `std::io::stdin`
//! and only uses `crossterm` for prompt/error styling.
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::{execute, ExecutableCommand};
use std::io::{self, Write};

const NAME: &str = env!("CARGO_PKG_NAME");

/// Print the `NAME> ` prompt without a trailing newline and flush.
pub fn print_prompt() -> io::Result<()> {
    io::stdout()
        .execute(Print(format!("{}> ", NAME)))?
        .flush()
}

/// Print a plain line to stdout.
pub fn echo(s: String) {
    let _ = io::stdout().execute(Print(s));
    let _ = io::stdout().flush();
}

/// Print a line to stdout in red, the way shell-surfaced errors are rendered.
pub fn error(s: String) {
    let _ = execute!(
        io::stdout(),
        SetForegroundColor(Color::Red),
        Print(s),
        ResetColor
    );
    let _ = io::stdout().flush();
}

#[macro_export]
macro_rules! echo {
    ($($arg:tt)*) => {
        $crate::console::echo(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::console::error(format!($($arg)*))
    };
}

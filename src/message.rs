use std::io::{BufRead, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Turn verbose reporting on or off for the rest of the process.
pub fn set_verbose(on: bool) {
    VERBOSE.store(on, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Normal informational output.
pub fn info(text: &str) {
    println!("{}", text);
}

/// Extra detail, only shown with `--verbose`.
pub fn verbose(text: &str) {
    if is_verbose() {
        println!("{}", text);
    }
}

/// Fatal problem, written to stderr before the process exits.
pub fn error(text: &str) {
    eprintln!("{} {}", "ERROR:".red().bold(), text);
}

/// Ask a yes/no question on the terminal. Only an exact `Y` answer
/// confirms; a non-interactive stdin declines.
pub fn confirm(question: &str) -> bool {
    if !std::io::stdin().is_terminal() {
        return false;
    }
    print!("{} [Y/n] ", question);
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim() == "Y"
}

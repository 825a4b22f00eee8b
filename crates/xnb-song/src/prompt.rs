//! Interactive prompting behind a small trait, so callers and tests can
//! substitute scripted input for the console.

use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::path::Path;

use crate::source::TaskType;

/// Line-oriented question/answer capability.
pub trait Prompt {
    /// Show `message` and read one line of input.
    ///
    /// Returns `Ok(None)` at end of input.
    fn ask_line(&mut self, message: &str) -> io::Result<Option<String>>;
}

/// [`Prompt`] over a reader/writer pair, normally stdin/stdout.
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<StdinLock<'static>, Stdout> {
    /// Prompt on the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R: BufRead, W: Write> Prompt for ConsolePrompt<R, W> {
    fn ask_line(&mut self, message: &str) -> io::Result<Option<String>> {
        writeln!(self.output, "{message}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Parse a typed duration: a non-negative integer number of milliseconds
/// that fits the 32-bit duration field.
pub fn parse_duration_ms(input: &str) -> Option<i64> {
    let value: i32 = input.trim().parse().ok()?;
    (value >= 0).then_some(i64::from(value))
}

/// Ask for the duration of `path` until a valid value is entered.
///
/// Returns `None` when input ends or cannot be read.
pub fn ask_duration_ms(prompt: &mut dyn Prompt, path: &Path) -> Option<i64> {
    let message = format!("Enter the duration of {} in milliseconds:", path.display());
    loop {
        match prompt.ask_line(&message) {
            Ok(Some(answer)) => match parse_duration_ms(&answer) {
                Some(ms) => return Some(ms),
                None => tracing::debug!(answer = %answer, "Rejected duration input"),
            },
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read duration input");
                return None;
            }
        }
    }
}

/// Show the task menu until a listed option is picked.
///
/// Returns [`TaskType::None`] when input ends.
pub fn ask_task(prompt: &mut dyn Prompt) -> io::Result<TaskType> {
    const MENU: &str = "Enter your option and press Enter/Return:\n1. Create Song .XNB";
    while let Some(answer) = prompt.ask_line(MENU)? {
        if answer.trim() == "1" {
            return Ok(TaskType::Song);
        }
    }
    Ok(TaskType::None)
}

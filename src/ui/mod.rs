//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - `scripted` - Pre-recorded answers for driving workflows in tests
//! - This module - The [Prompter] port and its interactive implementations

use std::cell::RefCell;
use std::io::{self, BufRead, Write};

use crate::error::{GitPromoteError, Result};

pub mod formatter;
pub mod scripted;

pub use formatter::{
    display_changelog, display_decision, display_error, display_manual_push_instruction,
    display_status, display_success, display_tag_plan, display_warning,
};
pub use scripted::{Answer, ScriptedPrompter};

/// Validation callback for free-text input; `Err` carries the message shown to the user
pub type Validator<'a> = &'a dyn Fn(&str) -> std::result::Result<(), String>;

/// Confirmation port used by the workflows at every blocking decision point
pub trait Prompter {
    /// Yes/no question; `default` is used when the user just presses Enter
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;

    /// Pick one of `options`, returning its index
    fn choose_one(&self, prompt: &str, options: &[String]) -> Result<usize>;

    /// Free-text input accepted only once `validate` passes
    fn input_text(
        &self,
        prompt: &str,
        default: Option<&str>,
        validate: Validator<'_>,
    ) -> Result<String>;
}

/// Line-based prompts on stdin/stdout
pub struct TerminalPrompter<R = io::StdinLock<'static>> {
    input: RefCell<R>,
}

impl TerminalPrompter {
    pub fn stdin() -> Self {
        TerminalPrompter {
            input: RefCell::new(io::stdin().lock()),
        }
    }
}

impl<R: BufRead> TerminalPrompter<R> {
    /// Prompter reading answers from any buffered reader
    pub fn with_input(input: R) -> Self {
        TerminalPrompter {
            input: RefCell::new(input),
        }
    }

    fn read_line(&self) -> Result<String> {
        io::stdout().flush()?;

        let mut line = String::new();
        let read = self.input.borrow_mut().read_line(&mut line)?;
        if read == 0 {
            return Err(GitPromoteError::prompt("input closed"));
        }
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead> Prompter for TerminalPrompter<R> {
    /// Accepts "y"/"yes" and "n"/"no" (case-insensitive); anything else takes the default.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        print!("\n{} ({}): ", prompt, hint);

        let response = self.read_line()?.to_lowercase();
        Ok(match response.as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default,
        })
    }

    /// Displays a numbered list and accepts a 1-based index; Enter picks the first option.
    fn choose_one(&self, prompt: &str, options: &[String]) -> Result<usize> {
        if options.is_empty() {
            return Err(GitPromoteError::prompt(format!("no options for '{}'", prompt)));
        }

        println!("\n{}", console::style(prompt).bold());
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }

        loop {
            print!("\nSelect (1-{}) [default: 1]: ", options.len());
            let selection = self.read_line()?;

            if selection.is_empty() {
                return Ok(0);
            }
            match selection.parse::<usize>() {
                Ok(index) if index > 0 && index <= options.len() => return Ok(index - 1),
                _ => display_error(&format!("Invalid selection '{}'", selection)),
            }
        }
    }

    /// Re-asks until the input passes validation; Enter takes `default` when given.
    fn input_text(
        &self,
        prompt: &str,
        default: Option<&str>,
        validate: Validator<'_>,
    ) -> Result<String> {
        loop {
            match default {
                Some(default) if !default.is_empty() => print!("\n{} [{}]: ", prompt, default),
                _ => print!("\n{}: ", prompt),
            }

            let mut input = self.read_line()?;
            if input.is_empty() {
                if let Some(default) = default {
                    input = default.to_string();
                }
            }

            match validate(&input) {
                Ok(()) => return Ok(input),
                Err(message) => display_error(&message),
            }
        }
    }
}

/// Non-interactive prompter for `--yes`: confirms everything and takes the first option.
///
/// Free-text input falls back to the default when it validates; otherwise the
/// prompt cannot be answered and the invocation stops with a validation error.
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm(&self, _prompt: &str, _default: bool) -> Result<bool> {
        Ok(true)
    }

    fn choose_one(&self, prompt: &str, options: &[String]) -> Result<usize> {
        if options.is_empty() {
            return Err(GitPromoteError::prompt(format!("no options for '{}'", prompt)));
        }
        Ok(0)
    }

    fn input_text(
        &self,
        prompt: &str,
        default: Option<&str>,
        validate: Validator<'_>,
    ) -> Result<String> {
        match default {
            Some(default) => validate(default)
                .map(|()| default.to_string())
                .map_err(GitPromoteError::validation),
            None => Err(GitPromoteError::validation(format!(
                "'{}' needs an answer but prompts are disabled",
                prompt
            ))),
        }
    }
}

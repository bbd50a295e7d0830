//! Pre-recorded answers for driving workflows without a terminal.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{GitPromoteError, Result};
use crate::ui::{Prompter, Validator};

/// One recorded answer, consumed in order by the matching prompt kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Confirm(bool),
    Choose(usize),
    Text(String),
}

/// [Prompter] answering from a fixed script.
///
/// Every prompt text is recorded so tests can check what was asked. Running
/// out of answers, or meeting an answer of the wrong kind, is a prompt error.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<Answer>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Answer>) -> Self {
        ScriptedPrompter {
            answers: RefCell::new(answers.into()),
            asked: RefCell::new(Vec::new()),
        }
    }

    /// Prompt texts in the order they were asked
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    /// Answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next(&self, prompt: &str) -> Result<Answer> {
        self.asked.borrow_mut().push(prompt.to_string());
        let answer = self.answers.borrow_mut().pop_front();
        answer.ok_or_else(|| {
            GitPromoteError::prompt(format!("no answer scripted for '{}'", prompt))
        })
    }
}

fn unexpected(prompt: &str, answer: &Answer) -> GitPromoteError {
    GitPromoteError::prompt(format!("unexpected answer {:?} for '{}'", answer, prompt))
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, prompt: &str, _default: bool) -> Result<bool> {
        match self.next(prompt)? {
            Answer::Confirm(value) => Ok(value),
            other => Err(unexpected(prompt, &other)),
        }
    }

    fn choose_one(&self, prompt: &str, options: &[String]) -> Result<usize> {
        match self.next(prompt)? {
            Answer::Choose(index) if index < options.len() => Ok(index),
            other => Err(unexpected(prompt, &other)),
        }
    }

    /// Scripted text is not retried: input failing `validate` is a validation error.
    fn input_text(
        &self,
        prompt: &str,
        default: Option<&str>,
        validate: Validator<'_>,
    ) -> Result<String> {
        let input = match self.next(prompt)? {
            Answer::Text(text) if text.is_empty() => default.unwrap_or_default().to_string(),
            Answer::Text(text) => text,
            other => return Err(unexpected(prompt, &other)),
        };

        validate(&input).map_err(GitPromoteError::validation)?;
        Ok(input)
    }
}

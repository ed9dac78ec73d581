//! Interactive confirmation and input.
//!
//! A run asks the operator before processing files, before replacing an
//! existing export, and for a start date when no previous export exists.

use std::collections::VecDeque;
use std::io::{BufRead, StdinLock, Stdout, Write};

use crate::core::LedgerError;

/// Answers the questions a run asks.
pub trait Operator {
    /// Ask a yes/no question; anything but `yes`/`y` is a no.
    fn confirm(&mut self, question: &str) -> Result<bool, LedgerError>;

    /// Ask for a free-form value, returned trimmed.
    fn prompt(&mut self, question: &str) -> Result<String, LedgerError>;
}

/// `yes` or `y`, case-insensitive, surrounding whitespace ignored.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")
}

/// Operator on a line-oriented terminal.
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl Terminal<StdinLock<'static>, Stdout> {
    /// Standard input and output.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    /// Create a terminal reading answers from `input`.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Result<String, LedgerError> {
        let io_err = |e| LedgerError::io("<terminal>", e);
        write!(self.output, "{question} ").map_err(io_err)?;
        self.output.flush().map_err(io_err)?;
        let mut line = String::new();
        self.input.read_line(&mut line).map_err(io_err)?;
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Operator for Terminal<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool, LedgerError> {
        let answer = self.ask(&format!("{question} (yes/no):"))?;
        Ok(is_yes(&answer))
    }

    fn prompt(&mut self, question: &str) -> Result<String, LedgerError> {
        self.ask(question)
    }
}

/// Operator replaying prepared answers, recording every question.
///
/// When the answers run out, confirmations are declined and prompts fail
/// with [`LedgerError::Input`].
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: VecDeque<String>,
    questions: Vec<String>,
}

impl ScriptedOperator {
    /// Create an operator giving `answers` in order.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            questions: Vec::new(),
        }
    }

    /// Questions asked so far, in order.
    pub fn questions(&self) -> &[String] {
        &self.questions
    }
}

impl Operator for ScriptedOperator {
    fn confirm(&mut self, question: &str) -> Result<bool, LedgerError> {
        self.questions.push(question.to_string());
        Ok(self.answers.pop_front().is_some_and(|a| is_yes(&a)))
    }

    fn prompt(&mut self, question: &str) -> Result<String, LedgerError> {
        self.questions.push(question.to_string());
        self.answers
            .pop_front()
            .map(|a| a.trim().to_string())
            .ok_or_else(|| LedgerError::Input(format!("no answer for '{question}'")))
    }
}

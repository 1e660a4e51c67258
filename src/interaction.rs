//! User interaction used to obtain dates the parsers could not infer.

use colored::*;
use dialoguer::Input;
use dialoguer::console::Term;
use indicatif::ProgressBar;
use std::collections::VecDeque;
use thiserror::Error;

/// Why an interaction did not yield an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    /// The user declined to answer (or the terminal went away).
    #[error("interaction aborted: {0}")]
    Aborted(String),
}

/// Something that can ask the user a question and return their answer.
pub trait Interaction {
    /// Asks `prompt` under a `title` banner, optionally showing `default_hint`.
    ///
    /// The hint is informational only; an empty answer is returned as an
    /// empty string.
    fn ask(
        &mut self,
        title: &str,
        prompt: &str,
        default_hint: Option<&str>,
    ) -> Result<String, InteractionError>;
}

/// Prompts on the terminal through `dialoguer`.
///
/// Answering `skip` aborts the question. A progress bar, if attached, is hidden
/// while the prompt is on screen.
#[derive(Debug, Default)]
pub struct ConsoleInteraction {
    progress: Option<ProgressBar>,
}

impl ConsoleInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspends `progress` whenever a prompt is shown.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    fn prompt(title: &str, prompt: &str, default_hint: Option<&str>) -> Result<String, InteractionError> {
        let term = Term::stderr();
        let _ = term.write_line("");
        let _ = term.write_line(&title.bold().to_string());
        if let Some(hint) = default_hint {
            let _ = term.write_line(&format!("    {}", hint.white().bold()));
        }

        let answer: String = Input::new()
            .with_prompt(format!("{} (or 'skip')", prompt))
            .allow_empty(true)
            .interact_text_on(&term)
            .map_err(|e| InteractionError::Aborted(e.to_string()))?;

        if answer.trim().eq_ignore_ascii_case("skip") {
            return Err(InteractionError::Aborted("skipped by user".to_string()));
        }
        Ok(answer)
    }
}

impl Interaction for ConsoleInteraction {
    fn ask(
        &mut self,
        title: &str,
        prompt: &str,
        default_hint: Option<&str>,
    ) -> Result<String, InteractionError> {
        match &self.progress {
            Some(progress) => progress.suspend(|| Self::prompt(title, prompt, default_hint)),
            None => Self::prompt(title, prompt, default_hint),
        }
    }
}

/// Replays canned answers; used by tests and non-interactive callers.
///
/// `None` entries simulate the user aborting. Once the script runs out every
/// further question is aborted.
#[derive(Debug, Default)]
pub struct ScriptedInteraction {
    answers: VecDeque<Option<String>>,
    asked: Vec<String>,
}

impl ScriptedInteraction {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(|a| a.map(Into::into)).collect(),
            asked: Vec::new(),
        }
    }

    /// Titles of every question asked so far, in order.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

impl Interaction for ScriptedInteraction {
    fn ask(
        &mut self,
        title: &str,
        _prompt: &str,
        _default_hint: Option<&str>,
    ) -> Result<String, InteractionError> {
        self.asked.push(title.to_string());
        self.answers
            .pop_front()
            .flatten()
            .ok_or_else(|| InteractionError::Aborted("no scripted answer".to_string()))
    }
}

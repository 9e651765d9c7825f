//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and user input handling

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use anyhow::Result;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_error, display_follow_up_links, display_lenses,
    display_plan, display_results, display_snapshot, display_status, display_success,
};

/// Questions the workflow asks the user while it runs.
///
/// One session object is owned by each command invocation and handed down as
/// `&mut dyn Interaction`, so the executor never talks to stdin directly.
pub trait Interaction {
    /// Asks a yes/no question. `Ok(false)` means the user declined.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;

    /// Asks before something that already exists is destroyed, such as a tag.
    fn confirm_overwrite(&mut self, prompt: &str) -> Result<bool> {
        self.confirm(prompt)
    }
}

/// Interaction through the terminal.
///
/// With `assume_yes` set every question is answered "yes" without prompting,
/// except overwrites: those follow `force_overwrite`, which defaults to "no".
pub struct TerminalSession {
    assume_yes: bool,
    force_overwrite: bool,
}

impl TerminalSession {
    pub fn new(assume_yes: bool) -> Self {
        TerminalSession {
            assume_yes,
            force_overwrite: false,
        }
    }

    /// Overwrite existing tags without asking
    pub fn with_force_overwrite(mut self, force: bool) -> Self {
        self.force_overwrite = force;
        self
    }
}

impl Interaction for TerminalSession {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        let stdin = io::stdin();
        confirm_action(prompt, &mut stdin.lock(), &mut io::stdout())
    }

    fn confirm_overwrite(&mut self, prompt: &str) -> Result<bool> {
        if self.force_overwrite {
            return Ok(true);
        }
        if self.assume_yes {
            return Ok(false);
        }
        self.confirm(prompt)
    }
}

/// Interaction with pre-recorded answers, for tests and non-interactive callers.
///
/// Answers are consumed in order; once they run out every question is declined.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    answers: VecDeque<bool>,
    prompts: Vec<String>,
}

impl ScriptedSession {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        ScriptedSession {
            answers: answers.into_iter().collect(),
            prompts: Vec::new(),
        }
    }

    /// Questions asked so far, in order
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Interaction for ScriptedSession {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front().unwrap_or(false))
    }
}

/// Prompts user to confirm an action with a yes/no prompt.
///
/// Displays the given prompt and accepts "y" or "yes" (case-insensitive) as confirmation.
/// Default is "no" if user presses Enter or input is closed.
///
/// # Arguments
/// * `prompt` - The prompt message to display (without the "(y/N): " suffix)
/// * `input` - Where the answer is read from
/// * `output` - Where the prompt is written to
///
/// # Returns
/// * `Ok(true)` - If user entered "y" or "yes"
/// * `Ok(false)` - Otherwise (including Enter, or "n"/"no")
/// * `Err` - If input error occurs
pub fn confirm_action<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    write!(output, "\n{} (y/N): ", prompt)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    let response = answer.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}

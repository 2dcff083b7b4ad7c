use std::io::IsTerminal;

use dialoguer::Input;
use tracing::warn;

/// Asks the user for a value the packs could not work out on their own.
pub trait VersionPrompt {
    /// Returns the answer, or `default` if the user gives none.
    fn ask(&self, prompt: &str, default: &str) -> String;
}

/// Interactive prompt on the controlling terminal.
///
/// Falls back to the default without asking when stdin is not a terminal.
pub struct TerminalPrompt;

impl VersionPrompt for TerminalPrompt {
    fn ask(&self, prompt: &str, default: &str) -> String {
        if !std::io::stdin().is_terminal() {
            return default.to_string();
        }

        match Input::<String>::new()
            .with_prompt(prompt)
            .default(default.to_string())
            .interact_text()
        {
            Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            Ok(_) => default.to_string(),
            Err(e) => {
                warn!(error = %e, "prompt failed, using default");
                default.to_string()
            }
        }
    }
}

/// Never asks; always answers with the default.
pub struct NoPrompt;

impl VersionPrompt for NoPrompt {
    fn ask(&self, _prompt: &str, default: &str) -> String {
        default.to_string()
    }
}

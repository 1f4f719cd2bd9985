//! Terminal front-end for the credential prompt.

use std::io::{BufRead, IsTerminal, Write};

use crossterm::style::Stylize;
use tracing::debug;

use super::OutputOptions;
use crate::api_client::AnalyzerApi;
use crate::classify::prompt::{CredentialPrompt, SubmitOutcome};
use crate::errors::AppError;
use crate::store::AppStore;

/// Shows the prompt and, when stdin is a terminal, reads keys until one is accepted
/// or the user submits an empty line (dismiss).
///
/// Returns whether a credential was accepted.
pub async fn run_credential_prompt(
    mut prompt: CredentialPrompt,
    api: &dyn AnalyzerApi,
    store: &AppStore,
    output: OutputOptions,
) -> Result<bool, AppError> {
    let mut err = std::io::stderr();
    let title = if output.color {
        prompt.title().bold().to_string()
    } else {
        prompt.title().to_string()
    };
    let _ = writeln!(err, "\n{title}\n{}", prompt.description());
    if let Some(alert) = prompt.alert() {
        let _ = writeln!(err, "  {alert}");
    }
    if let Some(message) = prompt.backend_message() {
        let _ = writeln!(err, "  Backend said: {message}");
    }

    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        let _ = writeln!(err, "Run `resume-analyzer key set <KEY>` and retry.");
        prompt.dismiss();
        return Ok(false);
    }

    while prompt.is_open() {
        let _ = write!(err, "OpenAI API key (empty to cancel): ");
        let _ = err.flush();

        let mut line = String::new();
        stdin
            .lock()
            .read_line(&mut line)
            .map_err(|e| AppError::Internal(e.into()))?;
        if line.trim().is_empty() {
            debug!("Credential prompt dismissed");
            prompt.dismiss();
            return Ok(false);
        }

        match prompt.submit(&line, api, store).await? {
            SubmitOutcome::Accepted => {
                let _ = writeln!(err, "API key saved successfully!");
                return Ok(true);
            }
            SubmitOutcome::Rejected(message) => {
                super::handlers::notify(output, &message);
            }
        }
    }
    Ok(false)
}

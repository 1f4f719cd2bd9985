use std::path::{Path, PathBuf};

use anyhow::Context;
use crossterm::style::{Color, Stylize};
use serde::Serialize;
use tracing::info;

use super::prompt::run_credential_prompt;
use super::{JobArgs, KeyAction, OutputOptions, StateAction, ThemeAction};
use crate::actions::{self, ActionError};
use crate::api_client::upload::ResumeFile;
use crate::api_client::{AnalyzerApi, GatewayError, GatewayErrorKind};
use crate::classify::prompt::{CredentialPrompt, SubmitOutcome};
use crate::classify::{FailureResponse, ProbeVerdict};
use crate::errors::AppError;
use crate::health::{run_startup_probe, ProbeOutcome};
use crate::report::{generate_report_markup, render_to_file, ExportFormat};
use crate::share::{result_id_from_link, share_link};
use crate::state::AppContext;
use crate::store::theme::{AmbientTheme, TerminalTheme};
use crate::store::{AppStore, ThemeSource};
use crate::view::{self, Palette};

// ────────────────────────────────────────────────────────────────────────────
// Output helpers
// ────────────────────────────────────────────────────────────────────────────

/// One-shot notification on stderr.
pub fn notify(output: OutputOptions, message: &str) {
    if output.color {
        eprintln!("{} {message}", "error:".with(Color::Red).bold());
    } else {
        eprintln!("error: {message}");
    }
}

fn palette(ctx: &AppContext, output: OutputOptions) -> Palette {
    if !output.color {
        return Palette::plain();
    }
    Palette {
        color: output.color,
        dark: ctx.store.is_dark_mode(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode JSON output")?;
    println!("{json}");
    Ok(())
}

fn read_text_file(path: &Path, what: &str) -> Result<String, AppError> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} from {}", path.display()))?;
    Ok(text)
}

fn job_text(job: JobArgs) -> Result<String, AppError> {
    match (job.job, job.job_file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => read_text_file(&path, "job description"),
        (None, None) => Ok(String::new()),
    }
}

fn read_resume(path: Option<PathBuf>) -> Result<Option<ResumeFile>, AppError> {
    path.map(|p| ResumeFile::read(&p)).transpose()
}

/// Shows the credential prompt for classified failures, then hands the error back.
async fn report_failure(ctx: &AppContext, output: OutputOptions, err: ActionError) -> AppError {
    if let FailureResponse::PromptForCredential(classification) = err.response() {
        let prompt = CredentialPrompt::open_for(Some(classification));
        match run_credential_prompt(prompt, &ctx.api, &ctx.store, output).await {
            Ok(true) => eprintln!("Retry the command to use the new key."),
            Ok(false) => {}
            Err(e) => return e,
        }
    }
    err.into()
}

// ────────────────────────────────────────────────────────────────────────────
// Commands
// ────────────────────────────────────────────────────────────────────────────

pub async fn cmd_analyze(
    ctx: &AppContext,
    output: OutputOptions,
    resume: Option<PathBuf>,
    job: JobArgs,
) -> Result<(), AppError> {
    let resume = read_resume(resume)?;
    let job = job_text(job)?;

    let result = match actions::submit_analysis(&ctx.api, &ctx.store, resume.as_ref(), &job).await
    {
        Ok(result) => result,
        Err(e) => return Err(report_failure(ctx, output, e).await),
    };

    if output.json {
        return print_json(&result);
    }
    eprintln!("Analysis completed successfully!");
    print!("{}", view::render_result(&result, palette(ctx, output)));
    Ok(())
}

pub async fn cmd_result(ctx: &AppContext, output: OutputOptions, id: &str) -> Result<(), AppError> {
    let result_id = result_id_from_link(id)?;
    let result = view::load_result(&result_id, &ctx.store, &ctx.api).await?;

    if output.json {
        return print_json(&result);
    }
    print!("{}", view::render_result(&result, palette(ctx, output)));
    Ok(())
}

pub async fn cmd_compare(
    ctx: &AppContext,
    output: OutputOptions,
    resume_1: Option<PathBuf>,
    resume_2: Option<PathBuf>,
    job: JobArgs,
) -> Result<(), AppError> {
    let resume_1 = read_resume(resume_1)?;
    let resume_2 = read_resume(resume_2)?;
    let job = job_text(job)?;

    let result =
        match actions::submit_comparison(&ctx.api, resume_1.as_ref(), resume_2.as_ref(), &job).await
        {
            Ok(result) => result,
            Err(e) => return Err(report_failure(ctx, output, e).await),
        };

    if output.json {
        return print_json(&result);
    }
    print!("{}", view::render_comparison(&result, palette(ctx, output)));
    Ok(())
}

pub async fn cmd_rewrite(
    ctx: &AppContext,
    output: OutputOptions,
    text: Option<String>,
    text_file: Option<PathBuf>,
    job: JobArgs,
) -> Result<(), AppError> {
    let section = match (text, text_file) {
        (Some(text), _) => text,
        (None, Some(path)) => read_text_file(&path, "section text")?,
        (None, None) => String::new(),
    };
    let job = job_text(job)?;

    let result = match actions::submit_rewrite(&ctx.api, &section, &job).await {
        Ok(result) => result,
        Err(e) => return Err(report_failure(ctx, output, e).await),
    };

    if output.json {
        return print_json(&result);
    }
    print!("{}", view::render_rewrite(&result, palette(ctx, output)));
    Ok(())
}

fn target_result_id(ctx: &AppContext, id: Option<&str>) -> Result<String, AppError> {
    match id {
        Some(id) => result_id_from_link(id),
        None => ctx
            .store
            .last_analysis()
            .map(|r| r.result_id)
            .ok_or_else(|| AppError::Validation("No analysis yet; pass a result id".to_string())),
    }
}

pub async fn cmd_export(
    ctx: &AppContext,
    id: Option<&str>,
    format: ExportFormat,
    out: &Path,
) -> Result<(), AppError> {
    let result_id = target_result_id(ctx, id)?;
    let result = view::load_result(&result_id, &ctx.store, &ctx.api).await?;

    let markup = generate_report_markup(&result);
    let path = render_to_file(&markup, out, format)?;

    eprintln!("Report exported successfully!");
    println!("{}", path.display());
    Ok(())
}

pub fn cmd_share(ctx: &AppContext, id: Option<&str>) -> Result<(), AppError> {
    let result_id = target_result_id(ctx, id)?;
    let link = share_link(&ctx.config.app_origin, &result_id)?;
    println!("{link}");
    Ok(())
}

pub async fn cmd_health(ctx: &AppContext, output: OutputOptions) -> Result<(), AppError> {
    let outcome = run_startup_probe(&ctx.api, &ctx.store, ctx.config.health_probe_delay).await;

    if output.json {
        #[derive(Serialize)]
        struct HealthReport<'a> {
            backend: &'a str,
            provider: Option<&'a str>,
        }
        let report = HealthReport {
            backend: match outcome {
                ProbeOutcome::BackendDown(_) => "down",
                ProbeOutcome::Provider(_) => "ok",
            },
            provider: ctx.store.provider_health_status().map(|s| s.as_str()),
        };
        print_json(&report)?;
    }

    match outcome {
        ProbeOutcome::BackendDown(message) => Err(GatewayError::new(
            GatewayErrorKind::Transport,
            format!("Backend unavailable at {}: {message}", ctx.api.base_url()),
        )
        .into()),
        ProbeOutcome::Provider(ProbeVerdict::Healthy) => {
            if !output.json {
                println!("Backend: ok");
                println!("AI provider: healthy");
            }
            Ok(())
        }
        ProbeOutcome::Provider(ProbeVerdict::Prompt(classification)) => {
            let prompt = CredentialPrompt::open_for(Some(classification));
            run_credential_prompt(prompt, &ctx.api, &ctx.store, output).await?;
            Ok(())
        }
        ProbeOutcome::Provider(ProbeVerdict::Notify(message)) => {
            notify(output, &message);
            Ok(())
        }
        ProbeOutcome::Provider(ProbeVerdict::Silent(_)) => {
            if !output.json {
                println!("Backend: ok");
                println!("AI provider: unavailable");
            }
            Ok(())
        }
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Validates `key` with the provider and stores it.
async fn save_key(key: &str, api: &dyn AnalyzerApi, store: &AppStore) -> Result<(), AppError> {
    let mut prompt = CredentialPrompt::open_for(None);
    match prompt.submit(key, api, store).await? {
        SubmitOutcome::Accepted => Ok(()),
        SubmitOutcome::Rejected(message) => Err(AppError::CredentialRejected(message)),
    }
}

pub async fn cmd_key(
    ctx: &AppContext,
    output: OutputOptions,
    action: KeyAction,
) -> Result<(), AppError> {
    match action {
        KeyAction::Set { key: Some(key) } => {
            save_key(&key, &ctx.api, &ctx.store).await?;
            println!("API key saved successfully!");
            Ok(())
        }
        KeyAction::Set { key: None } => {
            let accepted =
                run_credential_prompt(CredentialPrompt::open_for(None), &ctx.api, &ctx.store, output)
                    .await?;
            if accepted {
                Ok(())
            } else {
                Err(AppError::Validation("No API key saved".to_string()))
            }
        }
        KeyAction::Clear => {
            ctx.store.set_credential(None)?;
            info!("API key cleared");
            println!("API key removed");
            Ok(())
        }
        KeyAction::Show => {
            match ctx.store.credential() {
                Some(key) => println!("{}", mask(&key)),
                None => println!("No API key stored; the backend default is used"),
            }
            Ok(())
        }
    }
}

fn theme_name(dark: bool) -> &'static str {
    if dark {
        "dark"
    } else {
        "light"
    }
}

pub fn cmd_theme(ctx: &AppContext, action: ThemeAction) -> Result<(), AppError> {
    match action {
        ThemeAction::Toggle => {
            let dark = ctx.store.toggle_dark_mode()?;
            println!("{}", theme_name(dark));
        }
        ThemeAction::Show => {
            ctx.store.on_ambient_theme_change(TerminalTheme.prefers_dark());
            let source = match ctx.store.theme_source() {
                ThemeSource::Ambient => "follows terminal",
                ThemeSource::Manual => "chosen",
            };
            println!("{} ({source})", theme_name(ctx.store.is_dark_mode()));
        }
    }
    Ok(())
}

pub fn cmd_state(ctx: &AppContext, action: StateAction) -> Result<(), AppError> {
    match action {
        StateAction::Clear {
            analysis_only: true,
        } => {
            ctx.store.clear_last_analysis()?;
            println!("Cached analysis cleared");
            Ok(())
        }
        StateAction::Clear {
            analysis_only: false,
        } => {
            ctx.store.clear_persisted(&TerminalTheme)?;
            println!("Persisted state cleared");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api_client::types::{ProviderHealth, ProviderStatus};
    use crate::store::slot::MemorySlot;
    use crate::store::theme::FixedTheme;
    use crate::test_support::FakeApi;

    fn provider(status: ProviderStatus, message: Option<&str>) -> ProviderHealth {
        ProviderHealth {
            status,
            message: message.map(str::to_owned),
            model: None,
            error_type: None,
            error_detail: None,
        }
    }

    #[tokio::test]
    async fn test_save_key_reports_rejection_as_credential_error() {
        let api = FakeApi::default();
        api.provider_replies
            .lock()
            .unwrap()
            .push_back(Ok(provider(ProviderStatus::Error, Some("Incorrect API key provided"))));
        let store = AppStore::load(Arc::new(MemorySlot::default()), &FixedTheme(false));

        let err = save_key("sk-bad", &api, &store).await.unwrap_err();
        assert!(matches!(err, AppError::CredentialRejected(_)), "got {err:?}");
        assert_eq!(err.code(), "credential_rejected");
        assert!(err.to_string().contains("Incorrect API key provided"));
        assert_eq!(store.credential(), None);
    }

    #[tokio::test]
    async fn test_save_key_stores_accepted_key() {
        let api = FakeApi::default();
        api.provider_replies
            .lock()
            .unwrap()
            .push_back(Ok(provider(ProviderStatus::Healthy, None)));
        let store = AppStore::load(Arc::new(MemorySlot::default()), &FixedTheme(false));

        save_key("sk-good", &api, &store).await.unwrap();
        assert_eq!(store.credential().as_deref(), Some("sk-good"));
    }

    #[test]
    fn test_mask_hides_middle_of_key() {
        assert_eq!(mask("sk-abcdefghijklmnop"), "sk-...mnop");
        assert_eq!(mask("short"), "*****");
    }

    #[test]
    fn test_job_text_prefers_inline() {
        let job = JobArgs {
            job: Some("Python".into()),
            job_file: None,
        };
        assert_eq!(job_text(job).unwrap(), "Python");
        assert_eq!(job_text(JobArgs::default()).unwrap(), "");
    }

    #[test]
    fn test_job_text_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jd.txt");
        std::fs::write(&path, "Senior Engineer, Python, AWS").unwrap();
        let job = JobArgs {
            job: None,
            job_file: Some(path),
        };
        assert_eq!(job_text(job).unwrap(), "Senior Engineer, Python, AWS");
    }
}

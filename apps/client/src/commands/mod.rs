//! Command-line surface.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::errors::AppError;
use crate::report::ExportFormat;
use crate::state::AppContext;

mod handlers;
mod prompt;

/// AI Resume Analyzer - score a resume against a job description
#[derive(Parser, Debug)]
#[command(name = "resume-analyzer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Analyze, compare and improve resumes against a job description", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides RESUME_ANALYZER_API_URL)
    #[arg(global = true, long = "api-url")]
    pub api_url: Option<String>,

    /// Directory holding the persisted state file (overrides RESUME_ANALYZER_STATE_DIR)
    #[arg(global = true, long = "state-dir")]
    pub state_dir: Option<PathBuf>,

    /// Print results as JSON instead of the formatted view
    #[arg(global = true, long = "json")]
    pub json: bool,

    /// Disable coloured output
    #[arg(global = true, long = "no-color")]
    pub no_color: bool,

    /// Keep state in memory for this run only
    #[arg(global = true, long = "no-persist")]
    pub no_persist: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a resume against a job description
    Analyze {
        /// Resume PDF
        #[arg(long = "resume", short = 'r', value_name = "PATH")]
        resume: Option<PathBuf>,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Show a result by id or share link (served from cache when possible)
    Result {
        #[arg(value_name = "ID_OR_LINK")]
        id: String,
    },

    /// Compare two resumes against one job description
    Compare {
        #[arg(long = "resume-1", value_name = "PATH")]
        resume_1: Option<PathBuf>,

        #[arg(long = "resume-2", value_name = "PATH")]
        resume_2: Option<PathBuf>,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Ask the AI to rewrite one resume section
    Rewrite {
        /// Section text to improve
        #[arg(long = "text", conflicts_with = "text_file")]
        text: Option<String>,

        /// Read the section text from a file
        #[arg(long = "text-file", value_name = "PATH")]
        text_file: Option<PathBuf>,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Export a result as a report file
    Export {
        /// Result id or share link; defaults to the last analysis
        #[arg(value_name = "ID_OR_LINK")]
        id: Option<String>,

        #[arg(long = "format", short = 'f', value_enum, default_value_t = ExportFormat::Pdf)]
        format: ExportFormat,

        /// Output directory
        #[arg(long = "out", short = 'o', default_value = ".")]
        out: PathBuf,
    },

    /// Print the share link for a result
    Share {
        /// Result id; defaults to the last analysis
        #[arg(value_name = "ID")]
        id: Option<String>,
    },

    /// Check the backend and the AI provider
    Health,

    /// Manage the OpenAI API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Light/dark preference
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },

    /// Persisted state maintenance
    State {
        #[command(subcommand)]
        action: StateAction,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct JobArgs {
    /// Job description text
    #[arg(long = "job", short = 'j', conflicts_with = "job_file")]
    pub job: Option<String>,

    /// Read the job description from a file
    #[arg(long = "job-file", value_name = "PATH")]
    pub job_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum KeyAction {
    /// Validate a key with the provider and store it (prompts when omitted)
    Set {
        #[arg(value_name = "KEY")]
        key: Option<String>,
    },
    /// Forget the stored key
    Clear,
    /// Show whether a key is stored (masked)
    Show,
}

#[derive(Subcommand, Debug)]
pub enum ThemeAction {
    /// Flip between light and dark and remember the choice
    Toggle,
    Show,
}

#[derive(Subcommand, Debug)]
pub enum StateAction {
    /// Delete every persisted field
    Clear {
        /// Only forget the cached analysis; keep the key and theme
        #[arg(long = "analysis-only")]
        analysis_only: bool,
    },
}

/// Output options shared by every handler.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub color: bool,
}

impl Cli {
    /// Executes the command. Failures are reported to the user here and turned into
    /// a non-zero exit code.
    pub async fn run(self, ctx: AppContext) -> ExitCode {
        let output = OutputOptions {
            json: self.json,
            color: !self.no_color,
        };

        let result = match self.command {
            Commands::Analyze { resume, job } => handlers::cmd_analyze(&ctx, output, resume, job).await,
            Commands::Result { id } => handlers::cmd_result(&ctx, output, &id).await,
            Commands::Compare {
                resume_1,
                resume_2,
                job,
            } => handlers::cmd_compare(&ctx, output, resume_1, resume_2, job).await,
            Commands::Rewrite {
                text,
                text_file,
                job,
            } => handlers::cmd_rewrite(&ctx, output, text, text_file, job).await,
            Commands::Export { id, format, out } => {
                handlers::cmd_export(&ctx, id.as_deref(), format, &out).await
            }
            Commands::Share { id } => handlers::cmd_share(&ctx, id.as_deref()),
            Commands::Health => handlers::cmd_health(&ctx, output).await,
            Commands::Key { action } => handlers::cmd_key(&ctx, output, action).await,
            Commands::Theme { action } => handlers::cmd_theme(&ctx, action),
            Commands::State { action } => handlers::cmd_state(&ctx, action),
        };

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(output, &e),
        }
    }
}

/// The notification is the user-facing report; the log line is for debugging only.
fn fail(output: OutputOptions, err: &AppError) -> ExitCode {
    debug!(code = err.code(), "{err}");
    handlers::notify(output, &err.to_string());
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use clap::CommandFactory;

    use super::*;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failure_is_not_logged_at_default_level() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let output = OutputOptions {
                json: false,
                color: false,
            };
            let _ = fail(output, &AppError::Validation("Please upload your resume".into()));
        });

        assert!(logs.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_export_with_format() {
        let cli = Cli::try_parse_from([
            "resume-analyzer",
            "export",
            "r1",
            "--format",
            "html",
            "--out",
            "/tmp",
        ])
        .unwrap();
        match cli.command {
            Commands::Export { id, format, out } => {
                assert_eq!(id.as_deref(), Some("r1"));
                assert_eq!(format, ExportFormat::Html);
                assert_eq!(out, PathBuf::from("/tmp"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_job_text_and_file_conflict() {
        let err = Cli::try_parse_from([
            "resume-analyzer",
            "analyze",
            "--resume",
            "cv.pdf",
            "--job",
            "Python",
            "--job-file",
            "jd.txt",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["resume-analyzer", "key", "show", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Key { action: KeyAction::Show }));
    }
}

//! Live results view: what the terminal shows after an analysis, comparison or rewrite.

use std::fmt::Write as _;

use crossterm::style::{Color, Stylize};
use tracing::{debug, info};

use crate::api_client::types::{AnalysisResult, ComparisonResult, RewriteResult};
use crate::api_client::AnalyzerApi;
use crate::errors::AppError;
use crate::report::ScoreBand;
use crate::store::AppStore;

const BAR_WIDTH: usize = 30;

/// Resolves a result for display.
///
/// A cache hit on the store's last analysis makes no network call. Otherwise the
/// result is fetched and becomes the new cached analysis.
pub async fn load_result(
    result_id: &str,
    store: &AppStore,
    api: &dyn AnalyzerApi,
) -> Result<AnalysisResult, AppError> {
    if let Some(cached) = store.cached_result(result_id) {
        debug!(result_id, "Result served from cache");
        return Ok(cached);
    }

    let result = api.get_result(result_id).await.map_err(|e| {
        if e.is_not_found() {
            AppError::NotFound(format!("result '{result_id}'"))
        } else {
            e.into()
        }
    })?;

    store.set_last_analysis(result.clone())?;
    info!(result_id, "Result fetched");
    Ok(result)
}

/// Text styling for the terminal. `plain` drops every escape sequence.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub color: bool,
    pub dark: bool,
}

impl Palette {
    pub fn plain() -> Self {
        Self {
            color: false,
            dark: false,
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            let fg = if self.dark { Color::White } else { Color::Black };
            text.with(fg).bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn muted(&self, text: &str) -> String {
        self.paint(text, Color::DarkGrey)
    }
}

pub fn render_result(result: &AnalysisResult, palette: Palette) -> String {
    let band = ScoreBand::for_score(result.score);
    let mut out = String::new();

    let _ = writeln!(out, "{}", palette.heading("ATS Score"));
    let filled = (result.score.clamp(0, 100) as usize * BAR_WIDTH) / 100;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));
    let _ = writeln!(
        out,
        "  {}  {}  {}",
        palette.paint(&format!("{}%", result.score), band.terminal_color()),
        palette.paint(&bar, band.terminal_color()),
        palette.muted(band.label())
    );

    render_keywords(
        &mut out,
        "Matched Keywords",
        &result.matched_keywords,
        ScoreBand::Strong,
        palette,
    );
    render_keywords(
        &mut out,
        "Missing Keywords",
        &result.missing_keywords,
        ScoreBand::Weak,
        palette,
    );

    if !result.suggestions.is_empty() {
        let _ = writeln!(out, "\n{}", palette.heading("AI Suggestions"));
        for line in result.suggestions.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }

    let _ = writeln!(out, "\n{}", palette.muted(&format!("Result ID: {}", result.result_id)));
    out
}

fn render_keywords(
    out: &mut String,
    heading: &str,
    keywords: &[String],
    band: ScoreBand,
    palette: Palette,
) {
    if keywords.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}", palette.heading(&format!("{heading} ({})", keywords.len())));
    let badges: Vec<String> = keywords
        .iter()
        .map(|k| palette.paint(&format!("[{k}]"), band.terminal_color()))
        .collect();
    let _ = writeln!(out, "  {}", badges.join(" "));
}

pub fn render_comparison(result: &ComparisonResult, palette: Palette) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", palette.heading("Comparison"));
    for (label, score) in [
        ("Resume 1", result.resume_1_score),
        ("Resume 2", result.resume_2_score),
    ] {
        let band = ScoreBand::for_score(score);
        let _ = writeln!(
            out,
            "  {label}: {}",
            palette.paint(&format!("{score}%"), band.terminal_color())
        );
    }
    let _ = writeln!(out, "  Better match: {}", palette.heading(result.better_resume.label()));
    if !result.analysis_summary.is_empty() {
        let _ = writeln!(out, "\n{}", palette.heading("Summary"));
        for line in result.analysis_summary.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    out
}

pub fn render_rewrite(result: &RewriteResult, palette: Palette) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", palette.heading("Improved Text"));
    for line in result.improved_text.lines() {
        let _ = writeln!(out, "  {line}");
    }
    if !result.reasoning.is_empty() {
        let _ = writeln!(out, "\n{}", palette.heading("Reasoning"));
        for line in result.reasoning.lines() {
            let _ = writeln!(out, "  {}", palette.muted(line));
        }
    }
    out
}

//! Pure result → report transform. No I/O, no clock, no randomness.

use std::fmt::Write as _;

use super::band::ScoreBand;
use crate::api_client::types::AnalysisResult;

pub const REPORT_TITLE: &str = "AI Resume Analyzer";
pub const REPORT_SUBTITLE: &str = "Analysis Report";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordKind {
    Matched,
    Missing,
}

impl KeywordKind {
    pub fn heading(self) -> &'static str {
        match self {
            KeywordKind::Matched => "Matched Keywords",
            KeywordKind::Missing => "Missing Keywords",
        }
    }

    /// Badge colour: matched keywords use the strong band, missing ones the weak band.
    pub fn band(self) -> ScoreBand {
        match self {
            KeywordKind::Matched => ScoreBand::Strong,
            KeywordKind::Missing => ScoreBand::Weak,
        }
    }
}

/// One section of the report, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportBlock {
    Title { title: String, subtitle: String },
    Score { score: i32, band: ScoreBand },
    Keywords { kind: KeywordKind, keywords: Vec<String> },
    Suggestions(String),
    Footer { result_id: String },
}

/// The report as an ordered block list. Serializes deterministically to HTML and
/// is what the PDF renderer lays out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMarkup {
    pub result_id: String,
    pub blocks: Vec<ReportBlock>,
}

/// Builds the report for one analysis.
///
/// Sections are fixed in order: title, score, matched keywords, missing
/// keywords, suggestions, footer. Empty keyword lists and empty suggestion
/// text are left out entirely.
pub fn generate_report_markup(result: &AnalysisResult) -> ReportMarkup {
    let mut blocks = vec![
        ReportBlock::Title {
            title: REPORT_TITLE.to_string(),
            subtitle: REPORT_SUBTITLE.to_string(),
        },
        ReportBlock::Score {
            score: result.score,
            band: ScoreBand::for_score(result.score),
        },
    ];

    if !result.matched_keywords.is_empty() {
        blocks.push(ReportBlock::Keywords {
            kind: KeywordKind::Matched,
            keywords: result.matched_keywords.clone(),
        });
    }
    if !result.missing_keywords.is_empty() {
        blocks.push(ReportBlock::Keywords {
            kind: KeywordKind::Missing,
            keywords: result.missing_keywords.clone(),
        });
    }
    if !result.suggestions.is_empty() {
        blocks.push(ReportBlock::Suggestions(result.suggestions.clone()));
    }

    blocks.push(ReportBlock::Footer {
        result_id: result.result_id.clone(),
    });

    ReportMarkup {
        result_id: result.result_id.clone(),
        blocks,
    }
}

impl ReportMarkup {
    /// Standalone styled HTML document.
    pub fn html(&self) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(
            out,
            "<title>{} - {}</title>",
            escape_html(REPORT_SUBTITLE),
            escape_html(&self.result_id)
        );
        out.push_str("</head>\n<body>\n");
        out.push_str(
            "<div id=\"export-content\" style=\"font-family: Arial, sans-serif; padding: 20px; max-width: 800px; margin: 0 auto;\">\n",
        );
        for block in &self.blocks {
            render_block_html(&mut out, block);
        }
        out.push_str("</div>\n</body>\n</html>\n");
        out
    }
}

const HEADING_STYLE: &str = "color: #1f2937; margin-bottom: 15px; font-size: 18px;";

fn render_block_html(out: &mut String, block: &ReportBlock) {
    match block {
        ReportBlock::Title { title, subtitle } => {
            let _ = writeln!(
                out,
                "<div style=\"text-align: center; margin-bottom: 30px;\">\n\
                 <h1 style=\"color: #1f2937; margin-bottom: 10px;\">{}</h1>\n\
                 <p style=\"color: #6b7280; font-size: 14px;\">{}</p>\n</div>",
                escape_html(title),
                escape_html(subtitle)
            );
        }
        ReportBlock::Score { score, band } => {
            let color = band.hex();
            let bar = (*score).clamp(0, 100);
            let _ = writeln!(
                out,
                "<div class=\"score\" style=\"background: #f9fafb; padding: 20px; border-radius: 8px; margin-bottom: 30px;\">\n\
                 <h2 style=\"{HEADING_STYLE}\">ATS Score</h2>\n\
                 <div style=\"display: flex; align-items: center; gap: 20px;\">\n\
                 <div style=\"font-size: 48px; font-weight: bold; color: {color};\">{score}%</div>\n\
                 <div style=\"flex: 1; background: #e5e7eb; height: 20px; border-radius: 10px; overflow: hidden;\">\
                 <div style=\"background: {color}; height: 100%; width: {bar}%;\"></div></div>\n\
                 </div>\n</div>"
            );
        }
        ReportBlock::Keywords { kind, keywords } => {
            let class = match kind {
                KeywordKind::Matched => "matched-keywords",
                KeywordKind::Missing => "missing-keywords",
            };
            let _ = writeln!(
                out,
                "<div class=\"{class}\" style=\"margin-bottom: 30px;\">\n\
                 <h2 style=\"{HEADING_STYLE}\">{} ({})</h2>\n\
                 <div style=\"display: flex; flex-wrap: wrap; gap: 8px;\">",
                kind.heading(),
                keywords.len()
            );
            for keyword in keywords {
                let _ = writeln!(
                    out,
                    "<span style=\"background: {}; color: white; padding: 4px 12px; border-radius: 12px; font-size: 12px;\">{}</span>",
                    kind.band().hex(),
                    escape_html(keyword)
                );
            }
            out.push_str("</div>\n</div>\n");
        }
        ReportBlock::Suggestions(text) => {
            let _ = writeln!(
                out,
                "<div class=\"suggestions\" style=\"background: #fef3c7; border-left: 4px solid #f59e0b; padding: 15px; border-radius: 4px; margin-bottom: 30px;\">\n\
                 <h2 style=\"color: #1f2937; margin-bottom: 10px; font-size: 18px;\">AI Suggestions</h2>\n\
                 <p style=\"color: #374151; line-height: 1.6; white-space: pre-wrap;\">{}</p>\n</div>",
                escape_html(text)
            );
        }
        ReportBlock::Footer { result_id } => {
            let _ = writeln!(
                out,
                "<div class=\"footer\" style=\"text-align: center; margin-top: 40px; padding-top: 20px; border-top: 1px solid #e5e7eb; color: #6b7280; font-size: 12px;\">\n\
                 <p>Generated by {REPORT_TITLE}</p>\n\
                 <p style=\"margin-top: 8px; font-size: 11px;\">Result ID: {}</p>\n</div>",
                escape_html(result_id)
            );
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

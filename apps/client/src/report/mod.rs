//! Exportable report: pure markup generation plus PDF/HTML rendering.

pub mod band;
pub mod font_metrics;
pub mod markup;
pub mod render;

pub use band::ScoreBand;
pub use markup::generate_report_markup;
pub use render::render_to_file;

/// Output format for an exported report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Pdf,
    Html,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
        }
    }
}

/// `resume-analysis-{id}.{ext}`. Path separators in the id are replaced with `_`.
pub fn export_file_name(result_id: &str, format: ExportFormat) -> String {
    let id: String = result_id
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("resume-analysis-{}.{}", id, format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("r1", ExportFormat::Pdf), "resume-analysis-r1.pdf");
        assert_eq!(export_file_name("r1", ExportFormat::Html), "resume-analysis-r1.html");
        assert_eq!(export_file_name("../x", ExportFormat::Pdf), "resume-analysis-.._x.pdf");
    }
}

//! Score banding shared by the live results view and the exported report.

use crossterm::style::Color;

/// Three-tier banding of a compatibility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// 80 and above.
    Strong,
    /// 60–79.
    Moderate,
    /// Below 60.
    Weak,
}

impl ScoreBand {
    pub fn for_score(score: i32) -> Self {
        if score >= 80 {
            ScoreBand::Strong
        } else if score >= 60 {
            ScoreBand::Moderate
        } else {
            ScoreBand::Weak
        }
    }

    /// Colour used in the exported markup.
    pub fn hex(self) -> &'static str {
        match self {
            ScoreBand::Strong => "#22c55e",
            ScoreBand::Moderate => "#eab308",
            ScoreBand::Weak => "#ef4444",
        }
    }

    /// Same colour as `hex`, as 0.0–1.0 RGB components for PDF fill operators.
    pub fn rgb(self) -> [f32; 3] {
        match self {
            ScoreBand::Strong => [34.0 / 255.0, 197.0 / 255.0, 94.0 / 255.0],
            ScoreBand::Moderate => [234.0 / 255.0, 179.0 / 255.0, 8.0 / 255.0],
            ScoreBand::Weak => [239.0 / 255.0, 68.0 / 255.0, 68.0 / 255.0],
        }
    }

    /// Colour used by the live terminal view.
    pub fn terminal_color(self) -> Color {
        let [r, g, b] = self.rgb();
        Color::Rgb {
            r: (r * 255.0).round() as u8,
            g: (g * 255.0).round() as u8,
            b: (b * 255.0).round() as u8,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Strong => "strong match",
            ScoreBand::Moderate => "moderate match",
            ScoreBand::Weak => "weak match",
        }
    }
}

//! Report rendering: lays the block list out on A4 pages and writes the file.
//!
//! Layout (`layout_pages`) is pure and testable; only `render_to_file` touches
//! the filesystem. PDF encoding uses the base-14 Helvetica faces, so no font
//! files are embedded.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::info;

use super::band::ScoreBand;
use super::font_metrics::{get_metrics, FontFace};
use super::markup::{ReportBlock, ReportMarkup};
use super::{export_file_name, ExportFormat};
use crate::errors::AppError;

// A4 in points, 10 mm margins.
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 28.35;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const TITLE_SIZE: f32 = 22.0;
const SUBTITLE_SIZE: f32 = 11.0;
const HEADING_SIZE: f32 = 14.0;
const SCORE_SIZE: f32 = 32.0;
const BODY_SIZE: f32 = 11.0;
const BADGE_SIZE: f32 = 9.0;
const FOOTER_SIZE: f32 = 9.0;
const LINE_GAP: f32 = 1.4;
const SECTION_GAP: f32 = 18.0;
const BADGE_PAD_X: f32 = 6.0;
const BADGE_HEIGHT: f32 = 15.0;
const BADGE_GAP: f32 = 5.0;
const BAR_HEIGHT: f32 = 10.0;

const INK: [f32; 3] = [0.122, 0.161, 0.216];
const MUTED: [f32; 3] = [0.420, 0.447, 0.502];
const BODY: [f32; 3] = [0.216, 0.255, 0.318];
const TRACK: [f32; 3] = [0.898, 0.906, 0.922];
const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

/// One drawing primitive in page coordinates (origin bottom-left, points).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        face: FontFace,
        color: [f32; 3],
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: [f32; 3],
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        color: [f32; 3],
    },
}

/// Draw operations for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub ops: Vec<DrawOp>,
}

/// Top-down cursor that starts a new page when content would cross the bottom margin.
struct PageCursor {
    pages: Vec<PageLayout>,
    y: f32,
}

impl PageCursor {
    fn new() -> Self {
        Self {
            pages: vec![PageLayout::default()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Reserves `height` points, breaking the page first if needed.
    fn reserve(&mut self, height: f32) {
        let page_is_empty = self.pages.last().map(|p| p.ops.is_empty()).unwrap_or(true);
        if self.y - height < MARGIN && !page_is_empty {
            self.pages.push(PageLayout::default());
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    /// Emits one line of text and advances the cursor.
    fn line(&mut self, text: &str, size: f32, face: FontFace, color: [f32; 3], centered: bool) {
        let height = size * LINE_GAP;
        self.reserve(height);
        let x = if centered {
            MARGIN + (CONTENT_WIDTH - get_metrics(face).width_pt(text, size)).max(0.0) / 2.0
        } else {
            MARGIN
        };
        self.push(DrawOp::Text {
            x,
            y: self.y - size,
            size,
            face,
            color,
            text: text.to_string(),
        });
        self.y -= height;
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }
}

/// Lays the report out on as many A4 pages as it needs.
pub fn layout_pages(markup: &ReportMarkup) -> Vec<PageLayout> {
    let mut cursor = PageCursor::new();

    for block in &markup.blocks {
        match block {
            ReportBlock::Title { title, subtitle } => {
                cursor.line(title, TITLE_SIZE, FontFace::Bold, INK, true);
                cursor.line(subtitle, SUBTITLE_SIZE, FontFace::Regular, MUTED, true);
            }
            ReportBlock::Score { score, band } => {
                cursor.line("ATS Score", HEADING_SIZE, FontFace::Bold, INK, false);
                cursor.line(&format!("{score}%"), SCORE_SIZE, FontFace::Bold, band.rgb(), false);
                layout_score_bar(&mut cursor, *score, *band);
            }
            ReportBlock::Keywords { kind, keywords } => {
                let heading = format!("{} ({})", kind.heading(), keywords.len());
                cursor.line(&heading, HEADING_SIZE, FontFace::Bold, INK, false);
                layout_badges(&mut cursor, keywords, kind.band());
            }
            ReportBlock::Suggestions(text) => {
                cursor.line("AI Suggestions", HEADING_SIZE, FontFace::Bold, INK, false);
                let metrics = get_metrics(FontFace::Regular);
                // Line breaks in the suggestions are kept; blank lines become gaps.
                for paragraph in text.split('\n') {
                    let lines = metrics.wrap(paragraph, BODY_SIZE, CONTENT_WIDTH);
                    if lines.is_empty() {
                        cursor.gap(BODY_SIZE * LINE_GAP);
                        continue;
                    }
                    for line in lines {
                        cursor.line(&line, BODY_SIZE, FontFace::Regular, BODY, false);
                    }
                }
            }
            ReportBlock::Footer { result_id } => {
                cursor.reserve(SECTION_GAP + 2.0 * FOOTER_SIZE * LINE_GAP);
                cursor.push(DrawOp::Rule {
                    x1: MARGIN,
                    x2: PAGE_WIDTH - MARGIN,
                    y: cursor.y,
                    color: TRACK,
                });
                cursor.gap(FOOTER_SIZE);
                let id_line = format!("Result ID: {result_id}");
                for line in get_metrics(FontFace::Regular).wrap(&id_line, FOOTER_SIZE, CONTENT_WIDTH) {
                    cursor.line(&line, FOOTER_SIZE, FontFace::Regular, MUTED, true);
                }
            }
        }
        cursor.gap(SECTION_GAP);
    }

    cursor.pages
}

fn layout_score_bar(cursor: &mut PageCursor, score: i32, band: ScoreBand) {
    cursor.reserve(BAR_HEIGHT);
    let y = cursor.y - BAR_HEIGHT;
    cursor.push(DrawOp::Rect {
        x: MARGIN,
        y,
        width: CONTENT_WIDTH,
        height: BAR_HEIGHT,
        color: TRACK,
    });
    let filled = CONTENT_WIDTH * score.clamp(0, 100) as f32 / 100.0;
    if filled > 0.0 {
        cursor.push(DrawOp::Rect {
            x: MARGIN,
            y,
            width: filled,
            height: BAR_HEIGHT,
            color: band.rgb(),
        });
    }
    cursor.gap(BAR_HEIGHT);
}

/// Flows keyword badges left to right, wrapping onto new rows.
fn layout_badges(cursor: &mut PageCursor, keywords: &[String], band: ScoreBand) {
    let metrics = get_metrics(FontFace::Regular);
    let max_text = CONTENT_WIDTH - 2.0 * BADGE_PAD_X;
    let mut x = MARGIN;
    let mut row_open = false;

    for keyword in keywords {
        let text = truncate_to_width(keyword, max_text);
        let width = metrics.width_pt(&text, BADGE_SIZE) + 2.0 * BADGE_PAD_X;

        if !row_open || x + width > PAGE_WIDTH - MARGIN {
            if row_open {
                cursor.gap(BADGE_HEIGHT + BADGE_GAP);
            }
            cursor.reserve(BADGE_HEIGHT + BADGE_GAP);
            x = MARGIN;
            row_open = true;
        }

        let y = cursor.y - BADGE_HEIGHT;
        cursor.push(DrawOp::Rect {
            x,
            y,
            width,
            height: BADGE_HEIGHT,
            color: band.rgb(),
        });
        cursor.push(DrawOp::Text {
            x: x + BADGE_PAD_X,
            y: y + (BADGE_HEIGHT - BADGE_SIZE) / 2.0 + 1.0,
            size: BADGE_SIZE,
            face: FontFace::Regular,
            color: WHITE,
            text,
        });
        x += width + BADGE_GAP;
    }

    if row_open {
        cursor.gap(BADGE_HEIGHT + BADGE_GAP);
    }
}

fn truncate_to_width(text: &str, max_width: f32) -> String {
    let metrics = get_metrics(FontFace::Regular);
    if metrics.width_pt(text, BADGE_SIZE) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        out.push(c);
        if metrics.width_pt(&out, BADGE_SIZE) + metrics.width_pt("...", BADGE_SIZE) > max_width {
            out.pop();
            break;
        }
    }
    out.push_str("...");
    out
}

// ────────────────────────────────────────────────────────────────────────────
// PDF encoding
// ────────────────────────────────────────────────────────────────────────────

fn num(v: f32) -> Object {
    Object::Real(v.into())
}

fn color_operands(color: [f32; 3]) -> Vec<Object> {
    color.iter().copied().map(num).collect()
}

/// Base-14 fonts only cover Latin-1; anything else is drawn as `?`.
fn pdf_text(text: &str) -> Object {
    let bytes: Vec<u8> = text
        .chars()
        .map(|c| if (' '..='~').contains(&c) { c as u8 } else { b'?' })
        .collect();
    Object::string_literal(bytes)
}

fn page_operations(page: &PageLayout) -> Vec<Operation> {
    let mut ops = Vec::new();
    for op in &page.ops {
        match op {
            DrawOp::Text { x, y, size, face, color, text } => {
                ops.push(Operation::new("rg", color_operands(*color)));
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![Object::Name(face.resource_name().as_bytes().to_vec()), num(*size)],
                ));
                ops.push(Operation::new("Td", vec![num(*x), num(*y)]));
                ops.push(Operation::new("Tj", vec![pdf_text(text)]));
                ops.push(Operation::new("ET", vec![]));
            }
            DrawOp::Rect { x, y, width, height, color } => {
                ops.push(Operation::new("rg", color_operands(*color)));
                ops.push(Operation::new("re", vec![num(*x), num(*y), num(*width), num(*height)]));
                ops.push(Operation::new("f", vec![]));
            }
            DrawOp::Rule { x1, x2, y, color } => {
                ops.push(Operation::new("RG", color_operands(*color)));
                ops.push(Operation::new("w", vec![num(0.75)]));
                ops.push(Operation::new("m", vec![num(*x1), num(*y)]));
                ops.push(Operation::new("l", vec![num(*x2), num(*y)]));
                ops.push(Operation::new("S", vec![]));
            }
        }
    }
    ops
}

/// Encodes laid-out pages as PDF bytes.
pub fn render_pdf_bytes(pages: &[PageLayout]) -> Result<Vec<u8>, AppError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for face in [FontFace::Regular, FontFace::Bold] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page_operations(page),
        };
        let encoded = content
            .encode()
            .map_err(|e| AppError::Export(format!("failed to encode page content: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![num(0.0), num(0.0), num(PAGE_WIDTH), num(PAGE_HEIGHT)],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| AppError::Export(format!("failed to serialize PDF: {e}")))?;
    Ok(bytes)
}

/// Renders the report into `dir` under its deterministic file name.
///
/// Returns the path written.
pub fn render_to_file(
    markup: &ReportMarkup,
    dir: &Path,
    format: ExportFormat,
) -> Result<PathBuf, AppError> {
    let path = dir.join(export_file_name(&markup.result_id, format));

    let bytes = match format {
        ExportFormat::Pdf => {
            let pages = layout_pages(markup);
            info!(pages = pages.len(), "Rendering PDF report");
            render_pdf_bytes(&pages)?
        }
        ExportFormat::Html => markup.html().into_bytes(),
    };

    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::Export(format!("cannot create {}: {e}", dir.display())))?;
    std::fs::write(&path, bytes)
        .map_err(|e| AppError::Export(format!("cannot write {}: {e}", path.display())))?;

    info!("Report written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::markup::generate_report_markup;
    use crate::test_support::sample_result;

    fn texts(pages: &[PageLayout]) -> Vec<String> {
        pages
            .iter()
            .flat_map(|p| p.ops.iter())
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_short_report_fits_one_page() {
        let pages = layout_pages(&generate_report_markup(&sample_result("r1")));
        assert_eq!(pages.len(), 1);

        let texts = texts(&pages);
        assert_eq!(texts.first().map(String::as_str), Some("AI Resume Analyzer"));
        assert!(texts.contains(&"72%".to_string()));
        assert!(texts.contains(&"Python".to_string()));
        assert!(texts.contains(&"AWS".to_string()));
        assert_eq!(texts.last().map(String::as_str), Some("Result ID: r1"));
    }

    #[test]
    fn test_long_suggestions_paginate_within_margins() {
        let mut result = sample_result("r1");
        result.suggestions = (1..=200)
            .map(|i| format!("Suggestion {i}: quantify the impact of the migration work."))
            .collect::<Vec<_>>()
            .join("\n");

        let pages = layout_pages(&generate_report_markup(&result));

        assert!(pages.len() > 1, "expected pagination, got {} page(s)", pages.len());
        for page in &pages {
            assert!(!page.ops.is_empty());
            for op in &page.ops {
                if let DrawOp::Text { y, .. } = op {
                    assert!(*y >= MARGIN - 1.0 && *y <= PAGE_HEIGHT - MARGIN);
                }
            }
        }
        let all = texts(&pages);
        assert!(all.contains(&"Suggestion 200: quantify the impact of the migration work.".to_string()));
    }

    #[test]
    fn test_score_bar_width_tracks_score() {
        let mut result = sample_result("r1");
        result.score = 50;
        let pages = layout_pages(&generate_report_markup(&result));
        let bars: Vec<f32> = pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect { width, height, .. } if *height == BAR_HEIGHT => Some(*width),
                _ => None,
            })
            .collect();
        assert_eq!(bars.len(), 2);
        assert!((bars[1] - CONTENT_WIDTH / 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_many_badges_wrap_onto_rows() {
        let mut result = sample_result("r1");
        result.matched_keywords = (0..60).map(|i| format!("keyword-{i}")).collect();
        let pages = layout_pages(&generate_report_markup(&result));

        let badge_rows: std::collections::BTreeSet<i64> = pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect { y, height, .. } if *height == BADGE_HEIGHT => Some(*y as i64),
                _ => None,
            })
            .collect();
        assert!(badge_rows.len() > 1);
        for op in &pages[0].ops {
            if let DrawOp::Rect { x, width, .. } = op {
                assert!(x + width <= PAGE_WIDTH - MARGIN + 1e-3);
            }
        }
    }

    #[test]
    fn test_pdf_bytes_have_one_page_per_layout() {
        let mut result = sample_result("r1");
        result.suggestions = "Line\n".repeat(150);
        let pages = layout_pages(&generate_report_markup(&result));

        let bytes = render_pdf_bytes(&pages).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), pages.len());
    }

    #[test]
    fn test_render_to_file_names_output_by_result_id() {
        let dir = tempfile::tempdir().unwrap();
        let markup = generate_report_markup(&sample_result("r1"));

        let pdf = render_to_file(&markup, dir.path(), ExportFormat::Pdf).unwrap();
        let html = render_to_file(&markup, dir.path(), ExportFormat::Html).unwrap();

        assert_eq!(pdf.file_name().unwrap(), "resume-analysis-r1.pdf");
        assert_eq!(html.file_name().unwrap(), "resume-analysis-r1.html");
        assert!(std::fs::read(&pdf).unwrap().starts_with(b"%PDF"));
        assert_eq!(std::fs::read_to_string(&html).unwrap(), markup.html());
    }

    #[test]
    fn test_non_latin_text_is_replaced() {
        match pdf_text("naïve") {
            Object::String(bytes, _) => assert_eq!(bytes, b"na?ve".to_vec()),
            other => panic!("expected string object, got {other:?}"),
        }
    }

    #[test]
    fn test_truncate_to_width_appends_ellipsis() {
        let long = "k".repeat(400);
        let cut = truncate_to_width(&long, 100.0);
        assert!(cut.ends_with("..."));
        assert!(get_metrics(FontFace::Regular).width_pt(&cut, BADGE_SIZE) <= 100.0);
    }
}

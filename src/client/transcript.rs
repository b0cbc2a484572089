//! Export of the Q&A history as a paginated PDF transcript.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use genpdf::elements::PageBreak;
use genpdf::fonts::{FontData, FontFamily};
use genpdf::render::Area;
use genpdf::style::Style;
use genpdf::{Document, Element, Position, RenderResult};
use tracing::info;

use super::error::ClientError;
use super::session::HistoryEntry;

pub const DEFAULT_FILE_NAME: &str = "chat-answers.pdf";
pub const TITLE: &str = "AI Healthcare QA Answers";

/// Vertical positions in mm from the top edge of an A4 page.
const TITLE_Y: f64 = 10.0;
const FIRST_LINE_Y: f64 = 20.0;
const CONTINUATION_TOP_Y: f64 = 10.0;
const PAGE_BOTTOM_Y: f64 = 287.0;

const LINE_HEIGHT: f64 = 10.0;
const ENTRY_GAP: f64 = 5.0;

/// Characters per row; rows are wrapped as if the font were monospace.
const WRAP_COLUMNS: usize = 90;

const LEFT_X: f64 = 10.0;
const TITLE_SIZE: u8 = 14;
const BODY_SIZE: u8 = 10;
const MM_PER_PT: f64 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Title,
    Question,
    Answer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub y: f64,
    pub kind: LineKind,
    pub text: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

struct Layout {
    pages: Vec<Page>,
    y: f64,
}

impl Layout {
    fn place(&mut self, kind: LineKind, text: String) {
        if self.y > PAGE_BOTTOM_Y {
            self.pages.push(Page::default());
            self.y = CONTINUATION_TOP_Y;
        }
        if let Some(page) = self.pages.last_mut() {
            page.lines.push(PlacedLine { y: self.y, kind, text });
        }
        self.y += LINE_HEIGHT;
    }
}

/// Lay the history out onto pages: a title, then `Qn:`/`An:` rows.
pub fn layout(history: &[HistoryEntry]) -> Vec<Page> {
    let mut layout = Layout {
        pages: vec![Page {
            lines: vec![PlacedLine {
                y: TITLE_Y,
                kind: LineKind::Title,
                text: TITLE.to_string(),
            }],
        }],
        y: FIRST_LINE_Y,
    };

    for (idx, entry) in history.iter().enumerate() {
        let n = idx + 1;
        for row in wrap(&format!("Q{n}: {}", entry.question), WRAP_COLUMNS) {
            layout.place(LineKind::Question, row);
        }
        for row in wrap(&format!("A{n}: {}", entry.answer), WRAP_COLUMNS) {
            layout.place(LineKind::Answer, row);
        }
        layout.y += ENTRY_GAP;
    }

    layout.pages
}

/// Greedy word wrap. Words longer than a row are split; explicit newlines
/// always start a new row.
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut rows = Vec::new();

    for paragraph in text.split('\n') {
        let mut row = String::new();
        let mut row_len = 0;

        for word in paragraph.split_whitespace() {
            let mut chars: Vec<char> = word.chars().collect();

            while chars.len() > columns {
                if row_len > 0 {
                    rows.push(std::mem::take(&mut row));
                    row_len = 0;
                }
                let rest = chars.split_off(columns);
                rows.push(chars.into_iter().collect());
                chars = rest;
            }

            let needed = if row_len == 0 { chars.len() } else { row_len + 1 + chars.len() };
            if needed > columns {
                rows.push(std::mem::take(&mut row));
                row_len = 0;
            }
            if row_len > 0 {
                row.push(' ');
                row_len += 1;
            }
            row_len += chars.len();
            row.extend(chars);
        }

        rows.push(row);
    }

    rows
}

/// One laid-out page. Rows are printed at their own `y` (a baseline, in mm
/// from the page top) and the element claims the whole page.
struct PageRows(Vec<PlacedLine>);

impl Element for PageRows {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, genpdf::error::Error> {
        for line in &self.0 {
            let (style, size) = match line.kind {
                LineKind::Title => (Style::new().bold().with_font_size(TITLE_SIZE), TITLE_SIZE),
                LineKind::Question | LineKind::Answer => {
                    (Style::new().with_font_size(BODY_SIZE), BODY_SIZE)
                }
            };
            // Text is positioned by its top edge; one em above the baseline.
            let top = line.y - f64::from(size) * MM_PER_PT;
            if !area.print_str(&context.font_cache, Position::new(LEFT_X, top), style, &line.text)? {
                tracing::warn!(y = line.y, "Transcript row does not fit on the page");
            }
        }

        Ok(RenderResult {
            size: area.size(),
            has_more: false,
        })
    }
}

/// Renders transcripts with a TrueType family loaded from disk.
///
/// The directory must hold the family's four variants, named either
/// `<family>-Regular/-Bold/-Italic/-BoldItalic.ttf` (Liberation) or
/// `<family>/-Bold/-Oblique/-BoldOblique.ttf` (DejaVu).
#[derive(Debug, Clone)]
pub struct TranscriptExporter {
    font_dir: PathBuf,
    font_family: String,
}

impl Default for TranscriptExporter {
    fn default() -> Self {
        Self::new("/usr/share/fonts/truetype/liberation", "LiberationSans")
    }
}

impl TranscriptExporter {
    pub fn new(font_dir: impl Into<PathBuf>, font_family: impl Into<String>) -> Self {
        Self {
            font_dir: font_dir.into(),
            font_family: font_family.into(),
        }
    }

    pub fn export(&self, history: &[HistoryEntry], path: &Path) -> Result<(), ClientError> {
        self.write_pdf(history, path).map_err(ClientError::Export)
    }

    fn write_pdf(&self, history: &[HistoryEntry], path: &Path) -> Result<()> {
        info!(
            path = %path.display(),
            entries = history.len(),
            "Generating PDF transcript"
        );

        let font_family = self.load_font_family().with_context(|| {
            format!(
                "Failed to load font family {} from {}",
                self.font_family,
                self.font_dir.display()
            )
        })?;

        let mut doc = Document::new(font_family);
        doc.set_title(TITLE);
        doc.set_font_size(BODY_SIZE);

        for (page_idx, page) in layout(history).into_iter().enumerate() {
            if page_idx > 0 {
                doc.push(PageBreak::new());
            }
            doc.push(PageRows(page.lines));
        }

        doc.render_to_file(path)
            .with_context(|| format!("Failed to render PDF to {}", path.display()))?;

        info!(path = %path.display(), "PDF transcript saved");
        Ok(())
    }

    fn load_font_family(&self) -> Result<FontFamily<FontData>> {
        Ok(FontFamily {
            regular: self.load_variant(&["-Regular", ""])?,
            bold: self.load_variant(&["-Bold"])?,
            italic: self.load_variant(&["-Italic", "-Oblique"])?,
            bold_italic: self.load_variant(&["-BoldItalic", "-BoldOblique"])?,
        })
    }

    fn load_variant(&self, suffixes: &[&str]) -> Result<FontData> {
        let path = suffixes
            .iter()
            .map(|suffix| self.font_dir.join(format!("{}{suffix}.ttf", self.font_family)))
            .find(|path| path.is_file())
            .with_context(|| {
                format!("No {}{} font file found", self.font_family, suffixes[0])
            })?;

        let data = std::fs::read(&path)
            .with_context(|| format!("Failed to read font: {}", path.display()))?;
        FontData::new(data, None).with_context(|| format!("Failed to parse font: {}", path.display()))
    }
}

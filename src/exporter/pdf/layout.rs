//! Page layout of a report, independent of the PDF backend.
//!
//! Coordinates are millimetres from the bottom-left corner of a landscape
//! A4 page.

use super::{Block, Report, Table};

pub const PAGE_WIDTH: f32 = 297.0;
pub const PAGE_HEIGHT: f32 = 210.0;
pub const MARGIN: f32 = 15.0;

pub const TITLE_SIZE: f32 = 32.0;
pub const HEADING_SIZE: f32 = 18.0;
pub const SUBHEADING_SIZE: f32 = 14.0;
pub const TEXT_SIZE: f32 = 12.0;
pub const TABLE_SIZE: f32 = 8.0;

/// Millimetres per point.
const PT: f32 = 0.352_778;
/// Average Helvetica glyph width relative to the font size.
const GLYPH: f32 = 0.5;
const LEADING: f32 = 1.4;
const CELL_PADDING: f32 = 1.5;

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Text {
        text: String,
        size: f32,
        x: f32,
        y: f32,
        bold: bool,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<Op>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            Op::Text { text, .. } => Some(text.as_str()),
            Op::Rule { .. } => None,
        })
    }
}

/// Laid-out pages: the title page, the table of contents, then one run of
/// pages per section.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub pages: Vec<Page>,
    /// Section titles with their 1-based page numbers.
    pub toc: Vec<(String, usize)>,
}

fn line_height(size: f32) -> f32 {
    size * PT * LEADING
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * PT * GLYPH
}

/// Greedy word wrap to `width` millimetres; overlong words are split.
pub fn wrap(text: &str, width: f32, size: f32) -> Vec<String> {
    let capacity = ((width / (size * PT * GLYPH)) as usize).max(1);
    let mut lines = vec![];
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > capacity {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                lines.push(word.drain(..capacity).collect());
            }
            let word: String = word.into_iter().collect();
            let needed = line.chars().count() + word.chars().count() + usize::from(!line.is_empty());
            if needed > capacity && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }
    lines
}

struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![],
            y: 0.0,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.new_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Starts a new page unless `height` still fits.
    fn reserve(&mut self, height: f32) -> bool {
        if self.pages.is_empty() || self.y - height < MARGIN {
            self.new_page();
            return true;
        }
        false
    }

    fn text_at(&mut self, text: &str, size: f32, x: f32, bold: bool) {
        let y = self.y - size * PT;
        self.page().ops.push(Op::Text {
            text: String::from(text),
            size,
            x,
            y,
            bold,
        });
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        self.reserve(line_height(size));
        self.text_at(text, size, MARGIN, bold);
        self.y -= line_height(size);
    }

    fn paragraph(&mut self, text: &str, size: f32, bold: bool) {
        for line in wrap(text, PAGE_WIDTH - 2.0 * MARGIN, size) {
            self.line(&line, size, bold);
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn rule(&mut self) {
        let y = self.y;
        self.page().ops.push(Op::Rule {
            x1: MARGIN,
            x2: PAGE_WIDTH - MARGIN,
            y,
        });
    }

    fn row(&mut self, cells: &[String], widths: &[f32], bold: bool) -> f32 {
        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| wrap(cell, width - 2.0 * CELL_PADDING, TABLE_SIZE))
            .collect();
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let height = lines as f32 * line_height(TABLE_SIZE) + CELL_PADDING;
        let top = self.y;
        let mut x = MARGIN;
        for (cell, width) in wrapped.iter().zip(widths) {
            self.y = top - CELL_PADDING / 2.0;
            for line in cell {
                self.text_at(line, TABLE_SIZE, x + CELL_PADDING, bold);
                self.y -= line_height(TABLE_SIZE);
            }
            x += width;
        }
        self.y = top - height;
        self.rule();
        height
    }

    fn table(&mut self, table: &Table) {
        let columns = table.headers.len().max(1);
        let widths = vec![(PAGE_WIDTH - 2.0 * MARGIN) / columns as f32; columns];
        let header_height = wrap_height(&table.headers, &widths);
        self.reserve(header_height * 2.0);
        self.row(&table.headers, &widths, true);
        for row in &table.rows {
            if self.reserve(wrap_height(row, &widths)) {
                self.row(&table.headers, &widths, true);
            }
            self.row(row, &widths, false);
        }
        self.gap(line_height(TEXT_SIZE));
    }
}

fn wrap_height(cells: &[String], widths: &[f32]) -> f32 {
    let lines = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| wrap(cell, width - 2.0 * CELL_PADDING, TABLE_SIZE).len())
        .max()
        .unwrap_or(1)
        .max(1);
    lines as f32 * line_height(TABLE_SIZE) + CELL_PADDING
}

fn title_page(report: &Report) -> Page {
    let mut ops = vec![];
    let mut y = PAGE_HEIGHT * 0.6;
    for line in wrap(&report.title, PAGE_WIDTH - 2.0 * MARGIN, TITLE_SIZE) {
        ops.push(Op::Text {
            x: (PAGE_WIDTH - text_width(&line, TITLE_SIZE)) / 2.0,
            text: line,
            size: TITLE_SIZE,
            y,
            bold: true,
        });
        y -= line_height(TITLE_SIZE);
    }
    for line in [&report.subtitle, &report.generated].iter().filter(|s| !s.is_empty()) {
        ops.push(Op::Text {
            text: (*line).clone(),
            size: TEXT_SIZE,
            x: (PAGE_WIDTH - text_width(line, TEXT_SIZE)) / 2.0,
            y,
            bold: false,
        });
        y -= line_height(TEXT_SIZE) * 1.5;
    }
    Page { ops }
}

fn toc_lines_per_page() -> usize {
    let body = PAGE_HEIGHT - 2.0 * MARGIN - line_height(HEADING_SIZE) * 2.0;
    ((body / line_height(TEXT_SIZE)) as usize).max(1)
}

fn toc_pages(toc: &[(String, usize)]) -> Vec<Page> {
    let mut cursor = Cursor::new();
    for chunk in toc.chunks(toc_lines_per_page()) {
        cursor.new_page();
        cursor.line("Table of Contents", HEADING_SIZE, true);
        cursor.gap(line_height(HEADING_SIZE));
        for (title, page) in chunk {
            let number = page.to_string();
            cursor.text_at(
                &number,
                TEXT_SIZE,
                PAGE_WIDTH - MARGIN - text_width(&number, TEXT_SIZE),
                false,
            );
            cursor.line(title, TEXT_SIZE, false);
        }
    }
    if cursor.pages.is_empty() {
        cursor.new_page();
        cursor.line("Table of Contents", HEADING_SIZE, true);
    }
    cursor.pages
}

/// Lays out the whole report.
pub fn layout(report: &Report) -> Layout {
    let mut cursor = Cursor::new();
    let mut starts = vec![];
    for section in &report.sections {
        cursor.new_page();
        starts.push((section.title.clone(), cursor.pages.len() - 1));
        cursor.paragraph(&section.title, HEADING_SIZE, true);
        cursor.gap(line_height(TEXT_SIZE) / 2.0);
        for block in &section.blocks {
            match block {
                Block::Subheading(text) => {
                    cursor.gap(line_height(TEXT_SIZE) / 2.0);
                    cursor.paragraph(text, SUBHEADING_SIZE, true);
                }
                Block::Paragraph(text) => cursor.paragraph(text, TEXT_SIZE, false),
                Block::Table(table) => cursor.table(table),
            }
        }
    }

    let toc_count = toc_pages(&starts).len();
    let toc: Vec<(String, usize)> = starts
        .into_iter()
        .map(|(title, index)| (title, index + toc_count + 2))
        .collect();
    let mut pages = vec![title_page(report)];
    pages.extend(toc_pages(&toc));
    pages.extend(cursor.pages);
    Layout { pages, toc }
}

//! PDF reports: landscape A4 pages with a table of contents after the
//! title page.

pub use report::{model_report, project_report};

pub mod layout;

mod report;

use crate::{Error, Result};
use layout::{Op, PAGE_HEIGHT, PAGE_WIDTH};
use log::info;
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, Point};

/// Placeholder of an empty table cell.
pub const EMPTY_CELL: &str = "N/A";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        Self {
            headers: headers.iter().map(|h| String::from(h.as_ref())).collect(),
            rows: vec![],
        }
    }

    /// Appends a row; empty cells read `N/A`.
    pub fn push(&mut self, cells: Vec<String>) {
        self.rows.push(
            cells
                .into_iter()
                .map(|cell| {
                    if cell.trim().is_empty() {
                        String::from(EMPTY_CELL)
                    } else {
                        cell
                    }
                })
                .collect(),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Subheading(String),
    Paragraph(String),
    Table(Table),
}

/// Starts on a new page and gets an entry in the table of contents.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(title: &str, blocks: Vec<Block>) -> Self {
        Self {
            title: String::from(title),
            blocks,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub title: String,
    pub subtitle: String,
    /// Generation date shown on the title page.
    pub generated: String,
    pub sections: Vec<Section>,
}

impl Report {
    pub fn new(title: &str, subtitle: &str) -> Self {
        Self {
            title: String::from(title),
            subtitle: String::from(subtitle),
            generated: chrono::Local::now().format("%Y-%m-%d").to_string(),
            sections: vec![],
        }
    }

    pub fn section(&mut self, section: Section) -> &mut Self {
        self.sections.push(section);
        self
    }

    /// Renders the report to PDF bytes.
    pub fn to_pdf(&self) -> Result<Vec<u8>> {
        let layout = layout::layout(self);
        let (doc, first_page, first_layer) =
            PdfDocument::new(&self.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| Error::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| Error::Pdf(e.to_string()))?;

        let mut indices = vec![(first_page, first_layer)];
        for _ in 1..layout.pages.len() {
            indices.push(doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1"));
        }
        for (page, (page_index, layer_index)) in layout.pages.iter().zip(&indices) {
            let layer = doc.get_page(*page_index).get_layer(*layer_index);
            for op in &page.ops {
                match op {
                    Op::Text {
                        text,
                        size,
                        x,
                        y,
                        bold: is_bold,
                    } => {
                        let font: &IndirectFontRef = if *is_bold { &bold } else { &regular };
                        layer.use_text(text.as_str(), *size, Mm(*x), Mm(*y), font);
                    }
                    Op::Rule { x1, x2, y } => {
                        layer.set_outline_thickness(0.3);
                        layer.add_line(Line {
                            points: vec![
                                (Point::new(Mm(*x1), Mm(*y)), false),
                                (Point::new(Mm(*x2), Mm(*y)), false),
                            ],
                            is_closed: false,
                        });
                    }
                }
            }
        }
        for (title, number) in &layout.toc {
            if let Some((page_index, _)) = indices.get(number - 1) {
                doc.add_bookmark(title.as_str(), *page_index);
            }
        }
        let bytes = doc.save_to_bytes().map_err(|e| Error::Pdf(e.to_string()))?;
        info!("rendered `{}`: {} pages", self.title, layout.pages.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_cells() {
        let mut table = Table::new(&["Name", "ID"]);
        table.push(vec![String::from("Title"), String::new()]);
        assert_eq!(table.rows[0], vec!["Title", EMPTY_CELL]);
    }

    #[test]
    fn test_to_pdf() {
        let mut report = Report::new("Object", "Model report");
        let mut table = Table::new(&["Name"]);
        table.push(vec![String::from("Title")]);
        report
            .section(Section::new("Metadata", vec![Block::Table(table)]))
            .section(Section::new("Fields", vec![Block::Paragraph(String::from("No models found."))]));
        let bytes = report.to_pdf().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}

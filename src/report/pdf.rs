use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use crate::error::Error;

use super::{Report, Table};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const FOOTER_Y: f32 = 10.0;
const BODY_BOTTOM: f32 = 22.0;
const PT_TO_MM: f32 = 0.3528;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const TEXT_SIZE: f32 = 10.0;
const TABLE_SIZE: f32 = 8.0;

/// Lays text out top to bottom, starting a new page whenever the next line would run into
/// the footer.
struct PageWriter {
    doc: PdfDocumentReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    layers: Vec<PdfLayerReference>,
    cursor: f32,
}

impl PageWriter {
    fn new(title: &str) -> Result<PageWriter, Error> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(failed)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(failed)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(PageWriter {
            doc,
            regular,
            bold,
            layers: vec![layer],
            cursor: PAGE_HEIGHT - MARGIN,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "content");
        self.layers.push(self.doc.get_page(page).get_layer(layer));
        self.cursor = PAGE_HEIGHT - MARGIN;
    }

    fn line_height(size: f32) -> f32 {
        size * PT_TO_MM * 1.6
    }

    /// Moves down one line of `size`, breaking the page if needed, and returns the baseline.
    fn advance(&mut self, size: f32) -> f32 {
        let height = PageWriter::line_height(size);
        if self.cursor - height < BODY_BOTTOM {
            self.new_page();
        }
        self.cursor -= height;
        self.cursor
    }

    fn gap(&mut self, mm: f32) {
        self.cursor -= mm;
    }

    fn text(&mut self, text: &str, size: f32, bold: bool) {
        let y = self.advance(size);
        self.write_at(text, size, bold, MARGIN, y);
    }

    fn write_at(&self, text: &str, size: f32, bold: bool, x: f32, y: f32) {
        let font = if bold { &self.bold } else { &self.regular };
        if let Some(layer) = self.layers.last() {
            layer.use_text(text, size, Mm(x), Mm(y), font);
        }
    }

    fn row(&mut self, cells: &[String], bold: bool) {
        let columns = cells.len().max(1);
        let width = (PAGE_WIDTH - 2.0 * MARGIN) / columns as f32;
        let y = self.advance(TABLE_SIZE);
        for (i, cell) in cells.iter().enumerate() {
            let x = MARGIN + width * i as f32;
            self.write_at(&fit(cell, width, TABLE_SIZE), TABLE_SIZE, bold, x, y);
        }
    }

    fn table(&mut self, table: &Table) {
        self.row(&table.headers, true);
        for row in &table.rows {
            // repeat the header at the top of each continued page
            if self.cursor - PageWriter::line_height(TABLE_SIZE) < BODY_BOTTOM {
                self.new_page();
                self.row(&table.headers, true);
            }
            self.row(row, false);
        }
    }

    fn finish(self) -> Result<Vec<u8>, Error> {
        let pages = self.layers.len();
        for (i, layer) in self.layers.iter().enumerate() {
            let footer = format!("Page {} of {}", i + 1, pages);
            layer.use_text(
                footer,
                TABLE_SIZE,
                Mm(PAGE_WIDTH / 2.0 - 10.0),
                Mm(FOOTER_Y),
                &self.regular,
            );
        }

        self.doc.save_to_bytes().map_err(failed)
    }
}

/// Truncates `text` to roughly what fits in `width` millimeters of Helvetica at `size`.
fn fit(text: &str, width: f32, size: f32) -> String {
    let average_glyph = size * PT_TO_MM * 0.55;
    let max_chars = ((width - 2.0) / average_glyph).floor().max(1.0) as usize;

    if text.chars().count() <= max_chars {
        return text.to_owned();
    }

    let mut fitted: String = text.chars().take(max_chars.saturating_sub(2)).collect();
    fitted.push_str("..");
    fitted
}

fn failed(err: printpdf::Error) -> Error {
    Error::ReportGenerationFailed(err.to_string())
}

pub fn render(report: &Report) -> Result<Vec<u8>, Error> {
    let mut writer = PageWriter::new(&report.title)?;

    writer.text(&report.title, TITLE_SIZE, true);
    writer.text(
        &format!("Generated {}", report.generated_at.format("%Y-%m-%d %H:%M UTC")),
        TABLE_SIZE,
        false,
    );

    for section in &report.sections {
        writer.gap(4.0);
        writer.text(&section.heading, HEADING_SIZE, true);
        for (label, value) in &section.facts {
            writer.text(&format!("{}: {}", label, value), TEXT_SIZE, false);
        }
        if let Some(table) = &section.table {
            writer.gap(2.0);
            writer.table(table);
        }
    }

    writer.finish()
}

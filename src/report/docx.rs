use std::io::Cursor;

use docx_rs::{BreakType, Docx, Paragraph, Run, Table as DocxTable, TableCell, TableRow};

use crate::error::Error;

use super::{Report, Table};

// run sizes are in half-points
const TITLE_SIZE: usize = 36;
const HEADING_SIZE: usize = 28;
const NOTE_SIZE: usize = 18;

fn paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

fn styled(text: &str, size: usize, bold: bool) -> Paragraph {
    let run = Run::new().add_text(text).size(size);
    let run = if bold { run.bold() } else { run };
    Paragraph::new().add_run(run)
}

fn cell(text: &str, bold: bool) -> TableCell {
    let run = Run::new().add_text(text);
    let run = if bold { run.bold() } else { run };
    TableCell::new().add_paragraph(Paragraph::new().add_run(run))
}

fn table(table: &Table) -> DocxTable {
    let header = TableRow::new(table.headers.iter().map(|h| cell(h, true)).collect());
    let rows = table
        .rows
        .iter()
        .map(|row| TableRow::new(row.iter().map(|value| cell(value, false)).collect()));

    DocxTable::new(std::iter::once(header).chain(rows).collect())
}

pub fn render(report: &Report) -> Result<Vec<u8>, Error> {
    let mut docx = Docx::new()
        .add_paragraph(styled(&report.title, TITLE_SIZE, true))
        .add_paragraph(styled(
            &format!("Generated {}", report.generated_at.format("%Y-%m-%d %H:%M UTC")),
            NOTE_SIZE,
            false,
        ));

    for (i, section) in report.sections.iter().enumerate() {
        if i > 0 {
            docx = docx.add_paragraph(
                Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
            );
        }

        docx = docx.add_paragraph(styled(&section.heading, HEADING_SIZE, true));
        for (label, value) in &section.facts {
            docx = docx.add_paragraph(paragraph(&format!("{}: {}", label, value)));
        }
        if let Some(data) = &section.table {
            docx = docx.add_table(table(data));
        }
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|err| Error::ReportGenerationFailed(err.to_string()))?;

    Ok(buffer.into_inner())
}

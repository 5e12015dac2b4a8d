//! Downloadable campaign and dashboard reports.
//!
//! Reports are assembled once into a format-neutral [`Report`] from the same figures the
//! JSON endpoints return, then handed to one of the renderers.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::Error;

pub mod csv;
pub mod docx;
pub mod endpoints;
pub mod manager;
pub mod pdf;
pub use endpoints::*;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReportFormat {
    Csv,
    Pdf,
    Docx,
}

impl ReportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ReportFormat::Csv => "text/csv; charset=utf-8",
            ReportFormat::Pdf => "application/pdf",
            ReportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Pdf => "pdf",
            ReportFormat::Docx => "docx",
        }
    }

    pub fn render(self, report: &Report) -> Result<Vec<u8>, Error> {
        match self {
            ReportFormat::Csv => self::csv::render(report),
            ReportFormat::Pdf => pdf::render(report),
            ReportFormat::Docx => docx::render(report),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<ReportFormat, Error> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "pdf" => Ok(ReportFormat::Pdf),
            "docx" => Ok(ReportFormat::Docx),
            _ => Err(Error::InvalidReportFormat {
                format: s.to_owned(),
            }),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub heading: String,
    /// Label and value pairs shown above the table.
    pub facts: Vec<(String, String)>,
    pub table: Option<Table>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub title: String,
    /// Stem of the download name, without extension.
    pub file_stem: String,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<Section>,
}

impl Report {
    /// The table exported when a format only holds one.
    pub fn primary_table(&self) -> Option<&Table> {
        self.sections.iter().find_map(|section| section.table.as_ref())
    }

    pub fn file_name(&self, format: ReportFormat) -> String {
        format!("{}.{}", self.file_stem, format.extension())
    }
}

fn fact(label: &str, value: impl ToString) -> (String, String) {
    (label.to_string(), value.to_string())
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

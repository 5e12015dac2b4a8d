use ::csv::WriterBuilder;

use crate::error::Error;

use super::Report;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes the report's primary table, prefixed with a UTF-8 byte order mark so spreadsheet
/// applications pick the right encoding.
pub fn render(report: &Report) -> Result<Vec<u8>, Error> {
    let mut writer = WriterBuilder::new().from_writer(BOM.to_vec());

    if let Some(table) = report.primary_table() {
        writer.write_record(&table.headers).map_err(failed)?;
        for row in &table.rows {
            writer.write_record(row).map_err(failed)?;
        }
    }

    writer
        .into_inner()
        .map_err(|err| Error::ReportGenerationFailed(err.to_string()))
}

fn failed(err: ::csv::Error) -> Error {
    Error::ReportGenerationFailed(err.to_string())
}

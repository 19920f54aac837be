use std::path::{Path, PathBuf};

use capture_core::{WorkRecord, EXPORT_COLUMNS};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::persist::{AtomicFileWriter, PersistError};

pub const WORKSHEET_NAME: &str = "lists";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub jsonl_filename: String,
    pub workbook_filename: String,
    /// Optional CSV copy of the workbook sheet.
    pub table_filename: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            jsonl_filename: "lists.jsonl".to_string(),
            workbook_filename: "lists.xlsx".to_string(),
            table_filename: None,
        }
    }
}

impl ExportOptions {
    /// Every aggregate file name this configuration writes.
    pub fn filenames(&self) -> Vec<&str> {
        let mut names = vec![self.jsonl_filename.as_str(), self.workbook_filename.as_str()];
        names.extend(self.table_filename.as_deref());
        names
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub record_count: usize,
    pub jsonl_path: PathBuf,
    pub workbook_path: PathBuf,
    pub table_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("workbook error: {0}")]
    Workbook(#[from] XlsxError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Write the aggregate artifacts under `output_dir` from the same record set.
/// Each file is replaced atomically.
pub fn export_records(
    output_dir: &Path,
    records: &[WorkRecord],
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    let jsonl_path = writer.write(&options.jsonl_filename, &render_jsonl(records)?)?;
    let workbook_path = writer.write_bytes(&options.workbook_filename, &render_workbook(records)?)?;
    let table_path = match &options.table_filename {
        Some(name) => Some(writer.write_bytes(name, &render_table(records)?)?),
        None => None,
    };
    Ok(ExportSummary {
        record_count: records.len(),
        jsonl_path,
        workbook_path,
        table_path,
    })
}

/// One JSON object per line, keys in column order.
pub fn render_jsonl(records: &[WorkRecord]) -> Result<String, ExportError> {
    let mut buffer = String::new();
    for record in records {
        buffer.push_str(&serde_json::to_string(record)?);
        buffer.push('\n');
    }
    Ok(buffer)
}

/// Single-sheet workbook: a bold header row, then one row per record.
/// `Year` is numeric; every statistic stays the displayed text.
pub fn render_workbook(records: &[WorkRecord]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(WORKSHEET_NAME)?;

    for (col, name) in EXPORT_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }
    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write_number(row, 0, f64::from(record.year))?;
        for (offset, value) in record.text_columns().iter().enumerate() {
            sheet.write_string(row, offset as u16 + 1, *value)?;
        }
    }
    Ok(workbook.save_to_buffer()?)
}

/// CSV with a header row, UTF-8.
pub fn render_table(records: &[WorkRecord]) -> Result<Vec<u8>, ExportError> {
    let mut table = csv::Writer::from_writer(Vec::new());
    for record in records {
        table.serialize(record)?;
    }
    table.into_inner().map_err(|err| ExportError::Io(err.into_error()))
}

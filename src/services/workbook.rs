//! Spreadsheet template service.
//!
//! Loads xlsx templates from the configured directory, exposes the handful of
//! cell operations the exporters need and serializes the result as a
//! download.

use std::io::Cursor;
use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::config::ExportConfig;
use crate::{Error, Result};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A value ready to be written into one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Blank,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

/// Opens templates by file name.
#[derive(Debug, Clone)]
pub struct Templates {
    dir: PathBuf,
    password: String,
}

impl Templates {
    pub fn new(settings: &ExportConfig) -> Self {
        Self {
            dir: settings.templates_dir.clone(),
            password: settings.workbook_password.clone(),
        }
    }

    /// Load `name` from the templates directory.
    pub fn open(&self, name: &str) -> Result<Workbook> {
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(Error::Template(format!("{} not found", path.display())));
        }

        let book = umya_spreadsheet::reader::xlsx::read(&path)?;
        tracing::debug!(template = name, sheets = book.get_sheet_count(), "Template loaded");

        Ok(Workbook {
            book,
            password: self.password.clone(),
        })
    }
}

/// A template opened for writing.
pub struct Workbook {
    book: Spreadsheet,
    password: String,
}

impl Workbook {
    /// Wrap an in-memory spreadsheet. Used by tests and generated workbooks.
    pub fn from_spreadsheet(book: Spreadsheet, password: impl Into<String>) -> Self {
        Self {
            book,
            password: password.into(),
        }
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.book.get_sheet_by_name(name).is_some()
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|sheet| sheet.get_name().to_string())
            .collect()
    }

    /// Named sheet, if the template has it.
    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.book.get_sheet_by_name_mut(name)
    }

    /// Named sheet, falling back to the first one.
    pub fn sheet_or_first_mut(&mut self, name: &str) -> Result<&mut Worksheet> {
        if self.book.get_sheet_by_name(name).is_some() {
            return self
                .book
                .get_sheet_by_name_mut(name)
                .ok_or_else(|| Error::Workbook(format!("Sheet vanished: {}", name)));
        }
        self.first_sheet_mut()
    }

    pub fn first_sheet_mut(&mut self) -> Result<&mut Worksheet> {
        self.book
            .get_sheet_mut(&0)
            .ok_or_else(|| Error::Workbook("Template has no worksheets".into()))
    }

    pub fn remove_sheet(&mut self, name: &str) -> Result<()> {
        if !self.has_sheet(name) {
            return Ok(());
        }
        self.book
            .remove_sheet_by_name(name)
            .map_err(|e| Error::Workbook(format!("Cannot remove sheet {}: {}", name, e)))
    }

    /// Password-protect every sheet and serialize.
    pub fn finish(mut self, filename: impl Into<String>) -> Result<XlsxDownload> {
        for sheet in self.book.get_sheet_collection_mut().iter_mut() {
            sheet
                .get_sheet_protection_mut()
                .set_password(&self.password)
                .set_sheet(true);
        }

        let mut buffer = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&self.book, &mut buffer)?;

        Ok(XlsxDownload {
            filename: filename.into(),
            bytes: buffer.into_inner(),
        })
    }
}

/// Write one value into a sheet cell.
pub fn write_cell(sheet: &mut Worksheet, cell: &str, value: &CellValue) {
    let target = sheet.get_cell_mut(cell);
    match value {
        CellValue::Text(text) => {
            target.set_value_string(text.as_str());
        }
        CellValue::Number(number) => {
            target.set_value_number(*number);
        }
        CellValue::Blank => {
            target.set_value_string("");
        }
    }
}

pub fn write_text(sheet: &mut Worksheet, cell: &str, text: impl Into<String>) {
    sheet.get_cell_mut(cell).set_value_string(text.into());
}

pub fn write_number(sheet: &mut Worksheet, cell: &str, number: f64) {
    sheet.get_cell_mut(cell).set_value_number(number);
}

/// First row in `first..=last` whose `column` cell is empty.
pub fn first_empty_row(sheet: &Worksheet, column: &str, first: u32, last: u32) -> Option<u32> {
    (first..=last).find(|row| {
        sheet
            .get_cell(format!("{}{}", column, row).as_str())
            .map_or(true, |cell| cell.get_value().trim().is_empty())
    })
}

/// Finished workbook sent as an attachment.
#[derive(Debug)]
pub struct XlsxDownload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl IntoResponse for XlsxDownload {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.filename);
        let length = self.bytes.len();

        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, XLSX_CONTENT_TYPE)
            .header(header::CONTENT_DISPOSITION, disposition)
            .header(header::ACCESS_CONTROL_EXPOSE_HEADERS, "Content-Disposition")
            .header(header::CONTENT_LENGTH, length)
            .body(Body::from(self.bytes))
            .unwrap_or_else(|e| Error::Internal(e.to_string()).into_response())
    }
}

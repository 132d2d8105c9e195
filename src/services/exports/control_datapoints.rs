//! Control datapoint register export.

use chrono::NaiveDate;
use tracing::info;
use umya_spreadsheet::Worksheet;

use crate::db::{self, ControlDatapoint, DatapointFilter, DbPool};
use crate::services::formatting::format_date_dmy;
use crate::services::workbook::{
    first_empty_row, write_cell, write_number, CellValue, Templates, Workbook, XlsxDownload,
};
use crate::{Error, Result};

pub const TEMPLATE: &str = "Control-Datapoints.xlsx";

const DEFAULT_START_ROW: u32 = 10;

fn text(value: &Option<String>) -> CellValue {
    CellValue::text(value.clone().unwrap_or_default())
}

fn number(value: Option<f64>) -> CellValue {
    value.map_or(CellValue::Blank, CellValue::Number)
}

fn write_row(sheet: &mut Worksheet, row: u32, point: &ControlDatapoint) {
    write_number(sheet, &format!("A{}", row), point.id as f64);

    let cells = [
        ("B", text(&point.control_type)),
        ("C", text(&point.department)),
        ("D", text(&point.parameter_name)),
        ("E", number(point.target_value)),
        ("F", number(point.actual_value)),
        ("G", number(point.tolerance_min)),
        ("H", number(point.tolerance_max)),
        ("I", text(&point.status)),
        ("J", text(&point.remarks)),
        ("K", CellValue::text(format_date_dmy(&point.created_at))),
        ("L", text(&point.created_by_name)),
    ];
    for (column, value) in &cells {
        write_cell(sheet, &format!("{}{}", column, row), value);
    }
}

/// Write one row per datapoint from the first empty row of column A.
pub fn render(points: &[ControlDatapoint], workbook: &mut Workbook) -> Result<u32> {
    let sheet = workbook.first_sheet_mut()?;
    let start = first_empty_row(sheet, "A", 1, 50).unwrap_or(DEFAULT_START_ROW);

    for (offset, point) in points.iter().enumerate() {
        write_row(sheet, start + offset as u32, point);
    }
    Ok(start)
}

pub fn filename(today: NaiveDate) -> String {
    format!("Control-Datapoints-Export-{}.xlsx", today.format("%Y-%m-%d"))
}

pub async fn export_datapoints(
    pool: &DbPool,
    templates: &Templates,
    filter: &DatapointFilter,
    today: NaiveDate,
) -> Result<XlsxDownload> {
    let points = db::list_datapoints(pool, filter).await?;
    if points.is_empty() {
        return Err(Error::NotFound(
            "No control datapoints data found for the specified criteria".into(),
        ));
    }

    let mut workbook = templates.open(TEMPLATE)?;
    let start = render(&points, &mut workbook)?;

    info!(rows = points.len(), start_row = start, "Control datapoints exported");

    workbook.finish(filename(today))
}

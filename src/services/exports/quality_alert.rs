//! Quality alert export.
//!
//! Alerts are stacked as label/value blocks down the first sheet.

use chrono::NaiveDate;
use tracing::info;
use umya_spreadsheet::Worksheet;

use crate::db::{self, DbPool, QualityAlert};
use crate::services::formatting::{format_date_dmy, format_time_hhmm};
use crate::services::mapping::{field_text, Record};
use crate::services::workbook::{
    first_empty_row, write_number, write_text, Templates, Workbook, XlsxDownload,
};
use crate::{Error, Result};

pub const TEMPLATE: &str = "quality-alert-form.xlsx";

/// Rows between the starts of consecutive alerts.
const BLOCK_STRIDE: u32 = 15;
const DEFAULT_START_ROW: u32 = 10;

#[derive(Debug, Clone, Copy)]
enum Kind {
    Text,
    Date,
    Time,
}

/// One labelled value at a row offset from the block start.
struct Entry {
    offset: u32,
    label: &'static str,
    field: &'static str,
    kind: Kind,
}

const fn entry(offset: u32, label: &'static str, field: &'static str, kind: Kind) -> Entry {
    Entry {
        offset,
        label,
        field,
        kind,
    }
}

const INCIDENT: &[Entry] = &[
    entry(1, "Incident Title:", "incident_title", Kind::Text),
    entry(2, "Date of Occurrence:", "incident_date", Kind::Date),
    entry(3, "Time of Occurrence:", "incident_time", Kind::Time),
    entry(4, "Responsible Department:", "responsible_dept", Kind::Text),
    entry(5, "Location/Machine:", "location_area", Kind::Text),
    entry(6, "Type of Abnormality:", "abnormality_type", Kind::Text),
    entry(7, "Potential Quality Risk:", "quality_risk", Kind::Text),
    entry(8, "Kept in View:", "kept_in_view", Kind::Text),
    entry(9, "Incident Description:", "incident_desc", Kind::Text),
];

const PRODUCT: &[Entry] = &[
    entry(10, "Product Code:", "product_code", Kind::Text),
    entry(11, "Roll ID:", "roll_id", Kind::Text),
    entry(12, "Lot No:", "lot_no", Kind::Text),
    entry(13, "Roll Positions:", "roll_positions", Kind::Text),
    entry(14, "Lot Time:", "lot_time", Kind::Time),
    entry(15, "Shift:", "shift", Kind::Text),
];
const PRODUCT_TRIGGERS: &[&str] = &["product_code", "roll_id", "lot_no", "roll_positions"];

const ACTION: &[Entry] = &[
    entry(0, "Immediate Action:", "action_taken", Kind::Text),
    entry(1, "Action By:", "who_action", Kind::Text),
    entry(2, "Action Date:", "when_action_date", Kind::Date),
    entry(3, "Action Status:", "status_action", Kind::Text),
];
const ACTION_TRIGGERS: &[&str] = &["action_taken", "who_action", "when_action_date", "status_action"];

fn render_value(record: &Record, field: &str, kind: Kind) -> String {
    match (field_text(record, field), kind) {
        (None, _) => String::new(),
        (Some(text), Kind::Text) => text,
        (Some(text), Kind::Date) => format_date_dmy(&text),
        (Some(text), Kind::Time) => format_time_hhmm(&text),
    }
}

fn write_entries(
    sheet: &mut Worksheet,
    start: u32,
    entries: &[Entry],
    columns: (&str, &str),
    record: &Record,
) {
    for entry in entries {
        let row = start + entry.offset;
        write_text(sheet, &format!("{}{}", columns.0, row), entry.label);
        write_text(
            sheet,
            &format!("{}{}", columns.1, row),
            render_value(record, entry.field, entry.kind),
        );
    }
}

fn any_present(record: &Record, fields: &[&str]) -> bool {
    fields.iter().any(|f| field_text(record, f).is_some())
}

/// Write one alert block at `start`.
pub fn write_alert(sheet: &mut Worksheet, start: u32, alert: &QualityAlert) -> Result<()> {
    let record = alert.to_record()?;

    write_text(sheet, &format!("A{}", start), "Alert ID:");
    write_number(sheet, &format!("B{}", start), alert.id as f64);
    write_entries(sheet, start, INCIDENT, ("A", "B"), &record);

    if any_present(&record, PRODUCT_TRIGGERS) {
        write_entries(sheet, start, PRODUCT, ("A", "B"), &record);
    }
    if any_present(&record, ACTION_TRIGGERS) {
        write_entries(sheet, start, ACTION, ("D", "E"), &record);
    }

    let reporter = [
        ("Reported By:", alert.reporter_name.clone().unwrap_or_else(|| "Unknown".into())),
        (
            "User Department:",
            alert.reporter_department.clone().unwrap_or_else(|| "N/A".into()),
        ),
        ("Timestamp:", format_date_dmy(&alert.created_at)),
        ("Submission Status:", alert.submission_status.clone()),
    ];
    for (offset, (label, value)) in reporter.into_iter().enumerate() {
        let row = start + 4 + offset as u32;
        write_text(sheet, &format!("D{}", row), label);
        write_text(sheet, &format!("E{}", row), value);
    }

    Ok(())
}

/// Lay out every alert starting at the first empty row of column A.
pub fn render(alerts: &[QualityAlert], workbook: &mut Workbook) -> Result<u32> {
    let sheet = workbook.first_sheet_mut()?;
    let start = first_empty_row(sheet, "A", 1, 50).unwrap_or(DEFAULT_START_ROW);

    for (index, alert) in alerts.iter().enumerate() {
        write_alert(sheet, start + index as u32 * BLOCK_STRIDE, alert)?;
    }

    Ok(start)
}

pub fn filename(alert_id: Option<i64>, today: NaiveDate) -> String {
    match alert_id {
        Some(id) => format!("Quality_Alert_{}.xlsx", id),
        None => format!("Quality_Alerts_Export_{}.xlsx", today.format("%Y%m%d")),
    }
}

/// Export one alert, or every alert when `alert_id` is `None`.
pub async fn export_alerts(
    pool: &DbPool,
    templates: &Templates,
    alert_id: Option<i64>,
    today: NaiveDate,
) -> Result<XlsxDownload> {
    let alerts = match alert_id {
        Some(id) => match db::get_alert(pool, id).await {
            Ok(alert) => vec![alert],
            Err(Error::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        },
        None => db::list_alerts(pool).await?,
    };
    if alerts.is_empty() {
        return Err(Error::NotFound(
            "No data found for the specified alert(s)".into(),
        ));
    }

    let mut workbook = templates.open(TEMPLATE)?;
    let start = render(&alerts, &mut workbook)?;

    info!(alerts = alerts.len(), start_row = start, "Quality alerts exported");

    workbook.finish(filename(alert_id, today))
}

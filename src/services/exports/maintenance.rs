//! Maintenance exports: the job requisition (MJR) form and the machine
//! history card.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use umya_spreadsheet::Worksheet;

use crate::db::{self, DbPool, JobRequisition, RequisitionFilter};
use crate::services::formatting::{format_date_en_in, parse_date, sanitize_filename, slug_underscore};
use crate::services::mapping::{
    self, field_text, series_values, value_text, CellRule, Format, Record, SheetLayout,
};
use crate::services::workbook::{write_text, Templates, Workbook, XlsxDownload};
use crate::{Error, Result};

pub const MJR_TEMPLATE: &str = "maintenance-job-requisition.xlsx";
pub const HISTORY_CARD_TEMPLATE: &str = "machine-history-card.xlsx";

const TICK: &str = "✓";

// ============================================================================
// Job requisition form
// ============================================================================

const MJR_CELLS: &[CellRule] = &[
    CellRule::field("Q5", "requisition_no").or("N/A"),
    CellRule::field("D8", "occur_date").format(Format::Date),
    CellRule::field("F23", "requestor_name"),
    CellRule::field("C5", "req_dept"),
    CellRule::field("Q23", "req_dept_hod"),
    CellRule::field("C6", "equipment_name"),
    CellRule::field("C7", "equipment_no"),
    CellRule::field("Q6", "machine_no").or("N/A"),
    CellRule::field("S34", "purchase_req_no"),
    CellRule::field("H8", "occur_time").format(Format::Time),
    CellRule::field("V7", "require_completion_date").format(Format::Date),
    CellRule::field("V8", "completion_time").format(Format::Time),
    CellRule::field("V42", "total_hours").format(Format::Time),
    CellRule::field("C17", "existing_condition"),
];

const MJR_ACTION_CELLS: &[CellRule] = &[
    CellRule::field("C36", "correction"),
    CellRule::field("C37", "technician_name"),
    CellRule::field("C38", "material_retrieval"),
    CellRule::field("C40", "cleaning_inspection"),
    CellRule::field("D42", "schedule_start_date")
        .format(Format::Date)
        .or_keep(),
    CellRule::field("H42", "schedule_start_time")
        .format(Format::Time)
        .or_keep(),
    CellRule::field("M42", "schedule_end_date")
        .format(Format::Date)
        .or_keep(),
    CellRule::field("Q42", "schedule_end_time")
        .format(Format::Time)
        .or_keep(),
    CellRule::field("C48", "inspection_remarks"),
    CellRule::field("E52", "inspection_checked_by"),
    CellRule::field("U39", "clean_retr_checked_by"),
];

const MJR_LAYOUT: SheetLayout = SheetLayout {
    sheet: "MJR",
    when_any: &[],
    cells: MJR_CELLS,
    series: &[],
};

const MJR_ACTION_LAYOUT: SheetLayout = SheetLayout {
    sheet: "MJR",
    when_any: &[],
    cells: MJR_ACTION_CELLS,
    series: &[],
};

const BREAKDOWN_CODES: &[(&str, &str)] = &[
    ("A", "F11"),
    ("B", "I11"),
    ("C", "L11"),
    ("D", "O11"),
    ("E", "R11"),
    ("F", "U11"),
    ("G", "X11"),
    ("H", "F14"),
    ("I", "I14"),
    ("J", "L14"),
    ("K", "O14"),
    ("L", "R14"),
    ("M", "U14"),
    ("N", "X14"),
];

const POWER_OPTIONS: &[(&str, &str)] = &[("switchOffPower", "L25"), ("noSwitchPower", "L28")];
const MACHINE_OPTIONS: &[(&str, &str)] = &[("stopMachine", "X25"), ("noStopMachine", "X28")];
const HANDLE_BY: &[(&str, &str)] = &[("MT", "D32"), ("OTS", "I32"), ("BT", "L32")];

const CHECK_SETS: &[(&str, &[(&str, &str)])] = &[
    ("breakdown_codes", BREAKDOWN_CODES),
    ("power_options", POWER_OPTIONS),
    ("machine_options", MACHINE_OPTIONS),
    ("handle_by", HANDLE_BY),
];

const MATERIAL_FIRST_ROW: u32 = 45;
const MATERIAL_LAST_ROW: u32 = 53;
const MATERIAL_COLUMNS: &[(&str, &str)] = &[
    ("I", "material"),
    ("O", "specification"),
    ("T", "quantity_used"),
    ("W", "quantity_retrieved"),
];

/// Keys selected in a check-box set stored either as `["A", "B"]` or as
/// `{"A": true, "B": false}`.
pub fn checked_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_text).collect(),
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| matches!(v, Value::Bool(true)) || v.as_str() == Some("true"))
            .map(|(k, _)| k.clone())
            .collect(),
        _ => Vec::new(),
    }
}

fn write_check_sets(sheet: &mut Worksheet, record: &Record) -> usize {
    let mut written = 0;
    for (field, cells) in CHECK_SETS {
        let Some(value) = record.get(*field) else {
            continue;
        };
        for key in checked_keys(value) {
            if let Some((_, cell)) = cells.iter().find(|(k, _)| *k == key) {
                write_text(sheet, cell, TICK);
                written += 1;
            }
        }
    }
    written
}

fn write_materials(sheet: &mut Worksheet, record: &Record) -> usize {
    let Some(Value::Array(materials)) = record.get("materials_used") else {
        return 0;
    };
    let mut written = 0;
    for (row, material) in (MATERIAL_FIRST_ROW..=MATERIAL_LAST_ROW).zip(materials) {
        let Some(material) = material.as_object() else {
            continue;
        };
        for (column, key) in MATERIAL_COLUMNS {
            let text = field_text(material, key).unwrap_or_default();
            write_text(sheet, &format!("{}{}", column, row), text);
            written += 1;
        }
    }
    written
}

/// Write a requisition record into the MJR template's first sheet.
pub fn render_mjr(record: &Record, workbook: &mut Workbook) -> Result<usize> {
    let sheet = workbook.first_sheet_mut()?;
    let mut written = mapping::apply_to_sheet(sheet, &MJR_LAYOUT, record);

    if field_text(record, "form_type").as_deref() == Some("action") {
        written += mapping::apply_to_sheet(sheet, &MJR_ACTION_LAYOUT, record);
        match field_text(record, "inspection_result").as_deref() {
            Some("Accepted") => {
                write_text(sheet, "F43", TICK);
                write_text(sheet, "F45", "");
            }
            Some("Rejected") => {
                write_text(sheet, "F45", TICK);
                write_text(sheet, "F43", "");
            }
            _ => {}
        }
    }

    written += write_check_sets(sheet, record);
    written += write_materials(sheet, record);
    Ok(written)
}

pub fn mjr_filename(requisition: &JobRequisition, today: NaiveDate) -> String {
    let number = requisition
        .requisition_no
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(&requisition.id);
    sanitize_filename(&format!("MJR-{}-{}.xlsx", number.trim(), today.format("%Y-%m-%d")))
}

/// Export a single requisition on the MJR form.
pub async fn export_mjr(
    pool: &DbPool,
    templates: &Templates,
    id: &str,
    today: NaiveDate,
) -> Result<XlsxDownload> {
    let requisition = db::get_requisition(pool, id).await?;
    let record = requisition.to_record()?;

    let mut workbook = templates.open(MJR_TEMPLATE)?;
    let written = render_mjr(&record, &mut workbook)?;

    info!(id, form_type = %requisition.form_type, cells = written, "MJR exported");

    workbook.finish(mjr_filename(&requisition, today))
}

// ============================================================================
// Machine history card
// ============================================================================

const HISTORY_FIRST_ROW: u32 = 9;

/// One breakdown on the history card.
///
/// Also accepted from the portal, which posts rows with the original
/// column names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, alias = "occurdate")]
    pub occur_date: Option<String>,
    #[serde(default, alias = "requisitionno")]
    pub requisition_no: Option<String>,
    #[serde(default, alias = "breakdowncodes")]
    pub breakdown_codes: Value,
    #[serde(default, alias = "equipmentno")]
    pub equipment_no: Option<String>,
    #[serde(default, alias = "equipmentinstalldate")]
    pub equipment_install_date: Option<String>,
    #[serde(default, alias = "existingcondition")]
    pub existing_condition: Option<String>,
    #[serde(default, alias = "occurtime")]
    pub occur_time: Option<String>,
    #[serde(default, alias = "completiontime")]
    pub completion_time: Option<String>,
    #[serde(default, alias = "rootcause")]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub correction: Option<String>,
    #[serde(default, alias = "costincurred")]
    pub cost_incurred: Value,
    #[serde(default, alias = "technicianname")]
    pub technician_name: Option<String>,
    #[serde(default, alias = "inspectioncheckedby")]
    pub inspection_checked_by: Option<String>,
}

impl From<JobRequisition> for HistoryEntry {
    fn from(r: JobRequisition) -> Self {
        let breakdown_codes = serde_json::from_str(&r.breakdown_codes).unwrap_or(Value::Null);
        Self {
            occur_date: r.occur_date,
            requisition_no: r.requisition_no,
            breakdown_codes,
            equipment_no: r.equipment_no,
            equipment_install_date: r.equipment_install_date,
            existing_condition: r.existing_condition,
            occur_time: r.occur_time,
            completion_time: r.completion_time,
            root_cause: r.root_cause,
            correction: r.correction,
            cost_incurred: r.cost_incurred.map(Value::from).unwrap_or(Value::Null),
            technician_name: r.technician_name,
            inspection_checked_by: r.inspection_checked_by,
        }
    }
}

/// Body of the filtered history card export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryCardRequest {
    #[serde(default)]
    pub data: Vec<HistoryEntry>,
    #[serde(default)]
    pub selected_equipment_name: Option<String>,
    #[serde(default)]
    pub selected_equipment_id: Option<Value>,
    #[serde(default)]
    pub filter_summary: Option<Value>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn hhmm(value: &str) -> &str {
    value.get(..5).unwrap_or(value)
}

/// Breakdown codes as printed on the card.
pub fn breakdown_code_text(value: &Value) -> String {
    match value {
        Value::Array(_) => series_values(value)
            .into_iter()
            .filter_map(value_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => {
            let codes = checked_keys(value);
            if codes.is_empty() {
                "N/A".to_string()
            } else {
                codes.join(", ")
            }
        }
        other => value_text(other).unwrap_or_else(|| "N/A".to_string()),
    }
}

/// Breakdown duration as `Xh Ym`. A finish before the start is taken to be
/// on the next day.
pub fn breakdown_duration(start: &str, finish: &str) -> String {
    let parse = |t: &str| NaiveTime::parse_from_str(hhmm(t), "%H:%M").ok();
    let (Some(start), Some(finish)) = (parse(start), parse(finish)) else {
        return "N/A".to_string();
    };

    let mut minutes = (finish - start).num_minutes();
    if minutes < 0 {
        minutes += 24 * 60;
    }
    let (hours, minutes) = (minutes / 60, minutes % 60);

    match (hours, minutes) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

fn write_history_row(sheet: &mut Worksheet, row: u32, entry: &HistoryEntry) {
    let mut put = |column: &str, text: String| {
        write_text(sheet, &format!("{}{}", column, row), text);
    };

    if let Some(date) = non_empty(&entry.occur_date) {
        put("A", format_date_en_in(date));
    }
    if let Some(number) = non_empty(&entry.requisition_no) {
        put("B", number.to_string());
    }
    if mapping::is_truthy(Some(&entry.breakdown_codes)) {
        put("C", breakdown_code_text(&entry.breakdown_codes));
    }
    if let Some(no) = non_empty(&entry.equipment_no) {
        put("D", no.to_string());
    }
    if let Some(date) = non_empty(&entry.equipment_install_date) {
        put("E", format_date_en_in(date));
    }
    if let Some(text) = non_empty(&entry.existing_condition) {
        put("F", text.to_string());
    }
    let start = non_empty(&entry.occur_time);
    let finish = non_empty(&entry.completion_time);
    if let Some(start) = start {
        put("G", hhmm(start).to_string());
    }
    if let Some(finish) = finish {
        put("H", hhmm(finish).to_string());
    }
    if let (Some(start), Some(finish)) = (start, finish) {
        put("I", breakdown_duration(start, finish));
    }
    if let Some(text) = non_empty(&entry.root_cause) {
        put("J", text.to_string());
    }
    if let Some(text) = non_empty(&entry.correction) {
        put("K", text.to_string());
    }
    if mapping::is_truthy(Some(&entry.cost_incurred)) {
        if let Some(cost) = value_text(&entry.cost_incurred) {
            put("L", format!("₹{}", cost));
        }
    }
    if let Some(name) = non_empty(&entry.technician_name) {
        put("M", name.to_string());
    }
    if let Some(name) = non_empty(&entry.inspection_checked_by) {
        put("N", name.to_string());
    }
}

/// Write the card. `equipment_name` titles the sheet.
pub fn render_history_card(
    entries: &[HistoryEntry],
    equipment_name: Option<&str>,
    workbook: &mut Workbook,
) -> Result<()> {
    let sheet = workbook.sheet_or_first_mut("Page1")?;
    let title = equipment_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("All Equipment");
    write_text(sheet, "B5", title);

    for (offset, entry) in entries.iter().enumerate() {
        write_history_row(sheet, HISTORY_FIRST_ROW + offset as u32, entry);
    }
    Ok(())
}

pub fn history_card_filename(equipment_name: Option<&str>, rows: usize, today: NaiveDate) -> String {
    let date = today.format("%Y-%m-%d");
    match equipment_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Machine-History-Card-{}-{}.xlsx", slug_underscore(name), date),
        None => format!(
            "Machine-History-Card-All-Equipment-{}-Records-{}.xlsx",
            rows, date
        ),
    }
}

async fn export_history_card(
    templates: &Templates,
    entries: &[HistoryEntry],
    equipment_name: Option<&str>,
    today: NaiveDate,
) -> Result<XlsxDownload> {
    let mut workbook = templates.open(HISTORY_CARD_TEMPLATE)?;
    render_history_card(entries, equipment_name, &mut workbook)?;

    info!(
        rows = entries.len(),
        equipment = equipment_name.unwrap_or("all"),
        "Machine history card exported"
    );

    workbook.finish(history_card_filename(equipment_name, entries.len(), today))
}

/// History card for the requisitions matching `filter`.
pub async fn export_history_card_from_db(
    pool: &DbPool,
    templates: &Templates,
    filter: &RequisitionFilter,
    today: NaiveDate,
) -> Result<XlsxDownload> {
    let requisitions = db::list_requisitions(pool, filter).await?;
    if requisitions.is_empty() {
        return Err(Error::NotFound(
            "No machine history data found for export".into(),
        ));
    }
    let entries: Vec<HistoryEntry> = requisitions.into_iter().map(HistoryEntry::from).collect();
    export_history_card(templates, &entries, filter.equipment_name.as_deref(), today).await
}

/// History card for rows already filtered by the portal.
pub async fn export_history_card_from_rows(
    templates: &Templates,
    mut request: HistoryCardRequest,
    today: NaiveDate,
) -> Result<XlsxDownload> {
    if request.data.is_empty() {
        return Err(Error::InvalidInput(
            "No filtered data provided for export".into(),
        ));
    }
    request
        .data
        .sort_by_key(|entry| entry.occur_date.as_deref().and_then(parse_date));

    export_history_card(
        templates,
        &request.data,
        request.selected_equipment_name.as_deref(),
        today,
    )
    .await
}

//! Inline inspection report export.
//!
//! Lots are laid out roll by roll over up to three pages of the template,
//! with a blank separator row between lots and a roll summary per page.

use chrono::{Datelike, NaiveDate};
use serde_json::{json, Value};
use tracing::{debug, info};
use umya_spreadsheet::Worksheet;

use crate::db::{self, DbPool, InlineInspectionLot, LotFilter};
use crate::services::formatting::{clean_product_code, parse_date, sanitize_filename};
use crate::services::mapping::{
    self, field_text, numeric_value, plain_value, CellRule, Format, Record, SheetLayout,
};
use crate::services::workbook::{
    write_cell, write_number, write_text, CellValue, Templates, Workbook, XlsxDownload,
};
use crate::{Error, Result};

pub const TEMPLATE: &str = "Inline-inspection-form.xlsx";

const FIRST_ROW: u32 = 14;
const LAST_ROW: u32 = 83;
const PAGE_ROWS: usize = (LAST_ROW - FIRST_ROW + 1) as usize;
const PAGES: [&str; 3] = ["Page1", "Page2", "Page3"];

// ============================================================================
// Header
// ============================================================================

const HEADER_CELLS: &[CellRule] = &[
    CellRule::field("D5", "customer"),
    CellRule::field("D6", "production_no"),
    CellRule::field("D8", "prod_code"),
    CellRule::field("D9", "spec"),
    CellRule::field("N7", "year"),
    CellRule::field("P7", "month"),
    CellRule::field("R7", "date"),
    CellRule::field("T7", "mc_no"),
    CellRule::field("V7", "shift"),
    CellRule::field("AE6", "production_date").format(Format::Date),
    CellRule::field("AE7", "shift"),
    CellRule::field("AE8", "mc_no"),
    CellRule::field("L6", "printed").format(Format::Check),
    CellRule::field("L7", "non_printed").format(Format::Check),
    CellRule::field("L8", "ct").format(Format::Check),
    CellRule::field("F11", "emboss_type").format(Format::Equals("Random")),
    CellRule::field("I11", "emboss_type").format(Format::Equals("Matte")),
    CellRule::field("L11", "emboss_type").format(Format::Equals("Micro")),
];

const fn header_layout(sheet: &'static str) -> SheetLayout {
    SheetLayout {
        sheet,
        when_any: &[],
        cells: HEADER_CELLS,
        series: &[],
    }
}

const HEADER_LAYOUTS: [SheetLayout; 3] = [
    header_layout("Page1"),
    header_layout("Page2"),
    header_layout("Page3"),
];

/// Report header, merged from the exported lot and a sibling lot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub customer: String,
    pub production_no: String,
    pub prod_code: String,
    pub spec: String,
    pub mc_no: String,
    pub shift: String,
    pub production_date: Option<String>,
    pub emboss_type: String,
    pub printed: bool,
    pub non_printed: bool,
    pub ct: bool,
}

fn text_or(primary: &Option<String>, fallback: Option<&Option<String>>) -> String {
    primary
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| fallback.and_then(|f| f.as_deref()).filter(|s| !s.is_empty()))
        .unwrap_or_default()
        .to_string()
}

impl Header {
    /// Header values from `lot`, gaps filled from `sibling`.
    pub fn merge(lot: &InlineInspectionLot, sibling: Option<&InlineInspectionLot>) -> Self {
        Self {
            customer: text_or(&lot.customer, sibling.map(|s| &s.customer)),
            production_no: text_or(&lot.production_no, sibling.map(|s| &s.production_no)),
            prod_code: clean_product_code(&text_or(&lot.prod_code, sibling.map(|s| &s.prod_code))),
            spec: text_or(&lot.spec, sibling.map(|s| &s.spec)),
            mc_no: text_or(&lot.mc_no, sibling.map(|s| &s.mc_no)),
            shift: text_or(&lot.shift, sibling.map(|s| &s.shift)),
            production_date: Some(text_or(
                &lot.production_date,
                sibling.map(|s| &s.production_date),
            ))
            .filter(|d| !d.is_empty()),
            emboss_type: text_or(&lot.emboss_type, sibling.map(|s| &s.emboss_type)),
            printed: lot.printed || sibling.map_or(false, |s| s.printed),
            non_printed: lot.non_printed || sibling.map_or(false, |s| s.non_printed),
            ct: lot.ct || sibling.map_or(false, |s| s.ct),
        }
    }

    /// True when a header field the report needs is still blank.
    pub fn is_incomplete(lot: &InlineInspectionLot) -> bool {
        [
            &lot.customer,
            &lot.production_no,
            &lot.prod_code,
            &lot.spec,
            &lot.shift,
            &lot.mc_no,
        ]
        .iter()
        .any(|v| v.as_deref().map_or(true, str::is_empty))
    }

    /// Shift letter used in the filename.
    pub fn shift_letter(&self) -> String {
        match self.shift.as_str() {
            "" | "1" => "A".to_string(),
            "2" => "B".to_string(),
            "3" => "C".to_string(),
            other => other.to_string(),
        }
    }

    /// Cell record with placeholders for blanks and the date split into
    /// two-digit year, month and day.
    pub fn to_record(&self, today: NaiveDate) -> Record {
        fn or_default(value: &str, default: &str) -> String {
            if value.is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        }

        let day = self
            .production_date
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(today);

        let value = json!({
            "customer": or_default(&self.customer, "CUSTOMER"),
            "production_no": or_default(&self.production_no, "PROD-NO"),
            "prod_code": or_default(&self.prod_code, "PROD-CODE"),
            "spec": or_default(&self.spec, "SPEC"),
            "mc_no": or_default(&self.mc_no, "MC-NO"),
            "shift": or_default(&self.shift, "1"),
            "year": format!("{:02}", day.year() % 100),
            "month": format!("{:02}", day.month()),
            "date": format!("{:02}", day.day()),
            "production_date": self.production_date,
            "emboss_type": self.emboss_type,
            "printed": self.printed,
            "non_printed": self.non_printed,
            "ct": self.ct,
        });
        match value {
            Value::Object(map) => map,
            _ => Record::new(),
        }
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Rows a lot occupies: its rolls plus a separator unless it is last.
fn rows_needed(rolls: usize, is_last: bool) -> usize {
    rolls + usize::from(!is_last)
}

/// Split lots over the three pages.
///
/// Each lot goes on Page1 if it still fits there, else on Page2. The first
/// lot that fits on neither goes to Page3 together with every later lot.
pub fn plan_pages(roll_counts: &[usize]) -> [Vec<usize>; 3] {
    let mut pages: [Vec<usize>; 3] = Default::default();
    let mut used = [0usize; 2];

    for (index, &rolls) in roll_counts.iter().enumerate() {
        let needed = rows_needed(rolls, index + 1 == roll_counts.len());
        match (0..2).find(|&page| used[page] + needed <= PAGE_ROWS) {
            Some(page) => {
                used[page] += needed;
                pages[page].push(index);
            }
            None => {
                pages[2].extend(index..roll_counts.len());
                break;
            }
        }
    }

    pages
}

// ============================================================================
// Roll rows
// ============================================================================

const NUMBER_COLUMNS: &[(&str, &str)] = &[
    ("F", "roll_weight"),
    ("G", "roll_width"),
    ("H", "film_weight_gsm"),
    ("I", "thickness"),
    ("J", "roll_diameter"),
    ("L", "paper_core_od"),
];

const TEXT_COLUMNS: &[(&str, &str)] = &[
    ("K", "paper_core_id"),
    ("M", "lines_strips"),
    ("N", "glossy"),
    ("O", "film_color"),
    ("P", "pin_hole"),
    ("Q", "patch_mark"),
    ("R", "odour"),
    ("S", "ct_appearance"),
    ("T", "print_color"),
    ("U", "mis_print"),
    ("V", "dirty_print"),
    ("W", "tape_test"),
    ("X", "centralization"),
    ("Y", "wrinkles"),
    ("Z", "prs"),
    ("AA", "roll_curve"),
    ("AB", "core_misalignment"),
    ("AC", "others"),
];

fn roll_value(roll: &Record, key: &str, numeric: bool) -> CellValue {
    match roll.get(key) {
        Some(value) if numeric => numeric_value(value),
        Some(value) => plain_value(value),
        None => CellValue::Blank,
    }
}

fn lot_number(lot: &InlineInspectionLot) -> i64 {
    lot.rolls()
        .first()
        .and_then(|roll| field_text(roll, "lot_no"))
        .and_then(|n| n.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

fn status_mark(status: Option<String>) -> &'static str {
    match status.as_deref() {
        Some("Accept") => "O",
        Some("Reject") | Some("Rework") => "X",
        _ => "",
    }
}

/// Write one lot starting at `row`. Returns the next free row.
fn write_lot(sheet: &mut Worksheet, lot: &InlineInspectionLot, mut row: u32) -> u32 {
    let defects = lot.defect_name_map();
    let inspector = lot.inspected_by.clone().unwrap_or_default();
    let inspectors: Vec<&str> = inspector
        .split(|c| c == ',' || c == '\n' || c == '\r')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();

    for (index, roll) in lot.rolls().iter().enumerate() {
        if row > LAST_ROW {
            debug!(lot = %lot.id, "Page full, remaining rolls dropped");
            break;
        }
        let position = field_text(roll, "roll_position").unwrap_or_else(|| (index + 1).to_string());
        let cell = |column: &str| format!("{}{}", column, row);

        if index == 0 {
            write_cell(sheet, &cell("A"), &roll_value(roll, "hour", false));
            write_cell(sheet, &cell("B"), &roll_value(roll, "minute", false));
            let lot_no = field_text(roll, "lot_no")
                .map(|n| format!("{:0>2}", n))
                .unwrap_or_default();
            write_text(sheet, &cell("C"), lot_no);
            write_cell(sheet, &cell("E"), &roll_value(roll, "arm", false));
        }
        write_text(sheet, &cell("D"), position.as_str());

        for (column, key) in NUMBER_COLUMNS {
            write_cell(sheet, &cell(column), &roll_value(roll, key, true));
        }
        for (column, key) in TEXT_COLUMNS {
            write_cell(sheet, &cell(column), &roll_value(roll, key, false));
        }

        write_text(sheet, &cell("AD"), status_mark(field_text(roll, "accept_reject")));
        let defect = field_text(&defects, &position)
            .or_else(|| field_text(roll, "defect_name"))
            .unwrap_or_default();
        write_text(sheet, &cell("AE"), defect);

        if index < 2 {
            let name = inspectors.get(index).copied().unwrap_or_default();
            write_text(sheet, &cell("AF"), name);
        }

        row += 1;
    }

    row
}

/// Roll counts and weights summed over the lots on one page.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PageSummary {
    pub rolls: [i64; 4],
    pub weights: [f64; 4],
}

impl PageSummary {
    pub fn add(&mut self, lot: &InlineInspectionLot) {
        let rolls = [
            lot.accepted_rolls,
            lot.rejected_rolls,
            lot.rework_rolls,
            lot.kiv_rolls,
        ];
        let weights = [
            lot.accepted_weight,
            lot.rejected_weight,
            lot.rework_weight,
            lot.kiv_weight,
        ];
        for i in 0..4 {
            self.rolls[i] += rolls[i];
            self.weights[i] += weights[i];
        }
    }

    fn write(&self, sheet: &mut Worksheet) {
        for i in 0..4 {
            let row = 85 + i as u32;
            write_number(sheet, &format!("L{}", row), self.rolls[i] as f64);
            write_number(sheet, &format!("N{}", row), self.weights[i]);
        }
        write_number(sheet, "L89", self.rolls.iter().sum::<i64>() as f64);
        write_number(sheet, "N89", self.weights.iter().sum());
    }
}

fn write_page(sheet: &mut Worksheet, lots: &[&InlineInspectionLot]) -> PageSummary {
    let mut summary = PageSummary::default();
    let mut row = FIRST_ROW;
    for (index, lot) in lots.iter().enumerate() {
        summary.add(lot);
        row = write_lot(sheet, lot, row);
        if index + 1 < lots.len() && row <= LAST_ROW {
            row += 1;
        }
    }
    summary.write(sheet);
    summary
}

// ============================================================================
// Export
// ============================================================================

/// Download filename, `ILIF-{traceability}-{prod_code}-Shift-{letter}.xlsx`.
pub fn filename(traceability_code: &str, header: &Header) -> String {
    let code = if header.prod_code.is_empty() {
        "PROD-CODE"
    } else {
        header.prod_code.as_str()
    };
    sanitize_filename(&format!(
        "ILIF-{}-{}-Shift-{}.xlsx",
        traceability_code,
        code,
        header.shift_letter()
    ))
}

/// Lay the lots out over the template pages. Returns the page count.
pub fn render(
    lots: &mut [InlineInspectionLot],
    header: &Header,
    today: NaiveDate,
    workbook: &mut Workbook,
) -> Result<usize> {
    lots.sort_by_cached_key(lot_number);

    let roll_counts: Vec<usize> = lots.iter().map(|lot| lot.rolls().len()).collect();
    let plan = plan_pages(&roll_counts);
    let page_count = plan.iter().filter(|page| !page.is_empty()).count().max(1);

    let header_record = header.to_record(today);
    mapping::apply(&HEADER_LAYOUTS, &header_record, workbook);

    for (page, indices) in plan.iter().enumerate() {
        if page > 0 && indices.is_empty() {
            workbook.remove_sheet(PAGES[page])?;
            continue;
        }

        let sheet = if page == 0 {
            workbook.sheet_or_first_mut(PAGES[0])?
        } else {
            match workbook.sheet_mut(PAGES[page]) {
                Some(sheet) => sheet,
                None => {
                    debug!(sheet = PAGES[page], "Template has no sheet for overflow lots");
                    continue;
                }
            }
        };

        let page_lots: Vec<&InlineInspectionLot> = indices.iter().map(|&i| &lots[i]).collect();
        write_page(sheet, &page_lots);
        if page_count > 1 {
            write_text(sheet, "A1", format!("Page {} of {}", page + 1, page_count));
        }
    }

    Ok(page_count)
}

/// Export the lots matching `filter`.
pub async fn export_lots(
    pool: &DbPool,
    templates: &Templates,
    filter: &LotFilter,
    today: NaiveDate,
) -> Result<XlsxDownload> {
    let mut lots = db::list_lots(pool, filter).await?;
    let Some(target) = lots.first().cloned() else {
        return Err(Error::NotFound("No data found for the specified form".into()));
    };

    let sibling = if Header::is_incomplete(&target) {
        db::find_header_source(pool, &target.traceability_code, &target.id).await?
    } else {
        None
    };
    let header = Header::merge(&target, sibling.as_ref());

    let mut workbook = templates.open(TEMPLATE)?;
    let pages = render(&mut lots, &header, today, &mut workbook)?;

    info!(
        traceability_code = %target.traceability_code,
        lots = lots.len(),
        pages,
        "Inline inspection report exported"
    );

    workbook.finish(filename(&target.traceability_code, &header))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lot(lot_no: u32, rolls: usize) -> InlineInspectionLot {
        let rolls: Vec<Value> = (1..=rolls)
            .map(|i| {
                json!({
                    "lot_no": lot_no.to_string(),
                    "roll_position": i.to_string(),
                    "hour": "08",
                    "minute": "30",
                    "roll_weight": "25.4",
                    "accept_reject": if i == 2 { "Reject" } else { "Accept" },
                })
            })
            .collect();
        InlineInspectionLot {
            id: format!("lot-{}", lot_no),
            traceability_code: "T100".into(),
            lot_letter: "A".into(),
            customer: Some("P&G".into()),
            production_no: Some("PO-1".into()),
            prod_code: Some("168-18C (Jeddah)".into()),
            spec: Some("18 gsm".into()),
            production_date: Some("2025-02-07".into()),
            emboss_type: Some("Matte".into()),
            printed: true,
            non_printed: false,
            ct: false,
            year: None,
            month: None,
            date: None,
            mc_no: Some("3".into()),
            shift: Some("2".into()),
            production_type: None,
            inspected_by: Some("Anil, Meera".into()),
            inspection_data: json!({ "rolls": rolls }).to_string(),
            defect_names: json!({"2": "Wrinkle"}).to_string(),
            accepted_rolls: rolls.len() as i64 - 1,
            rejected_rolls: 1,
            rework_rolls: 0,
            kiv_rolls: 0,
            accepted_weight: 100.0,
            rejected_weight: 25.0,
            rework_weight: 0.0,
            kiv_weight: 0.0,
            created_at: "2025-02-07 10:00:00".into(),
        }
    }

    fn template() -> Workbook {
        let mut book = umya_spreadsheet::new_file();
        book.get_sheet_mut(&0).unwrap().set_name("Page1");
        book.new_sheet("Page2").unwrap();
        book.new_sheet("Page3").unwrap();
        Workbook::from_spreadsheet(book, "2256")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[rstest]
    #[case(&[10, 10], [vec![0, 1], vec![], vec![]])]
    #[case(&[69, 1], [vec![0], vec![1], vec![]])]
    #[case(&[70], [vec![0], vec![], vec![]])]
    #[case(&[60, 60, 60, 5], [vec![0], vec![1], vec![2, 3]])]
    fn test_plan_pages(#[case] counts: &[usize], #[case] expected: [Vec<usize>; 3]) {
        assert_eq!(plan_pages(counts), expected);
    }

    #[test]
    fn test_plan_pages_backfills_first_page() {
        assert_eq!(plan_pages(&[40, 40, 5]), [vec![0, 2], vec![1], vec![]]);
    }

    #[test]
    fn test_plan_pages_sends_rest_to_last_page() {
        // Lot 2 fits nowhere, so lot 3 follows it even though Page1 has room.
        assert_eq!(
            plan_pages(&[60, 60, 60, 2]),
            [vec![0], vec![1], vec![2, 3]]
        );
    }

    #[test]
    fn test_header_merge_fills_gaps_from_sibling() {
        let mut target = lot(1, 1);
        target.customer = None;
        target.shift = Some(String::new());
        let sibling = lot(2, 1);
        assert!(Header::is_incomplete(&target));

        let header = Header::merge(&target, Some(&sibling));
        assert_eq!(header.customer, "P&G");
        assert_eq!(header.shift, "2");
        assert_eq!(header.prod_code, "168-18C");
    }

    #[test]
    fn test_header_record_defaults_and_date_parts() {
        let record = Header::default().to_record(today());
        assert_eq!(record["customer"], "CUSTOMER");
        assert_eq!(record["shift"], "1");
        assert_eq!(record["year"], "25");
        assert_eq!(record["month"], "06");
        assert_eq!(record["date"], "01");
    }

    #[test]
    fn test_render_single_page() {
        let mut lots = vec![lot(2, 2), lot(1, 3)];
        let header = Header::merge(&lots[0], None);
        let mut wb = template();
        let pages = render(&mut lots, &header, today(), &mut wb).unwrap();
        assert_eq!(pages, 1);
        assert_eq!(wb.sheet_names(), vec!["Page1".to_string()]);

        let sheet = wb.sheet_mut("Page1").unwrap();
        assert_eq!(sheet.get_value("D8"), "168-18C");
        assert_eq!(sheet.get_value("N7"), "25");
        assert_eq!(sheet.get_value("L6"), "✔");
        assert_eq!(sheet.get_value("I11"), "✔");
        assert_eq!(sheet.get_value("F11"), "");
        assert_eq!(sheet.get_value("AE6"), "07/02/2025");
        assert_eq!(sheet.get_value("A1"), "");

        // Lot 01 sorts first: three rolls, a separator, then lot 02.
        assert_eq!(sheet.get_value("C14"), "01");
        assert_eq!(sheet.get_value("AF14"), "Anil");
        assert_eq!(sheet.get_value("AF15"), "Meera");
        assert_eq!(sheet.get_value("AD14"), "O");
        assert_eq!(sheet.get_value("AD15"), "X");
        assert_eq!(sheet.get_value("AE15"), "Wrinkle");
        assert_eq!(sheet.get_value("F14"), "25.4");
        assert_eq!(sheet.get_value("D17"), "");
        assert_eq!(sheet.get_value("C18"), "02");

        assert_eq!(sheet.get_value("L85"), "3");
        assert_eq!(sheet.get_value("L86"), "2");
        assert_eq!(sheet.get_value("L89"), "5");
    }

    #[test]
    fn test_render_overflows_to_second_page() {
        let mut lots = vec![lot(1, 60), lot(2, 20)];
        let header = Header::merge(&lots[0], None);
        let mut wb = template();
        let pages = render(&mut lots, &header, today(), &mut wb).unwrap();
        assert_eq!(pages, 2);
        assert_eq!(
            wb.sheet_names(),
            vec!["Page1".to_string(), "Page2".to_string()]
        );
        assert_eq!(wb.sheet_mut("Page1").unwrap().get_value("A1"), "Page 1 of 2");
        let page2 = wb.sheet_mut("Page2").unwrap();
        assert_eq!(page2.get_value("A1"), "Page 2 of 2");
        assert_eq!(page2.get_value("C14"), "02");
        assert_eq!(page2.get_value("D5"), "P&G");
    }

    #[rstest]
    #[case("1", "A")]
    #[case("2", "B")]
    #[case("3", "C")]
    #[case("", "A")]
    #[case("Night", "Night")]
    fn test_filename_shift_letter(#[case] shift: &str, #[case] letter: &str) {
        let header = Header {
            prod_code: "168-18C".into(),
            shift: shift.into(),
            ..Default::default()
        };
        assert_eq!(
            filename("T100", &header),
            format!("ILIF-T100-168-18C-Shift-{}.xlsx", letter)
        );
    }
}

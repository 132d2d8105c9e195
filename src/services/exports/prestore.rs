//! Pre-store checklist export.
//!
//! Any film inspection form can be printed on the generic pre-store sheet.

use tracing::info;

use crate::db::{self, DbPool};
use crate::services::formatting::{clean_product_code, sanitize_filename, wrap_words};
use crate::services::mapping::{
    self, field_text, CellRule, Fallback, Format, Record, SheetLayout, Source,
};
use crate::services::workbook::{write_text, Templates, Workbook, XlsxDownload};
use crate::Result;

pub const TEMPLATE: &str = "pre-store-form.xlsx";

const REMARKS_FIRST_ROW: u32 = 14;
const REMARKS_MAX_LINES: usize = 9;
const REMARKS_WIDTH: usize = 200;

/// Countersignature printed under every approval.
const PLANT_QA_HEAD: &str = "Bhushan Dessai";

const CELLS: &[CellRule] = &[
    CellRule::field("B4", "production_order").or_keep(),
    // Customer wins over the product code when both exist.
    CellRule::field("B5", "product_code")
        .format(Format::ProductCode)
        .or_keep(),
    CellRule::field("B5", "customer")
        .format(Format::WithSuffix("location"))
        .or_keep(),
    CellRule::field("B6", "standard_packing").or_keep(),
    CellRule::field("G4", "product_code")
        .format(Format::ProductCode)
        .or_keep(),
    CellRule::field("G5", "specification").or_keep(),
    CellRule::field("O4", "quantity").format(Format::Rolls).or_keep(),
    CellRule::field("O5", "batch").or_keep(),
    CellRule::field("T4", "production_date")
        .format(Format::Date)
        .or_keep(),
    CellRule::field("T5", "inspection_date")
        .format(Format::Date)
        .or_keep(),
    CellRule::field("P6", "pallet_size").or_if_present("N/A"),
    CellRule::field("C9", "pallet_list")
        .format(Format::Status)
        .or_if_present("N/A"),
    CellRule::field("P9", "product_label")
        .format(Format::Status)
        .or_if_present("N/A"),
    CellRule::field("C10", "wrapping")
        .format(Format::Status)
        .or_if_present("N/A"),
    CellRule::field("P10", "layer_pad")
        .format(Format::Status)
        .or_if_present("N/A"),
    CellRule::field("C11", "contamination")
        .format(Format::Status)
        .or_if_present("N/A"),
    CellRule::field("P11", "kraft_paper")
        .format(Format::Status)
        .or_if_present("N/A"),
    CellRule::field("C12", "no_damage")
        .format(Format::Status)
        .or_if_present("N/A"),
    CellRule::field("P12", "pallet")
        .format(Format::Status)
        .or_if_present("N/A"),
    CellRule::field("A29", "prestore_done_by").or_if_present("N/A"),
    CellRule::field("V3", "ref_no").or_if_present("N/A"),
    CellRule::sign_off("B33", "verified_date", "verified_by", "Not Verified"),
    CellRule::sign_off("E33", "approved_date", "approved_by", "Not Approved"),
    CellRule {
        cell: "I33",
        source: Source::SignOff {
            date: "approved_date",
            name: None,
            default_name: PLANT_QA_HEAD,
        },
        format: Format::Plain,
        fallback: Fallback::Keep,
        scope: None,
    },
];

/// Written to the template's first sheet whatever its name.
const LAYOUT: SheetLayout = SheetLayout {
    sheet: "Pre-Store",
    when_any: &[],
    cells: CELLS,
    series: &[],
};

fn is_approved(record: &Record) -> bool {
    field_text(record, "approved_by").map_or(false, |name| {
        let name = name.trim();
        !name.is_empty() && name != "N/A" && name != "Not Approved"
    })
}

/// Download filename, `Pre-Store-{code}-.xlsx`.
pub fn filename(record: &Record) -> String {
    let code = field_text(record, "product_code")
        .map(|code| clean_product_code(&code))
        .unwrap_or_else(|| "UNKNOWN".to_string());
    sanitize_filename(&format!("Pre-Store-{}-.xlsx", code))
}

/// Write a form record into the pre-store template.
pub fn render(record: &Record, workbook: &mut Workbook) -> Result<usize> {
    let sheet = workbook.first_sheet_mut()?;
    let mut written = mapping::apply_to_sheet(sheet, &LAYOUT, record);

    if record.contains_key("remarks") {
        let remarks = field_text(record, "remarks").unwrap_or_default();
        for (offset, line) in wrap_words(&remarks, REMARKS_WIDTH, REMARKS_MAX_LINES)
            .into_iter()
            .enumerate()
        {
            write_text(sheet, &format!("A{}", REMARKS_FIRST_ROW + offset as u32), line);
            written += 1;
        }
    }

    if is_approved(record) {
        write_text(sheet, "D24", "✔");
        written += 1;
    }

    Ok(written)
}

/// Load a film inspection form and print its pre-store checklist.
pub async fn export_prestore(
    pool: &DbPool,
    templates: &Templates,
    form_id: &str,
) -> Result<XlsxDownload> {
    let form = db::get_film_form(pool, form_id).await?;
    let record = form.to_record()?;

    let mut workbook = templates.open(TEMPLATE)?;
    let written = render(&record, &mut workbook)?;

    info!(form_id, variant = %form.variant, cells = written, "Pre-store form exported");

    workbook.finish(filename(&record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn render_into_blank(rec: &Record) -> Workbook {
        let mut wb = Workbook::from_spreadsheet(umya_spreadsheet::new_file(), "2256");
        render(rec, &mut wb).unwrap();
        wb
    }

    #[test]
    fn test_customer_with_location_overrides_product_code() {
        let mut wb = render_into_blank(&record(json!({
            "product_code": "168-18C White (Jeddah)",
            "customer": "P&G",
            "location": "Jeddah",
        })));
        let sheet = wb.first_sheet_mut().unwrap();
        assert_eq!(sheet.get_value("B5"), "P&G (Jeddah)");
        assert_eq!(sheet.get_value("G4"), "168-18C White");
    }

    #[test]
    fn test_product_code_used_when_no_customer() {
        let mut wb = render_into_blank(&record(json!({
            "product_code": "168-18C White (Jeddah)",
            "customer": null,
        })));
        assert_eq!(wb.first_sheet_mut().unwrap().get_value("B5"), "168-18C White");
    }

    #[test]
    fn test_status_cells_only_when_present() {
        let mut wb = render_into_blank(&record(json!({
            "pallet_list": "Accept",
            "wrapping": "fail",
            "layer_pad": "",
        })));
        let sheet = wb.first_sheet_mut().unwrap();
        assert_eq!(sheet.get_value("C9"), "✓");
        assert_eq!(sheet.get_value("C10"), "✗");
        assert_eq!(sheet.get_value("P10"), "N/A");
        assert_eq!(sheet.get_value("P9"), "");
    }

    #[test]
    fn test_remarks_wrap_into_rows() {
        let long = "word ".repeat(60);
        let mut wb = render_into_blank(&record(json!({"remarks": format!("first\n{}", long)})));
        let sheet = wb.first_sheet_mut().unwrap();
        assert!(sheet.get_value("A14").starts_with("first word"));
        assert!(!sheet.get_value("A15").is_empty());
        assert_eq!(sheet.get_value("A16"), "");
    }

    #[test]
    fn test_sign_offs_and_approval_tick() {
        let mut wb = render_into_blank(&record(json!({
            "verified_by": "N/A",
            "approved_by": "Ravi",
            "approved_date": "2024-03-05",
        })));
        let sheet = wb.first_sheet_mut().unwrap();
        assert_eq!(sheet.get_value("B33"), "()\nNot Verified");
        assert_eq!(sheet.get_value("E33"), "(05/03/2024)\nRavi");
        assert_eq!(sheet.get_value("I33"), "(05/03/2024)\nBhushan Dessai");
        assert_eq!(sheet.get_value("D24"), "✔");
    }

    #[test]
    fn test_not_approved_has_no_tick() {
        let mut wb = render_into_blank(&record(json!({"approved_by": "Not Approved"})));
        assert_eq!(wb.first_sheet_mut().unwrap().get_value("D24"), "");
    }

    #[test]
    fn test_filename_uses_clean_code() {
        assert_eq!(
            filename(&record(json!({"product_code": "168-18C White (Jeddah)"}))),
            "Pre-Store-168-18C White-.xlsx"
        );
        assert_eq!(filename(&record(json!({}))), "Pre-Store-UNKNOWN-.xlsx");
    }
}

//! Total production defects analysis.
//!
//! Defects recorded against inline inspection lots are tallied by name and
//! by roll position. Selection works on lots, but once a lot matches, every
//! lot of its (traceability code, lot letter) pair is counted.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};

use crate::db::{self, DbPool, InlineInspectionLot, LotFilter};
use crate::services::formatting::{parse_date, sanitize_filename, slug_underscore};
use crate::services::mapping::{ordered_entries, value_text};
use crate::services::workbook::{write_number, write_text, Templates, Workbook, XlsxDownload};
use crate::Result;

pub const TEMPLATE: &str = "total-production-defects.xlsx";

pub const ROLL_POSITIONS: usize = 21;
const FIRST_ROW: u32 = 5;
const MAX_ROWS: usize = 70;
const POSITION_COLUMNS: [&str; ROLL_POSITIONS] = [
    "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S", "T",
    "U", "V", "W",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Production type assumed for lots that do not record one.
const DEFAULT_PRODUCTION_TYPE: &str = "Commercial";

/// Lot selection for the analysis.
#[derive(Debug, Clone, Default)]
pub struct DefectFilter {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub machines: Vec<String>,
    pub product: Option<String>,
    pub production_type: Option<String>,
    pub shift: Option<String>,
    /// Only lots that recorded this defect. Advanced export only.
    pub defect: Option<String>,
}

impl DefectFilter {
    fn lot_filter(&self) -> LotFilter {
        LotFilter {
            from_date: self.from_date.clone(),
            to_date: self.to_date.clone(),
            machines: self.machines.clone(),
            ..Default::default()
        }
    }

    /// Whether a lot passes the product, production type, shift and defect
    /// criteria.
    pub fn matches(&self, lot: &InlineInspectionLot) -> bool {
        if let Some(product) = &self.product {
            if lot.prod_code.as_deref() != Some(product.as_str()) {
                return false;
            }
        }
        if !self.machines.is_empty() {
            let machine = lot.mc_no.as_deref().unwrap_or_default();
            if !self.machines.iter().any(|m| m == machine) {
                return false;
            }
        }
        if let Some(kind) = &self.production_type {
            let lot_kind = lot
                .production_type
                .as_deref()
                .filter(|k| !k.is_empty())
                .unwrap_or(DEFAULT_PRODUCTION_TYPE);
            if lot_kind != kind {
                return false;
            }
        }
        if let Some(shift) = &self.shift {
            if lot.shift.as_deref() != Some(shift.as_str()) {
                return false;
            }
        }
        if let Some(defect) = &self.defect {
            let wanted = defect.trim();
            let has_defect = lot
                .defect_name_map()
                .values()
                .filter_map(value_text)
                .any(|name| name.trim() == wanted);
            if !has_defect {
                return false;
            }
        }
        true
    }

    fn year(&self, today: NaiveDate) -> i32 {
        self.from_date
            .as_deref()
            .and_then(parse_date)
            .map_or(today.year(), |d| d.year())
    }

    /// Sheet title in C1, e.g. `MC#03 - 2024` or `MC#01 + MC#02 - 2024`.
    pub fn machine_title(&self, today: NaiveDate) -> String {
        let year = self.year(today);
        match self.machines.as_slice() {
            [] => String::new(),
            [machine] => format!("MC#{} - {}", pad2(machine), year),
            machines => {
                let mut numbers: Vec<&String> = machines.iter().collect();
                numbers.sort_by_key(|m| m.trim().parse::<i64>().unwrap_or(i64::MAX));
                let labels: Vec<String> = numbers.iter().map(|m| format!("MC#{}", pad2(m))).collect();
                format!("{} - {}", labels.join(" + "), year)
            }
        }
    }

    fn period(&self) -> Option<String> {
        let from = parse_date(self.from_date.as_deref()?)?;
        let to = parse_date(self.to_date.as_deref()?)?;
        if from.year() == to.year() && from.month() == to.month() {
            Some(MONTHS[from.month0() as usize].to_string())
        } else {
            Some(format!(
                "{} to {}",
                from.format("%d.%m.%Y"),
                to.format("%d.%m.%Y")
            ))
        }
    }

    /// `{year}-Total Defects Analysis-MC#{machines}[-Defect_x][-{period}].xlsx`
    pub fn filename(&self, today: NaiveDate) -> String {
        let machines = match self.machines.as_slice() {
            [] => "All".to_string(),
            [machine] => pad2(machine),
            machines => {
                let mut padded: Vec<String> = machines.iter().map(|m| pad2(m)).collect();
                padded.sort();
                padded.join("-")
            }
        };

        let mut name = format!(
            "{}-Total Defects Analysis-MC#{}",
            self.year(today),
            sanitize_filename(&machines).trim()
        );
        if let Some(defect) = &self.defect {
            name.push_str(&format!("-Defect_{}", slug_underscore(defect)));
        }
        if let Some(period) = self.period() {
            name.push_str(&format!("-{}", sanitize_filename(&period).trim()));
        }
        format!("{}.xlsx", name)
    }
}

fn pad2(machine: &str) -> String {
    format!("{:0>2}", machine.trim())
}

/// Occurrences of one defect.
#[derive(Debug, Clone, PartialEq)]
pub struct DefectTally {
    pub name: String,
    pub total: u32,
    pub positions: [u32; ROLL_POSITIONS],
}

/// Tally defect names across lots, most frequent first.
///
/// Each entry of a lot's `defect_names` map counts once towards the total;
/// keys 1 to 21 also count towards that roll position. Ties keep first-seen
/// order, reading each lot's positions numerically before named keys.
pub fn aggregate(lots: &[InlineInspectionLot]) -> Vec<DefectTally> {
    let mut tallies: Vec<DefectTally> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for lot in lots {
        let defects = lot.defect_name_map();
        for (position, name) in ordered_entries(&defects) {
            let Some(name) = value_text(name) else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }

            let slot = *index.entry(name.to_string()).or_insert_with(|| {
                tallies.push(DefectTally {
                    name: name.to_string(),
                    total: 0,
                    positions: [0; ROLL_POSITIONS],
                });
                tallies.len() - 1
            });

            let tally = &mut tallies[slot];
            tally.total += 1;
            if let Ok(pos) = position.trim().parse::<usize>() {
                if (1..=ROLL_POSITIONS).contains(&pos) {
                    tally.positions[pos - 1] += 1;
                }
            }
        }
    }

    tallies.sort_by(|a, b| b.total.cmp(&a.total));
    tallies
}

/// Rolls produced across lots.
pub fn total_rolls(lots: &[InlineInspectionLot]) -> i64 {
    lots.iter().map(InlineInspectionLot::total_rolls).sum()
}

/// Fill the analysis sheet.
pub fn render(
    filter: &DefectFilter,
    tallies: &[DefectTally],
    produced: i64,
    today: NaiveDate,
    workbook: &mut Workbook,
) -> Result<()> {
    let sheet = workbook.first_sheet_mut()?;

    write_text(sheet, "C1", filter.machine_title(today));
    write_text(
        sheet,
        "C2",
        filter
            .product
            .as_deref()
            .map(str::trim)
            .unwrap_or("All Products"),
    );
    write_number(sheet, "B77", produced as f64);

    for (offset, tally) in tallies.iter().take(MAX_ROWS).enumerate() {
        let row = FIRST_ROW + offset as u32;
        write_text(sheet, &format!("A{}", row), tally.name.as_str());
        write_number(sheet, &format!("B{}", row), tally.total as f64);
        for (column, count) in POSITION_COLUMNS.iter().zip(tally.positions) {
            write_number(sheet, &format!("{}{}", column, row), count as f64);
        }
    }
    Ok(())
}

/// Lots selected by the filter, widened to their whole traceability pairs.
pub async fn select_lots(pool: &DbPool, filter: &DefectFilter) -> Result<Vec<InlineInspectionLot>> {
    let candidates = db::list_lots(pool, &filter.lot_filter()).await?;

    let mut seen = HashSet::new();
    let keys: Vec<(String, String)> = candidates
        .iter()
        .filter(|lot| filter.matches(lot))
        .map(|lot| (lot.traceability_code.clone(), lot.lot_letter.clone()))
        .filter(|key| seen.insert(key.clone()))
        .collect();

    debug!(
        candidates = candidates.len(),
        pairs = keys.len(),
        "Defect analysis lots selected"
    );

    db::list_lots_by_keys(pool, &keys).await
}

pub async fn export_defects(
    pool: &DbPool,
    templates: &Templates,
    filter: &DefectFilter,
    today: NaiveDate,
) -> Result<XlsxDownload> {
    let mut workbook = templates.open(TEMPLATE)?;

    let lots = select_lots(pool, filter).await?;
    let tallies = aggregate(&lots);
    let produced = total_rolls(&lots);

    render(filter, &tallies, produced, today, &mut workbook)?;

    info!(
        lots = lots.len(),
        defects = tallies.len(),
        rolls = produced,
        "Production defects exported"
    );

    workbook.finish(filter.filename(today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn lot(defects: serde_json::Value) -> InlineInspectionLot {
        InlineInspectionLot {
            id: "l1".into(),
            traceability_code: "T1".into(),
            lot_letter: "A".into(),
            customer: None,
            production_no: None,
            prod_code: Some("168-16CP".into()),
            spec: None,
            production_date: Some("2024-03-01".into()),
            emboss_type: None,
            printed: false,
            non_printed: false,
            ct: false,
            year: None,
            month: None,
            date: None,
            mc_no: Some("3".into()),
            shift: Some("1".into()),
            production_type: None,
            inspected_by: None,
            inspection_data: "{}".into(),
            defect_names: defects.to_string(),
            accepted_rolls: 10,
            rejected_rolls: 2,
            rework_rolls: 1,
            kiv_rolls: 0,
            accepted_weight: 0.0,
            rejected_weight: 0.0,
            rework_weight: 0.0,
            kiv_weight: 0.0,
            created_at: "2024-03-01 08:00:00".into(),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_aggregate_counts_totals_and_positions() {
        let lots = vec![
            lot(json!({"1": "Gel", "2": "Wrinkle", "3": "Gel", "22": "Gel"})),
            lot(json!({"1": " Wrinkle ", "5": "", "x": "Hole"})),
        ];
        let tallies = aggregate(&lots);

        assert_eq!(tallies.len(), 3);
        assert_eq!(tallies[0].name, "Gel");
        assert_eq!(tallies[0].total, 3);
        assert_eq!(tallies[0].positions[0], 1);
        assert_eq!(tallies[0].positions[2], 1);
        assert_eq!(tallies[0].positions.iter().sum::<u32>(), 2);
        assert_eq!(tallies[1].name, "Wrinkle");
        assert_eq!(tallies[1].total, 2);
        assert_eq!(tallies[2].name, "Hole");
        assert_eq!(tallies[2].positions, [0; ROLL_POSITIONS]);
    }

    #[test]
    fn test_aggregate_ties_follow_numeric_positions() {
        let lots = vec![lot(json!({"x": "Hole", "10": "Streak", "9": "Gel", "b": "Wrinkle"}))];
        let names: Vec<String> = aggregate(&lots).into_iter().map(|t| t.name).collect();
        assert_eq!(names, ["Gel", "Streak", "Hole", "Wrinkle"]);
    }

    #[test]
    fn test_total_rolls() {
        assert_eq!(total_rolls(&[lot(json!({})), lot(json!({}))]), 26);
    }

    #[test]
    fn test_filter_treats_missing_type_as_commercial() {
        let filter = DefectFilter {
            production_type: Some("Commercial".into()),
            ..Default::default()
        };
        assert!(filter.matches(&lot(json!({}))));

        let trial = DefectFilter {
            production_type: Some("Trial".into()),
            ..Default::default()
        };
        assert!(!trial.matches(&lot(json!({}))));
    }

    #[test]
    fn test_filter_by_defect_shift_and_product() {
        let gel = lot(json!({"4": "Gel"}));
        let by_defect = DefectFilter {
            defect: Some(" Gel".into()),
            ..Default::default()
        };
        assert!(by_defect.matches(&gel));
        assert!(!by_defect.matches(&lot(json!({"4": "Hole"}))));

        let by_shift = DefectFilter {
            shift: Some("2".into()),
            ..Default::default()
        };
        assert!(!by_shift.matches(&gel));

        let by_product = DefectFilter {
            product: Some("168-16CP".into()),
            machines: vec!["3".into()],
            ..Default::default()
        };
        assert!(by_product.matches(&gel));
    }

    #[rstest]
    #[case(vec![], None, "")]
    #[case(vec!["3"], Some("2024-02-01"), "MC#03 - 2024")]
    #[case(vec!["10", "2"], None, "MC#02 + MC#10 - 2025")]
    fn test_machine_title(
        #[case] machines: Vec<&str>,
        #[case] from: Option<&str>,
        #[case] expected: &str,
    ) {
        let filter = DefectFilter {
            machines: machines.into_iter().map(String::from).collect(),
            from_date: from.map(String::from),
            ..Default::default()
        };
        assert_eq!(filter.machine_title(day()), expected);
    }

    #[test]
    fn test_filenames() {
        let month = DefectFilter {
            machines: vec!["3".into()],
            from_date: Some("2024-03-01".into()),
            to_date: Some("2024-03-31".into()),
            ..Default::default()
        };
        assert_eq!(
            month.filename(day()),
            "2024-Total Defects Analysis-MC#03-March.xlsx"
        );

        let range = DefectFilter {
            machines: vec!["2".into(), "1".into()],
            from_date: Some("2024-03-01".into()),
            to_date: Some("2024-04-15".into()),
            defect: Some("Gel spot".into()),
            ..Default::default()
        };
        assert_eq!(
            range.filename(day()),
            "2024-Total Defects Analysis-MC#01-02-Defect_Gel_spot-01.03.2024 to 15.04.2024.xlsx"
        );

        assert_eq!(
            DefectFilter::default().filename(day()),
            "2025-Total Defects Analysis-MC#All.xlsx"
        );
    }

    #[test]
    fn test_render_caps_rows_and_writes_totals() {
        let tallies: Vec<DefectTally> = (0..75)
            .map(|i| DefectTally {
                name: format!("D{}", i),
                total: 1,
                positions: [0; ROLL_POSITIONS],
            })
            .collect();
        let mut wb = Workbook::from_spreadsheet(umya_spreadsheet::new_file(), "2256");
        render(&DefectFilter::default(), &tallies, 42, day(), &mut wb).unwrap();

        let sheet = wb.first_sheet_mut().unwrap();
        assert_eq!(sheet.get_value("C1"), "");
        assert_eq!(sheet.get_value("C2"), "All Products");
        assert_eq!(sheet.get_value("A5"), "D0");
        assert_eq!(sheet.get_value("W5"), "0");
        assert_eq!(sheet.get_value("A74"), "D69");
        assert_eq!(sheet.get_value("A75"), "");
        assert_eq!(sheet.get_value("B77"), "42");
    }
}

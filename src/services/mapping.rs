//! Cell mapping engine.
//!
//! Every export layout is a static table: single-cell rules that pull a field
//! from the record and format it, plus series rules that write a list of
//! samples down a column. [`apply`] is the only writer; per-form code only
//! builds the record and picks the layouts.

use serde_json::{Map, Value};
use umya_spreadsheet::Worksheet;

use super::formatting::{
    clean_product_code, format_date_dmy, format_time_hhmm, parse_float_prefix, status_symbol,
};
use super::workbook::{write_cell, CellValue, Workbook};

/// One form row as the mapper sees it.
pub type Record = Map<String, Value>;

// ============================================================================
// Record access
// ============================================================================

/// Loose truthiness: null, `false`, `0`, `""` and missing values are falsy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Follow a key path through nested objects.
pub fn lookup<'a>(record: &'a Record, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = record.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// Dotted-path variant of [`lookup`].
pub fn lookup_dotted<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let parts: Vec<&str> = path.split('.').collect();
    lookup(record, &parts)
}

/// Text form of a scalar; `None` for null, arrays and objects.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Truthy field as text.
pub fn field_text(record: &Record, name: &str) -> Option<String> {
    let value = record.get(name);
    if is_truthy(value) {
        value.and_then(value_text)
    } else {
        None
    }
}

/// Plain cell value: numbers stay numbers, everything else is text.
pub fn plain_value(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Blank,
        Value::Number(n) => n.as_f64().map_or(CellValue::Blank, CellValue::Number),
        Value::String(s) if s.is_empty() => CellValue::Blank,
        other => value_text(other).map_or(CellValue::Blank, CellValue::Text),
    }
}

/// Numeric coercion with a text fallback when there is no leading number.
pub fn numeric_value(value: &Value) -> CellValue {
    match value {
        Value::Number(n) => n.as_f64().map_or(CellValue::Blank, CellValue::Number),
        Value::String(s) if s.is_empty() => CellValue::Blank,
        Value::String(s) => parse_float_prefix(s)
            .map(CellValue::Number)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        other => plain_value(other),
    }
}

fn array_index(key: &str) -> Option<u32> {
    if key == "0" {
        return Some(0);
    }
    if key.starts_with('0') || key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|n| *n < u32::MAX)
}

/// Object entries in enumeration order: integer-like keys ascending, then
/// the remaining keys in insertion order.
pub fn ordered_entries(map: &Map<String, Value>) -> Vec<(&str, &Value)> {
    let mut indexed: Vec<(u32, &str, &Value)> = Vec::new();
    let mut named: Vec<(&str, &Value)> = Vec::new();
    for (key, item) in map {
        match array_index(key) {
            Some(idx) => indexed.push((idx, key.as_str(), item)),
            None => named.push((key.as_str(), item)),
        }
    }
    indexed.sort_by_key(|(idx, _, _)| *idx);
    indexed
        .into_iter()
        .map(|(_, key, item)| (key, item))
        .chain(named)
        .collect()
}

/// Series entries in enumeration order. Arrays keep their order.
pub fn series_values(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => ordered_entries(map)
            .into_iter()
            .map(|(_, item)| item)
            .collect(),
        _ => Vec::new(),
    }
}

fn is_blank_entry(value: &Value) -> bool {
    matches!(value, Value::Null) || matches!(value, Value::String(s) if s.is_empty())
}

// ============================================================================
// Rules
// ============================================================================

/// Where a cell value comes from.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    Field(&'static str),
    Path(&'static [&'static str]),
    /// First truthy path wins.
    FirstOf(&'static [&'static [&'static str]]),
    Literal(&'static str),
    /// `({date})\n{name}` sign-off block.
    SignOff {
        date: &'static str,
        name: Option<&'static str>,
        default_name: &'static str,
    },
}

/// How the value is rendered.
#[derive(Debug, Clone, Copy)]
pub enum Format {
    Plain,
    /// `DD/MM/YYYY`.
    Date,
    /// `HH:MM`.
    Time,
    /// `{n} Rolls`.
    Rolls,
    Number,
    /// Truthy → `✔`.
    Check,
    /// Equal to the text → `✔`.
    Equals(&'static str),
    /// Accept/Reject words → symbols.
    Status,
    /// Product code without the plant suffix.
    ProductCode,
    /// Appends ` ({field})` when that field is present.
    WithSuffix(&'static str),
}

/// What to do when the source is falsy.
#[derive(Debug, Clone, Copy)]
pub enum Fallback {
    /// Leave the template cell untouched.
    Keep,
    Text(&'static str),
    /// Write the text only when the key exists; keep the cell otherwise.
    Present(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct CellRule {
    pub cell: &'static str,
    pub source: Source,
    pub format: Format,
    pub fallback: Fallback,
    /// When set, the rule only fires while this path is truthy.
    pub scope: Option<&'static [&'static str]>,
}

impl CellRule {
    pub const fn field(cell: &'static str, name: &'static str) -> Self {
        Self {
            cell,
            source: Source::Field(name),
            format: Format::Plain,
            fallback: Fallback::Text(""),
            scope: None,
        }
    }

    pub const fn path(cell: &'static str, path: &'static [&'static str]) -> Self {
        Self {
            cell,
            source: Source::Path(path),
            format: Format::Plain,
            fallback: Fallback::Text(""),
            scope: None,
        }
    }

    pub const fn first_of(cell: &'static str, paths: &'static [&'static [&'static str]]) -> Self {
        Self {
            cell,
            source: Source::FirstOf(paths),
            format: Format::Plain,
            fallback: Fallback::Text(""),
            scope: None,
        }
    }

    pub const fn literal(cell: &'static str, text: &'static str) -> Self {
        Self {
            cell,
            source: Source::Literal(text),
            format: Format::Plain,
            fallback: Fallback::Keep,
            scope: None,
        }
    }

    pub const fn sign_off(
        cell: &'static str,
        date: &'static str,
        name: &'static str,
        default_name: &'static str,
    ) -> Self {
        Self {
            cell,
            source: Source::SignOff {
                date,
                name: Some(name),
                default_name,
            },
            format: Format::Plain,
            fallback: Fallback::Keep,
            scope: None,
        }
    }

    pub const fn format(self, format: Format) -> Self {
        Self { format, ..self }
    }

    pub const fn or(self, text: &'static str) -> Self {
        Self {
            fallback: Fallback::Text(text),
            ..self
        }
    }

    pub const fn or_keep(self) -> Self {
        Self {
            fallback: Fallback::Keep,
            ..self
        }
    }

    pub const fn within(self, scope: &'static [&'static str]) -> Self {
        Self {
            scope: Some(scope),
            ..self
        }
    }

    pub const fn or_if_present(self, text: &'static str) -> Self {
        Self {
            fallback: Fallback::Present(text),
            ..self
        }
    }

    fn source_value<'a>(&self, record: &'a Record) -> Option<&'a Value> {
        match self.source {
            Source::Field(name) => record.get(name),
            Source::Path(path) => lookup(record, path),
            Source::FirstOf(paths) => paths
                .iter()
                .filter_map(|path| lookup(record, path))
                .find(|value| is_truthy(Some(value))),
            Source::Literal(_) | Source::SignOff { .. } => None,
        }
    }

    fn key_present(&self, record: &Record) -> bool {
        match self.source {
            Source::Field(name) => record.contains_key(name),
            Source::Path(path) => lookup(record, path).is_some(),
            Source::FirstOf(paths) => paths.iter().any(|path| lookup(record, path).is_some()),
            Source::Literal(_) | Source::SignOff { .. } => true,
        }
    }

    /// The value to write, or `None` to leave the cell alone.
    pub fn resolve(&self, record: &Record) -> Option<CellValue> {
        if let Some(scope) = self.scope {
            if !is_truthy(lookup(record, scope)) {
                return None;
            }
        }
        match self.source {
            Source::Literal(text) => return Some(CellValue::text(text)),
            Source::SignOff {
                date,
                name,
                default_name,
            } => return Some(CellValue::Text(sign_off_text(record, date, name, default_name))),
            _ => {}
        }

        let value = self.source_value(record);
        if is_truthy(value) {
            if let Some(rendered) = value.and_then(|v| self.render(record, v)) {
                return Some(rendered);
            }
        }

        match self.fallback {
            Fallback::Keep => None,
            Fallback::Text(text) => Some(CellValue::text(text)),
            Fallback::Present(text) if self.key_present(record) => Some(CellValue::text(text)),
            Fallback::Present(_) => None,
        }
    }

    fn render(&self, record: &Record, value: &Value) -> Option<CellValue> {
        let text = || value_text(value).unwrap_or_default();
        let rendered = match self.format {
            Format::Plain => plain_value(value),
            Format::Number => numeric_value(value),
            Format::Date => CellValue::Text(format_date_dmy(&text())),
            Format::Time => CellValue::Text(format_time_hhmm(&text())),
            Format::Rolls => CellValue::Text(format!("{} Rolls", text())),
            Format::Check => CellValue::text("✔"),
            Format::Equals(expected) => {
                if text() == expected {
                    CellValue::text("✔")
                } else {
                    return None;
                }
            }
            Format::Status => CellValue::Text(status_symbol(Some(&text()))),
            Format::ProductCode => CellValue::Text(clean_product_code(&text())),
            Format::WithSuffix(field) => match field_text(record, field) {
                Some(suffix) => CellValue::Text(format!("{} ({})", text(), suffix)),
                None => CellValue::Text(text()),
            },
        };
        Some(rendered)
    }
}

fn sign_off_text(
    record: &Record,
    date_field: &str,
    name_field: Option<&str>,
    default_name: &str,
) -> String {
    let date = field_text(record, date_field)
        .map(|d| format_date_dmy(&d))
        .unwrap_or_default();
    let name = name_field
        .and_then(|field| field_text(record, field))
        .filter(|name| !name.trim().is_empty() && name != "N/A")
        .unwrap_or_else(|| default_name.to_string());
    format!("({})\n{}", date, name)
}

/// Direction and gap handling for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Skip empty entries, write from the first row, blank the rest.
    TopDown,
    /// Entry `"1"` goes on the first row, `"2"` on the next; gaps are blanked.
    Keyed,
    /// Keep empty entries; the last entry lands on the last row.
    BottomUp,
    /// Skip empty entries, then fill bottom-up.
    BottomUpCompact,
}

#[derive(Debug, Clone, Copy)]
pub struct SeriesRule {
    pub column: &'static str,
    pub first_row: u32,
    pub last_row: u32,
    pub field: &'static str,
    pub numeric: bool,
    pub fill: Fill,
}

impl SeriesRule {
    pub const fn text(column: &'static str, rows: (u32, u32), field: &'static str) -> Self {
        Self {
            column,
            first_row: rows.0,
            last_row: rows.1,
            field,
            numeric: false,
            fill: Fill::TopDown,
        }
    }

    pub const fn number(column: &'static str, rows: (u32, u32), field: &'static str) -> Self {
        Self {
            numeric: true,
            ..Self::text(column, rows, field)
        }
    }

    pub const fn fill(self, fill: Fill) -> Self {
        Self { fill, ..self }
    }

    fn render(&self, value: &Value) -> CellValue {
        if is_blank_entry(value) {
            CellValue::Blank
        } else if self.numeric {
            numeric_value(value)
        } else {
            plain_value(value)
        }
    }

    /// Row/value pairs to write. Empty when the field is absent or falsy.
    pub fn plan(&self, record: &Record) -> Vec<(u32, CellValue)> {
        let Some(source) = record.get(self.field).filter(|v| is_truthy(Some(v))) else {
            return Vec::new();
        };
        let capacity = (self.last_row + 1).saturating_sub(self.first_row) as usize;

        match self.fill {
            Fill::TopDown => {
                let values: Vec<&Value> = series_values(source)
                    .into_iter()
                    .filter(|v| !is_blank_entry(v))
                    .collect();
                (0..capacity)
                    .map(|i| {
                        let row = self.first_row + i as u32;
                        let cell = values.get(i).map_or(CellValue::Blank, |v| self.render(v));
                        (row, cell)
                    })
                    .collect()
            }
            Fill::Keyed => (0..capacity)
                .map(|i| {
                    let row = self.first_row + i as u32;
                    let entry = match source {
                        Value::Array(items) => items.get(i),
                        Value::Object(map) => map.get(&(i + 1).to_string()),
                        _ => None,
                    };
                    let cell = entry
                        .filter(|v| is_truthy(Some(v)))
                        .map_or(CellValue::Blank, |v| self.render(v));
                    (row, cell)
                })
                .collect(),
            Fill::BottomUp | Fill::BottomUpCompact => {
                let values: Vec<&Value> = series_values(source)
                    .into_iter()
                    .filter(|v| self.fill == Fill::BottomUp || !is_blank_entry(v))
                    .collect();
                values
                    .iter()
                    .rev()
                    .take(capacity)
                    .enumerate()
                    .map(|(offset, v)| (self.last_row - offset as u32, self.render(v)))
                    .collect()
            }
        }
    }
}

/// Rules for one sheet. Several layouts may target the same sheet.
#[derive(Debug, Clone, Copy)]
pub struct SheetLayout {
    pub sheet: &'static str,
    /// Dotted paths; when non-empty, at least one must be truthy.
    pub when_any: &'static [&'static str],
    pub cells: &'static [CellRule],
    pub series: &'static [SeriesRule],
}

impl SheetLayout {
    pub fn applies_to(&self, record: &Record) -> bool {
        self.when_any.is_empty()
            || self
                .when_any
                .iter()
                .any(|path| is_truthy(lookup_dotted(record, path)))
    }
}

/// Write one layout's rules into a sheet.
pub fn apply_to_sheet(sheet: &mut Worksheet, layout: &SheetLayout, record: &Record) -> usize {
    let mut written = 0;
    for rule in layout.cells {
        if let Some(value) = rule.resolve(record) {
            write_cell(sheet, rule.cell, &value);
            written += 1;
        }
    }
    for series in layout.series {
        for (row, value) in series.plan(record) {
            write_cell(sheet, &format!("{}{}", series.column, row), &value);
            written += 1;
        }
    }
    written
}

/// Apply layouts to a workbook. Layouts whose sheet is missing, or whose
/// guard fails, are skipped. Returns the number of cells written.
pub fn apply(layouts: &[SheetLayout], record: &Record, workbook: &mut Workbook) -> usize {
    let mut written = 0;
    for layout in layouts {
        if !layout.applies_to(record) {
            tracing::trace!(sheet = layout.sheet, "Layout guard not met, skipping");
            continue;
        }
        match workbook.sheet_mut(layout.sheet) {
            Some(sheet) => written += apply_to_sheet(sheet, layout, record),
            None => tracing::debug!(sheet = layout.sheet, "Sheet not in template, skipping"),
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(is_truthy(Some(&json!("0"))));
        assert!(is_truthy(Some(&json!([]))));
    }

    #[test]
    fn test_object_series_orders_integer_keys_first() {
        let value: Value =
            serde_json::from_str(r#"{"b": "x", "10": "ten", "2": "two", "a": "y", "1": "one"}"#)
                .unwrap();
        let ordered: Vec<&str> = series_values(&value)
            .into_iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(ordered, vec!["one", "two", "ten", "x", "y"]);
    }

    #[test]
    fn test_top_down_skips_empties_and_blanks_tail() {
        let rule = SeriesRule::number("D", (9, 12), "weights");
        let rec = record(json!({"weights": {"1": "18.1", "2": "", "3": "n/a", "4": 17.9}}));
        let plan = rule.plan(&rec);
        assert_eq!(
            plan,
            vec![
                (9, CellValue::Number(18.1)),
                (10, CellValue::text("n/a")),
                (11, CellValue::Number(17.9)),
                (12, CellValue::Blank),
            ]
        );
    }

    #[test]
    fn test_bottom_up_keeps_empties_and_stops_at_first_row() {
        let rule = SeriesRule::number("H", (9, 11), "force").fill(Fill::BottomUp);
        let rec = record(json!({"force": ["1", "2", "", "4"]}));
        let plan = rule.plan(&rec);
        assert_eq!(
            plan,
            vec![
                (11, CellValue::Number(4.0)),
                (10, CellValue::Blank),
                (9, CellValue::Number(2.0)),
            ]
        );
    }

    #[test]
    fn test_bottom_up_compact_drops_empties() {
        let rule = SeriesRule::number("H", (9, 38), "q").fill(Fill::BottomUpCompact);
        let rec = record(json!({"q": ["1", "", "3"]}));
        assert_eq!(
            rule.plan(&rec),
            vec![(38, CellValue::Number(3.0)), (37, CellValue::Number(1.0))]
        );
    }

    #[test]
    fn test_keyed_fill_places_by_key() {
        let rule = SeriesRule::number("D", (9, 11), "md").fill(Fill::Keyed);
        let rec = record(json!({"md": {"3": "7.5", "1": "2"}}));
        assert_eq!(
            rule.plan(&rec),
            vec![
                (9, CellValue::Number(2.0)),
                (10, CellValue::Blank),
                (11, CellValue::Number(7.5)),
            ]
        );
    }

    #[test]
    fn test_absent_series_writes_nothing() {
        let rule = SeriesRule::text("A", (9, 38), "lot_and_roll");
        assert!(rule.plan(&Record::new()).is_empty());
    }

    #[test]
    fn test_cell_rule_formats_and_fallbacks() {
        let rec = record(json!({
            "quantity": 12,
            "production_date": "2024-05-01",
            "purchase_order": "",
            "customer": "Acme",
            "location": "Jeddah",
            "equipment_used": {"page1": {"cof_rs": "COF-2"}},
        }));

        let rolls = CellRule::field("H5", "quantity").format(Format::Rolls);
        assert_eq!(rolls.resolve(&rec), Some(CellValue::text("12 Rolls")));

        let date = CellRule::field("J4", "production_date").format(Format::Date);
        assert_eq!(date.resolve(&rec), Some(CellValue::text("01/05/2024")));

        let po = CellRule::field("F5", "purchase_order").or("NA");
        assert_eq!(po.resolve(&rec), Some(CellValue::text("NA")));

        let kept = CellRule::field("B6", "standard_packing").or_keep();
        assert_eq!(kept.resolve(&rec), None);

        let present = CellRule::field("P6", "purchase_order").or_if_present("N/A");
        assert_eq!(present.resolve(&rec), Some(CellValue::text("N/A")));
        let absent = CellRule::field("P6", "pallet_size").or_if_present("N/A");
        assert_eq!(absent.resolve(&rec), None);

        let cof = CellRule::first_of(
            "E6",
            &[&["equipment_used", "page1", "cof_rr"], &["equipment_used", "page1", "cof_rs"]],
        );
        assert_eq!(cof.resolve(&rec), Some(CellValue::text("COF-2")));

        let customer = CellRule::field("B5", "customer").format(Format::WithSuffix("location"));
        assert_eq!(customer.resolve(&rec), Some(CellValue::text("Acme (Jeddah)")));
    }

    #[test]
    fn test_sign_off_block() {
        let rec = record(json!({"approved_by": "N/A", "approved_date": "2024-02-03"}));
        let rule = CellRule::sign_off("E33", "approved_date", "approved_by", "Not Approved");
        assert_eq!(
            rule.resolve(&rec),
            Some(CellValue::text("(03/02/2024)\nNot Approved"))
        );
    }

    #[test]
    fn test_scoped_rule_blanks_only_inside_scope() {
        static SCOPE: &[&str] = &["equipment_used", "page1"];
        let rule = CellRule::path("E6", &["equipment_used", "page1", "thickness"]).within(SCOPE);
        let marker = CellRule::literal("F6", "NA").within(SCOPE);

        let inside = record(json!({"equipment_used": {"page1": {"film_weight": "FW-01"}}}));
        assert_eq!(rule.resolve(&inside), Some(CellValue::text("")));
        assert_eq!(marker.resolve(&inside), Some(CellValue::text("NA")));

        let outside = record(json!({"equipment_used": {"page2": {"opacity": "O-1"}}}));
        assert_eq!(rule.resolve(&outside), None);
        assert_eq!(marker.resolve(&outside), None);
        assert_eq!(marker.resolve(&Record::new()), None);
    }

    #[test]
    fn test_layout_guard() {
        static GUARDED: SheetLayout = SheetLayout {
            sheet: "Page2",
            when_any: &["page2_opacity", "equipment_used.page2"],
            cells: &[],
            series: &[],
        };
        assert!(!GUARDED.applies_to(&record(json!({"page2_opacity": "", "x": 1}))));
        assert!(GUARDED.applies_to(&record(
            json!({"equipment_used": {"page2": {"opacity": "O-1"}}})
        )));
    }

    #[test]
    fn test_apply_skips_missing_sheets() {
        static LAYOUTS: &[SheetLayout] = &[
            SheetLayout {
                sheet: "Sheet1",
                when_any: &[],
                cells: &[CellRule::field("C4", "product_code")],
                series: &[],
            },
            SheetLayout {
                sheet: "COA Form",
                when_any: &[],
                cells: &[CellRule::field("B7", "lot_no")],
                series: &[],
            },
        ];
        let mut wb = Workbook::from_spreadsheet(umya_spreadsheet::new_file(), "pw");
        let rec = record(json!({"product_code": "UC-18", "lot_no": "L1"}));
        assert_eq!(apply(LAYOUTS, &rec, &mut wb), 1);
        assert_eq!(wb.first_sheet_mut().unwrap().get_value("C4"), "UC-18");
    }
}

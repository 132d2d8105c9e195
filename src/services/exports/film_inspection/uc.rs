//! UC film inspection layouts.
//!
//! Page1 holds the header and per-roll physical tests, Page2 tensile and
//! dimensional tests, Page3 colour, and the COA sheet the sign-off.

use super::{PAGE1_EQUIPMENT, PAGE2_EQUIPMENT, PAGE3_EQUIPMENT};
use crate::services::mapping::{CellRule, Format, SeriesRule, SheetLayout};

const PAGE1_ROWS: (u32, u32) = (9, 38);
const PAGE2_ROWS: (u32, u32) = (11, 40);
const PAGE3_ROWS: (u32, u32) = (10, 39);

const PAGE2_FIELDS: &[&str] = &[
    "page2_tensile_break",
    "page2_cd_elongation",
    "page2_modulus",
    "page2_opacity",
    "page2_roll_width",
    "page2_diameter",
];

// ============================================================================
// UC 18gsm family
// ============================================================================

const HEADER_18GSM: &[CellRule] = &[
    CellRule::field("C4", "product_code"),
    CellRule::field("C5", "specification"),
    CellRule::field("F4", "production_order"),
    CellRule::field("F5", "purchase_order").or("NA"),
    CellRule::field("H4", "machine_no"),
    CellRule::field("H5", "quantity").format(Format::Rolls),
    CellRule::field("J4", "production_date").format(Format::Date),
    CellRule::field("J5", "inspection_date").format(Format::Date),
    CellRule::field("B42", "prepared_by").or("Unknown User"),
    CellRule::field("B43", "inspection_date").format(Format::Date),
    CellRule::field("J42", "verified_by").or("Not Verified"),
    CellRule::field("J43", "verified_date").format(Format::Date),
    CellRule::field("K3", "ref_no"),
];

const EQUIPMENT_18GSM_PAGE1: &[CellRule] = &[
    CellRule::path("D6", &["equipment_used", "page1", "film_weight"]).within(PAGE1_EQUIPMENT),
    CellRule::path("E6", &["equipment_used", "page1", "thickness"]).within(PAGE1_EQUIPMENT),
    CellRule::literal("F6", "NA").within(PAGE1_EQUIPMENT),
    CellRule::first_of(
        "G6",
        &[
            &["equipment_used", "page1", "tensile_break"],
            &["equipment_used", "page1", "cof_rr"],
        ],
    )
    .within(PAGE1_EQUIPMENT),
    CellRule::first_of(
        "I6",
        &[
            &["equipment_used", "page1", "tensile_break"],
            &["equipment_used", "page1", "elongation"],
            &["equipment_used", "page1", "modulus_10"],
        ],
    )
    .within(PAGE1_EQUIPMENT),
];

const EQUIPMENT_210W_PAGE1: &[CellRule] = &[
    CellRule::path("D6", &["equipment_used", "page1", "film_weight"]).within(PAGE1_EQUIPMENT),
    CellRule::path("E6", &["equipment_used", "page1", "thickness"]).within(PAGE1_EQUIPMENT),
    CellRule::first_of(
        "G6",
        &[
            &["equipment_used", "page1", "cof_rr"],
            &["equipment_used", "page1", "cof_cc"],
        ],
    )
    .within(PAGE1_EQUIPMENT),
    CellRule::path("H6", &["equipment_used", "page1", "tensile_break"]).within(PAGE1_EQUIPMENT),
    CellRule::path("I6", &["equipment_used", "page1", "elongation"]).within(PAGE1_EQUIPMENT),
    CellRule::path("J6", &["equipment_used", "page1", "modulus"]).within(PAGE1_EQUIPMENT),
];

const SERIES_18GSM_PAGE1: &[SeriesRule] = &[
    SeriesRule::text("A", PAGE1_ROWS, "lot_and_roll"),
    SeriesRule::text("B", PAGE1_ROWS, "roll_id"),
    SeriesRule::text("C", PAGE1_ROWS, "lot_time"),
    SeriesRule::number("D", PAGE1_ROWS, "page1_basis_weight"),
    SeriesRule::number("E", PAGE1_ROWS, "page1_thickness"),
    SeriesRule::number("F", PAGE1_ROWS, "page1_wettability"),
    SeriesRule::number("G", PAGE1_ROWS, "page1_cof_rr"),
    SeriesRule::number("H", PAGE1_ROWS, "page1_cof_cc"),
    SeriesRule::number("I", PAGE1_ROWS, "page1_tensile_break"),
    SeriesRule::number("J", PAGE1_ROWS, "page1_elongation"),
    SeriesRule::number("K", PAGE1_ROWS, "page1_modulus"),
];

const PERSONNEL_18GSM_PAGE2: &[CellRule] = &[
    CellRule::path("D6", &["equipment_used", "page2", "tensile_break"]).within(PAGE2_EQUIPMENT),
    CellRule::path("G6", &["equipment_used", "page2", "opacity"]).within(PAGE2_EQUIPMENT),
    CellRule::path("I6", &["equipment_used", "page2", "roll_width"]).within(PAGE2_EQUIPMENT),
    CellRule::path("K6", &["equipment_used", "page2", "diameter"]).within(PAGE2_EQUIPMENT),
    CellRule::field("B44", "prepared_by").or("Unknown User"),
    CellRule::field("B45", "inspection_date").format(Format::Date),
    CellRule::field("J44", "verified_by").or("Not Verified"),
    CellRule::field("J45", "verified_date").format(Format::Date),
    CellRule::field("K3", "ref_no"),
];

const PERSONNEL_210W_PAGE2: &[CellRule] = &[
    CellRule::path("D6", &["equipment_used", "page2", "tensile_break"]).within(PAGE2_EQUIPMENT),
    CellRule::path("E6", &["equipment_used", "page2", "elongation"]).within(PAGE2_EQUIPMENT),
    CellRule::path("F6", &["equipment_used", "page2", "modulus"]).within(PAGE2_EQUIPMENT),
    CellRule::path("G6", &["equipment_used", "page2", "opacity"]).within(PAGE2_EQUIPMENT),
    CellRule::path("I6", &["equipment_used", "page2", "roll_width"]).within(PAGE2_EQUIPMENT),
    CellRule::path("K6", &["equipment_used", "page2", "diameter"]).within(PAGE2_EQUIPMENT),
    CellRule::field("B44", "prepared_by").or("Unknown User"),
    CellRule::field("B45", "inspection_date").format(Format::Date),
    CellRule::field("J44", "verified_by").or("Not Verified"),
    CellRule::field("J45", "verified_date").format(Format::Date),
    CellRule::field("K3", "ref_no"),
];

const SERIES_18GSM_PAGE2: &[SeriesRule] = &[
    SeriesRule::number("D", PAGE2_ROWS, "page2_tensile_break"),
    SeriesRule::number("E", PAGE2_ROWS, "page2_cd_elongation"),
    SeriesRule::number("F", PAGE2_ROWS, "page2_modulus"),
    SeriesRule::number("G", (11, 38), "page2_opacity"),
    SeriesRule::number("I", PAGE2_ROWS, "page2_roll_width"),
    SeriesRule::number("K", PAGE2_ROWS, "page2_diameter"),
];

const SERIES_210W_PAGE2: &[SeriesRule] = &[
    SeriesRule::number("D", PAGE2_ROWS, "page2_tensile_break"),
    SeriesRule::number("E", PAGE2_ROWS, "page2_cd_elongation"),
    SeriesRule::number("F", PAGE2_ROWS, "page2_modulus"),
    SeriesRule::number("G", PAGE2_ROWS, "page2_opacity"),
    SeriesRule::number("I", PAGE2_ROWS, "page2_roll_width"),
    SeriesRule::number("K", PAGE2_ROWS, "page2_diameter"),
];

const PAGE3_FIELDS: &[&str] = &[
    "page3_colour_l",
    "page3_colour_a",
    "page3_colour_b",
    "page3_delta_e",
    "page3_base_film_pink",
];

const PERSONNEL_18GSM_PAGE3: &[CellRule] = &[
    CellRule::path("D6", &["equipment_used", "page3", "colour"]).within(PAGE3_EQUIPMENT),
    CellRule::field("B43", "prepared_by").or("Unknown User"),
    CellRule::field("B44", "inspection_date").format(Format::Date),
    CellRule::field("J43", "verified_by").or("Not Verified"),
    CellRule::field("J44", "verified_date").format(Format::Date),
    CellRule::field("K3", "ref_no"),
];

const PRINTED_COLOUR_EQUIPMENT: &[CellRule] =
    &[CellRule::path("H6", &["equipment_used", "page3", "colour"]).within(PAGE3_EQUIPMENT)];

const BASE_FILM_EQUIPMENT: &[CellRule] =
    &[CellRule::path("H6", &["equipment_used", "page3", "baseFilm"]).within(PAGE3_EQUIPMENT)];

const SERIES_18GSM_PAGE3: &[SeriesRule] = &[
    SeriesRule::number("D", PAGE3_ROWS, "page3_colour_l"),
    SeriesRule::number("E", PAGE3_ROWS, "page3_colour_a"),
    SeriesRule::number("F", PAGE3_ROWS, "page3_colour_b"),
    SeriesRule::number("G", PAGE3_ROWS, "page3_delta_e"),
    SeriesRule::number("H", PAGE3_ROWS, "page3_base_film_pink"),
];

const COA_18GSM: &[CellRule] = &[
    CellRule::field("B7", "lot_no"),
    CellRule::sign_off("C42", "inspection_date", "prepared_by", "Unknown User"),
    CellRule::sign_off("F42", "approved_date", "approved_by", "Not Approved"),
];

const fn page1(equipment: &'static [CellRule]) -> [SheetLayout; 2] {
    [
        SheetLayout {
            sheet: "Page1",
            when_any: &[],
            cells: HEADER_18GSM,
            series: SERIES_18GSM_PAGE1,
        },
        SheetLayout {
            sheet: "Page1",
            when_any: &[],
            cells: equipment,
            series: &[],
        },
    ]
}

const fn page3(colour_equipment: &'static [CellRule]) -> [SheetLayout; 2] {
    [
        SheetLayout {
            sheet: "Page3",
            when_any: PAGE3_FIELDS,
            cells: PERSONNEL_18GSM_PAGE3,
            series: SERIES_18GSM_PAGE3,
        },
        SheetLayout {
            sheet: "Page3",
            when_any: PAGE3_FIELDS,
            cells: colour_equipment,
            series: &[],
        },
    ]
}

const COA_SHEET_18GSM: SheetLayout = SheetLayout {
    sheet: "COA Form",
    when_any: &[],
    cells: COA_18GSM,
    series: &[],
};

const PAGE2_18GSM: SheetLayout = SheetLayout {
    sheet: "Page2",
    when_any: PAGE2_FIELDS,
    cells: PERSONNEL_18GSM_PAGE2,
    series: SERIES_18GSM_PAGE2,
};

const ABQR_PAGE1: [SheetLayout; 2] = page1(EQUIPMENT_18GSM_PAGE1);
const ABQR_PAGE3: [SheetLayout; 2] = page3(PRINTED_COLOUR_EQUIPMENT);
const BFQR_PAGE3: [SheetLayout; 2] = page3(BASE_FILM_EQUIPMENT);
const W210_PAGE1: [SheetLayout; 2] = page1(EQUIPMENT_210W_PAGE1);

/// 250P, 290P and 290NP ABQR.
pub const UC_18GSM_ABQR: &[SheetLayout] = &[
    ABQR_PAGE1[0],
    ABQR_PAGE1[1],
    PAGE2_18GSM,
    ABQR_PAGE3[0],
    ABQR_PAGE3[1],
    COA_SHEET_18GSM,
];

pub const UC_18GSM_250W_BFQR: &[SheetLayout] = &[
    ABQR_PAGE1[0],
    ABQR_PAGE1[1],
    PAGE2_18GSM,
    BFQR_PAGE3[0],
    BFQR_PAGE3[1],
    COA_SHEET_18GSM,
];

pub const UC_18GSM_210W_BFQR: &[SheetLayout] = &[
    W210_PAGE1[0],
    W210_PAGE1[1],
    SheetLayout {
        sheet: "Page2",
        when_any: PAGE2_FIELDS,
        cells: PERSONNEL_210W_PAGE2,
        series: SERIES_210W_PAGE2,
    },
    BFQR_PAGE3[0],
    BFQR_PAGE3[1],
    COA_SHEET_18GSM,
];

// ============================================================================
// UC 16gsm 165W
// ============================================================================

const PAGE1_165W_FIELDS: &[&str] = &[
    "page1_basis_weight",
    "page1_thickness",
    "page1_cof_rr",
    "page1_tensile_break",
    "page1_elongation",
    "page1_modulus",
];

const PAGE3_165W_FIELDS: &[&str] = &[
    "page3_colour_l",
    "page3_colour_a",
    "page3_colour_b",
    "page3_delta_e",
];

const HEADER_165W: &[CellRule] = &[
    CellRule::field("B4", "product_code"),
    CellRule::field("B5", "specification"),
    CellRule::field("I3", "ref_no"),
    CellRule::field("E4", "production_order"),
    CellRule::field("E5", "purchase_order").or("NA"),
    CellRule::field("G4", "machine_no"),
    CellRule::field("G5", "quantity").format(Format::Rolls),
    CellRule::field("I4", "production_date").format(Format::Date),
    CellRule::field("I5", "inspection_date").format(Format::Date),
];

const TENSILE_165W: &[&[&str]] = &[
    &["equipment_used", "page1", "tensile_break"],
    &["equipment_used", "page1", "elongation"],
    &["equipment_used", "page1", "modulus_10"],
];

const UTM_165W: &[&[&str]] = &[
    &["equipment_used", "page2", "tensile_break"],
    &["equipment_used", "page2", "cd_elongation"],
    &["equipment_used", "page2", "modulus"],
];

const PAGE1_165W: &[CellRule] = &[
    CellRule::path("D6", &["equipment_used", "page1", "film_weight"]).within(PAGE1_EQUIPMENT),
    CellRule::path("E6", &["equipment_used", "page1", "thickness"]).within(PAGE1_EQUIPMENT),
    CellRule::path("F6", &["equipment_used", "page1", "cof_rr"]).within(PAGE1_EQUIPMENT),
    CellRule::first_of("G6", TENSILE_165W).within(PAGE1_EQUIPMENT),
    CellRule::first_of("H6", TENSILE_165W).within(PAGE1_EQUIPMENT),
    CellRule::first_of("I6", TENSILE_165W).within(PAGE1_EQUIPMENT),
    CellRule::field("B42", "prepared_by").or("Unknown User"),
    CellRule::field("B43", "inspection_date").format(Format::Date),
    CellRule::field("H42", "verified_by").or("Not Verified"),
    CellRule::field("H43", "verified_date").format(Format::Date),
];

const SERIES_165W_PAGE1: &[SeriesRule] = &[
    SeriesRule::text("A", PAGE1_ROWS, "lot_and_roll"),
    SeriesRule::text("B", PAGE1_ROWS, "roll_id"),
    SeriesRule::text("C", PAGE1_ROWS, "lot_time"),
    SeriesRule::number("D", PAGE1_ROWS, "page1_basis_weight"),
    SeriesRule::number("E", PAGE1_ROWS, "page1_thickness"),
    SeriesRule::number("F", PAGE1_ROWS, "page1_cof_rr"),
    SeriesRule::number("G", PAGE1_ROWS, "page1_tensile_break"),
    SeriesRule::number("H", PAGE1_ROWS, "page1_elongation"),
    SeriesRule::number("I", PAGE1_ROWS, "page1_modulus"),
];

const PAGE2_165W: &[CellRule] = &[
    CellRule::first_of("D6", UTM_165W).within(PAGE2_EQUIPMENT),
    CellRule::first_of("E6", UTM_165W).within(PAGE2_EQUIPMENT),
    CellRule::first_of("F6", UTM_165W).within(PAGE2_EQUIPMENT),
    CellRule::path("G6", &["equipment_used", "page2", "opacity"]).within(PAGE2_EQUIPMENT),
    CellRule::path("H6", &["equipment_used", "page2", "roll_width"]).within(PAGE2_EQUIPMENT),
    CellRule::path("I6", &["equipment_used", "page2", "diameter"]).within(PAGE2_EQUIPMENT),
];

const SERIES_165W_PAGE2: &[SeriesRule] = &[
    SeriesRule::text("A", PAGE2_ROWS, "lot_and_roll"),
    SeriesRule::text("B", PAGE2_ROWS, "roll_id"),
    SeriesRule::text("C", PAGE2_ROWS, "lot_time"),
    SeriesRule::number("D", PAGE2_ROWS, "page2_tensile_break"),
    SeriesRule::number("E", PAGE2_ROWS, "page2_cd_elongation"),
    SeriesRule::number("F", PAGE2_ROWS, "page2_modulus"),
    SeriesRule::number("G", PAGE2_ROWS, "page2_opacity"),
    SeriesRule::number("H", PAGE2_ROWS, "page2_roll_width"),
    SeriesRule::number("I", PAGE2_ROWS, "page2_diameter"),
];

const SERIES_165W_PAGE3: &[SeriesRule] = &[
    SeriesRule::text("A", PAGE1_ROWS, "lot_and_roll"),
    SeriesRule::text("B", PAGE1_ROWS, "roll_id"),
    SeriesRule::text("C", PAGE1_ROWS, "lot_time"),
    SeriesRule::number("D", PAGE1_ROWS, "page3_colour_l"),
    SeriesRule::number("E", PAGE1_ROWS, "page3_colour_a"),
    SeriesRule::number("F", PAGE1_ROWS, "page3_colour_b"),
    SeriesRule::number("G", PAGE1_ROWS, "page3_delta_e"),
];

pub const UC_16GSM_165W: &[SheetLayout] = &[
    SheetLayout {
        sheet: "Page1",
        when_any: &[],
        cells: HEADER_165W,
        series: &[],
    },
    SheetLayout {
        sheet: "Page1",
        when_any: PAGE1_165W_FIELDS,
        cells: PAGE1_165W,
        series: SERIES_165W_PAGE1,
    },
    SheetLayout {
        sheet: "Page2",
        when_any: PAGE2_FIELDS,
        cells: PAGE2_165W,
        series: SERIES_165W_PAGE2,
    },
    SheetLayout {
        sheet: "Page3",
        when_any: PAGE3_165W_FIELDS,
        cells: &[
            CellRule::path("D6", &["equipment_used", "page3", "colour"]).within(PAGE3_EQUIPMENT),
        ],
        series: SERIES_165W_PAGE3,
    },
    SheetLayout {
        sheet: "COA Form",
        when_any: &[],
        cells: &[
            CellRule::field("B7", "lot_no"),
            CellRule::sign_off("C34", "inspection_date", "prepared_by", "Unknown User"),
            CellRule::sign_off("F34", "approved_date", "approved_by", "Not Approved"),
        ],
        series: &[],
    },
];

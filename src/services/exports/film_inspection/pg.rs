//! P&G film inspection layouts.
//!
//! Page1 carries the header and per-roll tests written top-down from row 8.
//! MD/CD tensile pages are entered from the bottom of the sheet upwards on
//! the Kranti, WW and 168-16C white forms, and by sample number on the newer
//! white forms.

use super::{PAGE1_EQUIPMENT, PAGE4_EQUIPMENT};
use crate::services::mapping::{CellRule, Fill, Format, SeriesRule, SheetLayout};

const PAGE1_ROWS: (u32, u32) = (8, 37);
const TENSILE_ROWS: (u32, u32) = (9, 38);

// ============================================================================
// Shared pieces
// ============================================================================

const fn personnel(verified_name: &'static str, verified_date: &'static str) -> [CellRule; 5] {
    [
        CellRule::field("B42", "prepared_by").or("Unknown User"),
        CellRule::field("B43", "inspection_date").format(Format::Date),
        CellRule::field(verified_name, "verified_by").or("Not Verified"),
        CellRule::field(verified_date, "verified_date").format(Format::Date),
        CellRule::field("O3", "ref_no"),
    ]
}

const PERSONNEL_M: [CellRule; 5] = personnel("M42", "M43");
const PERSONNEL_L: [CellRule; 5] = personnel("L42", "L43");

const fn tensile(fill: Fill, columns: [&'static str; 9], fields: [&'static str; 9]) -> [SeriesRule; 9] {
    let mut out = [SeriesRule::number("D", TENSILE_ROWS, ""); 9];
    let mut i = 0;
    while i < 9 {
        out[i] = SeriesRule::number(columns[i], TENSILE_ROWS, fields[i]).fill(fill);
        i += 1;
    }
    out
}

const TENSILE_COLUMNS: [&str; 9] = ["D", "E", "F", "H", "I", "J", "L", "M", "N"];

const MD_FIELDS: [&str; 9] = [
    "page2_elongation_md_1",
    "page2_elongation_md_2",
    "page2_elongation_md_3",
    "page2_force_md_1",
    "page2_force_md_2",
    "page2_force_md_3",
    "page2_force_5p_md_1",
    "page2_force_5p_md_2",
    "page2_force_5p_md_3",
];

const CD_FIELDS: [&str; 9] = [
    "page3_elongation_cd_1",
    "page3_elongation_cd_2",
    "page3_elongation_cd_3",
    "page3_force_cd_1",
    "page3_force_cd_2",
    "page3_force_cd_3",
    "page3_modulus_1",
    "page3_modulus_2",
    "page3_modulus_3",
];

const MD_BOTTOM_UP: [SeriesRule; 9] = tensile(Fill::BottomUp, TENSILE_COLUMNS, MD_FIELDS);
const CD_BOTTOM_UP: [SeriesRule; 9] = tensile(Fill::BottomUp, TENSILE_COLUMNS, CD_FIELDS);
const MD_KEYED: [SeriesRule; 9] = tensile(Fill::Keyed, TENSILE_COLUMNS, MD_FIELDS);
const CD_KEYED: [SeriesRule; 9] = tensile(Fill::Keyed, TENSILE_COLUMNS, CD_FIELDS);

const PAGE2_EQUIPMENT: &[CellRule] =
    &[CellRule::path("D6", &["equipment_used", "page2", "common"]).within(super::PAGE2_EQUIPMENT)];
const PAGE3_EQUIPMENT: &[CellRule] =
    &[CellRule::path("D6", &["equipment_used", "page3", "common"]).within(super::PAGE3_EQUIPMENT)];

const ROLL_COLUMNS: &[SeriesRule] = &[
    SeriesRule::text("A", PAGE1_ROWS, "lot_and_roll"),
    SeriesRule::text("B", PAGE1_ROWS, "roll_id"),
    SeriesRule::text("C", PAGE1_ROWS, "lot_time"),
];

const fn sheet(
    sheet: &'static str,
    cells: &'static [CellRule],
    series: &'static [SeriesRule],
) -> SheetLayout {
    SheetLayout {
        sheet,
        when_any: &[],
        cells,
        series,
    }
}

// ============================================================================
// 168-16CP Kranti and 176-18CP WW
// ============================================================================

const KRANTI_EQUIPMENT: &[CellRule] = &[
    CellRule::path("D6", &["equipment_used", "page1", "basic_weight"]).within(PAGE1_EQUIPMENT),
    CellRule::path("F6", &["equipment_used", "page1", "thickness"]).within(PAGE1_EQUIPMENT),
    CellRule::path("H6", &["equipment_used", "page1", "opacity"]).within(PAGE1_EQUIPMENT),
    CellRule::path("J6", &["equipment_used", "page1", "cof"]).within(PAGE1_EQUIPMENT),
    CellRule::path("L6", &["equipment_used", "page1", "cut_width"]).within(PAGE1_EQUIPMENT),
    CellRule::path("N6", &["equipment_used", "page1", "color_unprinted"]).within(PAGE1_EQUIPMENT),
];

const KRANTI_SERIES: &[SeriesRule] = &[
    SeriesRule::number("D", PAGE1_ROWS, "page1_basis_weight"),
    SeriesRule::number("F", PAGE1_ROWS, "page1_thickness"),
    SeriesRule::number("H", PAGE1_ROWS, "page1_opacity"),
    SeriesRule::number("J", PAGE1_ROWS, "page1_cof_kinetic"),
    SeriesRule::number("L", PAGE1_ROWS, "page1_cut_width"),
    SeriesRule::number("N", PAGE1_ROWS, "page1_color_delta_unprinted"),
    SeriesRule::number("O", PAGE1_ROWS, "page1_color_delta_printed"),
];

const KRANTI_HEADER: &[CellRule] = &[
    CellRule::field("C4", "product_code"),
    CellRule::field("C5", "specification"),
    CellRule::field("H4", "production_order"),
    CellRule::field("H5", "purchase_order"),
    CellRule::field("K4", "machine_no"),
    CellRule::field("K5", "quantity").format(Format::Rolls),
    CellRule::field("N4", "production_date").format(Format::Date),
    CellRule::field("N5", "inspection_date").format(Format::Date),
    CellRule::field("B41", "prepared_by").or("Unknown User"),
    CellRule::field("B42", "inspection_date").format(Format::Date),
    CellRule::field("M41", "verified_by").or("Not Verified"),
    CellRule::field("M42", "verified_date").format(Format::Date),
    CellRule::field("O3", "ref_no"),
];

const WW_HEADER: &[CellRule] = &[
    CellRule::field("B4", "product_code"),
    CellRule::field("B5", "specification"),
    CellRule::field("G4", "production_order"),
    CellRule::field("G5", "purchase_order"),
    CellRule::field("J4", "machine_no"),
    CellRule::field("J5", "quantity").format(Format::Rolls),
    CellRule::field("N4", "production_date").format(Format::Date),
    CellRule::field("N5", "inspection_date").format(Format::Date),
    CellRule::field("B41", "prepared_by").or("Unknown User"),
    CellRule::field("B42", "inspection_date").format(Format::Date),
    CellRule::field("M41", "verified_by").or("Not Verified"),
    CellRule::field("M42", "verified_date").format(Format::Date),
    CellRule::field("O3", "ref_no"),
];

const GLOSS_PAGE4: &[SeriesRule] = &[
    SeriesRule::number("D", TENSILE_ROWS, "page4_gloss_1").fill(Fill::BottomUp),
    SeriesRule::number("E", TENSILE_ROWS, "page4_gloss_2").fill(Fill::BottomUp),
    SeriesRule::number("F", TENSILE_ROWS, "page4_gloss_3").fill(Fill::BottomUp),
    SeriesRule::number("H", TENSILE_ROWS, "page4_pg_quality").fill(Fill::BottomUpCompact),
];

const GLOSS_EQUIPMENT: &[CellRule] =
    &[CellRule::path("D6", &["equipment_used", "page4", "gloss"]).within(PAGE4_EQUIPMENT)];

const BOTTOM_UP_PAGES: [SheetLayout; 7] = [
    sheet("Page2", &PERSONNEL_M, &MD_BOTTOM_UP),
    sheet("Page2", PAGE2_EQUIPMENT, &[]),
    sheet("Page3", &PERSONNEL_M, &CD_BOTTOM_UP),
    sheet("Page3", PAGE3_EQUIPMENT, &[]),
    sheet("Page4", &PERSONNEL_M, GLOSS_PAGE4),
    sheet("Page4", GLOSS_EQUIPMENT, &[]),
    sheet("Page1", KRANTI_EQUIPMENT, ROLL_COLUMNS),
];

pub const KRANTI_168_16CP: &[SheetLayout] = &[
    sheet("Page1", KRANTI_HEADER, KRANTI_SERIES),
    BOTTOM_UP_PAGES[6],
    BOTTOM_UP_PAGES[0],
    BOTTOM_UP_PAGES[1],
    BOTTOM_UP_PAGES[2],
    BOTTOM_UP_PAGES[3],
    BOTTOM_UP_PAGES[4],
    BOTTOM_UP_PAGES[5],
];

pub const WW_176_18CP: &[SheetLayout] = &[
    sheet("Page1", WW_HEADER, KRANTI_SERIES),
    BOTTOM_UP_PAGES[6],
    BOTTOM_UP_PAGES[0],
    BOTTOM_UP_PAGES[1],
    BOTTOM_UP_PAGES[2],
    BOTTOM_UP_PAGES[3],
    BOTTOM_UP_PAGES[4],
    BOTTOM_UP_PAGES[5],
];

// ============================================================================
// White forms
// ============================================================================

const fn white_header(
    order: &'static str,
    purchase_order: &'static str,
    product: CellRule,
) -> [CellRule; 13] {
    [
        product,
        CellRule::field("B5", "specification"),
        CellRule::field(order, "production_order"),
        CellRule::field(purchase_order, "purchase_order"),
        CellRule::field("J4", "machine_no"),
        CellRule::field("J5", "quantity").format(Format::Rolls),
        CellRule::field("N4", "production_date").format(Format::Date),
        CellRule::field("N5", "inspection_date").format(Format::Date),
        CellRule::field("B41", "prepared_by").or("Unknown User"),
        CellRule::field("B42", "inspection_date").format(Format::Date),
        CellRule::field("L41", "verified_by").or("Not Verified"),
        CellRule::field("L42", "verified_date").format(Format::Date),
        CellRule::field("O3", "ref_no"),
    ]
}

const PRODUCT_CODE: CellRule = CellRule::field("B4", "product_code");

const WHITE_HEADER_G: [CellRule; 13] = white_header("G4", "G5", PRODUCT_CODE);
const WHITE_HEADER_F: [CellRule; 13] = white_header("F4", "F5", PRODUCT_CODE);
const WHITE_HEADER_JEDDAH: [CellRule; 13] = white_header(
    "F4",
    "F5",
    CellRule::field("B4", "product_code").format(Format::ProductCode),
);

const WHITE_EQUIPMENT: &[CellRule] = &[
    CellRule::path("D6", &["equipment_used", "page1", "basic_weight"]).within(PAGE1_EQUIPMENT),
    CellRule::path("G6", &["equipment_used", "page1", "thickness"]).within(PAGE1_EQUIPMENT),
    CellRule::path("J6", &["equipment_used", "page1", "opacity"]).within(PAGE1_EQUIPMENT),
    CellRule::path("M6", &["equipment_used", "page1", "cof"]).within(PAGE1_EQUIPMENT),
];

const WHITE_SERIES: &[SeriesRule] = &[
    SeriesRule::text("A", PAGE1_ROWS, "lot_and_roll"),
    SeriesRule::text("B", PAGE1_ROWS, "roll_id"),
    SeriesRule::text("C", PAGE1_ROWS, "lot_time"),
    SeriesRule::number("D", PAGE1_ROWS, "page1_basis_weight"),
    SeriesRule::number("G", PAGE1_ROWS, "page1_thickness"),
    SeriesRule::number("J", PAGE1_ROWS, "page1_opacity"),
    SeriesRule::number("M", PAGE1_ROWS, "page1_cof_kinetic"),
];

const WHITE_PAGE4_EQUIPMENT: &[CellRule] = &[
    CellRule::path("D6", &["equipment_used", "page4", "color_common"]).within(PAGE4_EQUIPMENT),
    CellRule::path("L6", &["equipment_used", "page4", "gloss"]).within(PAGE4_EQUIPMENT),
];

const fn colour_gloss(fill: Fill) -> [SeriesRule; 7] {
    [
        SeriesRule::number("D", TENSILE_ROWS, "page4_color_l").fill(fill),
        SeriesRule::number("F", TENSILE_ROWS, "page4_color_a").fill(fill),
        SeriesRule::number("H", TENSILE_ROWS, "page4_color_b").fill(fill),
        SeriesRule::number("J", TENSILE_ROWS, "page4_color_delta_e").fill(fill),
        SeriesRule::number("L", TENSILE_ROWS, "page4_gloss_1").fill(fill),
        SeriesRule::number("M", TENSILE_ROWS, "page4_gloss_2").fill(fill),
        SeriesRule::number("N", TENSILE_ROWS, "page4_gloss_3").fill(fill),
    ]
}

const COLOUR_GLOSS_BOTTOM_UP: [SeriesRule; 7] = colour_gloss(Fill::BottomUp);
const COLOUR_GLOSS_KEYED: [SeriesRule; 7] = colour_gloss(Fill::Keyed);

const PG_QUALITY_PAGE5: &[SeriesRule] =
    &[SeriesRule::number("D", TENSILE_ROWS, "page5_pg_quality").fill(Fill::BottomUpCompact)];

const PAGE5_EQUIPMENT: &[CellRule] =
    &[CellRule::path("D6", &["equipment_used", "page5", "common"]).within(super::PAGE5_EQUIPMENT)];

const PAGE2_WHITE_FIELDS: &[&str] = &[
    "page2_elongation_md_1",
    "page2_force_md_1",
    "page2_force_5p_md_1",
];

pub const WHITE_168_16C: &[SheetLayout] = &[
    sheet("Page1", &WHITE_HEADER_G, WHITE_SERIES),
    sheet("Page1", WHITE_EQUIPMENT, &[]),
    sheet("Page2", &PERSONNEL_M, &MD_BOTTOM_UP),
    sheet("Page2", PAGE2_EQUIPMENT, &[]),
    sheet("Page3", &PERSONNEL_M, &CD_BOTTOM_UP),
    sheet("Page3", PAGE3_EQUIPMENT, &[]),
    sheet("Page4", &PERSONNEL_M, &COLOUR_GLOSS_BOTTOM_UP),
    sheet("Page4", WHITE_PAGE4_EQUIPMENT, &[]),
    sheet("Page5", &PERSONNEL_M, PG_QUALITY_PAGE5),
    sheet("Page5", PAGE5_EQUIPMENT, &[]),
];

const fn keyed_white(header: &'static [CellRule], people: &'static [CellRule]) -> [SheetLayout; 8] {
    [
        sheet("Page1", header, WHITE_SERIES),
        sheet("Page1", WHITE_EQUIPMENT, &[]),
        SheetLayout {
            sheet: "Page2",
            when_any: PAGE2_WHITE_FIELDS,
            cells: people,
            series: &MD_KEYED,
        },
        sheet("Page2", PAGE2_EQUIPMENT, &[]),
        sheet("Page3", people, &CD_KEYED),
        sheet("Page3", PAGE3_EQUIPMENT, &[]),
        sheet("Page4", people, &COLOUR_GLOSS_KEYED),
        sheet("Page4", WHITE_PAGE4_EQUIPMENT, &[]),
    ]
}

const WHITE_168_18C_PAGES: [SheetLayout; 8] = keyed_white(&WHITE_HEADER_F, &PERSONNEL_L);
const WHITE_JEDDAH_PAGES: [SheetLayout; 8] = keyed_white(&WHITE_HEADER_JEDDAH, &PERSONNEL_L);
const WHITE_102_PAGES: [SheetLayout; 8] = keyed_white(&WHITE_HEADER_F, &PERSONNEL_M);

pub const WHITE_168_18C: &[SheetLayout] = &WHITE_168_18C_PAGES;
pub const WHITE_168_18C_JEDDAH: &[SheetLayout] = &WHITE_JEDDAH_PAGES;
pub const WHITE_102_18C: &[SheetLayout] = &WHITE_102_PAGES;

// ============================================================================
// Micro white
// ============================================================================

const MICRO_ROWS: (u32, u32) = (9, 38);
const MICRO_PAGE2_ROWS: (u32, u32) = (8, 37);

const MICRO_HEADER: &[CellRule] = &[
    CellRule::field("C4", "product_code"),
    CellRule::field("C5", "specification"),
    CellRule::field("F4", "production_order"),
    CellRule::field("F5", "purchase_order"),
    CellRule::field("H4", "machine_no"),
    CellRule::field("H5", "quantity").format(Format::Rolls),
    CellRule::field("L4", "production_date").format(Format::Date),
    CellRule::field("L5", "inspection_date").format(Format::Date),
    CellRule::field("B42", "prepared_by").or("Unknown User"),
    CellRule::field("B43", "inspection_date").format(Format::Date),
    CellRule::field("I42", "verified_by").or("Not Verified"),
    CellRule::field("I43", "verified_date").format(Format::Date),
    CellRule::field("L3", "ref_no"),
    CellRule::path("D6", &["equipment_used", "page1", "basic_weight"]).within(PAGE1_EQUIPMENT),
    CellRule::first_of(
        "E6",
        &[
            &["equipment_used", "page1", "cof_rr"],
            &["equipment_used", "page1", "cof_rs"],
        ],
    )
    .within(PAGE1_EQUIPMENT),
    CellRule::path("G6", &["equipment_used", "page1", "opacity"]).within(PAGE1_EQUIPMENT),
    CellRule::path("H6", &["equipment_used", "page1", "modulus"]).within(PAGE1_EQUIPMENT),
    CellRule::path("L6", &["equipment_used", "page1", "gloss"]).within(PAGE1_EQUIPMENT),
];

const MICRO_214_SERIES: &[SeriesRule] = &[
    SeriesRule::text("A", MICRO_ROWS, "lot_and_roll"),
    SeriesRule::text("B", MICRO_ROWS, "roll_id"),
    SeriesRule::text("C", MICRO_ROWS, "lot_time"),
    SeriesRule::number("D", MICRO_ROWS, "page1_basis_weight").fill(Fill::Keyed),
    SeriesRule::number("G", MICRO_ROWS, "page1_opacity").fill(Fill::Keyed),
    SeriesRule::number("H", MICRO_ROWS, "page1_modulus_1").fill(Fill::Keyed),
    SeriesRule::number("I", MICRO_ROWS, "page1_modulus_2").fill(Fill::Keyed),
    SeriesRule::number("J", MICRO_ROWS, "page1_modulus_3").fill(Fill::Keyed),
    SeriesRule::number("L", MICRO_ROWS, "page1_gloss").fill(Fill::Keyed),
];

const MICRO_COF_SERIES: &[SeriesRule] = &[
    SeriesRule::number("E", MICRO_ROWS, "page1_cof_kinetic_r_r").fill(Fill::Keyed),
    SeriesRule::number("F", MICRO_ROWS, "page1_cof_kinetic_r_s").fill(Fill::Keyed),
];

const MICRO_PAGE2_FIELDS: &[&str] = &[
    "page2_force_elongation_md_5p",
    "page2_force_tensile_md",
    "page2_force_elongation_cd_5p",
    "page2_force_tensile_cd",
    "page2_color_l",
    "page2_color_a",
    "page2_color_b",
    "page2_color_delta_e",
];

const MICRO_PAGE2: &[CellRule] = &[
    CellRule::field("B41", "prepared_by").or("Unknown User"),
    CellRule::field("B42", "inspection_date").format(Format::Date),
    CellRule::field("I41", "verified_by").or("Not Verified"),
    CellRule::field("I42", "verified_date").format(Format::Date),
    CellRule::field("K3", "ref_no"),
    CellRule::path("D6", &["equipment_used", "page2", "force"]).within(super::PAGE2_EQUIPMENT),
    CellRule::path("H6", &["equipment_used", "page2", "colour"]).within(super::PAGE2_EQUIPMENT),
];

const MICRO_PAGE2_SERIES: &[SeriesRule] = &[
    SeriesRule::number("D", MICRO_PAGE2_ROWS, "page2_force_elongation_md_5p").fill(Fill::Keyed),
    SeriesRule::number("E", MICRO_PAGE2_ROWS, "page2_force_tensile_md").fill(Fill::Keyed),
    SeriesRule::number("F", MICRO_PAGE2_ROWS, "page2_force_elongation_cd_5p").fill(Fill::Keyed),
    SeriesRule::number("G", MICRO_PAGE2_ROWS, "page2_force_tensile_cd").fill(Fill::Keyed),
    SeriesRule::number("H", MICRO_PAGE2_ROWS, "page2_color_l").fill(Fill::Keyed),
    SeriesRule::number("I", MICRO_PAGE2_ROWS, "page2_color_a").fill(Fill::Keyed),
    SeriesRule::number("J", MICRO_PAGE2_ROWS, "page2_color_b").fill(Fill::Keyed),
    SeriesRule::number("K", MICRO_PAGE2_ROWS, "page2_color_delta_e").fill(Fill::Keyed),
];

pub const MICRO_234_18: &[SheetLayout] = &[
    sheet("Page1", MICRO_HEADER, MICRO_214_SERIES),
    sheet("Page1", &[], MICRO_COF_SERIES),
    SheetLayout {
        sheet: "Page2",
        when_any: MICRO_PAGE2_FIELDS,
        cells: MICRO_PAGE2,
        series: MICRO_PAGE2_SERIES,
    },
];

pub const MICRO_214_18: &[SheetLayout] = &[sheet("Page1", MICRO_HEADER, MICRO_214_SERIES)];

//! Spreadsheet exporters, one module per form family.

pub mod control_datapoints;
pub mod film_inspection;
pub mod inline_inspection;
pub mod maintenance;
pub mod prestore;
pub mod production_defects;
pub mod quality_alert;

pub use film_inspection::{find_variant, Variant, VARIANTS};

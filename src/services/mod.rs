//! Service layer for filmqa.
//!
//! - Formatting (dates, times, statuses, filenames)
//! - Workbook (template loading, cell writes, protected download)
//! - Mapping (declarative cell and series rules)
//! - Exports (one exporter per form family)

pub mod exports;
pub mod formatting;
pub mod mapping;
pub mod workbook;

pub use workbook::{Templates, Workbook, XlsxDownload};

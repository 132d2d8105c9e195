//! Shared helpers for integration tests.
//!
//! Every test gets an in-memory database and a temp directory of
//! programmatically built templates, one per export.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;

use axum::Router;
use axum_test::TestServer;
use filmqa::config::ExportConfig;
use filmqa::db::{self, DbPool};
use filmqa::services::Templates;
use filmqa::AppState;
use tempfile::TempDir;
use umya_spreadsheet::Spreadsheet;

/// Template files and the sheets each one carries.
pub const TEMPLATES: &[(&str, &[&str])] = &[
    ("UC-16gsm-165W.xlsx", &["Page1", "Page2", "Page3", "COA Form"]),
    ("UC-18gsm-250P-ABQR.xlsx", &["Page1", "Page2", "Page3", "COA Form"]),
    ("168-16cp-kranti.xlsx", &["Page1", "Page2", "Page3", "Page4", "COA Form"]),
    ("pre-store-form.xlsx", &["Pre-Store"]),
    ("Inline-inspection-form.xlsx", &["Page1", "Page2", "Page3"]),
    ("quality-alert-form.xlsx", &["Sheet1"]),
    ("maintenance-job-requisition.xlsx", &["Sheet1"]),
    ("machine-history-card.xlsx", &["Page1"]),
    ("Control-Datapoints.xlsx", &["Sheet1"]),
    ("total-production-defects.xlsx", &["Sheet1"]),
];

/// A running test application and the resources it borrows.
pub struct TestApp {
    pub server: TestServer,
    pub db: DbPool,
    /// Holds the template directory alive for the test's duration.
    pub templates_dir: TempDir,
}

/// Create a test database with the schema applied.
pub async fn setup_test_db() -> DbPool {
    let pool = db::init_pool(":memory:")
        .await
        .expect("Failed to create test database");
    db::initialize_schema(&pool)
        .await
        .expect("Failed to initialize schema");
    pool
}

/// Write a blank workbook with the given sheets.
pub fn write_template(dir: &Path, file: &str, sheets: &[&str]) {
    let mut book = umya_spreadsheet::new_file();
    book.get_sheet_mut(&0).unwrap().set_name(sheets[0]);
    for name in &sheets[1..] {
        book.new_sheet(*name).unwrap();
    }
    umya_spreadsheet::writer::xlsx::write(&book, dir.join(file)).expect("Failed to write template");
}

/// Build a temp directory holding every template.
pub fn setup_templates() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for (file, sheets) in TEMPLATES {
        write_template(dir.path(), file, sheets);
    }
    dir
}

/// Build the full router over the given pool and template directory.
pub fn build_app(pool: DbPool, templates_dir: &Path) -> Router {
    let templates = Templates::new(&ExportConfig::with_templates_dir(templates_dir));
    filmqa::app(AppState::from_parts(pool, templates))
}

pub async fn setup_app() -> TestApp {
    let db = setup_test_db().await;
    let templates_dir = setup_templates();
    let server = TestServer::new(build_app(db.clone(), templates_dir.path()))
        .expect("Failed to create test server");
    TestApp {
        server,
        db,
        templates_dir,
    }
}

/// Parse a downloaded workbook.
pub fn read_workbook(bytes: &[u8]) -> Spreadsheet {
    umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes.to_vec()), true)
        .expect("Download is not a valid xlsx")
}

/// Value of `cell` on the named sheet.
pub fn cell(book: &Spreadsheet, sheet: &str, cell: &str) -> String {
    book.get_sheet_by_name(sheet)
        .unwrap_or_else(|| panic!("sheet {} missing", sheet))
        .get_value(cell)
}

pub fn sheet_names(book: &Spreadsheet) -> Vec<String> {
    book.get_sheet_collection()
        .iter()
        .map(|s| s.get_name().to_string())
        .collect()
}

/// Every sheet of a download is locked with a password.
pub fn assert_protected(book: &Spreadsheet) {
    for sheet in book.get_sheet_collection() {
        let protection = sheet
            .get_sheet_protection()
            .unwrap_or_else(|| panic!("sheet {} is not protected", sheet.get_name()));
        assert!(*protection.get_sheet(), "sheet {} is unlocked", sheet.get_name());
        assert!(
            !protection.get_hash_value().is_empty(),
            "sheet {} has no password",
            sheet.get_name()
        );
    }
}

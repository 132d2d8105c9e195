//! Export integration tests.
//!
//! Seeds the database, downloads each spreadsheet through the router and
//! reads the returned workbook back.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use axum_test::TestResponse;
use common::{
    assert_protected, build_app, cell, read_workbook, setup_app, setup_templates, setup_test_db,
    sheet_names, TestApp,
};
use filmqa::db::{self, SaveFilmInspectionForm, SaveInlineInspectionLot};
use serde_json::{json, Value};
use tower::ServiceExt;
use umya_spreadsheet::Spreadsheet;

fn disposition(response: &TestResponse) -> String {
    response
        .header("content-disposition")
        .to_str()
        .unwrap()
        .to_string()
}

fn download(response: &TestResponse) -> Spreadsheet {
    response.assert_status_ok();
    assert_eq!(
        response.header("content-type"),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let book = read_workbook(response.as_bytes());
    assert_protected(&book);
    book
}

async fn seed_film_form(app: &TestApp, variant: &str) -> String {
    let form = db::create_film_form(
        &app.db,
        SaveFilmInspectionForm {
            variant: variant.into(),
            product_code: Some("UC-16gsm-165W".into()),
            specification: Some("16 gsm white".into()),
            customer: Some("P&G".into()),
            location: Some("Jeddah".into()),
            lot_no: Some("L-77".into()),
            quantity: Some(48),
            production_date: Some("2024-03-05".into()),
            inspection_date: Some("2024-03-06".into()),
            prepared_by: Some("Meera".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    form.form_id
}

fn lot(code: &str, letter: &str, machine: &str, defects: Value) -> SaveInlineInspectionLot {
    SaveInlineInspectionLot {
        traceability_code: code.into(),
        lot_letter: letter.into(),
        customer: Some("P&G".into()),
        prod_code: Some("168-18C (Jeddah)".into()),
        production_date: Some("2024-03-05".into()),
        mc_no: Some(machine.into()),
        shift: Some("2".into()),
        emboss_type: Some("Matte".into()),
        inspection_data: json!({
            "rolls": [
                {"lot_no": "1", "roll_position": "1", "roll_weight": "25.4", "accept_reject": "Accept"},
                {"lot_no": "1", "roll_position": "2", "roll_weight": "25.1", "accept_reject": "Reject"},
            ]
        }),
        defect_names: defects,
        accepted_rolls: 10,
        ..Default::default()
    }
}

// ============================================================================
// Film inspection forms
// ============================================================================

#[tokio::test]
async fn test_film_form_export_fills_template() {
    let app = setup_app().await;
    let form_id = seed_film_form(&app, "uc-16gsm-165w").await;

    let response = app
        .server
        .get("/export-uc-16gsm-165w-form")
        .add_query_param("form_id", &form_id)
        .await;
    let book = download(&response);

    assert_eq!(
        disposition(&response),
        "attachment; filename=\"FIF-UC-16gsm-165W-.xlsx\""
    );
    assert_eq!(cell(&book, "Page1", "B4"), "UC-16gsm-165W");
    assert_eq!(cell(&book, "Page1", "B5"), "16 gsm white");
    assert_eq!(cell(&book, "COA Form", "B7"), "L-77");
}

#[tokio::test]
async fn test_film_form_export_requires_form_id() {
    let app = setup_app().await;

    let response = app.server.get("/export-uc-16gsm-165w-form").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "MISSING_PARAMETER"
    );
}

#[tokio::test]
async fn test_film_form_export_checks_variant() {
    let app = setup_app().await;
    let form_id = seed_film_form(&app, "uc-16gsm-165w").await;

    app.server
        .get("/export-168-16cp-kranti-form")
        .add_query_param("form_id", &form_id)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .get("/export-uc-16gsm-165w-form")
        .add_query_param("form_id", "missing")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_template_is_server_error() {
    let app = setup_app().await;
    let form_id = seed_film_form(&app, "168-18c-white").await;

    let response = app
        .server
        .get("/export-168-18c-white-form")
        .add_query_param("form_id", &form_id)
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["error"]["code"], "TEMPLATE_ERROR");
}

#[tokio::test]
async fn test_download_headers_via_oneshot() {
    let pool = setup_test_db().await;
    let templates = setup_templates();
    let form = db::create_film_form(
        &pool,
        SaveFilmInspectionForm {
            variant: "uc-18gsm-250p-abqr".into(),
            lot_no: Some("L-1".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let app = build_app(pool, templates.path());
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/export-uc-18gsm-250p-abqr-form?form_id={}", form.form_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"FIF-UC-18gsm-250P-ABQR-.xlsx\""
    );
    assert_eq!(
        headers[header::ACCESS_CONTROL_EXPOSE_HEADERS],
        "Content-Disposition"
    );
    let length: usize = headers[header::CONTENT_LENGTH]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body.len(), length);
    let book = read_workbook(&body);
    assert_protected(&book);
    assert_eq!(cell(&book, "COA Form", "B7"), "L-1");
}

// ============================================================================
// Pre-store
// ============================================================================

#[tokio::test]
async fn test_prestore_export() {
    let app = setup_app().await;
    let form_id = seed_film_form(&app, "uc-16gsm-165w").await;

    let response = app
        .server
        .get(&format!("/api/download-prestore-excel/{}", form_id))
        .await;
    let book = download(&response);

    assert_eq!(
        disposition(&response),
        "attachment; filename=\"Pre-Store-UC-16gsm-165W-.xlsx\""
    );
    assert_eq!(cell(&book, "Pre-Store", "B5"), "P&G (Jeddah)");
    assert_eq!(cell(&book, "Pre-Store", "O4"), "48 Rolls");
    assert_eq!(cell(&book, "Pre-Store", "T4"), "05/03/2024");
    assert_eq!(cell(&book, "Pre-Store", "B33"), "()\nNot Verified");
}

// ============================================================================
// Inline inspection
// ============================================================================

#[tokio::test]
async fn test_inline_export_single_page() {
    let app = setup_app().await;
    db::create_lot(&app.db, lot("T100", "A", "3", json!({"2": "Wrinkle"})))
        .await
        .unwrap();

    let response = app
        .server
        .get("/export")
        .add_query_param("traceability_code", "T100")
        .add_query_param("lot_letter", "A")
        .await;
    let book = download(&response);

    assert_eq!(
        disposition(&response),
        "attachment; filename=\"ILIF-T100-168-18C-Shift-B.xlsx\""
    );
    assert_eq!(sheet_names(&book), vec!["Page1".to_string()]);
    assert_eq!(cell(&book, "Page1", "D5"), "P&G");
    assert_eq!(cell(&book, "Page1", "D8"), "168-18C");
    assert_eq!(cell(&book, "Page1", "I11"), "✔");
}

fn long_lot(letter: &str, lot_no: u32, rolls: usize) -> SaveInlineInspectionLot {
    let rolls: Vec<Value> = (1..=rolls)
        .map(|position| {
            json!({
                "lot_no": lot_no.to_string(),
                "roll_position": position.to_string(),
                "roll_weight": "24.8",
            })
        })
        .collect();
    SaveInlineInspectionLot {
        inspection_data: json!({ "rolls": rolls }),
        defect_names: json!({}),
        ..lot("T300", letter, "5", json!({}))
    }
}

#[tokio::test]
async fn test_inline_export_overflows_to_third_page() {
    let app = setup_app().await;
    // Stored out of order; pages follow the first roll's lot number.
    for (letter, lot_no, rolls) in [("D", 4, 2), ("C", 3, 60), ("A", 1, 60), ("B", 2, 60)] {
        db::create_lot(&app.db, long_lot(letter, lot_no, rolls))
            .await
            .unwrap();
    }

    let response = app
        .server
        .get("/export")
        .add_query_param("traceability_code", "T300")
        .await;
    let book = download(&response);

    assert_eq!(
        sheet_names(&book),
        vec!["Page1".to_string(), "Page2".to_string(), "Page3".to_string()]
    );
    assert_eq!(cell(&book, "Page1", "A1"), "Page 1 of 3");
    assert_eq!(cell(&book, "Page1", "C14"), "01");
    assert_eq!(cell(&book, "Page2", "C14"), "02");
    assert_eq!(cell(&book, "Page3", "A1"), "Page 3 of 3");
    assert_eq!(cell(&book, "Page3", "C14"), "03");
    // Lot 4 would fit on Page1 but follows lot 3 once the third page starts.
    assert_eq!(cell(&book, "Page3", "C75"), "04");
    assert_eq!(cell(&book, "Page1", "C75"), "");
    assert_eq!(cell(&book, "Page3", "L85"), "20");
    assert_eq!(cell(&book, "Page3", "D8"), "168-18C");
}

#[tokio::test]
async fn test_inline_export_without_lots_is_404() {
    let app = setup_app().await;

    let response = app
        .server
        .get("/export")
        .add_query_param("traceability_code", "NOPE")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Quality alerts
// ============================================================================

#[tokio::test]
async fn test_quality_alert_export_single() {
    let app = setup_app().await;
    let alert = db::create_alert(
        &app.db,
        db::CreateQualityAlert {
            incident_title: Some("Gel spots".into()),
            incident_date: Some("2024-11-02".into()),
            incident_time: Some("14:35:00".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let response = app
        .server
        .get("/export-quality-alert")
        .add_query_param("alert_id", alert.id)
        .await;
    let book = download(&response);

    assert_eq!(
        disposition(&response),
        format!("attachment; filename=\"Quality_Alert_{}.xlsx\"", alert.id)
    );
    assert_eq!(cell(&book, "Sheet1", "A1"), "Alert ID:");
    assert_eq!(cell(&book, "Sheet1", "B1"), alert.id.to_string());
    assert_eq!(cell(&book, "Sheet1", "B3"), "02/11/2024");
}

#[tokio::test]
async fn test_quality_alert_bad_id() {
    let app = setup_app().await;

    let response = app
        .server
        .get("/export-quality-alert")
        .add_query_param("alert_id", "seven")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "INVALID_INPUT");
}

// ============================================================================
// Maintenance
// ============================================================================

#[tokio::test]
async fn test_mjr_export() {
    let app = setup_app().await;
    let requisition = db::create_requisition(
        &app.db,
        db::SaveJobRequisition {
            requisition_no: Some("MJR-9".into()),
            equipment_name: Some("Winder 2".into()),
            occur_date: Some("2024-04-02".into()),
            breakdown_codes: json!(["mechanical"]),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let response = app
        .server
        .get(&format!("/api/export-mjr-record/{}", requisition.id))
        .await;
    let book = download(&response);

    assert!(disposition(&response).starts_with("attachment; filename=\"MJR-MJR-9-"));
    assert_eq!(cell(&book, "Sheet1", "Q5"), "MJR-9");
    assert_eq!(cell(&book, "Sheet1", "C6"), "Winder 2");
    assert_eq!(cell(&book, "Sheet1", "D8"), "02/04/2024");
}

#[tokio::test]
async fn test_mjr_filename_is_header_safe() {
    let app = setup_app().await;
    let requisition = db::create_requisition(
        &app.db,
        db::SaveJobRequisition {
            requisition_no: Some("MJR/10\n\"A\"".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let response = app
        .server
        .get(&format!("/api/export-mjr-record/{}", requisition.id))
        .await;
    download(&response);
    assert!(disposition(&response).starts_with("attachment; filename=\"MJR-MJR-10--A--"));
}

#[tokio::test]
async fn test_history_card_from_database() {
    let app = setup_app().await;
    for (name, date) in [("Winder 2", "2024-04-02"), ("Chiller", "2024-04-03")] {
        db::create_requisition(
            &app.db,
            db::SaveJobRequisition {
                requisition_no: Some(format!("R-{}", date)),
                equipment_name: Some(name.into()),
                occur_date: Some(date.into()),
                occur_time: Some("08:00".into()),
                completion_time: Some("09:30".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    let response = app
        .server
        .get("/api/export-machine-history-card")
        .add_query_param("equipmentName", "Winder 2")
        .await;
    let book = download(&response);

    assert!(disposition(&response).contains("Machine-History-Card-Winder_2-"));
    assert_eq!(cell(&book, "Page1", "B5"), "Winder 2");
    assert_eq!(cell(&book, "Page1", "A9"), "2/4/2024");
    assert_eq!(cell(&book, "Page1", "B9"), "R-2024-04-02");
    assert_eq!(cell(&book, "Page1", "A10"), "");
}

#[tokio::test]
async fn test_history_card_empty_selection() {
    let app = setup_app().await;

    app.server
        .get("/api/export-machine-history-card")
        .add_query_param("equipmentName", "Nothing")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .post("/api/export-machine-history-card")
        .json(&json!({"data": []}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_card_from_posted_rows() {
    let app = setup_app().await;

    let response = app
        .server
        .post("/api/export-machine-history-card")
        .json(&json!({
            "data": [
                {"occurdate": "2024-05-10", "requisitionno": "R-2"},
                {"occurdate": "2024-05-01", "requisitionno": "R-1"},
            ],
        }))
        .await;
    let book = download(&response);

    assert!(disposition(&response).contains("Machine-History-Card-All-Equipment-2-Records-"));
    assert_eq!(cell(&book, "Page1", "B5"), "All Equipment");
    assert_eq!(cell(&book, "Page1", "B9"), "R-1");
    assert_eq!(cell(&book, "Page1", "B10"), "R-2");
}

// ============================================================================
// Control datapoints
// ============================================================================

#[tokio::test]
async fn test_control_datapoints_export() {
    let app = setup_app().await;

    app.server
        .get("/export-control-datapoints")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let point = db::create_datapoint(
        &app.db,
        db::CreateControlDatapoint {
            department: Some("Extrusion".into()),
            parameter_name: Some("Melt temp".into()),
            actual_value: Some(228.5),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let response = app
        .server
        .get("/export-control-datapoints")
        .add_query_param("department", "Extrusion")
        .await;
    let book = download(&response);

    assert!(disposition(&response).contains("Control-Datapoints-Export-"));
    assert_eq!(cell(&book, "Sheet1", "A1"), point.id.to_string());
    assert_eq!(cell(&book, "Sheet1", "D1"), "Melt temp");
    assert_eq!(cell(&book, "Sheet1", "F1"), "228.5");

    // Blank filter fields from an empty search form match everything.
    let response = app
        .server
        .get("/export-control-datapoints?department=&machine=&start_date=")
        .await;
    let book = download(&response);
    assert_eq!(cell(&book, "Sheet1", "A1"), point.id.to_string());

    let listed: Vec<Value> = app
        .server
        .get("/api/control-datapoints?department=&gcas=")
        .await
        .json();
    assert_eq!(listed.len(), 1);
}

// ============================================================================
// Production defects
// ============================================================================

#[tokio::test]
async fn test_production_defects_widens_lot_pairs() {
    let app = setup_app().await;
    // The second T1/A lot ran on another machine but still belongs to the pair.
    db::create_lot(&app.db, lot("T1", "A", "3", json!({"1": "Gel", "2": "Wrinkle"})))
        .await
        .unwrap();
    db::create_lot(&app.db, lot("T1", "A", "4", json!({"3": "Gel"})))
        .await
        .unwrap();
    db::create_lot(&app.db, lot("T2", "A", "4", json!({"1": "Hole"})))
        .await
        .unwrap();

    let response = app
        .server
        .get("/export-production-defects")
        .add_query_param("machine", "3")
        .add_query_param("fromDate", "2024-03-01")
        .add_query_param("toDate", "2024-03-31")
        .await;
    let book = download(&response);

    assert_eq!(
        disposition(&response),
        "attachment; filename=\"2024-Total Defects Analysis-MC#03-March.xlsx\""
    );
    assert_eq!(cell(&book, "Sheet1", "C1"), "MC#03 - 2024");
    assert_eq!(cell(&book, "Sheet1", "C2"), "All Products");
    assert_eq!(cell(&book, "Sheet1", "A5"), "Gel");
    assert_eq!(cell(&book, "Sheet1", "B5"), "2");
    assert_eq!(cell(&book, "Sheet1", "C5"), "1");
    assert_eq!(cell(&book, "Sheet1", "E5"), "1");
    assert_eq!(cell(&book, "Sheet1", "A6"), "Wrinkle");
    assert_eq!(cell(&book, "Sheet1", "A7"), "");
    assert_eq!(cell(&book, "Sheet1", "B77"), "20");
}

#[tokio::test]
async fn test_production_defects_advanced_filters_defect() {
    let app = setup_app().await;
    db::create_lot(&app.db, lot("T1", "A", "1", json!({"1": "Gel"})))
        .await
        .unwrap();
    db::create_lot(&app.db, lot("T2", "A", "2", json!({"4": "Hole"})))
        .await
        .unwrap();

    let response = app
        .server
        .get("/export-production-defects-advanced")
        .add_query_param("machines", "2,1")
        .add_query_param("defect", "Hole")
        .add_query_param("fromDate", "2024-03-01")
        .add_query_param("toDate", "2024-04-15")
        .await;
    let book = download(&response);

    assert_eq!(
        disposition(&response),
        "attachment; filename=\"2024-Total Defects Analysis-MC#01-02-Defect_Hole-01.03.2024 to 15.04.2024.xlsx\""
    );
    assert_eq!(cell(&book, "Sheet1", "C1"), "MC#01 + MC#02 - 2024");
    assert_eq!(cell(&book, "Sheet1", "A5"), "Hole");
    assert_eq!(cell(&book, "Sheet1", "F5"), "1");
    assert_eq!(cell(&book, "Sheet1", "A6"), "");
}

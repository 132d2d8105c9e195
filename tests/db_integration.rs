//! Database integration tests.

mod common;

use chrono::NaiveDate;
use common::setup_test_db;
use filmqa::db::{
    self, ExtinguisherInspection, InspectionStatus, RecordInspection, RequisitionFilter,
    SaveGoodsReceivedNote, SaveGrnItem, SaveInlineInspectionLot, SaveJobRequisition,
};
use filmqa::Error;
use rstest::rstest;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_schema_is_idempotent() {
    let pool = setup_test_db().await;
    db::initialize_schema(&pool).await.unwrap();
    db::health_check(&pool).await.unwrap();
}

#[tokio::test]
async fn test_lots_by_keys_spans_batches() {
    let pool = setup_test_db().await;

    let mut keys = Vec::new();
    for i in 0..120 {
        let code = format!("T{:03}", i);
        db::create_lot(
            &pool,
            SaveInlineInspectionLot {
                traceability_code: code.clone(),
                lot_letter: "A".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        if i % 2 == 0 {
            keys.push((code, "A".to_string()));
        }
    }

    let lots = db::list_lots_by_keys(&pool, &keys).await.unwrap();
    assert_eq!(lots.len(), 60);
    assert!(db::list_lots_by_keys(&pool, &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_requisition_date_range() {
    let pool = setup_test_db().await;
    for date in ["2024-01-10", "2024-02-10", "2024-03-10"] {
        db::create_requisition(
            &pool,
            SaveJobRequisition {
                occur_date: Some(date.into()),
                equipment_name: Some("Winder 2".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    let rows = db::list_requisitions(
        &pool,
        &RequisitionFilter {
            from_date: Some("2024-02-01".into()),
            to_date: Some("2024-03-31".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let dates: Vec<_> = rows.iter().filter_map(|r| r.occur_date.clone()).collect();
    assert_eq!(dates, vec!["2024-02-10", "2024-03-10"]);
}

#[rstest]
#[case("2024-06-10", InspectionStatus::Active)]
#[case("2024-05-20", InspectionStatus::ServiceDue)]
#[case("2024-04-30", InspectionStatus::Expired)]
#[tokio::test]
async fn test_inspection_status_from_due_date(
    #[case] next_due: &str,
    #[case] expected: InspectionStatus,
) {
    let pool = setup_test_db().await;

    let extinguisher = db::record_inspection(
        &pool,
        RecordInspection {
            extinguisher_no: "fe-12".into(),
            type_of_extinguisher: Some("CO2".into()),
            location: None,
            capacity: Some("4.5 kg".into()),
            inspection: ExtinguisherInspection {
                next_due_date: Some(next_due.into()),
                ..Default::default()
            },
        },
        day(2024, 5, 1),
    )
    .await
    .unwrap();

    assert_eq!(extinguisher.extinguisher_no, "FE-012");
    let log = extinguisher.inspection_log();
    assert_eq!(log.inspections.len(), 1);
    assert_eq!(log.inspections[0].status, Some(expected));
    assert!(!log.inspections[0].id.is_empty());
}

#[tokio::test]
async fn test_repeat_inspections_append_to_one_extinguisher() {
    let pool = setup_test_db().await;
    let submit = |no: &str| RecordInspection {
        extinguisher_no: no.into(),
        type_of_extinguisher: None,
        location: Some("Store".into()),
        capacity: None,
        inspection: ExtinguisherInspection::default(),
    };

    db::record_inspection(&pool, submit("3"), day(2024, 5, 1))
        .await
        .unwrap();
    let second = db::record_inspection(&pool, submit("FE-003"), day(2024, 6, 1))
        .await
        .unwrap();

    assert_eq!(second.inspection_log().inspections.len(), 2);
    assert_eq!(db::list_extinguishers(&pool).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inspections_all_land_in_one_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inspections.db");
    let pool = db::init_pool(path.to_str().unwrap()).await.unwrap();
    db::initialize_schema(&pool).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..12 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            db::record_inspection(
                &pool,
                RecordInspection {
                    extinguisher_no: "9".into(),
                    type_of_extinguisher: None,
                    location: Some(format!("Bay {}", i)),
                    capacity: None,
                    inspection: ExtinguisherInspection::default(),
                },
                day(2024, 5, 1),
            )
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let all = db::list_extinguishers(&pool).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].extinguisher_no, "FE-009");
    assert_eq!(all[0].inspection_log().inspections.len(), 12);
}

#[tokio::test]
async fn test_delete_inspection_keeps_other_entries() {
    let pool = setup_test_db().await;
    let submit = || RecordInspection {
        extinguisher_no: "4".into(),
        type_of_extinguisher: Some("Foam".into()),
        location: None,
        capacity: None,
        inspection: ExtinguisherInspection::default(),
    };
    db::record_inspection(&pool, submit(), day(2024, 5, 1))
        .await
        .unwrap();
    let both = db::record_inspection(&pool, submit(), day(2024, 5, 2))
        .await
        .unwrap();
    let log = both.inspection_log();

    let left = db::delete_inspection(&pool, &both.id, &log.inspections[0].id)
        .await
        .unwrap();
    let remaining = left.inspection_log();
    assert_eq!(remaining.inspections.len(), 1);
    assert_eq!(remaining.inspections[0].id, log.inspections[1].id);
    assert_eq!(left.type_of_extinguisher.as_deref(), Some("Foam"));

    let err = db::delete_inspection(&pool, "missing", "x").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_grn_update_replaces_items_until_submitted() {
    let pool = setup_test_db().await;
    let item = |code: &str| SaveGrnItem {
        item_code: Some(code.into()),
        quantity_received: 1.0,
        ..Default::default()
    };

    let grn = db::create_grn(
        &pool,
        SaveGoodsReceivedNote {
            grn_number: Some("GRN-7".into()),
            items: vec![item("A"), item("B")],
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(grn.items.len(), 2);

    let updated = db::update_grn(
        &pool,
        &grn.note.id,
        SaveGoodsReceivedNote {
            grn_number: Some("GRN-7".into()),
            items: vec![item("C")],
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.items.len(), 1);
    assert_eq!(updated.items[0].item_code.as_deref(), Some("C"));

    db::submit_grn(&pool, &grn.note.id).await.unwrap();
    let err = db::update_grn(&pool, &grn.note.id, SaveGoodsReceivedNote::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

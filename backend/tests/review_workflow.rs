mod support;

use backend::error::AppError;
use backend::review::{apply_action, load_snapshot, ReviewAction, TableSnapshot};
use backend::warehouse::identifier::TableName;
use backend::warehouse::statement::{Predicate, SqlValue, Statement};
use backend::warehouse::Warehouse;
use chrono::{NaiveDate, NaiveDateTime};
use common::model::review::{columns, ReviewStatus};
use common::requests::RecordKey;
use support::{merchants_config, seed_merchants, RecordingWarehouse, MERCHANTS};

const MAKER: &str = "maker@corp.com";
const CHECKER: &str = "checker@corp.com";

fn at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(10, 15, 0)
        .unwrap()
}

fn key(id: &str) -> RecordKey {
    [("merchant_id".to_string(), serde_json::json!(id))]
        .into_iter()
        .collect()
}

async fn snapshot(warehouse: &RecordingWarehouse) -> TableSnapshot {
    load_snapshot(warehouse, &TableName::parse(MERCHANTS).unwrap(), None, 1000)
        .await
        .unwrap()
}

fn submit(size: &str, gender: &str) -> ReviewAction {
    ReviewAction::MakerSubmit {
        size: size.into(),
        gender: gender.into(),
    }
}

fn approve() -> ReviewAction {
    ReviewAction::CheckerApprove {
        size: "SMALL".into(),
        gender: "MALE".into(),
        comments: Some("looks right".into()),
    }
}

fn updates(warehouse: &RecordingWarehouse) -> usize {
    warehouse
        .statements()
        .iter()
        .filter(|s| matches!(s, Statement::Update { .. }))
        .count()
}

#[tokio::test]
async fn maker_submission_without_a_size_never_reaches_the_warehouse() {
    let warehouse = RecordingWarehouse::new();
    seed_merchants(&warehouse, &[("M-1", None, None)]).await;
    let snap = snapshot(&warehouse).await;

    let err = apply_action(
        &warehouse,
        &merchants_config(&["merchant_id"]),
        &snap,
        &key("M-1"),
        &submit("", "FEMALE"),
        MAKER,
        at(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(updates(&warehouse), 0);
}

#[tokio::test]
async fn blank_status_labels_can_be_submitted() {
    let warehouse = RecordingWarehouse::new();
    seed_merchants(&warehouse, &[("M-1", None, None), ("M-2", None, None)]).await;
    for (id, blank) in [("M-1", ""), ("M-2", "  ")] {
        warehouse
            .execute(&Statement::Update {
                table: TableName::parse(MERCHANTS).unwrap(),
                assignments: vec![(columns::STATUS.to_string(), SqlValue::text(blank))],
                predicate: Predicate::new().and_eq("merchant_id", SqlValue::text(id)),
            })
            .await
            .unwrap();
    }
    let table = merchants_config(&["merchant_id"]);
    let snap = snapshot(&warehouse).await;

    for id in ["M-1", "M-2"] {
        let outcome = apply_action(
            &warehouse,
            &table,
            &snap,
            &key(id),
            &submit("SMALL", "MALE"),
            MAKER,
            at(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.from, ReviewStatus::Unset);
        let row = warehouse
            .row_where(MERCHANTS, "merchant_id", SqlValue::text(id))
            .await;
        assert_eq!(row[columns::STATUS], SqlValue::text("PENDING"));
    }
}

#[tokio::test]
async fn rejection_without_comments_writes_nothing() {
    let warehouse = RecordingWarehouse::new();
    seed_merchants(&warehouse, &[("M-1", Some("PENDING"), None)]).await;
    let snap = snapshot(&warehouse).await;

    let err = apply_action(
        &warehouse,
        &merchants_config(&["merchant_id"]),
        &snap,
        &key("M-1"),
        &ReviewAction::CheckerReject {
            comments: "   ".into(),
        },
        CHECKER,
        at(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(updates(&warehouse), 0);
}

#[tokio::test]
async fn submit_then_reject_keeps_the_reviewed_values() {
    let warehouse = RecordingWarehouse::new();
    seed_merchants(&warehouse, &[("M-1", Some("APPROVED"), Some("LARGE"))]).await;
    let table = merchants_config(&["merchant_id"]);

    let snap = snapshot(&warehouse).await;
    let outcome = apply_action(
        &warehouse,
        &table,
        &snap,
        &key("M-1"),
        &submit("MEDIUM", "FEMALE"),
        MAKER,
        at(),
    )
    .await
    .unwrap();
    assert_eq!(outcome.from, ReviewStatus::Approved);
    assert_eq!(outcome.to, ReviewStatus::Pending);

    let row = warehouse
        .row_where(MERCHANTS, "merchant_id", SqlValue::text("M-1"))
        .await;
    assert_eq!(row[columns::STATUS], SqlValue::text("PENDING"));
    assert_eq!(row[columns::SIZE_PENDING], SqlValue::text("MEDIUM"));
    assert_eq!(row[columns::MAKER_DATE], SqlValue::text("2024-06-03 10:15:00"));

    let snap = snapshot(&warehouse).await;
    apply_action(
        &warehouse,
        &table,
        &snap,
        &key("M-1"),
        &ReviewAction::CheckerReject {
            comments: "size is off".into(),
        },
        CHECKER,
        at(),
    )
    .await
    .unwrap();

    let row = warehouse
        .row_where(MERCHANTS, "merchant_id", SqlValue::text("M-1"))
        .await;
    assert_eq!(row[columns::STATUS], SqlValue::text("REJECTED"));
    assert_eq!(row[columns::SIZE], SqlValue::text("LARGE"));
    assert_eq!(row[columns::CHECKER], SqlValue::text(CHECKER));
    assert_eq!(row[columns::CHECKER_COMMENTS], SqlValue::text("size is off"));
}

#[tokio::test]
async fn the_second_of_two_racing_checkers_gets_a_conflict() {
    let warehouse = RecordingWarehouse::new();
    seed_merchants(&warehouse, &[("M-1", Some("PENDING"), None)]).await;
    let table = merchants_config(&["merchant_id"]);

    let first = snapshot(&warehouse).await;
    let second = snapshot(&warehouse).await;

    apply_action(&warehouse, &table, &first, &key("M-1"), &approve(), CHECKER, at())
        .await
        .unwrap();
    let err = apply_action(
        &warehouse,
        &table,
        &second,
        &key("M-1"),
        &ReviewAction::CheckerReject {
            comments: "too late".into(),
        },
        "other@corp.com",
        at(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict { .. }));

    let row = warehouse
        .row_where(MERCHANTS, "merchant_id", SqlValue::text("M-1"))
        .await;
    assert_eq!(row[columns::STATUS], SqlValue::text("APPROVED"));
    assert_eq!(row[columns::CHECKER], SqlValue::text(CHECKER));
}

#[tokio::test]
async fn tables_without_a_declared_key_are_read_only() {
    let warehouse = RecordingWarehouse::new();
    seed_merchants(&warehouse, &[("M-1", None, None)]).await;
    let snap = snapshot(&warehouse).await;

    let err = apply_action(
        &warehouse,
        &merchants_config(&[]),
        &snap,
        &key("M-1"),
        &submit("SMALL", "MALE"),
        MAKER,
        at(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("no declared key"));
    assert_eq!(updates(&warehouse), 0);
}

#[tokio::test]
async fn a_key_matching_several_rows_is_reported() {
    let warehouse = RecordingWarehouse::new();
    seed_merchants(&warehouse, &[("M-1", None, None), ("M-1", None, None)]).await;
    let snap = snapshot(&warehouse).await;

    let err = apply_action(
        &warehouse,
        &merchants_config(&["merchant_id"]),
        &snap,
        &key("M-1"),
        &submit("SMALL", "MALE"),
        MAKER,
        at(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::AmbiguousKey { matched: 2, .. }));
}

#[tokio::test]
async fn approving_an_approved_record_is_refused_before_writing() {
    let warehouse = RecordingWarehouse::new();
    seed_merchants(&warehouse, &[("M-1", Some("PENDING"), None)]).await;
    let table = merchants_config(&["merchant_id"]);

    let snap = snapshot(&warehouse).await;
    apply_action(&warehouse, &table, &snap, &key("M-1"), &approve(), CHECKER, at())
        .await
        .unwrap();
    warehouse.clear();

    let snap = snapshot(&warehouse).await;
    let err = apply_action(&warehouse, &table, &snap, &key("M-1"), &approve(), CHECKER, at())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            from: ReviewStatus::Approved,
            to: ReviewStatus::Approved
        }
    ));
    assert_eq!(updates(&warehouse), 0);
}

#[tokio::test]
async fn unknown_records_are_not_found() {
    let warehouse = RecordingWarehouse::new();
    seed_merchants(&warehouse, &[("M-1", None, None)]).await;
    let snap = snapshot(&warehouse).await;

    let err = apply_action(
        &warehouse,
        &merchants_config(&["merchant_id"]),
        &snap,
        &key("M-9"),
        &submit("SMALL", "MALE"),
        MAKER,
        at(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

use chrono::{NaiveDate, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Engine, EngineError, MonthlySummary, TransactionChanges, TransactionKind,
    TransactionListFilter,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (name, email, password_hash, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?)",
        vec![
            "alice".into(),
            "alice@example.com".into(),
            "secret".into(),
            Utc::now().into(),
            Utc::now().into(),
        ],
    ))
    .await
    .unwrap();
    let engine = Engine::builder().database(db.clone()).build().await.unwrap();
    (engine, db)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn new_transaction_rejects_invalid_input() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .new_transaction(
            0,
            TransactionKind::Expense,
            "food",
            None,
            date(2024, 3, 10),
            true,
            None,
            None,
            1,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .new_transaction(
            1_000,
            TransactionKind::Expense,
            "  ",
            None,
            date(2024, 3, 10),
            true,
            None,
            None,
            1,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));

    let all = engine
        .list_transactions(1, &TransactionListFilter::default())
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn list_transactions_filters_by_kind_category_and_range() {
    let (engine, _db) = engine_with_db().await;

    engine
        .new_transaction(
            5_000,
            TransactionKind::Income,
            "salary",
            Some("March pay"),
            date(2024, 3, 1),
            true,
            None,
            None,
            1,
        )
        .await
        .unwrap();
    engine
        .new_transaction(
            2_000,
            TransactionKind::Expense,
            "food",
            None,
            date(2024, 3, 5),
            true,
            None,
            None,
            1,
        )
        .await
        .unwrap();
    engine
        .new_transaction(
            800,
            TransactionKind::Expense,
            "transport",
            None,
            date(2024, 4, 2),
            true,
            None,
            None,
            1,
        )
        .await
        .unwrap();

    let all = engine
        .list_transactions(1, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    // Newest first.
    assert_eq!(all[0].occurred_on, date(2024, 4, 2));
    assert_eq!(all[2].occurred_on, date(2024, 3, 1));

    let expenses = engine
        .list_transactions(
            1,
            &TransactionListFilter {
                kind: Some(TransactionKind::Expense),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(expenses.len(), 2);

    let march = engine
        .list_transactions(
            1,
            &TransactionListFilter {
                from: Some(date(2024, 3, 1)),
                to: Some(date(2024, 3, 31)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(march.len(), 2);

    let food = engine
        .list_transactions(
            1,
            &TransactionListFilter {
                category: Some("food".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(food.len(), 1);
    assert_eq!(food[0].amount_minor, 2_000);

    let err = engine
        .list_transactions(
            1,
            &TransactionListFilter {
                from: Some(date(2024, 4, 1)),
                to: Some(date(2024, 3, 1)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidDate(_)));
}

#[tokio::test]
async fn update_transaction_touches_only_supplied_fields() {
    let (engine, _db) = engine_with_db().await;

    let tx = engine
        .new_transaction(
            2_000,
            TransactionKind::Expense,
            "food",
            Some("lunch"),
            date(2024, 3, 5),
            false,
            None,
            None,
            1,
        )
        .await
        .unwrap();

    engine
        .update_transaction(
            tx.id,
            TransactionChanges {
                is_confirmed: Some(true),
                note: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let updated = engine.transaction(tx.id).await.unwrap().unwrap();
    assert!(updated.is_confirmed);
    assert_eq!(updated.note, None);
    assert_eq!(updated.amount_minor, 2_000);
    assert_eq!(updated.category, "food");
    assert!(updated.updated_at > tx.updated_at);

    // Missing ids are a no-op for update and delete alike.
    engine
        .update_transaction(
            9_999,
            TransactionChanges {
                is_confirmed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    engine.delete_transaction(9_999).await.unwrap();

    engine.delete_transaction(tx.id).await.unwrap();
    assert!(engine.transaction(tx.id).await.unwrap().is_none());
}

#[tokio::test]
async fn monthly_summary_counts_confirmed_rows_inside_the_month() {
    let (engine, _db) = engine_with_db().await;

    engine
        .new_transaction(
            5_000,
            TransactionKind::Income,
            "salary",
            None,
            date(2024, 3, 1),
            true,
            None,
            None,
            1,
        )
        .await
        .unwrap();
    engine
        .new_transaction(
            2_000,
            TransactionKind::Expense,
            "food",
            None,
            date(2024, 3, 31),
            true,
            None,
            None,
            1,
        )
        .await
        .unwrap();
    // Unconfirmed and out-of-month rows are excluded.
    engine
        .new_transaction(
            999,
            TransactionKind::Expense,
            "food",
            None,
            date(2024, 3, 15),
            false,
            None,
            None,
            1,
        )
        .await
        .unwrap();
    engine
        .new_transaction(
            700,
            TransactionKind::Expense,
            "food",
            None,
            date(2024, 4, 1),
            true,
            None,
            None,
            1,
        )
        .await
        .unwrap();

    let summary = engine.monthly_summary(1, 2024, 3).await.unwrap();
    assert_eq!(
        summary,
        MonthlySummary {
            income_minor: 5_000,
            expense_minor: 2_000,
            balance_minor: 3_000,
        }
    );

    let err = engine.monthly_summary(1, 2024, 13).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidDate(_)));
}

#[tokio::test]
async fn category_totals_groups_confirmed_expenses_descending() {
    let (engine, _db) = engine_with_db().await;

    for (amount, category) in [(2_000, "food"), (3_000, "rent"), (1_500, "food")] {
        engine
            .new_transaction(
                amount,
                TransactionKind::Expense,
                category,
                None,
                date(2024, 3, 10),
                true,
                None,
                None,
                1,
            )
            .await
            .unwrap();
    }
    engine
        .new_transaction(
            9_999,
            TransactionKind::Expense,
            "food",
            None,
            date(2024, 3, 11),
            false,
            None,
            None,
            1,
        )
        .await
        .unwrap();

    let totals = engine
        .category_totals(1, TransactionKind::Expense, None, None)
        .await
        .unwrap();
    assert_eq!(
        totals,
        vec![("food".to_string(), 3_500), ("rent".to_string(), 3_000)]
    );
}

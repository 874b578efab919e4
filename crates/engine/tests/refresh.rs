use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use tokio::time::sleep;

use engine::{Budget, BudgetPeriod, BudgetSession, Engine, TransactionKind};
use migration::MigratorTrait;

async fn engine_with_db() -> (Arc<Engine>, DatabaseConnection) {
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
    (Arc::new(engine), db)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn comida_budget(engine: &Engine) -> Budget {
    engine
        .new_budget(
            "Comida",
            100_000,
            BudgetPeriod::Monthly,
            date(2024, 3, 1),
            None,
            None,
            None,
            1,
        )
        .await
        .unwrap()
}

async fn expense(engine: &Engine, amount_minor: i64, budget_id: i64) {
    engine
        .new_transaction(
            amount_minor,
            TransactionKind::Expense,
            "food",
            None,
            date(2024, 3, 10),
            true,
            None,
            Some(budget_id),
            1,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn load_refreshes_spent_amounts() {
    let (engine, _db) = engine_with_db().await;
    let budget = comida_budget(&engine).await;

    // Expenses recorded before the session ever loaded.
    expense(&engine, 30_000, budget.id).await;
    expense(&engine, 45_000, budget.id).await;

    let session = BudgetSession::new(Arc::clone(&engine), 1);
    session.load().await.unwrap();

    let loaded = session.budgets().await;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].spent_minor, 75_000);
}

#[tokio::test]
async fn refresh_task_picks_up_ledger_changes() {
    let (engine, _db) = engine_with_db().await;
    let budget = comida_budget(&engine).await;

    let session = BudgetSession::new(Arc::clone(&engine), 1);
    session.load().await.unwrap();
    let handle = session.spawn_refresh(Duration::from_millis(50));

    // A transaction recorded by another flow, with no recompute call.
    expense(&engine, 30_000, budget.id).await;

    sleep(Duration::from_millis(300)).await;

    let refreshed = session.budgets().await;
    assert_eq!(refreshed[0].spent_minor, 30_000);
    let stored = engine.budget(budget.id).await.unwrap().unwrap();
    assert_eq!(stored.spent_minor, 30_000);

    handle.stop();
}

#[tokio::test]
async fn stopped_refresh_no_longer_updates() {
    let (engine, _db) = engine_with_db().await;
    let budget = comida_budget(&engine).await;

    let session = BudgetSession::new(Arc::clone(&engine), 1);
    session.load().await.unwrap();
    let handle = session.spawn_refresh(Duration::from_millis(50));
    handle.stop();

    expense(&engine, 30_000, budget.id).await;
    sleep(Duration::from_millis(300)).await;

    // The stale value stays until someone recomputes explicitly.
    let stored = engine.budget(budget.id).await.unwrap().unwrap();
    assert_eq!(stored.spent_minor, 0);

    engine.recompute_spent(budget.id).await.unwrap();
    let recomputed = engine.budget(budget.id).await.unwrap().unwrap();
    assert_eq!(recomputed.spent_minor, 30_000);
}

#[tokio::test]
async fn dropping_the_handle_cancels_the_task() {
    let (engine, _db) = engine_with_db().await;
    let budget = comida_budget(&engine).await;

    let session = BudgetSession::new(Arc::clone(&engine), 1);
    session.load().await.unwrap();
    let handle = session.spawn_refresh(Duration::from_millis(50));
    drop(handle);

    expense(&engine, 30_000, budget.id).await;
    sleep(Duration::from_millis(300)).await;

    let stored = engine.budget(budget.id).await.unwrap().unwrap();
    assert_eq!(stored.spent_minor, 0);
}

#[tokio::test]
async fn refresh_pass_tolerates_stale_loaded_budgets() {
    let (engine, _db) = engine_with_db().await;
    let kept = comida_budget(&engine).await;
    let doomed = engine
        .new_budget(
            "Proyecto",
            50_000,
            BudgetPeriod::Custom,
            date(2024, 3, 1),
            None,
            None,
            None,
            1,
        )
        .await
        .unwrap();

    let session = BudgetSession::new(Arc::clone(&engine), 1);
    session.load().await.unwrap();
    assert_eq!(session.budgets().await.len(), 2);

    // Deleted behind the session's back; its recompute becomes a no-op
    // and the pass must still refresh the surviving budget.
    engine.delete_budget(doomed.id).await.unwrap();
    expense(&engine, 10_000, kept.id).await;

    let handle = session.spawn_refresh(Duration::from_millis(50));
    sleep(Duration::from_millis(300)).await;

    assert!(!handle.is_finished());
    let refreshed = session.budgets().await;
    assert_eq!(refreshed.len(), 1);
    assert_eq!(refreshed[0].id, kept.id);
    assert_eq!(refreshed[0].spent_minor, 10_000);

    handle.stop();
}

#[tokio::test]
async fn refresh_skips_when_nothing_is_active() {
    let (engine, _db) = engine_with_db().await;
    let budget = comida_budget(&engine).await;

    let session = BudgetSession::new(Arc::clone(&engine), 1);
    session.load().await.unwrap();

    engine.set_budget_active(budget.id, false).await.unwrap();
    session.load().await.unwrap();
    assert!(session.budgets().await.is_empty());

    // With nothing active the timer keeps ticking but writes nothing.
    let handle = session.spawn_refresh(Duration::from_millis(50));
    expense(&engine, 30_000, budget.id).await;
    sleep(Duration::from_millis(300)).await;

    let stored = engine.budget(budget.id).await.unwrap().unwrap();
    assert_eq!(stored.spent_minor, 0);

    handle.stop();
}

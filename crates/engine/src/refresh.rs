//! Session-scoped budget list with a periodic spent-amount refresh.
//!
//! Transaction flows never tell the budget core what changed, so spent
//! amounts go stale whenever an expense is recorded elsewhere. A
//! `BudgetSession` keeps the signed-in user's budget list in memory and
//! re-derives every active budget's spent amount on load and on a fixed
//! timer. The staleness window equals the refresh interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::{Budget, Engine, ResultEngine};

/// Gap between refresh passes unless the caller picks another one.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// One signed-in user's view of their budgets.
///
/// The refresh task only ever touches budgets this session has loaded;
/// it never scans the store for budgets nobody is looking at.
#[derive(Clone)]
pub struct BudgetSession {
    engine: Arc<Engine>,
    user_id: i64,
    budgets: Arc<RwLock<Vec<Budget>>>,
}

impl BudgetSession {
    pub fn new(engine: Arc<Engine>, user_id: i64) -> Self {
        Self {
            engine,
            user_id,
            budgets: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Budgets as of the last load or refresh pass.
    pub async fn budgets(&self) -> Vec<Budget> {
        self.budgets.read().await.clone()
    }

    /// Fetch the user's active budgets, bring their spent amounts up to
    /// date and re-fetch so the stored list shows the refreshed values.
    pub async fn load(&self) -> ResultEngine<()> {
        let initial = self.engine.list_budgets(self.user_id, true).await?;
        *self.budgets.write().await = initial;
        refresh_pass(&self.engine, self.user_id, &self.budgets).await
    }

    /// Start the repeating refresh. The first pass runs one `interval`
    /// after spawning (`load` already refreshed once); each tick skips
    /// silently when no loaded budget is active.
    ///
    /// The returned handle must outlive the session's screen: dropping
    /// it cancels the task.
    pub fn spawn_refresh(&self, interval: Duration) -> RefreshHandle {
        let engine = Arc::clone(&self.engine);
        let budgets = Arc::clone(&self.budgets);
        let user_id = self.user_id;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let any_active = budgets.read().await.iter().any(|b| b.is_active);
                if !any_active {
                    continue;
                }
                if let Err(err) = refresh_pass(&engine, user_id, &budgets).await {
                    tracing::warn!("budget refresh pass failed: {err}");
                }
            }
        });

        RefreshHandle { handle }
    }
}

/// One refresh pass: recompute every loaded active budget, then reload
/// the list. A failed recompute is logged and skipped so the remaining
/// budgets in the same pass still refresh.
async fn refresh_pass(
    engine: &Engine,
    user_id: i64,
    budgets: &RwLock<Vec<Budget>>,
) -> ResultEngine<()> {
    let loaded = budgets.read().await.clone();
    for budget in loaded.iter().filter(|b| b.is_active) {
        if let Err(err) = engine.recompute_spent(budget.id).await {
            tracing::warn!(budget_id = budget.id, "spent recompute failed: {err}");
        }
    }

    let refreshed = engine.list_budgets(user_id, true).await?;
    *budgets.write().await = refreshed;
    Ok(())
}

/// Owner of the spawned refresh task. The task is aborted on `stop` and
/// on drop, so a torn-down session cannot leave a timer running.
#[derive(Debug)]
pub struct RefreshHandle {
    handle: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, Condition, QueryFilter, QueryOrder, Statement, TransactionTrait, Value,
    prelude::*,
};

use crate::{Budget, BudgetPeriod, ResultEngine, TransactionKind, budgets};

use super::{
    Engine, normalize_optional_text, normalize_required_name, require_positive_amount, with_tx,
};

/// A partial update for a budget.
///
/// `None` leaves the field untouched. Clearable fields are doubly
/// wrapped: `Some(None)` clears the stored value, `Some(Some(v))`
/// replaces it. `updated_at` is refreshed on every call regardless.
#[derive(Clone, Debug, Default)]
pub struct BudgetChanges {
    pub name: Option<String>,
    pub amount_minor: Option<i64>,
    pub category: Option<Option<String>>,
    pub period: Option<BudgetPeriod>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub account_id: Option<Option<i64>>,
    pub is_active: Option<bool>,
    pub spent_minor: Option<i64>,
}

impl Engine {
    /// Create a budget.
    ///
    /// For the calendar periods the end date defaults to one period
    /// after `start_date` unless the caller overrides it; a `custom`
    /// budget keeps whatever end date it was given, including none.
    /// The new budget starts active with nothing spent.
    pub async fn new_budget(
        &self,
        name: &str,
        amount_minor: i64,
        period: BudgetPeriod,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        category: Option<&str>,
        account_id: Option<i64>,
        user_id: i64,
    ) -> ResultEngine<Budget> {
        let name = normalize_required_name(name, "budget")?;
        require_positive_amount(amount_minor)?;

        let end_date = match end_date {
            Some(explicit) => Some(explicit),
            None => period.derived_end_date(start_date)?,
        };

        let now = Utc::now();
        let model = budgets::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name),
            amount_minor: ActiveValue::Set(amount_minor),
            spent_minor: ActiveValue::Set(0),
            category: ActiveValue::Set(normalize_optional_text(category)),
            period: ActiveValue::Set(period.as_str().to_string()),
            start_date: ActiveValue::Set(start_date),
            end_date: ActiveValue::Set(end_date),
            is_active: ActiveValue::Set(true),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            account_id: ActiveValue::Set(account_id),
            user_id: ActiveValue::Set(Some(user_id)),
        };

        with_tx!(self, |db_tx| {
            let inserted = model.insert(&db_tx).await?;
            Budget::try_from(inserted)
        })
    }

    /// Return a budget by id, or `None` when it does not exist.
    pub async fn budget(&self, budget_id: i64) -> ResultEngine<Option<Budget>> {
        budgets::Entity::find_by_id(budget_id)
            .one(&self.database)
            .await?
            .map(Budget::try_from)
            .transpose()
    }

    /// List a user's budgets, most recent start date first.
    pub async fn list_budgets(&self, user_id: i64, active_only: bool) -> ResultEngine<Vec<Budget>> {
        let mut query = budgets::Entity::find().filter(budgets::Column::UserId.eq(user_id));
        if active_only {
            query = query.filter(budgets::Column::IsActive.eq(true));
        }
        let models = query
            .order_by_desc(budgets::Column::StartDate)
            .all(&self.database)
            .await?;
        models.into_iter().map(Budget::try_from).collect()
    }

    /// Budgets in effect on `as_of`: active, started, and either open
    /// ended or not yet past their end date. This is the authoritative
    /// "currently tracked" query.
    pub async fn active_budgets_on(
        &self,
        user_id: i64,
        as_of: NaiveDate,
    ) -> ResultEngine<Vec<Budget>> {
        let models = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .filter(budgets::Column::IsActive.eq(true))
            .filter(budgets::Column::StartDate.lte(as_of))
            .filter(
                Condition::any()
                    .add(budgets::Column::EndDate.is_null())
                    .add(budgets::Column::EndDate.gte(as_of)),
            )
            .order_by_asc(budgets::Column::Period)
            .order_by_asc(budgets::Column::Category)
            .all(&self.database)
            .await?;
        models.into_iter().map(Budget::try_from).collect()
    }

    /// Apply a partial update. Updating a missing id is a no-op; the
    /// caller is expected to have read the budget it is editing.
    pub async fn update_budget(&self, budget_id: i64, changes: BudgetChanges) -> ResultEngine<()> {
        let mut update = budgets::ActiveModel {
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };

        if let Some(name) = changes.name {
            update.name = ActiveValue::Set(normalize_required_name(&name, "budget")?);
        }
        if let Some(amount_minor) = changes.amount_minor {
            require_positive_amount(amount_minor)?;
            update.amount_minor = ActiveValue::Set(amount_minor);
        }
        if let Some(category) = changes.category {
            update.category = ActiveValue::Set(category);
        }
        if let Some(period) = changes.period {
            update.period = ActiveValue::Set(period.as_str().to_string());
        }
        if let Some(start_date) = changes.start_date {
            update.start_date = ActiveValue::Set(start_date);
        }
        if let Some(end_date) = changes.end_date {
            update.end_date = ActiveValue::Set(end_date);
        }
        if let Some(account_id) = changes.account_id {
            update.account_id = ActiveValue::Set(account_id);
        }
        if let Some(is_active) = changes.is_active {
            update.is_active = ActiveValue::Set(is_active);
        }
        if let Some(spent_minor) = changes.spent_minor {
            update.spent_minor = ActiveValue::Set(spent_minor);
        }

        budgets::Entity::update_many()
            .set(update)
            .filter(budgets::Column::Id.eq(budget_id))
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Flip the tracking toggle without deleting anything.
    pub async fn set_budget_active(&self, budget_id: i64, active: bool) -> ResultEngine<()> {
        self.update_budget(
            budget_id,
            BudgetChanges {
                is_active: Some(active),
                ..Default::default()
            },
        )
        .await
    }

    /// Hard delete. Transactions that referenced the budget stay in the
    /// ledger; the store nulls their `budget_id`. Deleting a missing id
    /// is a no-op.
    pub async fn delete_budget(&self, budget_id: i64) -> ResultEngine<()> {
        budgets::Entity::delete_by_id(budget_id)
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Re-derive `spent_minor` from the ledger: the sum of confirmed
    /// expenses referencing this budget, restricted to the budget's
    /// account when it is scoped to one. Zero when nothing matches.
    ///
    /// Idempotent for an unchanged ledger. A recompute racing a
    /// transaction write may briefly store a stale sum; the next pass
    /// (or an explicit call) converges it.
    pub async fn recompute_spent(&self, budget_id: i64) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            match budgets::Entity::find_by_id(budget_id).one(&db_tx).await? {
                None => Ok(()),
                Some(model) => {
                    let backend = self.database.get_database_backend();
                    let mut sql = String::from(
                        "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
                         FROM transactions \
                         WHERE budget_id = ? AND kind = ? AND is_confirmed = 1",
                    );
                    let mut values: Vec<Value> = vec![
                        budget_id.into(),
                        TransactionKind::Expense.as_str().into(),
                    ];
                    if let Some(account_id) = model.account_id {
                        sql.push_str(" AND account_id = ?");
                        values.push(account_id.into());
                    }
                    let row = db_tx
                        .query_one(Statement::from_sql_and_values(backend, sql, values))
                        .await?;
                    let spent_minor: i64 = row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0);

                    let update = budgets::ActiveModel {
                        spent_minor: ActiveValue::Set(spent_minor),
                        updated_at: ActiveValue::Set(Utc::now()),
                        ..Default::default()
                    };
                    budgets::Entity::update_many()
                        .set(update)
                        .filter(budgets::Column::Id.eq(budget_id))
                        .exec(&db_tx)
                        .await?;
                    Ok(())
                }
            }
        })
    }
}

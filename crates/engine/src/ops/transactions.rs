use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, Statement, TransactionTrait, Value, prelude::*,
};

use crate::{EngineError, ResultEngine, Transaction, TransactionKind, transactions};

use super::{
    Engine, normalize_optional_text, normalize_required_name, require_positive_amount, with_tx,
};

/// Filters for listing a user's transactions. Date bounds are inclusive.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub kind: Option<TransactionKind>,
    pub account_id: Option<i64>,
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(EngineError::InvalidDate(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    Ok(())
}

/// A partial update for a transaction, with the same presence rules as
/// `BudgetChanges`.
#[derive(Clone, Debug, Default)]
pub struct TransactionChanges {
    pub amount_minor: Option<i64>,
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub note: Option<Option<String>>,
    pub occurred_on: Option<NaiveDate>,
    pub is_recurring: Option<bool>,
    pub recurrence_rule: Option<Option<String>>,
    pub is_confirmed: Option<bool>,
    pub account_id: Option<Option<i64>>,
    pub budget_id: Option<Option<i64>>,
}

/// Confirmed income/expense totals for one calendar month.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthlySummary {
    pub income_minor: i64,
    pub expense_minor: i64,
    pub balance_minor: i64,
}

impl Engine {
    /// Record a ledger entry. Recurrence metadata starts cleared; the
    /// entry is attributed to a budget only through `budget_id`.
    pub async fn new_transaction(
        &self,
        amount_minor: i64,
        kind: TransactionKind,
        category: &str,
        note: Option<&str>,
        occurred_on: NaiveDate,
        is_confirmed: bool,
        account_id: Option<i64>,
        budget_id: Option<i64>,
        user_id: i64,
    ) -> ResultEngine<Transaction> {
        let category = normalize_required_name(category, "category")?;
        require_positive_amount(amount_minor)?;

        let now = Utc::now();
        let model = transactions::ActiveModel {
            id: ActiveValue::NotSet,
            amount_minor: ActiveValue::Set(amount_minor),
            kind: ActiveValue::Set(kind.as_str().to_string()),
            category: ActiveValue::Set(category),
            note: ActiveValue::Set(normalize_optional_text(note)),
            occurred_on: ActiveValue::Set(occurred_on),
            is_recurring: ActiveValue::Set(false),
            recurrence_rule: ActiveValue::Set(None),
            is_confirmed: ActiveValue::Set(is_confirmed),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            account_id: ActiveValue::Set(account_id),
            budget_id: ActiveValue::Set(budget_id),
            user_id: ActiveValue::Set(Some(user_id)),
        };

        with_tx!(self, |db_tx| {
            let inserted = model.insert(&db_tx).await?;
            Transaction::try_from(inserted)
        })
    }

    /// Return a transaction by id, or `None` when it does not exist.
    pub async fn transaction(&self, transaction_id: i64) -> ResultEngine<Option<Transaction>> {
        transactions::Entity::find_by_id(transaction_id)
            .one(&self.database)
            .await?
            .map(Transaction::try_from)
            .transpose()
    }

    /// List a user's transactions, newest first.
    pub async fn list_transactions(
        &self,
        user_id: i64,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        validate_list_filter(filter)?;

        let mut query =
            transactions::Entity::find().filter(transactions::Column::UserId.eq(user_id));
        if let Some(kind) = filter.kind {
            query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(account_id) = filter.account_id {
            query = query.filter(transactions::Column::AccountId.eq(account_id));
        }
        if let Some(category) = &filter.category {
            query = query.filter(transactions::Column::Category.eq(category.clone()));
        }
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::OccurredOn.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::OccurredOn.lte(to));
        }

        let models = query
            .order_by_desc(transactions::Column::OccurredOn)
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Transaction::try_from).collect()
    }

    /// Apply a partial update. Updating a missing id is a no-op.
    pub async fn update_transaction(
        &self,
        transaction_id: i64,
        changes: TransactionChanges,
    ) -> ResultEngine<()> {
        let mut update = transactions::ActiveModel {
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };

        if let Some(amount_minor) = changes.amount_minor {
            require_positive_amount(amount_minor)?;
            update.amount_minor = ActiveValue::Set(amount_minor);
        }
        if let Some(kind) = changes.kind {
            update.kind = ActiveValue::Set(kind.as_str().to_string());
        }
        if let Some(category) = changes.category {
            update.category = ActiveValue::Set(normalize_required_name(&category, "category")?);
        }
        if let Some(note) = changes.note {
            update.note = ActiveValue::Set(note);
        }
        if let Some(occurred_on) = changes.occurred_on {
            update.occurred_on = ActiveValue::Set(occurred_on);
        }
        if let Some(is_recurring) = changes.is_recurring {
            update.is_recurring = ActiveValue::Set(is_recurring);
        }
        if let Some(recurrence_rule) = changes.recurrence_rule {
            update.recurrence_rule = ActiveValue::Set(recurrence_rule);
        }
        if let Some(is_confirmed) = changes.is_confirmed {
            update.is_confirmed = ActiveValue::Set(is_confirmed);
        }
        if let Some(account_id) = changes.account_id {
            update.account_id = ActiveValue::Set(account_id);
        }
        if let Some(budget_id) = changes.budget_id {
            update.budget_id = ActiveValue::Set(budget_id);
        }

        transactions::Entity::update_many()
            .set(update)
            .filter(transactions::Column::Id.eq(transaction_id))
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Hard delete; a missing id is a no-op.
    pub async fn delete_transaction(&self, transaction_id: i64) -> ResultEngine<()> {
        transactions::Entity::delete_by_id(transaction_id)
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Confirmed income and expense totals for `year`/`month`, plus
    /// their difference.
    pub async fn monthly_summary(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> ResultEngine<MonthlySummary> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| EngineError::InvalidDate(format!("invalid month: {year}-{month}")))?;
        let next_month = first
            .checked_add_months(chrono::Months::new(1))
            .ok_or_else(|| EngineError::InvalidDate(format!("invalid month: {year}-{month}")))?;

        let backend = self.database.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT \
                 COALESCE(SUM(CASE WHEN kind = ? THEN amount_minor ELSE 0 END), 0) AS income, \
                 COALESCE(SUM(CASE WHEN kind = ? THEN amount_minor ELSE 0 END), 0) AS expense \
             FROM transactions \
             WHERE user_id = ? AND occurred_on >= ? AND occurred_on < ? AND is_confirmed = 1",
            vec![
                TransactionKind::Income.as_str().into(),
                TransactionKind::Expense.as_str().into(),
                user_id.into(),
                first.into(),
                next_month.into(),
            ],
        );
        let row = self.database.query_one(stmt).await?;
        let income_minor: i64 = row
            .as_ref()
            .and_then(|r| r.try_get("", "income").ok())
            .unwrap_or(0);
        let expense_minor: i64 = row
            .as_ref()
            .and_then(|r| r.try_get("", "expense").ok())
            .unwrap_or(0);

        Ok(MonthlySummary {
            income_minor,
            expense_minor,
            balance_minor: income_minor - expense_minor,
        })
    }

    /// Confirmed totals per category for one kind, biggest first. Date
    /// bounds are inclusive and optional.
    pub async fn category_totals(
        &self,
        user_id: i64,
        kind: TransactionKind,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultEngine<Vec<(String, i64)>> {
        let mut sql = String::from(
            "SELECT category, SUM(amount_minor) AS total \
             FROM transactions \
             WHERE user_id = ? AND kind = ? AND is_confirmed = 1",
        );
        let mut values: Vec<Value> = vec![user_id.into(), kind.as_str().into()];
        if let Some(from) = from {
            sql.push_str(" AND occurred_on >= ?");
            values.push(from.into());
        }
        if let Some(to) = to {
            sql.push_str(" AND occurred_on <= ?");
            values.push(to.into());
        }
        sql.push_str(" GROUP BY category ORDER BY total DESC");

        let backend = self.database.get_database_backend();
        let rows = self
            .database
            .query_all(Statement::from_sql_and_values(backend, sql, values))
            .await?;

        let mut totals = Vec::with_capacity(rows.len());
        for row in rows {
            let category: String = row.try_get("", "category")?;
            let total: i64 = row.try_get("", "total")?;
            totals.push((category, total));
        }
        Ok(totals)
    }
}

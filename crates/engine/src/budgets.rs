//! Budget entity and its derived progress evaluation.
//!
//! A budget is a spending limit over a period. `spent_minor` is never
//! edited by callers: it is re-derived from the confirmed expenses that
//! reference the budget (see `Engine::recompute_spent`). Progress and
//! status are pure functions of `amount_minor`/`spent_minor`.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Progress at or above this percentage turns a budget `Warning`.
pub const WARNING_THRESHOLD: f64 = 80.0;
/// Progress at or above this percentage turns a budget `Exceeded`.
pub const EXCEEDED_THRESHOLD: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

impl BudgetPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Custom => "custom",
        }
    }

    /// End date implied by `start` for this period.
    ///
    /// Month and year steps clamp to the last valid day of the target
    /// month (2024-01-31 + 1 month = 2024-02-29). `Custom` implies no
    /// end date; the caller supplies one or leaves the budget open.
    pub fn derived_end_date(self, start: NaiveDate) -> ResultEngine<Option<NaiveDate>> {
        let end = match self {
            Self::Daily => start.checked_add_days(Days::new(1)),
            Self::Weekly => start.checked_add_days(Days::new(7)),
            Self::Monthly => start.checked_add_months(Months::new(1)),
            Self::Yearly => start.checked_add_months(Months::new(12)),
            Self::Custom => return Ok(None),
        };
        end.map(Some).ok_or_else(|| {
            EngineError::InvalidDate(format!(
                "{start} + 1 {} is out of the calendar range",
                self.as_str()
            ))
        })
    }
}

impl TryFrom<&str> for BudgetPeriod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "custom" => Ok(Self::Custom),
            other => Err(EngineError::InvalidPeriod(format!(
                "invalid budget period: {other}"
            ))),
        }
    }
}

/// Tiered classification of a budget's progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Good,
    Warning,
    Exceeded,
}

impl BudgetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Exceeded => "exceeded",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub name: String,
    pub amount_minor: i64,
    pub spent_minor: i64,
    pub category: Option<String>,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub account_id: Option<i64>,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Spent amount as a percentage of the limit, capped at 100 for
    /// display. A non-positive limit yields 0 rather than dividing by
    /// zero (creation rejects such limits, but stored rows are not
    /// trusted).
    pub fn progress(&self) -> f64 {
        if self.amount_minor <= 0 {
            return 0.0;
        }
        (self.spent_minor as f64 / self.amount_minor as f64 * 100.0).min(100.0)
    }

    pub fn status(&self) -> BudgetStatus {
        let progress = self.progress();
        if progress >= EXCEEDED_THRESHOLD {
            BudgetStatus::Exceeded
        } else if progress >= WARNING_THRESHOLD {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Good
        }
    }

    /// Signed amount left to spend; negative once the budget is
    /// exceeded, so callers can tell "remaining" from "over by".
    pub fn remaining_minor(&self) -> i64 {
        self.amount_minor - self.spent_minor
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub amount_minor: i64,
    pub spent_minor: i64,
    pub category: Option<String>,
    pub period: String,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub account_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Users,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            amount_minor: model.amount_minor,
            spent_minor: model.spent_minor,
            category: model.category,
            period: BudgetPeriod::try_from(model.period.as_str())?,
            start_date: model.start_date,
            end_date: model.end_date,
            is_active: model.is_active,
            account_id: model.account_id,
            user_id: model.user_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

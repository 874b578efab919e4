//! Finance account entity.
//!
//! Accounts are plain records the budget core points at: a budget with
//! an `account_id` only counts that account's expenses. Balance upkeep
//! and the rest of the account store stay outside the engine.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Cash,
    BankAccount,
    CreditCard,
    DigitalWallet,
    Savings,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::BankAccount => "bank_account",
            Self::CreditCard => "credit_card",
            Self::DigitalWallet => "digital_wallet",
            Self::Savings => "savings",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "bank_account" => Ok(Self::BankAccount),
            "credit_card" => Ok(Self::CreditCard),
            "digital_wallet" => Ok(Self::DigitalWallet),
            "savings" => Ok(Self::Savings),
            other => Err(EngineError::InvalidKind(format!(
                "invalid account kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub kind: AccountKind,
    pub currency: Currency,
    pub initial_balance_minor: i64,
    pub current_balance_minor: i64,
    pub is_active: bool,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "finance_accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub currency: String,
    pub initial_balance_minor: i64,
    pub current_balance_minor: i64,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub user_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::budgets::Entity")]
    Budgets,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Users,
}

impl Related<super::budgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            kind: AccountKind::try_from(model.kind.as_str())?,
            currency: Currency::try_from(model.currency.as_str())?,
            initial_balance_minor: model.initial_balance_minor,
            current_balance_minor: model.current_balance_minor,
            is_active: model.is_active,
            user_id: model.user_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

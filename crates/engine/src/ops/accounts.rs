use chrono::Utc;
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{Account, AccountKind, Currency, ResultEngine, accounts};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Create a finance account budgets and transactions can reference.
    pub async fn new_account(
        &self,
        name: &str,
        kind: AccountKind,
        currency: Currency,
        initial_balance_minor: i64,
        user_id: i64,
    ) -> ResultEngine<Account> {
        let name = normalize_required_name(name, "account")?;

        let now = Utc::now();
        let model = accounts::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name),
            kind: ActiveValue::Set(kind.as_str().to_string()),
            currency: ActiveValue::Set(currency.code().to_string()),
            initial_balance_minor: ActiveValue::Set(initial_balance_minor),
            current_balance_minor: ActiveValue::Set(initial_balance_minor),
            is_active: ActiveValue::Set(true),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            user_id: ActiveValue::Set(Some(user_id)),
        };

        with_tx!(self, |db_tx| {
            let inserted = model.insert(&db_tx).await?;
            Account::try_from(inserted)
        })
    }

    /// Return an account by id, or `None` when it does not exist.
    pub async fn account(&self, account_id: i64) -> ResultEngine<Option<Account>> {
        accounts::Entity::find_by_id(account_id)
            .one(&self.database)
            .await?
            .map(Account::try_from)
            .transpose()
    }
}

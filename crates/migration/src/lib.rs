pub use sea_orm_migration::prelude::*;

mod m20260118_090000_users;
mod m20260118_091000_finance_accounts;
mod m20260118_092000_budgets;
mod m20260118_093000_transactions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260118_090000_users::Migration),
            Box::new(m20260118_091000_finance_accounts::Migration),
            Box::new(m20260118_092000_budgets::Migration),
            Box::new(m20260118_093000_transactions::Migration),
        ]
    }
}

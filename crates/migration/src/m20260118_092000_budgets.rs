use sea_orm_migration::prelude::*;

use crate::m20260118_090000_users::Users;
use crate::m20260118_091000_finance_accounts::FinanceAccounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Budgets {
    Table,
    Id,
    Name,
    AmountMinor,
    SpentMinor,
    Category,
    Period,
    StartDate,
    EndDate,
    IsActive,
    CreatedAt,
    UpdatedAt,
    AccountId,
    UserId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Budgets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Budgets::Name).string().not_null())
                    .col(
                        ColumnDef::new(Budgets::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Budgets::SpentMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Budgets::Category).string())
                    .col(ColumnDef::new(Budgets::Period).string().not_null())
                    .col(ColumnDef::new(Budgets::StartDate).date().not_null())
                    .col(ColumnDef::new(Budgets::EndDate).date())
                    .col(ColumnDef::new(Budgets::IsActive).boolean().not_null())
                    .col(ColumnDef::new(Budgets::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Budgets::UpdatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Budgets::AccountId).big_integer())
                    .col(ColumnDef::new(Budgets::UserId).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-account_id")
                            .from(Budgets::Table, Budgets::AccountId)
                            .to(FinanceAccounts::Table, FinanceAccounts::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-budgets-user_id")
                            .from(Budgets::Table, Budgets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-budgets-user_id-start_date")
                    .table(Budgets::Table)
                    .col(Budgets::UserId)
                    .col(Budgets::StartDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await
    }
}

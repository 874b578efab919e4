use sea_orm_migration::prelude::*;

use crate::m20260118_090000_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum FinanceAccounts {
    Table,
    Id,
    Name,
    Kind,
    Currency,
    InitialBalanceMinor,
    CurrentBalanceMinor,
    IsActive,
    CreatedAt,
    UpdatedAt,
    UserId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FinanceAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinanceAccounts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FinanceAccounts::Name).string().not_null())
                    .col(ColumnDef::new(FinanceAccounts::Kind).string().not_null())
                    .col(
                        ColumnDef::new(FinanceAccounts::Currency)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinanceAccounts::InitialBalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinanceAccounts::CurrentBalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinanceAccounts::IsActive)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinanceAccounts::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinanceAccounts::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FinanceAccounts::UserId).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-finance_accounts-user_id")
                            .from(FinanceAccounts::Table, FinanceAccounts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-finance_accounts-user_id")
                    .table(FinanceAccounts::Table)
                    .col(FinanceAccounts::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FinanceAccounts::Table).to_owned())
            .await
    }
}

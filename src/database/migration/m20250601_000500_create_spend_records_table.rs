use super::{SearchBudgets, SpendRecords};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SpendRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SpendRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SpendRecords::BudgetId).integer().not_null())
                    .col(ColumnDef::new(SpendRecords::UserId).integer().not_null())
                    .col(ColumnDef::new(SpendRecords::SearchId).integer().null())
                    .col(
                        ColumnDef::new(SpendRecords::Amount)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SpendRecords::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        if manager.get_database_backend() == sea_orm::DatabaseBackend::Postgres {
            manager
                .create_foreign_key(
                    ForeignKey::create()
                        .name("fk_spend_records_budget_id")
                        .from(SpendRecords::Table, SpendRecords::BudgetId)
                        .to(SearchBudgets::Table, SearchBudgets::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .to_owned(),
                )
                .await?;
        }

        // Trailing-window analytics scan by user + time
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_spend_records_user_time")
                    .table(SpendRecords::Table)
                    .col(SpendRecords::UserId)
                    .col(SpendRecords::RecordedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SpendRecords::Table).to_owned())
            .await
    }
}

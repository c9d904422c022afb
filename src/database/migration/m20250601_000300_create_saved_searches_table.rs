use super::{SavedSearches, Users};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SavedSearches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SavedSearches::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SavedSearches::UserId).integer().not_null())
                    .col(ColumnDef::new(SavedSearches::Name).string().not_null())
                    .col(ColumnDef::new(SavedSearches::Query).string().not_null())
                    .col(ColumnDef::new(SavedSearches::Platform).string().not_null())
                    .col(
                        ColumnDef::new(SavedSearches::MinPrice)
                            .decimal_len(10, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SavedSearches::MaxPrice)
                            .decimal_len(10, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SavedSearches::CheckIntervalHours)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SavedSearches::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(SavedSearches::ChainId).integer().null())
                    .col(ColumnDef::new(SavedSearches::TemplateId).integer().null())
                    .col(
                        ColumnDef::new(SavedSearches::DependsOnSearchId)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SavedSearches::LastRunAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SavedSearches::LastResultCount)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SavedSearches::LastTriggeredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SavedSearches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SavedSearches::UpdatedAt)
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
                        .name("fk_saved_searches_user_id")
                        .from(SavedSearches::Table, SavedSearches::UserId)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_saved_searches_user_id")
                    .table(SavedSearches::Table)
                    .col(SavedSearches::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_saved_searches_chain_id")
                    .table(SavedSearches::Table)
                    .col(SavedSearches::ChainId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SavedSearches::Table).to_owned())
            .await
    }
}

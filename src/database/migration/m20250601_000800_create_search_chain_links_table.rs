use super::{SearchChainLinks, SearchChains};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SearchChainLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchChainLinks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SearchChainLinks::ChainId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchChainLinks::SearchId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchChainLinks::OrderIndex)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchChainLinks::ConditionType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchChainLinks::MinResults)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SearchChainLinks::LastFiredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SearchChainLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchChainLinks::UpdatedAt)
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
                        .name("fk_search_chain_links_chain_id")
                        .from(SearchChainLinks::Table, SearchChainLinks::ChainId)
                        .to(SearchChains::Table, SearchChains::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .to_owned(),
                )
                .await?;
        }

        // Duplicate order indexes within a chain are a data-integrity violation
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_search_chain_links_chain_order")
                    .table(SearchChainLinks::Table)
                    .col(SearchChainLinks::ChainId)
                    .col(SearchChainLinks::OrderIndex)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchChainLinks::Table).to_owned())
            .await
    }
}

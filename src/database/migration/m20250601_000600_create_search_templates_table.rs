use super::SearchTemplates;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SearchTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchTemplates::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SearchTemplates::Name).string().not_null())
                    .col(ColumnDef::new(SearchTemplates::Description).string().null())
                    .col(
                        ColumnDef::new(SearchTemplates::Category)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchTemplates::TemplateData)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchTemplates::Parameters)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchTemplates::IsPublic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(SearchTemplates::CreatedBy).integer().null())
                    .col(
                        ColumnDef::new(SearchTemplates::UsageCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SearchTemplates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SearchTemplates::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_search_templates_category")
                    .table(SearchTemplates::Table)
                    .col(SearchTemplates::Category)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchTemplates::Table).to_owned())
            .await
    }
}

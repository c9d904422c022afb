use sea_orm_migration::prelude::*;

pub use sea_orm_migration::MigratorTrait;

mod m20250601_000100_create_users_table;
mod m20250601_000200_create_refresh_tokens_table;
mod m20250601_000300_create_saved_searches_table;
mod m20250601_000400_create_search_budgets_table;
mod m20250601_000500_create_spend_records_table;
mod m20250601_000600_create_search_templates_table;
mod m20250601_000700_create_search_chains_table;
mod m20250601_000800_create_search_chain_links_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000100_create_users_table::Migration),
            Box::new(m20250601_000200_create_refresh_tokens_table::Migration),
            Box::new(m20250601_000300_create_saved_searches_table::Migration),
            Box::new(m20250601_000400_create_search_budgets_table::Migration),
            Box::new(m20250601_000500_create_spend_records_table::Migration),
            Box::new(m20250601_000600_create_search_templates_table::Migration),
            Box::new(m20250601_000700_create_search_chains_table::Migration),
            Box::new(m20250601_000800_create_search_chain_links_table::Migration),
        ]
    }
}

/// Common table and column identifiers
#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Email,
    DisplayName,
    CreatedAt,
    UpdatedAt,
    LastLogin,
}

#[derive(Iden)]
pub enum RefreshTokens {
    Table,
    Id,
    TokenHash,
    UserId,
    CreatedAt,
    ExpiresAt,
    RotationCount,
    RevokedAt,
}

#[derive(Iden)]
pub enum SavedSearches {
    Table,
    Id,
    UserId,
    Name,
    Query,
    Platform,
    MinPrice,
    MaxPrice,
    CheckIntervalHours,
    IsActive,
    ChainId,
    TemplateId,
    DependsOnSearchId,
    LastRunAt,
    LastResultCount,
    LastTriggeredAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum SearchBudgets {
    Table,
    Id,
    UserId,
    MonthlyLimit,
    CurrentSpent,
    PeriodStart,
    PeriodEnd,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum SpendRecords {
    Table,
    Id,
    BudgetId,
    UserId,
    SearchId,
    Amount,
    RecordedAt,
}

#[derive(Iden)]
pub enum SearchTemplates {
    Table,
    Id,
    Name,
    Description,
    Category,
    TemplateData,
    Parameters,
    IsPublic,
    CreatedBy,
    UsageCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum SearchChains {
    Table,
    Id,
    UserId,
    Name,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum SearchChainLinks {
    Table,
    Id,
    ChainId,
    SearchId,
    OrderIndex,
    ConditionType,
    MinResults,
    LastFiredAt,
    CreatedAt,
    UpdatedAt,
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A saved marketplace search. Execution (crawling Discogs/eBay) is owned by
/// the external search engine; this service only reads the persisted outcome
/// of the last run (`last_run_at`, `last_result_count`) and requests new runs
/// by stamping `last_triggered_at`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "saved_searches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub query: String,
    pub platform: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub min_price: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub max_price: Option<Decimal>,
    pub check_interval_hours: Option<i32>,
    pub is_active: bool,
    /// Chain this search belongs to, if any (at most one).
    pub chain_id: Option<i32>,
    /// Template this search was materialized from, if any.
    pub template_id: Option<i32>,
    /// Denormalized cache of the chain predecessor that triggers this search.
    pub depends_on_search_id: Option<i32>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_result_count: Option<i32>,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

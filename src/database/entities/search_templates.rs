use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A parameterized search definition. `template_data` holds the partial
/// saved-search definition (query with `{name}` placeholders, platform,
/// optional price bounds); `parameters` holds the declared parameter schema
/// (name -> type/required/default/description).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "search_templates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    /// Free-form grouping label, not an enum.
    pub category: String,
    #[sea_orm(column_type = "Json")]
    pub template_data: Json,
    #[sea_orm(column_type = "Json")]
    pub parameters: Json,
    pub is_public: bool,
    /// Owner; `None` marks a system-provided template.
    pub created_by: Option<i32>,
    pub usage_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Visible to its owner, or to everyone when public. System templates
    /// (no owner) are implicitly public.
    pub fn visible_to(&self, user_id: i32) -> bool {
        self.is_public || self.created_by.is_none() || self.created_by == Some(user_id)
    }
}

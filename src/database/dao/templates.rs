use crate::database::entities::{SearchTemplate, search_templates};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

/// Fields accepted when creating a template
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub template_data: serde_json::Value,
    pub parameters: serde_json::Value,
    pub is_public: bool,
    pub created_by: Option<i32>,
}

/// Templates DAO for database operations
#[derive(Clone)]
pub struct TemplatesDao {
    db: DatabaseConnection,
}

impl TemplatesDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, template: NewTemplate) -> DatabaseResult<SearchTemplate> {
        let now = Utc::now();
        let active_model = search_templates::ActiveModel {
            id: ActiveValue::NotSet,
            name: Set(template.name),
            description: Set(template.description),
            category: Set(template.category),
            template_data: Set(template.template_data),
            parameters: Set(template.parameters),
            is_public: Set(template.is_public),
            created_by: Set(template.created_by),
            usage_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(created)
    }

    pub async fn find_by_id(&self, template_id: i32) -> DatabaseResult<Option<SearchTemplate>> {
        let template = search_templates::Entity::find_by_id(template_id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(template)
    }

    /// Templates visible to a user: their own, public ones, and system ones
    /// (no owner). Optionally narrowed to one category.
    pub async fn find_visible(
        &self,
        user_id: i32,
        category: Option<&str>,
    ) -> DatabaseResult<Vec<SearchTemplate>> {
        let mut select = search_templates::Entity::find().filter(
            Condition::any()
                .add(search_templates::Column::IsPublic.eq(true))
                .add(search_templates::Column::CreatedBy.is_null())
                .add(search_templates::Column::CreatedBy.eq(user_id)),
        );

        if let Some(category) = category {
            select = select.filter(search_templates::Column::Category.eq(category));
        }

        let templates = select
            .order_by_asc(search_templates::Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(templates)
    }

    pub async fn update(&self, template: &SearchTemplate) -> DatabaseResult<SearchTemplate> {
        let active_model = search_templates::ActiveModel {
            id: Set(template.id),
            name: Set(template.name.clone()),
            description: Set(template.description.clone()),
            category: Set(template.category.clone()),
            template_data: Set(template.template_data.clone()),
            parameters: Set(template.parameters.clone()),
            is_public: Set(template.is_public),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        let updated = active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(updated)
    }

    pub async fn delete(&self, template_id: i32) -> DatabaseResult<bool> {
        let result = search_templates::Entity::delete_by_id(template_id)
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Atomically bump `usage_count` as a single UPDATE
    pub async fn increment_usage(&self, template_id: i32) -> DatabaseResult<u64> {
        let result = search_templates::Entity::update_many()
            .col_expr(
                search_templates::Column::UsageCount,
                Expr::col(search_templates::Column::UsageCount).add(1),
            )
            .col_expr(search_templates::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(search_templates::Column::Id.eq(template_id))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Distinct category labels across templates visible to a user
    pub async fn categories(&self, user_id: i32) -> DatabaseResult<Vec<String>> {
        let categories: Vec<String> = search_templates::Entity::find()
            .filter(
                Condition::any()
                    .add(search_templates::Column::IsPublic.eq(true))
                    .add(search_templates::Column::CreatedBy.is_null())
                    .add(search_templates::Column::CreatedBy.eq(user_id)),
            )
            .select_only()
            .column(search_templates::Column::Category)
            .distinct()
            .order_by_asc(search_templates::Column::Category)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(categories)
    }
}

use crate::database::entities::{SavedSearch, saved_searches};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

/// Fields accepted when creating a saved search
#[derive(Debug, Clone)]
pub struct NewSavedSearch {
    pub user_id: i32,
    pub name: String,
    pub query: String,
    pub platform: String,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub check_interval_hours: Option<i32>,
    pub template_id: Option<i32>,
}

/// Saved searches DAO for database operations
#[derive(Clone)]
pub struct SavedSearchesDao {
    db: DatabaseConnection,
}

impl SavedSearchesDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, search: NewSavedSearch) -> DatabaseResult<SavedSearch> {
        let now = Utc::now();
        let active_model = saved_searches::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: Set(search.user_id),
            name: Set(search.name),
            query: Set(search.query),
            platform: Set(search.platform),
            min_price: Set(search.min_price),
            max_price: Set(search.max_price),
            check_interval_hours: Set(search.check_interval_hours),
            is_active: Set(true),
            chain_id: Set(None),
            template_id: Set(search.template_id),
            depends_on_search_id: Set(None),
            last_run_at: Set(None),
            last_result_count: Set(None),
            last_triggered_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(created)
    }

    pub async fn find_by_id(&self, search_id: i32) -> DatabaseResult<Option<SavedSearch>> {
        let search = saved_searches::Entity::find_by_id(search_id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(search)
    }

    pub async fn find_by_user(&self, user_id: i32) -> DatabaseResult<Vec<SavedSearch>> {
        let searches = saved_searches::Entity::find()
            .filter(saved_searches::Column::UserId.eq(user_id))
            .order_by_asc(saved_searches::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(searches)
    }

    /// Update mutable fields from a full model (id selects the row)
    pub async fn update(&self, search: &SavedSearch) -> DatabaseResult<SavedSearch> {
        let active_model = saved_searches::ActiveModel {
            id: Set(search.id),
            name: Set(search.name.clone()),
            query: Set(search.query.clone()),
            platform: Set(search.platform.clone()),
            min_price: Set(search.min_price),
            max_price: Set(search.max_price),
            check_interval_hours: Set(search.check_interval_hours),
            is_active: Set(search.is_active),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        let updated = active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(updated)
    }

    pub async fn delete(&self, search_id: i32) -> DatabaseResult<bool> {
        let result = saved_searches::Entity::delete_by_id(search_id)
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Point a search at its chain and its predecessor within that chain.
    /// `depends_on_search_id` is a denormalized cache kept in sync by the
    /// chain link DAO; pass `None` for both to detach.
    pub async fn set_chain_membership(
        &self,
        search_id: i32,
        chain_id: Option<i32>,
        depends_on_search_id: Option<i32>,
    ) -> DatabaseResult<()> {
        let active_model = saved_searches::ActiveModel {
            id: Set(search_id),
            chain_id: Set(chain_id),
            depends_on_search_id: Set(depends_on_search_id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(())
    }

    /// Stamp a search as requested-to-run by the external engine
    pub async fn mark_triggered(
        &self,
        search_id: i32,
        at: DateTime<Utc>,
    ) -> DatabaseResult<SavedSearch> {
        let active_model = saved_searches::ActiveModel {
            id: Set(search_id),
            last_triggered_at: Set(Some(at)),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        let updated = active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Record the outcome of a completed run (written by the engine callback)
    pub async fn record_run(
        &self,
        search_id: i32,
        ran_at: DateTime<Utc>,
        result_count: i32,
    ) -> DatabaseResult<SavedSearch> {
        let active_model = saved_searches::ActiveModel {
            id: Set(search_id),
            last_run_at: Set(Some(ran_at)),
            last_result_count: Set(Some(result_count)),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        let updated = active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(updated)
    }
}

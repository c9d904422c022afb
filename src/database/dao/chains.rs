use crate::database::entities::{
    SearchChain, SearchChainLink, search_chain_links, search_chains,
};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

/// Chains DAO for database operations on chains and their links
#[derive(Clone)]
pub struct ChainsDao {
    db: DatabaseConnection,
}

impl ChainsDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: i32,
        name: &str,
        description: Option<&str>,
    ) -> DatabaseResult<SearchChain> {
        let now = Utc::now();
        let active_model = search_chains::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: Set(user_id),
            name: Set(name.to_string()),
            description: Set(description.map(|s| s.to_string())),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let chain = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(chain)
    }

    pub async fn find_by_id(&self, chain_id: i32) -> DatabaseResult<Option<SearchChain>> {
        let chain = search_chains::Entity::find_by_id(chain_id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(chain)
    }

    pub async fn find_by_user(&self, user_id: i32) -> DatabaseResult<Vec<SearchChain>> {
        let chains = search_chains::Entity::find()
            .filter(search_chains::Column::UserId.eq(user_id))
            .order_by_asc(search_chains::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(chains)
    }

    /// Every active chain in the system (scheduler input)
    pub async fn find_active(&self) -> DatabaseResult<Vec<SearchChain>> {
        let chains = search_chains::Entity::find()
            .filter(search_chains::Column::IsActive.eq(true))
            .order_by_asc(search_chains::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(chains)
    }

    pub async fn update(
        &self,
        chain_id: i32,
        name: Option<String>,
        description: Option<Option<String>>,
        is_active: Option<bool>,
    ) -> DatabaseResult<SearchChain> {
        let mut active_model = search_chains::ActiveModel {
            id: Set(chain_id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(name) = name {
            active_model.name = Set(name);
        }
        if let Some(description) = description {
            active_model.description = Set(description);
        }
        if let Some(is_active) = is_active {
            active_model.is_active = Set(is_active);
        }

        let updated = active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(updated)
    }

    pub async fn delete(&self, chain_id: i32) -> DatabaseResult<bool> {
        // Links first: SQLite has no FK cascade here
        search_chain_links::Entity::delete_many()
            .filter(search_chain_links::Column::ChainId.eq(chain_id))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        let result = search_chains::Entity::delete_by_id(chain_id)
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn add_link(
        &self,
        chain_id: i32,
        search_id: i32,
        order_index: i32,
        condition_type: &str,
        min_results: Option<i32>,
    ) -> DatabaseResult<SearchChainLink> {
        let now = Utc::now();
        let active_model = search_chain_links::ActiveModel {
            id: ActiveValue::NotSet,
            chain_id: Set(chain_id),
            search_id: Set(search_id),
            order_index: Set(order_index),
            condition_type: Set(condition_type.to_string()),
            min_results: Set(min_results),
            last_fired_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let link = active_model.insert(&self.db).await.map_err(|e| {
            if e.to_string().to_lowercase().contains("unique") {
                DatabaseError::Constraint(format!(
                    "order index {} already used in chain {}",
                    order_index, chain_id
                ))
            } else {
                DatabaseError::Database(e.to_string())
            }
        })?;

        Ok(link)
    }

    pub async fn find_link(&self, link_id: i32) -> DatabaseResult<Option<SearchChainLink>> {
        let link = search_chain_links::Entity::find_by_id(link_id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(link)
    }

    /// Links of a chain in evaluation order
    pub async fn links_sorted(&self, chain_id: i32) -> DatabaseResult<Vec<SearchChainLink>> {
        let links = search_chain_links::Entity::find()
            .filter(search_chain_links::Column::ChainId.eq(chain_id))
            .order_by_asc(search_chain_links::Column::OrderIndex)
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(links)
    }

    pub async fn update_link(
        &self,
        link_id: i32,
        order_index: Option<i32>,
        condition_type: Option<String>,
        min_results: Option<Option<i32>>,
    ) -> DatabaseResult<SearchChainLink> {
        let mut active_model = search_chain_links::ActiveModel {
            id: Set(link_id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(order_index) = order_index {
            active_model.order_index = Set(order_index);
        }
        if let Some(condition_type) = condition_type {
            active_model.condition_type = Set(condition_type);
        }
        if let Some(min_results) = min_results {
            active_model.min_results = Set(min_results);
        }

        let updated = active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(updated)
    }

    pub async fn delete_link(&self, link_id: i32) -> DatabaseResult<bool> {
        let result = search_chain_links::Entity::delete_by_id(link_id)
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Stamp the moment a link's condition fired (idempotence marker)
    pub async fn mark_link_fired(
        &self,
        link_id: i32,
        at: DateTime<Utc>,
    ) -> DatabaseResult<SearchChainLink> {
        let active_model = search_chain_links::ActiveModel {
            id: Set(link_id),
            last_fired_at: Set(Some(at)),
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

use crate::database::entities::{UserRecord, users};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

/// Users DAO for database operations
#[derive(Clone)]
pub struct UsersDao {
    db: DatabaseConnection,
}

impl UsersDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new user
    pub async fn create(&self, email: &str, display_name: Option<&str>) -> DatabaseResult<UserRecord> {
        let now = Utc::now();
        let active_model = users::ActiveModel {
            id: ActiveValue::NotSet,
            email: Set(email.to_string()),
            display_name: Set(display_name.map(|s| s.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
            last_login: Set(None),
        };

        let user = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(user)
    }

    /// Find user by ID
    pub async fn find_by_id(&self, user_id: i32) -> DatabaseResult<Option<UserRecord>> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(user)
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<UserRecord>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(user)
    }

    /// Update last login timestamp
    pub async fn update_last_login(&self, user_id: i32) -> DatabaseResult<UserRecord> {
        let active_model = users::ActiveModel {
            id: Set(user_id),
            last_login: Set(Some(Utc::now())),
            ..Default::default()
        };

        let updated_user = active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(updated_user)
    }
}

use crate::database::entities::{RefreshTokenData, refresh_tokens};
use crate::database::{DatabaseError, DatabaseResult};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

/// Refresh tokens DAO for database operations
#[derive(Clone)]
pub struct RefreshTokensDao {
    db: DatabaseConnection,
}

impl RefreshTokensDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Store a new refresh token (hash only, never the raw token)
    pub async fn store(
        &self,
        token_hash: &str,
        user_id: i32,
        expires_at: DateTime<Utc>,
        rotation_count: i32,
    ) -> DatabaseResult<RefreshTokenData> {
        let active_model = refresh_tokens::ActiveModel {
            id: ActiveValue::NotSet,
            token_hash: Set(token_hash.to_string()),
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
            expires_at: Set(expires_at),
            rotation_count: Set(rotation_count),
            revoked_at: Set(None),
        };

        let token = active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(token)
    }

    /// Find a token by its hash
    pub async fn find_by_hash(&self, token_hash: &str) -> DatabaseResult<Option<RefreshTokenData>> {
        let token = refresh_tokens::Entity::find()
            .filter(refresh_tokens::Column::TokenHash.eq(token_hash))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(token)
    }

    /// Revoke a single token
    pub async fn revoke(&self, token_id: i32) -> DatabaseResult<()> {
        let active_model = refresh_tokens::ActiveModel {
            id: Set(token_id),
            revoked_at: Set(Some(Utc::now())),
            ..Default::default()
        };

        active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(())
    }

    /// Revoke all tokens for a user
    pub async fn revoke_all_for_user(&self, user_id: i32) -> DatabaseResult<u64> {
        let result = refresh_tokens::Entity::update_many()
            .col_expr(
                refresh_tokens::Column::RevokedAt,
                sea_orm::sea_query::Expr::value(Some(Utc::now())),
            )
            .filter(refresh_tokens::Column::UserId.eq(user_id))
            .filter(refresh_tokens::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete expired and revoked tokens, returning the number removed
    pub async fn delete_expired(&self) -> DatabaseResult<u64> {
        let result = refresh_tokens::Entity::delete_many()
            .filter(
                sea_orm::Condition::any()
                    .add(refresh_tokens::Column::ExpiresAt.lt(Utc::now()))
                    .add(refresh_tokens::Column::RevokedAt.is_not_null()),
            )
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

use crate::auth::jwt::{AccessClaims, JwtService};
use crate::database::DatabaseManager;
use crate::database::entities::UserRecord;
use crate::error::AppError;
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use utoipa::ToSchema;

/// Token pair handed to the client. The refresh token is returned exactly
/// once; only its hash is stored.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Session service: access token issuance and refresh-token rotation
#[derive(Clone)]
pub struct SessionService {
    database: Arc<dyn DatabaseManager>,
    jwt: Arc<dyn JwtService>,
    access_token_ttl: u64,
    refresh_token_ttl_days: i64,
}

impl SessionService {
    pub fn new(
        database: Arc<dyn DatabaseManager>,
        jwt: Arc<dyn JwtService>,
        access_token_ttl: u64,
        refresh_token_ttl_days: i64,
    ) -> Self {
        Self {
            database,
            jwt,
            access_token_ttl,
            refresh_token_ttl_days,
        }
    }

    /// Issue a fresh session for a user (initial login handshake)
    pub async fn issue_session(&self, user_id: i32) -> Result<SessionTokens, AppError> {
        self.issue(user_id, 0).await
    }

    /// Bootstrap handshake: look up or create the user for an email and hand
    /// out a fresh session. Identity is asserted by the caller; the external
    /// identity layer fronts this endpoint in deployment.
    pub async fn login(
        &self,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<(UserRecord, SessionTokens), AppError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation("A valid email is required".to_string()));
        }

        let user = match self.database.users().find_by_email(email).await? {
            Some(user) => user,
            None => self.database.users().create(email, display_name).await?,
        };
        let user = self.database.users().update_last_login(user.id).await?;

        tracing::info!(user_id = user.id, "session issued");
        let tokens = self.issue_session(user.id).await?;
        Ok((user, tokens))
    }

    /// Revoke every outstanding refresh token for a user
    pub async fn logout(&self, user_id: i32) -> Result<u64, AppError> {
        let revoked = self
            .database
            .refresh_tokens()
            .revoke_all_for_user(user_id)
            .await?;
        tracing::info!(user_id, revoked, "sessions revoked");
        Ok(revoked)
    }

    /// Exchange a refresh token for a new session. The presented token is
    /// revoked and replaced; a revoked or expired token is rejected with 401.
    pub async fn refresh(&self, raw_refresh_token: &str) -> Result<SessionTokens, AppError> {
        let hash = hash_token(raw_refresh_token);
        let stored = self
            .database
            .refresh_tokens()
            .find_by_hash(&hash)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown refresh token".to_string()))?;

        if !stored.is_valid() {
            return Err(AppError::Unauthorized(
                "Refresh token expired or revoked".to_string(),
            ));
        }

        self.database.refresh_tokens().revoke(stored.id).await?;
        self.database
            .users()
            .update_last_login(stored.user_id)
            .await?;

        tracing::info!(
            user_id = stored.user_id,
            rotation = stored.rotation_count + 1,
            "refresh token rotated"
        );
        self.issue(stored.user_id, stored.rotation_count + 1).await
    }

    /// Current user for a bearer access token
    pub async fn authenticated_user(&self, access_token: &str) -> Result<UserRecord, AppError> {
        let claims = self.jwt.validate_access_token(access_token)?;
        self.database
            .users()
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))
    }

    async fn issue(&self, user_id: i32, rotation_count: i32) -> Result<SessionTokens, AppError> {
        let claims = AccessClaims::new(user_id, self.access_token_ttl);
        let access_token = self.jwt.create_access_token(&claims)?;

        let refresh_token = random_token();
        let expires_at = Utc::now() + Duration::days(self.refresh_token_ttl_days);
        self.database
            .refresh_tokens()
            .store(&hash_token(&refresh_token), user_id, expires_at, rotation_count)
            .await?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_ttl,
        })
    }
}

/// SHA-256 hex digest; the database never sees raw refresh tokens
pub fn hash_token(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    hex_encode(&digest)
}

fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
        s
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_is_stable_and_hex() {
        let h1 = hash_token("some-token");
        let h2 = hash_token("some-token");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_tokens_hash_differently() {
        assert_ne!(hash_token("a"), hash_token("b"));
    }

    #[test]
    fn random_tokens_are_unique() {
        let t1 = random_token();
        let t2 = random_token();
        assert_ne!(t1, t2);
        assert_eq!(t1.len(), 64);
    }
}

use crate::error::AppError;
use crate::health::{HealthCheckResult, HealthChecker};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

pub fn parse_algorithm(alg: &str) -> Result<Algorithm, AppError> {
    let algorithm = Algorithm::from_str(alg)
        .map_err(|_| AppError::BadRequest(format!("Unsupported JWT algorithm: {}", alg)))?;

    // Access tokens are signed with the shared secret; only HMAC fits that
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(AppError::BadRequest(format!(
            "Only HMAC algorithms are supported, got {:?}",
            other
        ))),
    }
}

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: i32, // Database user ID
    pub iat: usize,
    pub exp: usize,
}

impl AccessClaims {
    pub fn new(user_id: i32, expires_in_seconds: u64) -> Self {
        let now = Utc::now().timestamp() as usize;
        Self {
            sub: user_id,
            iat: now,
            exp: now + expires_in_seconds as usize,
        }
    }

    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as usize;
        self.exp <= now
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp as i64, 0).unwrap_or_else(Utc::now)
    }
}

/// JWT service trait for dependency injection and testing
pub trait JwtService: Send + Sync {
    /// Sign an access token from claims
    fn create_access_token(&self, claims: &AccessClaims) -> Result<String, AppError>;

    /// Validate an access token and return its claims
    fn validate_access_token(&self, token: &str) -> Result<AccessClaims, AppError>;

    /// Get algorithm used by this service
    fn algorithm(&self) -> Algorithm;
}

#[derive(Clone)]
pub struct JwtServiceImpl {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtServiceImpl {
    pub fn new(secret: &str, algorithm: Algorithm) -> Result<Self, AppError> {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {}
            other => {
                return Err(AppError::Config(config::ConfigError::Message(format!(
                    "unsupported JWT algorithm {:?}",
                    other
                ))));
            }
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        })
    }

    /// Create a health checker for this JWT service
    pub fn health_checker(&self) -> Arc<JwtHealthChecker> {
        Arc::new(JwtHealthChecker {
            service: self.clone(),
        })
    }
}

impl JwtService for JwtServiceImpl {
    fn create_access_token(&self, claims: &AccessClaims) -> Result<String, AppError> {
        let header = Header::new(self.algorithm);
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn validate_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(token_data.claims)
    }

    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

/// Health checker that round-trips a short-lived test token
pub struct JwtHealthChecker {
    service: JwtServiceImpl,
}

#[async_trait]
impl HealthChecker for JwtHealthChecker {
    fn name(&self) -> &str {
        "jwt"
    }

    async fn check(&self) -> HealthCheckResult {
        let test_claims = AccessClaims::new(1, 60);

        let token = match self.service.create_access_token(&test_claims) {
            Ok(token) => token,
            Err(err) => {
                return HealthCheckResult::unhealthy(format!(
                    "Failed to create test JWT token: {}",
                    err
                ));
            }
        };

        match self.service.validate_access_token(&token) {
            Ok(claims) if claims.sub == test_claims.sub => {
                HealthCheckResult::healthy_with_details(serde_json::json!({
                    "algorithm": format!("{:?}", self.service.algorithm),
                    "token_round_trip": "success"
                }))
            }
            Ok(_) => HealthCheckResult::unhealthy(
                "Token validation returned incorrect claims".to_string(),
            ),
            Err(err) => {
                HealthCheckResult::unhealthy(format!("Failed to validate test JWT token: {}", err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_algorithm_hmac_only() {
        assert!(parse_algorithm("HS256").is_ok());
        assert!(parse_algorithm("HS384").is_ok());
        assert!(parse_algorithm("HS512").is_ok());
        assert!(parse_algorithm("RS256").is_err());
        assert!(parse_algorithm("ES256").is_err());
        assert!(parse_algorithm("EdDSA").is_err());
    }

    #[test]
    fn test_parse_algorithm_case_sensitive() {
        // Algorithms are case sensitive per JWT spec
        assert!(parse_algorithm("hs256").is_err());
    }

    #[test]
    fn test_parse_algorithm_invalid() {
        assert!(parse_algorithm("INVALID").is_err());
        assert!(parse_algorithm("").is_err());
    }

    #[test]
    fn test_token_round_trip() {
        let service = JwtServiceImpl::new("test-secret", Algorithm::HS256).unwrap();
        let claims = AccessClaims::new(7, 3600);

        let token = service.create_access_token(&claims).unwrap();
        assert!(!token.is_empty());

        let validated = service.validate_access_token(&token).unwrap();
        assert_eq!(validated.sub, 7);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtServiceImpl::new("test-secret", Algorithm::HS256).unwrap();
        let mut claims = AccessClaims::new(7, 3600);
        claims.exp = (Utc::now().timestamp() - 3600) as usize;
        claims.iat = claims.exp - 60;

        let token = service.create_access_token(&claims).unwrap();
        assert!(service.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = JwtServiceImpl::new("test-secret", Algorithm::HS256).unwrap();
        let other = JwtServiceImpl::new("other-secret", Algorithm::HS256).unwrap();

        let token = service
            .create_access_token(&AccessClaims::new(1, 3600))
            .unwrap();
        assert!(other.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_claims_expiration_helpers() {
        let mut claims = AccessClaims::new(1, 3600);
        assert!(!claims.is_expired());
        assert!(claims.expires_at() > Utc::now());

        claims.exp = (Utc::now().timestamp() - 60) as usize;
        assert!(claims.is_expired());
    }
}

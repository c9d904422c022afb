pub mod jwt;
pub mod middleware;
pub mod session;

pub use jwt::{AccessClaims, JwtService, JwtServiceImpl, parse_algorithm};
pub use middleware::{UserExtractor, jwt_auth_middleware};
pub use session::{SessionService, SessionTokens, hash_token};

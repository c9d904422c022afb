pub mod auth;
pub mod budgets;
pub mod chains;
pub mod health;
pub mod searches;
pub mod templates;

pub use auth::{create_auth_routes, create_protected_auth_routes};
pub use budgets::create_budget_routes;
pub use chains::create_chain_routes;
pub use health::create_health_routes;
pub use searches::create_search_routes;
pub use templates::create_template_routes;

pub mod budgets;
pub mod chains;
pub mod refresh_tokens;
pub mod saved_searches;
pub mod templates;
pub mod users;

pub use budgets::BudgetsDao;
pub use chains::ChainsDao;
pub use refresh_tokens::RefreshTokensDao;
pub use saved_searches::{NewSavedSearch, SavedSearchesDao};
pub use templates::{NewTemplate, TemplatesDao};
pub use users::UsersDao;

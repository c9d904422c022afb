pub mod refresh_tokens;
pub mod saved_searches;
pub mod search_budgets;
pub mod search_chain_links;
pub mod search_chains;
pub mod search_templates;
pub mod spend_records;
pub mod users;

pub use refresh_tokens::Entity as RefreshTokens;
pub use saved_searches::Entity as SavedSearches;
pub use search_budgets::Entity as SearchBudgets;
pub use search_chain_links::Entity as SearchChainLinks;
pub use search_chains::Entity as SearchChains;
pub use search_templates::Entity as SearchTemplates;
pub use spend_records::Entity as SpendRecords;
pub use users::Entity as Users;

// Type aliases
pub type UserRecord = users::Model;
pub type RefreshTokenData = refresh_tokens::Model;
pub type SavedSearch = saved_searches::Model;
pub type SearchBudget = search_budgets::Model;
pub type SpendRecord = spend_records::Model;
pub type SearchTemplate = search_templates::Model;
pub type SearchChain = search_chains::Model;
pub type SearchChainLink = search_chain_links::Model;

pub use search_chain_links::TriggerCondition;

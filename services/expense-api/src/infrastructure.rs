// Infrastructure layer modules
pub mod config;
pub mod logging;
pub mod store;

// Re-exports
pub use config::DbConfig;
pub use logging::init_logging;
pub use store::{ExpenseStore, InMemoryExpenseStore, MySqlExpenseStore, StoreError};

// Domain layer modules
pub mod expense;

// Re-exports
pub use expense::Expense;

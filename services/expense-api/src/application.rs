// アプリケーション層モジュール
pub mod expense_handler;

// 再エクスポート
pub use expense_handler::{ApiRequest, ApiResponse, ExpenseHandler};

//! 経費ストア
//!
//! 経費レコードの永続化を抽象化する。実装は2つ:
//! - `MySqlExpenseStore`: 本番用。操作毎に接続を開閉する（プールなし）
//! - `InMemoryExpenseStore`: テスト・ローカル開発用
//!
//! 各操作は単一のアトミックなステートメントであり、複数操作に
//! またがるトランザクションは必要としない。

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::Expense;

pub mod memory;
pub mod mysql;

pub use memory::InMemoryExpenseStore;
pub use mysql::MySqlExpenseStore;

/// ストアエラー
///
/// 接続確立の失敗とステートメント実行の失敗を区別するのは
/// 診断ログのためだけであり、API境界ではどちらも500に収束する。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// データストアへの接続が確立できない
    #[error("Database connection failed: {0}")]
    Unavailable(String),

    /// ステートメントの実行に失敗
    #[error("Database error: {0}")]
    Query(String),
}

/// 経費ストアトレイト
///
/// デプロイ形態に依存しない永続化の継ぎ目。ハンドラーはこの
/// トレイト越しにのみストアへアクセスする。
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// スキーマとテーブルを冪等に初期化する
    ///
    /// 既に存在する場合は何もしない。プロセス起動毎に呼んで安全。
    async fn initialize(&self) -> Result<(), StoreError>;

    /// 全経費レコードを取得する
    ///
    /// フィルタリングなし。順序はストア定義（契約上の保証なし）。
    async fn list(&self) -> Result<Vec<Expense>, StoreError>;

    /// 経費レコードを挿入し、採番済みIDを含む作成結果を返す
    async fn insert(
        &self,
        description: &str,
        amount: Decimal,
        category: &str,
    ) -> Result<Expense, StoreError>;

    /// IDで経費レコードを削除する
    ///
    /// # Returns
    /// * `Ok(true)` - 1行削除された
    /// * `Ok(false)` - 該当行なし（削除済み/存在しないIDは区別しない）
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

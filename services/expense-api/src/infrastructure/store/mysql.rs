//! MySQL経費ストア
//!
//! 操作毎に接続を開いて閉じる（プールなし）。並行リクエストは
//! 互いに独立した接続で動作するため、プロセス内ロックは不要。
//! 一貫性の保証はMySQL側の分離レベルに委譲する。

use rust_decimal::Decimal;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection, Row};

use super::{ExpenseStore, StoreError};
use crate::domain::Expense;
use crate::infrastructure::config::DbConfig;

/// expensesテーブルを作成するSQL（データベース名は実行時に補完）
const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS `{db}`.`expenses` (
    id CHAR(36) PRIMARY KEY,
    description VARCHAR(255) NOT NULL,
    amount DECIMAL(10, 2) NOT NULL,
    category VARCHAR(50) NOT NULL
)
"#;

/// MySQL経費ストア
///
/// 接続設定を保持するだけで、接続自体は各操作が都度開く。
pub struct MySqlExpenseStore {
    /// データストア接続設定
    config: DbConfig,
}

impl MySqlExpenseStore {
    /// 新しいMySqlExpenseStoreを作成
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    /// 接続オプションを構築する
    ///
    /// `initialize`はデータベース自体を作成するため、
    /// データベース未選択の接続も構築できるようにする。
    fn connect_options(&self, with_database: bool) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(self.config.host())
            .username(self.config.user())
            .password(self.config.password());

        if with_database {
            options.database(self.config.database())
        } else {
            options
        }
    }

    /// データベース選択済みの接続を開く
    async fn connect(&self) -> Result<MySqlConnection, StoreError> {
        self.connect_options(true)
            .connect()
            .await
            .map_err(connect_error)
    }
}

/// 接続確立の失敗をStoreErrorへ変換
fn connect_error(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

/// ステートメント実行の失敗をStoreErrorへ変換
fn query_error(err: sqlx::Error) -> StoreError {
    StoreError::Query(err.to_string())
}

#[async_trait::async_trait]
impl ExpenseStore for MySqlExpenseStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        // データベース自体を作成する可能性があるため、未選択で接続する
        let mut conn = self
            .connect_options(false)
            .connect()
            .await
            .map_err(connect_error)?;

        let database = self.config.database();

        sqlx::query(&format!("CREATE DATABASE IF NOT EXISTS `{}`", database))
            .execute(&mut conn)
            .await
            .map_err(query_error)?;

        sqlx::query(&CREATE_TABLE_SQL.replace("{db}", database))
            .execute(&mut conn)
            .await
            .map_err(query_error)?;

        conn.close().await.ok();

        tracing::info!(database = database, "スキーマ初期化完了");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Expense>, StoreError> {
        let mut conn = self.connect().await?;

        let rows = sqlx::query("SELECT id, description, amount, category FROM expenses")
            .fetch_all(&mut conn)
            .await
            .map_err(query_error)?;

        let mut expenses = Vec::with_capacity(rows.len());
        for row in rows {
            expenses.push(Expense {
                id: row.try_get("id").map_err(query_error)?,
                description: row.try_get("description").map_err(query_error)?,
                amount: row.try_get("amount").map_err(query_error)?,
                category: row.try_get("category").map_err(query_error)?,
            });
        }

        conn.close().await.ok();
        Ok(expenses)
    }

    async fn insert(
        &self,
        description: &str,
        amount: Decimal,
        category: &str,
    ) -> Result<Expense, StoreError> {
        let expense = Expense::new(description, amount, category);

        let mut conn = self.connect().await?;

        sqlx::query("INSERT INTO expenses (id, description, amount, category) VALUES (?, ?, ?, ?)")
            .bind(&expense.id)
            .bind(&expense.description)
            .bind(expense.amount)
            .bind(&expense.category)
            .execute(&mut conn)
            .await
            .map_err(query_error)?;

        conn.close().await.ok();

        tracing::debug!(expense_id = %expense.id, "経費レコードを挿入");
        Ok(expense)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.connect().await?;

        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&mut conn)
            .await
            .map_err(query_error)?;

        conn.close().await.ok();

        // 影響行数で「削除済み」と「該当なし」を区別する
        Ok(result.rows_affected() > 0)
    }
}

//! インメモリ経費ストア
//!
//! テストとローカル開発用。`ExpenseStore`の契約（ID採番、
//! 影響行数による削除判定、順序非保証の一覧）をそのまま満たす。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{ExpenseStore, StoreError};
use crate::domain::Expense;

/// インメモリ経費ストア
///
/// クローン間でレコードを共有する（Arc内包）。
#[derive(Clone, Default)]
pub struct InMemoryExpenseStore {
    /// 経費レコード
    records: Arc<Mutex<Vec<Expense>>>,
}

impl InMemoryExpenseStore {
    /// 新しい空のInMemoryExpenseStoreを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 保持しているレコード数を返す（テスト検証用）
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .expect("インメモリストアのロック取得に失敗（Mutex poisoned）")
            .len()
    }

    /// レコードが空かどうかを返す
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ExpenseStore for InMemoryExpenseStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        // スキーマを持たないため何もしない（冪等）
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Expense>, StoreError> {
        let records = self
            .records
            .lock()
            .expect("インメモリストアのロック取得に失敗（Mutex poisoned）");
        Ok(records.clone())
    }

    async fn insert(
        &self,
        description: &str,
        amount: Decimal,
        category: &str,
    ) -> Result<Expense, StoreError> {
        let expense = Expense::new(description, amount, category);

        let mut records = self
            .records
            .lock()
            .expect("インメモリストアのロック取得に失敗（Mutex poisoned）");
        records.push(expense.clone());

        Ok(expense)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self
            .records
            .lock()
            .expect("インメモリストアのロック取得に失敗（Mutex poisoned）");

        let before = records.len();
        records.retain(|expense| expense.id != id);

        Ok(records.len() < before)
    }
}

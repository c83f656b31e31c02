//! 経費エンティティ
//!
//! 本システム唯一のエンティティ。作成時にサーバー側でIDを採番し、
//! 以降は削除以外の変更を許さない（更新操作は存在しない）。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 経費レコード
///
/// `amount`はJSON上では`"12.50"`のような10進文字列として
/// シリアライズされる（rust_decimalのデフォルトserde表現）。
/// 2進浮動小数点を経由しないため、セント単位の値が壊れない。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Expense {
    /// 経費ID（UUID v4、36文字）。作成時に一度だけ採番される
    pub id: String,
    /// 経費の説明
    pub description: String,
    /// 金額（固定小数点、小数部2桁）
    pub amount: Decimal,
    /// カテゴリ
    pub category: String,
}

impl Expense {
    /// 新しい経費レコードを作成する
    ///
    /// IDをUUID v4で採番し、金額をDECIMAL(10,2)に合わせて
    /// 小数部2桁へ正規化する（`12.5` → `12.50`）。
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
        category: impl Into<String>,
    ) -> Self {
        let mut amount = amount;
        amount.rescale(2);

        Self {
            id: Uuid::new_v4().to_string(),
            description: description.into(),
            amount,
            category: category.into(),
        }
    }
}

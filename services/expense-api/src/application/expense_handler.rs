//! 経費リクエストハンドラー
//!
//! トランスポート非依存のリクエスト/レスポンス表現を受け取り、
//! ストア操作へ変換する共有コンポーネント。常駐サーバーとLambdaの
//! 両アダプターがここへ委譲するため、2形態の挙動が乖離しない。
//!
//! ルーティングはメソッド優先（GET=一覧、POST=作成、DELETE=ID削除、
//! その他=405）。パスの細かい検証は意図的に行わない（元の契約が
//! 粗い検証だったため、それを維持する）。

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::infrastructure::{ExpenseStore, StoreError};

/// トランスポート非依存のリクエスト表現
///
/// 各デプロイ形態のアダプターが自前のリクエスト型からこの形へ変換する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTPメソッド（大文字、例: "GET"）
    pub method: String,
    /// リクエストパス（プレフィックス込み、例: "/api/expenses/xxx"）
    pub path: String,
    /// リクエストボディ（存在する場合）
    pub body: Option<String>,
}

impl ApiRequest {
    /// 新しいApiRequestを作成
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        body: Option<String>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body,
        }
    }
}

/// トランスポート非依存のレスポンス表現
///
/// ステータスコードとJSONボディのみ。ヘッダー等の具象は
/// 各アダプターが補う。
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTPステータスコード
    pub status: u16,
    /// JSONレスポンスボディ
    pub body: Value,
}

impl ApiResponse {
    /// 200 OKレスポンスを作成
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    /// 201 Createdレスポンスを作成
    pub fn created(body: Value) -> Self {
        Self { status: 201, body }
    }

    /// 200 OK + 確認メッセージレスポンスを作成
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: serde_json::json!({ "message": text.into() }),
        }
    }

    /// 400 Bad Requestエラーを作成
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(400, message)
    }

    /// 404 Not Foundエラーを作成
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::error(404, message)
    }

    /// 405 Method Not Allowedエラーを作成
    pub fn method_not_allowed() -> Self {
        Self::error(405, "Method Not Allowed")
    }

    /// 500 Internal Server Errorを作成
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::error(500, message)
    }

    /// `{"error": ...}`形式のエラーレスポンスを作成
    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message.into() }),
        }
    }
}

/// 経費リクエストハンドラー
///
/// ストアをトレイト越しに保持し、正規化済みリクエストを
/// ストア操作とレスポンスへ変換する。
pub struct ExpenseHandler<S>
where
    S: ExpenseStore,
{
    /// 経費ストア
    store: S,
}

impl<S> ExpenseHandler<S>
where
    S: ExpenseStore,
{
    /// 新しいExpenseHandlerを作成
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 正規化済みリクエストを処理してレスポンスを返す
    ///
    /// # Returns
    /// - 200: 一覧取得成功 / 削除成功
    /// - 201: 作成成功（採番済みIDを含む）
    /// - 400: ボディ不正・フィールド欠落・ID抽出不能
    /// - 404: 削除対象が存在しない
    /// - 405: 未対応メソッド（ストアには触れない）
    /// - 500: ストア利用不能
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        tracing::info!(
            method = %request.method,
            path = %request.path,
            "経費リクエストを受信"
        );

        match request.method.as_str() {
            "GET" => self.list().await,
            "POST" => self.create(request.body.as_deref()).await,
            "DELETE" => self.delete(&request.path).await,
            method => {
                tracing::warn!(method = method, "未対応メソッド");
                ApiResponse::method_not_allowed()
            }
        }
    }

    /// 全経費レコードを取得する
    async fn list(&self) -> ApiResponse {
        match self.store.list().await {
            Ok(expenses) => {
                tracing::info!(count = expenses.len(), "経費一覧を返却");
                match serde_json::to_value(&expenses) {
                    Ok(body) => ApiResponse::ok(body),
                    Err(e) => {
                        tracing::error!(error = %e, "一覧のシリアライズに失敗");
                        ApiResponse::internal_error("Database error")
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "経費一覧取得エラー");
                store_error_response(e)
            }
        }
    }

    /// 経費レコードを作成する
    ///
    /// ボディはJSONオブジェクトで、`description`・`amount`・`category`の
    /// 3フィールドすべてが必要。非オブジェクトのボディはフィールド欠落と
    /// 同じ400として扱う（粗い検証を維持）。
    async fn create(&self, body: Option<&str>) -> ApiResponse {
        let Some(body) = body else {
            return ApiResponse::bad_request("Invalid JSON");
        };
        let Ok(value) = serde_json::from_str::<Value>(body) else {
            return ApiResponse::bad_request("Invalid JSON");
        };

        let Some(description) = non_empty_text(value.get("description")) else {
            return ApiResponse::bad_request("Missing data");
        };
        let Some(category) = non_empty_text(value.get("category")) else {
            return ApiResponse::bad_request("Missing data");
        };
        let amount = match parse_amount(value.get("amount")) {
            Ok(amount) => amount,
            Err(response) => return response,
        };

        match self.store.insert(description, amount, category).await {
            Ok(expense) => {
                tracing::info!(expense_id = %expense.id, "経費を作成");
                match serde_json::to_value(&expense) {
                    Ok(body) => ApiResponse::created(body),
                    Err(e) => {
                        tracing::error!(error = %e, "作成結果のシリアライズに失敗");
                        ApiResponse::internal_error("Database error")
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "経費作成エラー");
                store_error_response(e)
            }
        }
    }

    /// パス末尾のIDで経費レコードを削除する
    async fn delete(&self, path: &str) -> ApiResponse {
        let Some(id) = extract_id(path) else {
            return ApiResponse::bad_request("Expense ID missing in URL");
        };

        match self.store.delete(id).await {
            Ok(true) => {
                tracing::info!(expense_id = id, "経費を削除");
                ApiResponse::message("Expense deleted successfully")
            }
            Ok(false) => {
                tracing::warn!(expense_id = id, "削除対象の経費が見つからない");
                ApiResponse::not_found("Expense not found")
            }
            Err(e) => {
                tracing::error!(expense_id = id, error = %e, "経費削除エラー");
                store_error_response(e)
            }
        }
    }
}

/// ストアエラーを500レスポンスへ変換
///
/// 接続失敗とクエリ失敗は原因を問わず一律500（API境界では区別しない）。
fn store_error_response(err: StoreError) -> ApiResponse {
    let message = match err {
        StoreError::Unavailable(_) => "Database connection failed",
        StoreError::Query(_) => "Database error",
    };
    ApiResponse::internal_error(message)
}

/// JSON値から非空テキストを取り出す
///
/// 文字列以外・空白のみの文字列は欠落と同じ扱い。
fn non_empty_text(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// JSON値から金額を固定小数点として取り出す
///
/// 文字列・数値のいずれも受け付ける。欠落は"Missing data"、
/// 10進数として解釈できない値は"Invalid amount"の400になる。
fn parse_amount(value: Option<&Value>) -> Result<Decimal, ApiResponse> {
    match value {
        Some(Value::String(s)) => {
            Decimal::from_str(s.trim()).map_err(|_| ApiResponse::bad_request("Invalid amount"))
        }
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .map_err(|_| ApiResponse::bad_request("Invalid amount")),
        None | Some(Value::Null) => Err(ApiResponse::bad_request("Missing data")),
        Some(_) => Err(ApiResponse::bad_request("Invalid amount")),
    }
}

/// パス末尾のセグメントを経費IDとして抽出する
///
/// 末尾スラッシュは無視する。コレクションパス自体（`.../expenses`）や
/// 空のセグメントからはIDを抽出できない。
fn extract_id(path: &str) -> Option<&str> {
    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    if segment.is_empty() || segment == "expenses" {
        None
    } else {
        Some(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Expense;
    use crate::infrastructure::InMemoryExpenseStore;
    use async_trait::async_trait;

    fn request(method: &str, path: &str, body: Option<&str>) -> ApiRequest {
        ApiRequest::new(method, path, body.map(String::from))
    }

    fn handler() -> (ExpenseHandler<InMemoryExpenseStore>, InMemoryExpenseStore) {
        let store = InMemoryExpenseStore::new();
        (ExpenseHandler::new(store.clone()), store)
    }

    /// 常にStoreError::Unavailableを返すストア（500系テスト用）
    struct FailingStore;

    #[async_trait]
    impl ExpenseStore for FailingStore {
        async fn initialize(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn list(&self) -> Result<Vec<Expense>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn insert(
            &self,
            _description: &str,
            _amount: Decimal,
            _category: &str,
        ) -> Result<Expense, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn delete(&self, _id: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    // ========================================
    // 一覧（GET）のテスト
    // ========================================

    /// 空のストアに対する一覧が200と空配列を返すことを確認
    #[tokio::test]
    async fn test_list_empty_returns_empty_array() {
        let (handler, _store) = handler();

        let response = handler.handle(request("GET", "/api/expenses", None)).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body, serde_json::json!([]));
    }

    /// 作成後の一覧が作成したレコードをちょうど1件含むことを確認
    #[tokio::test]
    async fn test_create_then_list_contains_exactly_one_match() {
        let (handler, _store) = handler();

        let created = handler
            .handle(request(
                "POST",
                "/api/expenses",
                Some(r#"{"description":"昼食","amount":"12.50","category":"食費"}"#),
            ))
            .await;
        assert_eq!(created.status, 201);
        let created_id = created.body["id"].as_str().unwrap().to_string();

        let response = handler.handle(request("GET", "/api/expenses", None)).await;
        let expenses = response.body.as_array().unwrap();

        let matches: Vec<_> = expenses
            .iter()
            .filter(|e| e["id"] == created.body["id"])
            .collect();
        assert_eq!(matches.len(), 1, "作成したレコードがちょうど1件含まれるべき");
        assert_eq!(matches[0]["description"], "昼食");
        assert_eq!(matches[0]["amount"], "12.50");
        assert_eq!(matches[0]["category"], "食費");
        assert_eq!(created_id.len(), 36);
    }

    /// ストア利用不能時に一覧が500を返すことを確認
    #[tokio::test]
    async fn test_list_store_unavailable_returns_500() {
        let handler = ExpenseHandler::new(FailingStore);

        let response = handler.handle(request("GET", "/api/expenses", None)).await;

        assert_eq!(response.status, 500);
        assert_eq!(response.body["error"], "Database connection failed");
    }

    // ========================================
    // 作成（POST）のテスト
    // ========================================

    /// 金額"12.5"が"12.50"として返ることを確認（10進精度の維持）
    #[tokio::test]
    async fn test_create_preserves_decimal_precision() {
        let (handler, _store) = handler();

        let response = handler
            .handle(request(
                "POST",
                "/api/expenses",
                Some(r#"{"description":"コーヒー","amount":"12.5","category":"飲料"}"#),
            ))
            .await;

        assert_eq!(response.status, 201);
        assert_eq!(
            response.body["amount"],
            "12.50",
            "金額は小数部2桁の10進文字列で返すべき（浮動小数点の揺れ禁止）"
        );
    }

    /// JSON数値の金額も受理されることを確認
    #[tokio::test]
    async fn test_create_accepts_numeric_amount() {
        let (handler, _store) = handler();

        let response = handler
            .handle(request(
                "POST",
                "/api/expenses",
                Some(r#"{"description":"切手","amount":84,"category":"郵送"}"#),
            ))
            .await;

        assert_eq!(response.status, 201);
        assert_eq!(response.body["amount"], "84.00");
    }

    /// 同一内容の作成でもIDが再利用されないことを確認
    #[tokio::test]
    async fn test_create_never_reuses_ids() {
        let (handler, _store) = handler();
        let body = r#"{"description":"定期券","amount":"150.00","category":"交通"}"#;

        let first = handler
            .handle(request("POST", "/api/expenses", Some(body)))
            .await;
        let second = handler
            .handle(request("POST", "/api/expenses", Some(body)))
            .await;

        assert_eq!(first.status, 201);
        assert_eq!(second.status, 201);
        assert_ne!(first.body["id"], second.body["id"], "IDは毎回新しく採番されるべき");
    }

    /// 必須フィールド欠落が400になり、レコードが作成されないことを確認
    #[tokio::test]
    async fn test_create_missing_field_returns_400_without_insert() {
        let (handler, store) = handler();

        let bodies = [
            r#"{"amount":"12.50","category":"食費"}"#,
            r#"{"description":"昼食","category":"食費"}"#,
            r#"{"description":"昼食","amount":"12.50"}"#,
            r#"{"description":"","amount":"12.50","category":"食費"}"#,
            r#"{"description":"昼食","amount":null,"category":"食費"}"#,
        ];

        for body in bodies {
            let response = handler
                .handle(request("POST", "/api/expenses", Some(body)))
                .await;
            assert_eq!(response.status, 400, "フィールド欠落は400を返すべき: {}", body);
            assert_eq!(response.body["error"], "Missing data");
        }

        assert_eq!(store.len(), 0, "400の場合レコードは作成されないべき");
    }

    /// 不正なJSONボディが400になることを確認
    #[tokio::test]
    async fn test_create_invalid_json_returns_400() {
        let (handler, store) = handler();

        let response = handler
            .handle(request("POST", "/api/expenses", Some("{ invalid json }")))
            .await;
        assert_eq!(response.status, 400);
        assert_eq!(response.body["error"], "Invalid JSON");

        // ボディなしも同じ400
        let response = handler.handle(request("POST", "/api/expenses", None)).await;
        assert_eq!(response.status, 400);
        assert_eq!(response.body["error"], "Invalid JSON");

        assert_eq!(store.len(), 0);
    }

    /// 非オブジェクトのボディがフィールド欠落と同じ400になることを確認
    /// （粗い検証を維持する: 配列・文字列等も区別せず400）
    #[tokio::test]
    async fn test_create_non_object_body_returns_400() {
        let (handler, store) = handler();

        for body in [r#"[1, 2, 3]"#, r#""just a string""#, "42"] {
            let response = handler
                .handle(request("POST", "/api/expenses", Some(body)))
                .await;
            assert_eq!(response.status, 400, "非オブジェクトボディは400を返すべき: {}", body);
        }

        assert_eq!(store.len(), 0);
    }

    /// 10進数として解釈できない金額が400になることを確認
    #[tokio::test]
    async fn test_create_invalid_amount_returns_400() {
        let (handler, store) = handler();

        let bodies = [
            r#"{"description":"昼食","amount":"abc","category":"食費"}"#,
            r#"{"description":"昼食","amount":"","category":"食費"}"#,
            r#"{"description":"昼食","amount":true,"category":"食費"}"#,
        ];

        for body in bodies {
            let response = handler
                .handle(request("POST", "/api/expenses", Some(body)))
                .await;
            assert_eq!(response.status, 400, "不正な金額は400を返すべき: {}", body);
            assert_eq!(response.body["error"], "Invalid amount");
        }

        assert_eq!(store.len(), 0);
    }

    /// ストア利用不能時に作成が500を返すことを確認
    #[tokio::test]
    async fn test_create_store_unavailable_returns_500() {
        let handler = ExpenseHandler::new(FailingStore);

        let response = handler
            .handle(request(
                "POST",
                "/api/expenses",
                Some(r#"{"description":"昼食","amount":"12.50","category":"食費"}"#),
            ))
            .await;

        assert_eq!(response.status, 500);
        assert_eq!(response.body["error"], "Database connection failed");
    }

    // ========================================
    // 削除（DELETE）のテスト
    // ========================================

    /// 作成したIDの削除が200を返し、再削除が404になることを確認
    #[tokio::test]
    async fn test_delete_then_second_delete_returns_404() {
        let (handler, store) = handler();

        let created = handler
            .handle(request(
                "POST",
                "/api/expenses",
                Some(r#"{"description":"書籍","amount":"30.00","category":"教育"}"#),
            ))
            .await;
        let id = created.body["id"].as_str().unwrap().to_string();
        let path = format!("/api/expenses/{}", id);

        let first = handler.handle(request("DELETE", &path, None)).await;
        assert_eq!(first.status, 200);
        assert_eq!(first.body["message"], "Expense deleted successfully");
        assert_eq!(store.len(), 0, "削除は該当レコードのみをちょうど1件消すべき");

        let second = handler.handle(request("DELETE", &path, None)).await;
        assert_eq!(second.status, 404, "同一IDの2回目の削除は404を返すべき");
        assert_eq!(second.body["error"], "Expense not found");
    }

    /// 存在しないIDの削除が404を返すことを確認
    #[tokio::test]
    async fn test_delete_unknown_id_returns_404() {
        let (handler, _store) = handler();

        let response = handler
            .handle(request("DELETE", "/api/expenses/no-such-id", None))
            .await;

        assert_eq!(response.status, 404);
        assert_eq!(response.body["error"], "Expense not found");
    }

    /// パスからIDを抽出できない場合に400を返すことを確認
    #[tokio::test]
    async fn test_delete_without_id_returns_400() {
        let (handler, _store) = handler();

        for path in ["/api/expenses", "/api/expenses/", "/", ""] {
            let response = handler.handle(request("DELETE", path, None)).await;
            assert_eq!(response.status, 400, "ID抽出不能なパスは400を返すべき: {:?}", path);
            assert_eq!(response.body["error"], "Expense ID missing in URL");
        }
    }

    /// ストア利用不能時に削除が500を返すことを確認
    #[tokio::test]
    async fn test_delete_store_unavailable_returns_500() {
        let handler = ExpenseHandler::new(FailingStore);

        let response = handler
            .handle(request("DELETE", "/api/expenses/some-id", None))
            .await;

        assert_eq!(response.status, 500);
    }

    // ========================================
    // 未対応メソッドのテスト
    // ========================================

    /// 未対応メソッドが405を返し、ストアに触れないことを確認
    /// （ストアが落ちていても500ではなく405になる）
    #[tokio::test]
    async fn test_unsupported_method_returns_405_without_touching_store() {
        let handler = ExpenseHandler::new(FailingStore);

        for method in ["PUT", "PATCH", "OPTIONS", "HEAD"] {
            let response = handler.handle(request(method, "/api/expenses", None)).await;
            assert_eq!(
                response.status, 405,
                "未対応メソッドはストアに触れず405を返すべき: {}",
                method
            );
            assert_eq!(response.body["error"], "Method Not Allowed");
        }
    }

    // ========================================
    // 往復の冪等性テスト
    // ========================================

    /// 一覧→作成→削除→一覧で元の集合に戻ることを確認（順序非依存）
    #[tokio::test]
    async fn test_create_delete_round_trip_restores_original_set() {
        let (handler, _store) = handler();

        // 事前データを2件投入
        for body in [
            r#"{"description":"家賃","amount":"800.00","category":"住居"}"#,
            r#"{"description":"電気代","amount":"45.30","category":"光熱"}"#,
        ] {
            let response = handler
                .handle(request("POST", "/api/expenses", Some(body)))
                .await;
            assert_eq!(response.status, 201);
        }

        let before = handler.handle(request("GET", "/api/expenses", None)).await;
        let mut before_ids: Vec<String> = before
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_str().unwrap().to_string())
            .collect();
        before_ids.sort();

        // 作成して即削除
        let created = handler
            .handle(request(
                "POST",
                "/api/expenses",
                Some(r#"{"description":"映画","amount":"15.00","category":"娯楽"}"#),
            ))
            .await;
        let id = created.body["id"].as_str().unwrap();
        let deleted = handler
            .handle(request("DELETE", &format!("/api/expenses/{}", id), None))
            .await;
        assert_eq!(deleted.status, 200);

        let after = handler.handle(request("GET", "/api/expenses", None)).await;
        let mut after_ids: Vec<String> = after
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_str().unwrap().to_string())
            .collect();
        after_ids.sort();

        assert_eq!(before_ids, after_ids, "往復後は元の集合に戻るべき（順序非依存）");
    }

    // ========================================
    // ヘルパー関数のテスト
    // ========================================

    /// パスからのID抽出の境界ケースを確認
    #[test]
    fn test_extract_id_edge_cases() {
        assert_eq!(extract_id("/api/expenses/abc-123"), Some("abc-123"));
        assert_eq!(extract_id("/expenses/abc-123/"), Some("abc-123"));
        assert_eq!(
            extract_id("/.netlify/functions/expenses/xyz"),
            Some("xyz"),
            "Function形態のプレフィックス付きパスからも抽出できるべき"
        );
        assert_eq!(extract_id("/api/expenses"), None);
        assert_eq!(extract_id("/api/expenses/"), None);
        assert_eq!(extract_id("/"), None);
        assert_eq!(extract_id(""), None);
    }

    /// 金額パースの受理・拒否を確認
    #[test]
    fn test_parse_amount_coercion() {
        use std::str::FromStr;

        let ok = parse_amount(Some(&serde_json::json!("12.5"))).unwrap();
        assert_eq!(ok, Decimal::from_str("12.5").unwrap());

        let ok = parse_amount(Some(&serde_json::json!(" 99.99 "))).unwrap();
        assert_eq!(ok, Decimal::from_str("99.99").unwrap());

        let ok = parse_amount(Some(&serde_json::json!(7))).unwrap();
        assert_eq!(ok, Decimal::from_str("7").unwrap());

        assert!(parse_amount(None).is_err());
        assert!(parse_amount(Some(&serde_json::json!(null))).is_err());
        assert!(parse_amount(Some(&serde_json::json!("abc"))).is_err());
        assert!(parse_amount(Some(&serde_json::json!([1]))).is_err());
    }
}

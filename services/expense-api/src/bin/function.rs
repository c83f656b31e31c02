//! 経費記録Lambdaエントリポイント（Function-Handler形態）
//!
//! 呼び出し毎に環境変数から接続設定を読み込み、新しいストアを
//! 構築して共有ハンドラーへ委譲する。プロセス内状態は呼び出し間で
//! 一切引き継がない（ステートレス）。
//!
//! ルーティング・検証・エラー形式は常駐サーバー形態と同一
//! （application層の共有ハンドラーに実装がある）。

use lambda_http::{Body, Error, Request, Response, run, service_fn};
use tracing::info;

use expense_api::application::{ApiRequest, ApiResponse, ExpenseHandler};
use expense_api::infrastructure::{DbConfig, ExpenseStore, MySqlExpenseStore, init_logging};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    info!("経費記録Lambda関数を初期化");

    // Lambda関数を実行
    run(service_fn(handler)).await
}

/// HTTPリクエストハンドラー
///
/// 呼び出し毎に接続設定とストアを新規構築する。
/// データストアへの接続はストアが操作毎に開くため、
/// 初期化処理はここでは行わない。
///
/// # 環境変数
/// - `DB_HOST` / `DB_USER` / `DB_PASSWORD` / `DB_NAME`: MySQL接続設定
async fn handler(request: Request) -> Result<Response<Body>, Error> {
    let config = DbConfig::from_env();
    let expense_handler = ExpenseHandler::new(MySqlExpenseStore::new(config));

    handle_request(&expense_handler, request).await
}

/// リクエストを共有ハンドラーへ委譲する
///
/// ストア実装に依存しないため、テストではインメモリストアを
/// 差し込んで全経路を検証できる。
async fn handle_request<S>(
    expense_handler: &ExpenseHandler<S>,
    request: Request,
) -> Result<Response<Body>, Error>
where
    S: ExpenseStore,
{
    let api_request = to_api_request(&request);
    let api_response = expense_handler.handle(api_request).await;
    to_response(api_response)
}

/// Lambdaリクエストをトランスポート非依存の表現へ変換する
fn to_api_request(request: &Request) -> ApiRequest {
    let body = match request.body() {
        Body::Text(text) => Some(text.clone()),
        Body::Binary(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Body::Empty => None,
        _ => None,
    };

    ApiRequest::new(
        request.method().as_str(),
        request.uri().path(),
        body,
    )
}

/// 正規化レスポンスをLambdaレスポンスへ変換する
fn to_response(response: ApiResponse) -> Result<Response<Body>, Error> {
    let body = serde_json::to_string(&response.body)?;

    Ok(Response::builder()
        .status(response.status)
        .header("content-type", "application/json")
        .body(Body::Text(body))?)
}

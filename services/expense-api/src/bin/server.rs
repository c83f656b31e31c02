//! 経費記録HTTP APIサーバー（常駐プロセス形態）
//!
//! 本バイナリは以下の機能を提供する:
//! - 経費の一覧取得 (GET /api/expenses)
//! - 経費の作成 (POST /api/expenses)
//! - 経費の削除 (DELETE /api/expenses/{id})
//! - ヘルスチェック (GET /health)
//!
//! ルーティング・検証はapplication層の共有ハンドラーへ委譲し、
//! 本バイナリはaxumのリクエスト/レスポンスを正規化表現へ変換する
//! 薄いアダプターに徹する。

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get},
};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use expense_api::application::{ApiRequest, ApiResponse, ExpenseHandler};
use expense_api::infrastructure::{DbConfig, ExpenseStore, MySqlExpenseStore, init_logging};

/// リクエストボディの最大サイズ
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// リッスンポート
const LISTEN_PORT: u16 = 8080;

/// アプリケーション状態
///
/// ルーター全体で共有される状態を保持する。
pub struct AppState<S>
where
    S: ExpenseStore,
{
    /// 共有経費ハンドラー
    handler: Arc<ExpenseHandler<S>>,
}

impl<S> Clone for AppState<S>
where
    S: ExpenseStore,
{
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
        }
    }
}

/// ヘルスチェックエンドポイント
///
/// サーバーの死活確認用。ストアには触れない。
async fn health() -> &'static str {
    "OK"
}

/// 経費エンドポイントのディスパッチアダプター
///
/// axumのリクエストをトランスポート非依存の表現へ変換して
/// 共有ハンドラーに渡す。メソッドの振り分け・検証・エラー形式は
/// すべて共有ハンドラー側にあり、Function形態と完全に一致する。
async fn dispatch<S>(State(state): State<AppState<S>>, request: Request) -> Response
where
    S: ExpenseStore + 'static,
{
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, MAX_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "リクエストボディの読み取りに失敗");
            return into_response(ApiResponse::bad_request("Invalid JSON"));
        }
    };
    let body = if bytes.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&bytes).into_owned())
    };

    let api_request = ApiRequest::new(parts.method.as_str(), parts.uri.path(), body);
    into_response(state.handler.handle(api_request).await)
}

/// 正規化レスポンスをaxumレスポンスへ変換する
fn into_response(response: ApiResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}

/// ルーターを構築する
///
/// 経費エンドポイントは全メソッドを共有ハンドラーへ流す
/// （未対応メソッドの405判定も共有ハンドラーが行う）。
/// TraceLayerによりリクエスト/レスポンスの構造化ログを自動記録する。
///
/// # Arguments
/// * `handler` - 共有経費ハンドラー
pub fn create_router<S>(handler: Arc<ExpenseHandler<S>>) -> Router
where
    S: ExpenseStore + 'static,
{
    let state = AppState { handler };

    Router::new()
        .route("/health", get(health))
        .route("/api/expenses", any(dispatch::<S>))
        .route("/api/expenses/{id}", any(dispatch::<S>))
        // フロントエンドからの直接アクセス用にCORSを許可
        .layer(CorsLayer::permissive())
        // リクエストトレーシングレイヤー（method, path, status, latencyを自動記録）
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// シャットダウンシグナルを待機する
///
/// SIGTERMまたはCtrl+C (SIGINT) を待機し、いずれかを受信したらリターンする。
/// axum::serve の with_graceful_shutdown() と組み合わせて使用することで、
/// 新規リクエストの受付停止と処理中リクエストの完了待機を実現する。
///
/// # Panics
/// シグナルハンドラーの登録に失敗した場合はパニックする。
async fn shutdown_signal() {
    // Ctrl+C (SIGINT) を待機
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Ctrl+C シグナルハンドラーの登録に失敗しました");
    };

    // SIGTERM を待機 (Unix系OSのみ)
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM シグナルハンドラーの登録に失敗しました")
            .recv()
            .await;
    };

    // Windows等の非Unix環境ではSIGTERMは利用不可
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C (SIGINT) を受信しました。graceful shutdownを開始します");
        }
        _ = terminate => {
            tracing::info!("SIGTERM を受信しました。graceful shutdownを開始します");
        }
    }
}

/// メイン関数
///
/// トレーシングを初期化し、HTTPサーバーを起動する。
/// 接続設定はプロセス起動時に一度だけ構築し、以降は参照で渡す。
/// スキーマ初期化の失敗はログに残すだけでサーバーは起動を続ける
/// （各リクエストが自前の接続を再試行するため）。
///
/// # 環境変数
/// - `DB_HOST` / `DB_USER` / `DB_PASSWORD` / `DB_NAME`: MySQL接続設定
/// - `RUST_LOG`: ログレベル（デフォルト: info）
#[tokio::main]
async fn main() {
    // 構造化ログの初期化
    init_logging();

    tracing::info!("経費記録APIサーバーを起動します");

    // 接続設定を一度だけ構築（グローバル可変状態は持たない）
    let config = DbConfig::from_env();
    tracing::info!(
        host = config.host(),
        database = config.database(),
        "データストア設定を読み込みました"
    );

    let store = MySqlExpenseStore::new(config);

    // スキーマ初期化は失敗してもプロセスを止めない
    if let Err(e) = store.initialize().await {
        tracing::error!(error = %e, "スキーマ初期化に失敗。リクエスト処理は継続します");
    }

    let handler = Arc::new(ExpenseHandler::new(store));
    let app = create_router(handler);

    let addr = SocketAddr::from(([0, 0, 0, 0], LISTEN_PORT));
    tracing::info!("リッスン開始: {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("アドレスのバインドに失敗しました");

    // graceful shutdownを有効にしてサーバーを起動
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("サーバーの起動に失敗しました");

    tracing::info!("サーバーが正常に停止しました");
}

//! 経費記録API
//!
//! 経費レコード（説明・金額・カテゴリ）の作成・一覧・削除を提供する。
//! 同一の論理コントラクトを2つのデプロイ形態で公開する:
//! - 常駐HTTPサーバー（`bin/server.rs`、axum）
//! - ステートレスなFunctionハンドラー（`bin/function.rs`、lambda_http）
//!
//! 両形態はapplication層の共有ハンドラーを経由するため、挙動が乖離しない。

// Domain layer modules
pub mod domain;

// Application layer modules
pub mod application;

// Infrastructure layer modules
pub mod infrastructure;

//! データストア接続設定
//!
//! 接続先のホスト・ユーザー・パスワード・データベース名を保持する。
//! プロセス起動時（サーバー形態）または呼び出し毎（Function形態）に
//! 一度構築し、参照でストアへ渡す。グローバル可変状態は持たない。

/// ホスト名の環境変数
const DB_HOST_ENV: &str = "DB_HOST";
/// ユーザー名の環境変数
const DB_USER_ENV: &str = "DB_USER";
/// パスワードの環境変数
const DB_PASSWORD_ENV: &str = "DB_PASSWORD";
/// データベース名の環境変数
const DB_NAME_ENV: &str = "DB_NAME";

/// ホスト名のデフォルト値
const DEFAULT_HOST: &str = "localhost";
/// ユーザー名のデフォルト値
const DEFAULT_USER: &str = "root";
/// データベース名のデフォルト値
const DEFAULT_DATABASE: &str = "expenses_db";

/// データストア接続設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// 接続先ホスト
    host: String,
    /// 接続ユーザー
    user: String,
    /// 接続パスワード
    password: String,
    /// データベース名
    database: String,
}

impl DbConfig {
    /// 明示的な値で新しいDbConfigを作成（テスト用）
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
        }
    }

    /// 環境変数から設定を読み込む
    ///
    /// 環境変数:
    /// - `DB_HOST`: 接続先ホスト（デフォルト: localhost）
    /// - `DB_USER`: 接続ユーザー（デフォルト: root）
    /// - `DB_PASSWORD`: 接続パスワード（デフォルト: 空文字列）
    /// - `DB_NAME`: データベース名（デフォルト: expenses_db）
    ///
    /// すべてフォールバック値を持つため失敗しない。
    pub fn from_env() -> Self {
        Self {
            host: std::env::var(DB_HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            user: std::env::var(DB_USER_ENV).unwrap_or_else(|_| DEFAULT_USER.to_string()),
            password: std::env::var(DB_PASSWORD_ENV).unwrap_or_default(),
            database: std::env::var(DB_NAME_ENV).unwrap_or_else(|_| DEFAULT_DATABASE.to_string()),
        }
    }

    /// 接続先ホストを取得
    pub fn host(&self) -> &str {
        &self.host
    }

    /// 接続ユーザーを取得
    pub fn user(&self) -> &str {
        &self.user
    }

    /// 接続パスワードを取得
    pub fn password(&self) -> &str {
        &self.password
    }

    /// データベース名を取得
    pub fn database(&self) -> &str {
        &self.database
    }
}

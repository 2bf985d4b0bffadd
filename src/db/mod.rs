use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::path::Path;
use std::time::Duration;

pub mod models;

/// busy_timeout設定（ミリ秒）
/// SQLiteのロック競合時に待機する最大時間
/// 5秒あれば通常の競合は解消される
const SQLITE_BUSY_TIMEOUT_MS: u64 = 5000;

/// データベース接続プールを作成し、マイグレーションを実行
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // SqliteConnectOptionsを使用してbusy_timeoutを明示的に設定
    // URIパラメータではなくAPIを使用することで、設定が確実に適用される
    let connect_options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .busy_timeout(Duration::from_millis(SQLITE_BUSY_TIMEOUT_MS));

    // 書き込みは到着順に1件ずつ行う
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await?;

    // マイグレーション実行
    sqlx::migrate!("./migrations").run(&pool).await?;

    // colors_json列が無い古いDBに列を追加
    ensure_colors_column(&pool).await?;

    Ok(pool)
}

/// comments テーブルに colors_json 列が無ければ追加する
///
/// colors_json導入前に作られたDBとの後方互換用
pub async fn ensure_colors_column(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let columns = sqlx::query("PRAGMA table_info(comments)")
        .fetch_all(pool)
        .await?;

    let has_colors = columns
        .iter()
        .any(|row| row.try_get::<String, _>("name").ok().as_deref() == Some("colors_json"));
    if has_colors {
        return Ok(());
    }

    log::info!("Adding colors_json column to comments table");
    sqlx::query("ALTER TABLE comments ADD COLUMN colors_json TEXT")
        .execute(pool)
        .await?;
    Ok(())
}

//! コメントDB（comments.db）への保存と読み出し

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

use super::errors::YouTubeError;
use super::poller::ChatSink;
use super::types::ChatEvent;
use crate::config::{DEFAULT_RECENT_LIMIT, MAX_RECENT_LIMIT, STORE_FILE_NAME};
use crate::db::{create_pool, models::ChatEventRow};

/// recent() の件数を有効範囲に収める（範囲外はデフォルト件数）
pub fn normalize_limit(limit: i64) -> i64 {
    if (1..=MAX_RECENT_LIMIT).contains(&limit) {
        limit
    } else {
        DEFAULT_RECENT_LIMIT
    }
}

/// SQLiteのコメントストア
pub struct ChatStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl ChatStore {
    /// 指定ディレクトリ（省略時はカレントディレクトリ）に comments.db を開く
    ///
    /// 何度呼んでも安全。ディレクトリ・テーブルが無ければ作る。
    pub async fn open(dir: Option<&Path>) -> Result<Self, YouTubeError> {
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir()?,
        };
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(STORE_FILE_NAME);
        let pool = create_pool(&path).await?;
        log::info!("Chat store opened: {}", path.display());

        Ok(Self { pool, path })
    }

    /// DBファイルのパス
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 1件保存する
    ///
    /// INSERT OR IGNOREで重複を無視し、既存レコードはスキップする。
    /// 新規に保存した場合はtrue。
    pub async fn insert(&self, event: &ChatEvent) -> Result<bool, YouTubeError> {
        let row = ChatEventRow::from_event(event);

        let result = sqlx::query(
            r#"INSERT OR IGNORE INTO comments
            (id, video_id, timestamp_ms, timestamp, author, text, kind, amount, amount_text,
             icon, parts_json, colors_json)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&row.id)
        .bind(&row.video_id)
        .bind(row.timestamp_ms)
        .bind(&row.timestamp)
        .bind(&row.author)
        .bind(&row.text)
        .bind(&row.kind)
        .bind(row.amount)
        .bind(&row.amount_text)
        .bind(&row.icon)
        .bind(&row.parts_json)
        .bind(&row.colors_json)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 新しい順に最大limit件を取り出し、古い順に並べて返す
    pub async fn recent(&self, limit: i64) -> Result<Vec<ChatEvent>, YouTubeError> {
        let rows: Vec<ChatEventRow> = sqlx::query_as(
            r#"SELECT id, video_id, timestamp_ms, timestamp, author, text, kind, amount,
                      amount_text, icon, parts_json, colors_json
            FROM comments
            ORDER BY timestamp_ms DESC, rowid DESC
            LIMIT ?"#,
        )
        .bind(normalize_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().rev().map(ChatEventRow::into_event).collect())
    }

    /// 接続を閉じる
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ChatSink for ChatStore {
    async fn save(&self, event: &ChatEvent) {
        match self.insert(event).await {
            Ok(true) => {}
            Ok(false) => log::debug!("Duplicate chat event skipped: {}", event.id),
            Err(e) => log::warn!("Failed to save chat event to DB: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::types::{EventKind, MessagePart};
    use tempfile::TempDir;

    fn event(id: &str, timestamp_ms: i64, text: &str) -> ChatEvent {
        ChatEvent {
            id: id.to_string(),
            stream_id: "abcdefghijk".to_string(),
            timestamp_ms,
            timestamp_display: "2024-01-01 12:00:00".to_string(),
            author: "太郎".to_string(),
            text: text.to_string(),
            kind: EventKind::Text,
            amount: None,
            amount_text: String::new(),
            icon_url: None,
            parts: vec![MessagePart::text(text)],
            colors: None,
        }
    }

    async fn open_temp() -> (TempDir, ChatStore) {
        let dir = TempDir::new().unwrap();
        let store = ChatStore::open(Some(dir.path())).await.unwrap();
        (dir, store)
    }

    #[test]
    fn test_normalize_limit() {
        assert_eq!(normalize_limit(1), 1);
        assert_eq!(normalize_limit(500), 500);
        assert_eq!(normalize_limit(0), 50);
        assert_eq!(normalize_limit(-3), 50);
        assert_eq!(normalize_limit(501), 50);
    }

    #[tokio::test]
    async fn test_open_creates_nested_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");

        let store = ChatStore::open(Some(nested.as_path())).await.unwrap();
        assert_eq!(store.path(), nested.join("comments.db"));
        assert!(store.path().exists());
        store.close().await;

        // 2回目のopenも成功する
        let store = ChatStore::open(Some(nested.as_path())).await.unwrap();
        store.close().await;
    }

    #[tokio::test]
    async fn test_save_is_idempotent_and_keeps_first_write() {
        let (_dir, store) = open_temp().await;

        assert!(store.insert(&event("msg-1", 1000, "first")).await.unwrap());
        assert!(!store.insert(&event("msg-1", 1000, "second")).await.unwrap());

        let events = store.recent(50).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].text, "first");
        store.close().await;
    }

    #[tokio::test]
    async fn test_recent_returns_oldest_first() {
        let (_dir, store) = open_temp().await;

        store.save(&event("c", 3000, "three")).await;
        store.save(&event("a", 1000, "one")).await;
        store.save(&event("b", 2000, "two")).await;
        // 同じタイムスタンプは挿入順
        store.save(&event("d", 3000, "four")).await;

        let events = store.recent(3).await.unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "d"]);
        store.close().await;
    }

    #[tokio::test]
    async fn test_recent_out_of_range_limit_uses_default() {
        let (_dir, store) = open_temp().await;

        for i in 0..60 {
            store.save(&event(&format!("msg-{}", i), i, "x")).await;
        }

        assert_eq!(store.recent(0).await.unwrap().len(), 50);
        assert_eq!(store.recent(1000).await.unwrap().len(), 50);
        assert_eq!(store.recent(10).await.unwrap().len(), 10);

        // 最新の10件が古い順で返る
        let events = store.recent(10).await.unwrap();
        assert_eq!(events.first().unwrap().id, "msg-50");
        assert_eq!(events.last().unwrap().id, "msg-59");
        store.close().await;
    }

    #[tokio::test]
    async fn test_save_after_close_is_swallowed() {
        let (_dir, store) = open_temp().await;
        store.close().await;

        // 保存失敗はパニックせずログのみ
        store.save(&event("msg-1", 1000, "late")).await;
        assert!(store.insert(&event("msg-1", 1000, "late")).await.is_err());
    }
}

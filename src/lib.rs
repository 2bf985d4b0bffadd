//! YouTubeライブチャットレコーダー
//!
//! 配信のライブチャットをInnerTube APIでポーリングし、
//! 正規化したコメントをSQLite（comments.db）に1件1回だけ保存する。

pub mod commands;
pub mod config;
pub mod db;
pub mod util; // doctestのためpubにする
pub mod youtube;

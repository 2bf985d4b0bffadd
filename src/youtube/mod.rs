//! YouTubeライブチャットの取得・正規化・保存

pub mod bootstrap;
pub mod db;
pub mod errors;
pub mod innertube;
pub mod poller;
pub mod state;
pub mod types;

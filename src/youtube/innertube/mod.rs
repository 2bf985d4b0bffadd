//! InnerTube API クライアントモジュール
//!
//! YouTubeの内部APIを使用してライブチャットを取得する。
//! 公式API Data v3と異なり、APIキー不要でクォータ制限なし。
//!
//! ## 注意事項
//! - 非公式APIのため、仕様変更のリスクあり
//! - 未知のレンダラーはスキップし、ポーリングは継続する

pub mod client;
pub mod parser;
pub mod types;

pub use client::{fetch_live_chat, ChatTransport, InnerTubeClient};
pub use parser::parse_chat_response;
pub use types::*;

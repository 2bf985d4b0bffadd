//! chat-recorder - YouTubeライブチャットをcomments.dbに記録するCLI

use anyhow::{Context, Result};
use chat_recorder_lib::commands::{record, view, RecordOptions, ViewOptions};
use chat_recorder_lib::config::{DEFAULT_VIEW_LIMIT, STORE_DIR_ENV, YOUTUBE_BASE_URL};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// YouTube live chat recorder
#[derive(Parser, Debug)]
#[command(name = "chat-recorder")]
#[command(about = "Record YouTube live chat into a local SQLite store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll a live stream's chat and save every event to comments.db
    Record {
        /// Video id, @handle, channel id or YouTube URL
        input: String,

        /// Directory containing comments.db (defaults to current directory)
        #[arg(long, value_name = "DIR", env = STORE_DIR_ENV)]
        store_dir: Option<PathBuf>,

        /// Echo each saved event to stdout
        #[arg(long)]
        print: bool,

        /// Keep the "Top chat" view instead of switching to "All chat"
        #[arg(long)]
        top_chat: bool,
    },

    /// Show recent comments from comments.db
    View {
        /// Directory containing comments.db (defaults to current directory)
        #[arg(long, value_name = "DIR", env = STORE_DIR_ENV)]
        store_dir: Option<PathBuf>,

        /// Number of recent comments to show (max 500)
        #[arg(long, default_value_t = DEFAULT_VIEW_LIMIT)]
        limit: i64,

        /// Output full JSON objects instead of simple lines
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .envがあれば読み込む（無くてもよい）
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Record {
            input,
            store_dir,
            print,
            top_chat,
        } => {
            let options = RecordOptions {
                input,
                store_dir,
                print,
                top_chat,
                base_url: YOUTUBE_BASE_URL.to_string(),
            };
            let session = record(options)
                .await
                .context("Failed to record live chat")?;
            log::info!(
                "Stopped live chat fetcher: videoId={}, polls={}, saved={}",
                session.state.video_id,
                session.polls(),
                session.events_saved
            );
        }
        Command::View {
            store_dir,
            limit,
            json,
        } => {
            let output = view(ViewOptions {
                store_dir,
                limit,
                json,
            })
            .await
            .context("Failed to read comments")?;
            if !output.is_empty() {
                println!("{}", output);
            }
        }
    }

    Ok(())
}

//! CLIサブコマンドの実装

pub mod record;
pub mod view;

pub use record::{record, RecordOptions};
pub use view::{view, ViewOptions};

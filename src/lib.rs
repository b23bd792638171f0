//! ropebuf - ロープ構造のテキストバッファエンジン
//!
//! 任意位置での高速な挿入・削除、オフセットと (行, 列) の相互変換、
//! アンドゥ/リドゥ可能な編集履歴を提供する

// コアモジュール
pub mod config;
pub mod error;
pub mod logging;

// データ層
pub mod buffer;

// 編集層
pub mod history;

// 公開API
pub use buffer::{ChangeEvent, ChangeListener, Cursor, CursorMovement, ListenerId, Rope, TextBuffer};
pub use config::{BufferConfig, RebalancePolicy};
pub use error::{ConfigError, Result, RopebufError};
pub use history::{ChangeKind, ChangeRecord};

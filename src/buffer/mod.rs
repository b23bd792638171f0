//! テキストバッファ
//!
//! ロープ構造の文書モデルと、その上に載る編集・位置変換・変更通知

pub mod change_notifier;
pub mod cursor;
pub mod editor;
pub mod index;
pub mod rope;

pub use change_notifier::{ChangeEvent, ChangeListener, ChangeNotifier, ListenerId};
pub use cursor::{Cursor, CursorMovement};
pub use editor::TextBuffer;
pub use rope::{Chunk, Chunks, Rope};

//! 変更通知システム
//!
//! バッファの変更をリスナーへ同期的に配信する。
//! 一回の変更操作の中では `ContentChanged` が必ず `CursorMoved` より先に届く。
//! `CursorMoved` はカーソル位置が実際に変わった場合のみ配信される。

use crate::buffer::cursor::Cursor;
use std::fmt;

/// リスナーの一意識別子
pub type ListenerId = usize;

/// 変更イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// テキストが変化した（`offset` から `removed` 文字が `inserted` 文字に置き換わった）
    ContentChanged {
        offset: usize,
        removed: usize,
        inserted: usize,
    },
    /// カーソルが移動した
    CursorMoved {
        old_position: Cursor,
        new_position: Cursor,
    },
}

/// 変更通知リスナー
pub trait ChangeListener {
    fn on_change(&mut self, event: &ChangeEvent);
}

impl<F> ChangeListener for F
where
    F: FnMut(&ChangeEvent),
{
    fn on_change(&mut self, event: &ChangeEvent) {
        self(event)
    }
}

/// 変更通知の配信先を管理する
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Vec<(ListenerId, Box<dyn ChangeListener>)>,
    next_listener_id: ListenerId,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// リスナーを追加
    pub fn add_listener(&mut self, listener: Box<dyn ChangeListener>) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// リスナーを削除
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// 変更を登録順に通知
    pub fn notify(&mut self, event: ChangeEvent) {
        for (_, listener) in &mut self.listeners {
            listener.on_change(&event);
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.len())
            .field("next_listener_id", &self.next_listener_id)
            .finish()
    }
}

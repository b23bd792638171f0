//! 編集履歴（アンドゥ/リドゥ）
//!
//! 挿入・削除ごとに可逆な変更記録を積む。再生中は記録を一時停止し、
//! アンドゥ/リドゥ自身が履歴に積まれないようにする。

use crate::buffer::{Cursor, TextBuffer};
use std::collections::VecDeque;

/// 変更の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Delete,
}

/// 一回の編集を正確に取り消し・やり直すための記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    /// 挿入位置、または削除範囲の先頭
    pub offset: usize,
    /// 挿入した、または削除したテキスト
    pub text: String,
    pub cursor_before: Cursor,
    pub cursor_after: Cursor,
    pub offset_before: usize,
    pub offset_after: usize,
}

impl ChangeRecord {
    /// 記録したテキストの文字数
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// 編集履歴スタック
#[derive(Debug, Clone, Default)]
pub struct HistoryStack {
    undo: VecDeque<ChangeRecord>,
    redo: Vec<ChangeRecord>,
    limit: Option<usize>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// 上限付きの履歴スタック
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// 新しい編集を積む（リドゥ履歴は破棄される）
    pub fn push(&mut self, record: ChangeRecord) {
        self.push_without_clearing(record);
        self.redo.clear();
    }

    pub fn take_for_undo(&mut self) -> Option<ChangeRecord> {
        self.undo.pop_back()
    }

    pub fn push_redo(&mut self, record: ChangeRecord) {
        self.redo.push(record);
    }

    pub fn take_for_redo(&mut self) -> Option<ChangeRecord> {
        self.redo.pop()
    }

    pub fn push_without_clearing(&mut self, record: ChangeRecord) {
        self.undo.push_back(record);
        if let Some(limit) = self.limit {
            while self.undo.len() > limit {
                self.undo.pop_front();
            }
        }
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

/// 履歴記録器（一時停止フラグ付きの履歴スタック）
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    stack: HistoryStack,
    paused: bool,
}

impl ChangeLog {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            stack: HistoryStack::with_limit(limit),
            paused: false,
        }
    }

    pub fn stack(&self) -> &HistoryStack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut HistoryStack {
        &mut self.stack
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn suspend(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// 編集を記録（一時停止中は何もしない）
    pub fn record(&mut self, record: ChangeRecord) {
        if self.paused {
            return;
        }
        self.stack.push(record);
    }
}

/// 記録の逆操作を再生し、編集前のカーソルに戻す
pub(crate) fn apply_undo(buffer: &mut TextBuffer, record: &ChangeRecord) {
    match record.kind {
        ChangeKind::Insert => {
            buffer.remove_range(record.offset, record.offset + record.char_len());
        }
        ChangeKind::Delete => {
            buffer.insert_at_offset(record.offset, &record.text);
        }
    }
    buffer.restore_cursor(record.cursor_before);
}

/// 記録した操作そのものを再生し、編集後のカーソルに戻す
pub(crate) fn apply_redo(buffer: &mut TextBuffer, record: &ChangeRecord) {
    match record.kind {
        ChangeKind::Insert => {
            buffer.insert_at_offset(record.offset, &record.text);
        }
        ChangeKind::Delete => {
            buffer.remove_range(record.offset, record.offset + record.char_len());
        }
    }
    buffer.restore_cursor(record.cursor_after);
}

//! テキストバッファ
//!
//! 編集操作のメインインターフェース。ロープ操作と位置変換を組み合わせ、
//! 変更ごとに履歴を記録して通知を配信する。

use crate::buffer::change_notifier::{ChangeEvent, ChangeListener, ChangeNotifier, ListenerId};
use crate::buffer::cursor::{Cursor, CursorMovement, CursorMover};
use crate::buffer::rope::{self, Rope, RopeNode, Subtree};
use crate::config::BufferConfig;
use crate::error::Result;
use crate::history::{self, ChangeKind, ChangeLog, ChangeRecord};
use std::time::Instant;

/// テキストバッファのメイン構造体
///
/// 範囲外の位置指定はすべて有効な位置にクランプされ、エラーにはならない。
/// 内部で `Rc` を使うためスレッド間では共有できない。
#[derive(Debug)]
pub struct TextBuffer {
    /// 現在のロープ（編集ごとに差し替わる）
    rope: Rope,
    /// カーソル位置
    cursor: Cursor,
    /// 縦移動で目標とする列
    last_column: usize,
    /// 編集履歴
    history: ChangeLog,
    /// 変更通知システム
    notifier: ChangeNotifier,
    config: BufferConfig,
    /// 最後の操作時刻（パフォーマンス監視用）
    last_operation_time: Instant,
}

impl TextBuffer {
    /// 既定の設定でバッファを作成
    pub fn new(initial: &str) -> Self {
        Self::build(initial, BufferConfig::default())
    }

    /// 設定を指定してバッファを作成
    pub fn with_config(initial: &str, config: BufferConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(initial, config))
    }

    fn build(initial: &str, config: BufferConfig) -> Self {
        Self {
            rope: Rope::from_text(initial, config.max_chunk_size),
            cursor: Cursor::origin(),
            last_column: 0,
            history: ChangeLog::new(config.history_limit),
            notifier: ChangeNotifier::new(),
            config,
            last_operation_time: Instant::now(),
        }
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// 文書の文字数
    pub fn len(&self) -> usize {
        self.rope.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.rope.line_count()
    }

    /// 行の文字数（改行を含まない、行番号はクランプされる）
    pub fn line_len(&self, line: usize) -> usize {
        self.rope.line_len(line)
    }

    /// 現在のテキストのスナップショット
    pub fn snapshot(&self) -> Rope {
        self.rope.clone()
    }

    /// カーソル位置を取得
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// カーソル位置のオフセット
    pub fn cursor_offset(&self) -> usize {
        self.rope.cursor_to_offset(self.cursor)
    }

    pub fn cursor_to_offset(&self, cursor: Cursor) -> usize {
        self.rope.cursor_to_offset(cursor)
    }

    pub fn offset_to_cursor(&self, offset: usize) -> Cursor {
        self.rope.offset_to_cursor(offset)
    }

    /// 変更リスナーを追加
    pub fn add_listener<L>(&mut self, listener: L) -> ListenerId
    where
        L: ChangeListener + 'static,
    {
        self.notifier.add_listener(Box::new(listener))
    }

    /// 変更リスナーを削除
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.notifier.remove_listener(id)
    }

    // ---- 読み取り ----

    /// 指定位置の文字（行末・範囲外は `None`）
    pub fn get_char(&self, line: usize, column: usize) -> Option<char> {
        if line >= self.line_count() || column >= self.rope.line_len(line) {
            return None;
        }
        self.rope.char_at(self.rope.line_to_offset(line) + column)
    }

    /// 指定行のテキスト（改行を含まない、範囲外は `None`）
    pub fn get_line(&self, line: usize) -> Option<String> {
        if line >= self.line_count() {
            return None;
        }
        Some(
            self.rope
                .slice(self.rope.line_to_offset(line), self.rope.line_end_offset(line)),
        )
    }

    /// 全テキスト
    pub fn get_all(&self) -> String {
        self.rope.to_string()
    }

    /// 二つのカーソル位置の間のテキスト（逆順・空範囲は空文字列）
    pub fn get_text_in_range(&self, start: Cursor, end: Cursor) -> String {
        let start = self.rope.cursor_to_offset(start);
        let end = self.rope.cursor_to_offset(end);
        self.rope.slice(start, end)
    }

    /// 葉ごとにテキストと範囲をコールバックへ渡す（連結しない）
    pub fn for_each_chunk<F>(&self, callback: F)
    where
        F: FnMut(&str, usize, usize),
    {
        self.rope.for_each_chunk(callback)
    }

    /// 葉を順に返すイテレータ
    pub fn chunks(&self) -> rope::Chunks<'_> {
        self.rope.chunks()
    }

    // ---- 編集 ----

    /// 指定位置に文字列を挿入し、カーソルを挿入文字列の末尾に置く
    pub fn insert(&mut self, line: usize, column: usize, text: &str) {
        let offset = self.rope.cursor_to_offset(Cursor::new(line, column));
        self.insert_at_offset(offset, text);
    }

    /// 指定位置から後方へ `count` 文字削除し、削除したテキストを返す
    ///
    /// 文書先頭を越える分は黙って切り詰められる。
    pub fn delete(&mut self, line: usize, column: usize, count: usize) -> String {
        let end = self.rope.cursor_to_offset(Cursor::new(line, column));
        let start = end.saturating_sub(count);
        if count == 0 || start == end {
            return String::new();
        }
        self.remove_range(start, end)
    }

    /// カーソル位置に文字を挿入
    pub fn insert_char(&mut self, ch: char) {
        let mut buf = [0; 4];
        let offset = self.cursor_offset();
        self.insert_at_offset(offset, ch.encode_utf8(&mut buf));
    }

    /// Backspace削除（カーソル前の一文字）
    pub fn delete_char(&mut self) -> Option<char> {
        let end = self.cursor_offset();
        if end == 0 {
            return None;
        }
        self.remove_range(end - 1, end).chars().next()
    }

    /// Delete削除（カーソル後の一文字、カーソルは動かない）
    pub fn delete_char_forward(&mut self) -> Option<char> {
        let start = self.cursor_offset();
        if start >= self.len() {
            return None;
        }
        self.remove_range(start, start + 1).chars().next()
    }

    /// 全テキストを置き換える（カーソルは原点、履歴は破棄）
    pub fn set_all(&mut self, content: &str) {
        let removed = self.len();
        self.rope = Rope::from_text(content, self.config.max_chunk_size);
        self.history.stack_mut().clear();

        let old_position = self.cursor;
        self.cursor = Cursor::origin();
        self.last_column = 0;
        log::debug!("buffer replaced: {} -> {} chars", removed, self.len());

        let inserted = self.len();
        if removed > 0 || inserted > 0 {
            self.notifier.notify(ChangeEvent::ContentChanged {
                offset: 0,
                removed,
                inserted,
            });
        }
        self.notify_cursor_moved(old_position);
    }

    // ---- カーソル移動 ----

    /// カーソル位置を設定（範囲外はクランプ）
    pub fn set_cursor(&mut self, position: Cursor) {
        let position = self.rope.clamp_cursor(position);
        self.move_cursor_to(position);
    }

    /// カーソルを移動し、動いたかどうかを返す
    pub fn move_cursor(&mut self, movement: CursorMovement) -> bool {
        let Some(target) = CursorMover::target(&self.rope, self.cursor, self.last_column, movement)
        else {
            return false;
        };

        match movement {
            CursorMovement::Up | CursorMovement::Down => {
                // 縦移動ではクランプ後の列で記憶を上書きしない
                let old_position = self.cursor;
                self.cursor = target;
                self.notify_cursor_moved(old_position);
            }
            CursorMovement::Left | CursorMovement::Right => self.move_cursor_to(target),
        }
        true
    }

    pub fn move_cursor_left(&mut self) -> bool {
        self.move_cursor(CursorMovement::Left)
    }

    pub fn move_cursor_right(&mut self) -> bool {
        self.move_cursor(CursorMovement::Right)
    }

    pub fn move_cursor_up(&mut self) -> bool {
        self.move_cursor(CursorMovement::Up)
    }

    pub fn move_cursor_down(&mut self) -> bool {
        self.move_cursor(CursorMovement::Down)
    }

    // ---- 履歴 ----

    pub fn can_undo(&self) -> bool {
        self.history.stack().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.stack().can_redo()
    }

    /// 直前の編集を取り消す（履歴が空なら何もせず `false`）
    pub fn undo(&mut self) -> bool {
        let Some(record) = self.history.stack_mut().take_for_undo() else {
            return false;
        };
        log::trace!("undo {:?} at offset {}", record.kind, record.offset);

        self.history.suspend(true);
        history::apply_undo(self, &record);
        self.history.suspend(false);

        self.history.stack_mut().push_redo(record);
        true
    }

    /// 取り消した編集をやり直す（履歴が空なら何もせず `false`）
    pub fn redo(&mut self) -> bool {
        let Some(record) = self.history.stack_mut().take_for_redo() else {
            return false;
        };
        log::trace!("redo {:?} at offset {}", record.kind, record.offset);

        self.history.suspend(true);
        history::apply_redo(self, &record);
        self.history.suspend(false);

        self.history.stack_mut().push_without_clearing(record);
        true
    }

    /// 履歴を破棄
    pub fn clear_history(&mut self) {
        self.history.stack_mut().clear();
    }

    // ---- 内部操作 ----

    /// オフセット位置に挿入（空文字列は何もしない）
    pub(crate) fn insert_at_offset(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        self.start_performance_measurement();

        let offset = offset.min(self.len());
        let cursor_before = self.cursor;
        let offset_before = self.cursor_offset();

        let (left, right) = rope::split(self.rope.root(), offset);
        let middle = rope::from_text(text, self.config.max_chunk_size);
        let inserted = middle.len();
        self.replace_root(rope::concat(rope::concat(left, Some(middle)), right));

        let offset_after = offset + inserted;
        self.cursor = self.rope.offset_to_cursor(offset_after);
        self.last_column = self.cursor.column;
        log::trace!("insert {} chars at offset {}", inserted, offset);

        self.history.record(ChangeRecord {
            kind: ChangeKind::Insert,
            offset,
            text: text.to_string(),
            cursor_before,
            cursor_after: self.cursor,
            offset_before,
            offset_after,
        });

        self.notifier.notify(ChangeEvent::ContentChanged {
            offset,
            removed: 0,
            inserted,
        });
        self.notify_cursor_moved(cursor_before);

        self.end_performance_measurement("insert");
    }

    /// `[start, end)` を削除して削除したテキストを返す（空範囲は何もしない）
    pub(crate) fn remove_range(&mut self, start: usize, end: usize) -> String {
        let end = end.min(self.len());
        if start >= end {
            return String::new();
        }
        self.start_performance_measurement();

        let cursor_before = self.cursor;
        let offset_before = self.cursor_offset();
        let removed = self.rope.slice(start, end);

        let (left, rest) = rope::split(self.rope.root(), start);
        let right = rest.and_then(|rest| rope::split(&rest, end - start).1);
        self.replace_root(rope::concat(left, right));

        self.cursor = self.rope.offset_to_cursor(start);
        self.last_column = self.cursor.column;
        log::trace!("delete {} chars at offset {}", end - start, start);

        self.history.record(ChangeRecord {
            kind: ChangeKind::Delete,
            offset: start,
            text: removed.clone(),
            cursor_before,
            cursor_after: self.cursor,
            offset_before,
            offset_after: start,
        });

        self.notifier.notify(ChangeEvent::ContentChanged {
            offset: start,
            removed: end - start,
            inserted: 0,
        });
        self.notify_cursor_moved(cursor_before);

        self.end_performance_measurement("delete");
        removed
    }

    /// 履歴再生後のカーソル復元
    pub(crate) fn restore_cursor(&mut self, position: Cursor) {
        self.set_cursor(position);
    }

    /// 新しいルートに差し替え、方針に従って再バランスする
    fn replace_root(&mut self, root: Subtree) {
        let root = root.unwrap_or_else(RopeNode::empty);
        let root = if self.config.rebalance.should_rebalance(root.depth()) {
            rope::rebalance(&root, self.config.max_chunk_size)
        } else {
            root
        };
        self.rope = Rope::from_root(root);
    }

    /// カーソルを移動して列の記憶を更新
    fn move_cursor_to(&mut self, position: Cursor) {
        let old_position = self.cursor;
        self.cursor = position;
        self.last_column = position.column;
        self.notify_cursor_moved(old_position);
    }

    /// カーソルが実際に動いた場合のみ通知
    fn notify_cursor_moved(&mut self, old_position: Cursor) {
        if old_position != self.cursor {
            self.notifier.notify(ChangeEvent::CursorMoved {
                old_position,
                new_position: self.cursor,
            });
        }
    }

    /// パフォーマンス計測開始
    fn start_performance_measurement(&mut self) {
        self.last_operation_time = Instant::now();
    }

    /// パフォーマンス計測終了とログ
    fn end_performance_measurement(&self, operation_name: &str) {
        let duration = self.last_operation_time.elapsed();
        if duration > self.config.slow_edit_threshold() {
            log::warn!(
                "{} took {}us (threshold: {}ms, {} leaves)",
                operation_name,
                duration.as_micros(),
                self.config.slow_edit_threshold_ms,
                self.rope.leaf_count()
            );
        }
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new("")
    }
}

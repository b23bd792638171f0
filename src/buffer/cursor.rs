//! カーソル位置管理
//!
//! テキストバッファ内でのカーソル位置と、縦移動時の列記憶（スティッキー列）を扱う

use crate::buffer::rope::Rope;

/// カーソル位置を表現する構造体
///
/// 行・列ともに 0 ベースの文字単位。バッファに保持される値は常に
/// `line < line_count` かつ `column <= line_len(line)` に収まる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Cursor {
    /// 行番号
    pub line: usize,
    /// 行内の文字位置
    pub column: usize,
}

impl Cursor {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// 原点
    pub fn origin() -> Self {
        Self::default()
    }
}

impl From<(usize, usize)> for Cursor {
    fn from((line, column): (usize, usize)) -> Self {
        Self::new(line, column)
    }
}

/// カーソル操作の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMovement {
    Left,
    Right,
    Up,
    Down,
}

/// カーソル移動の計算
pub struct CursorMover;

impl CursorMover {
    /// 移動先のカーソル位置を計算する
    ///
    /// `last_column` は縦移動で目標とする列。移動できない場合は `None`。
    pub fn target(
        rope: &Rope,
        cursor: Cursor,
        last_column: usize,
        movement: CursorMovement,
    ) -> Option<Cursor> {
        let target = match movement {
            CursorMovement::Left => Self::move_left(rope, cursor),
            CursorMovement::Right => Self::move_right(rope, cursor),
            CursorMovement::Up => Self::move_up(rope, cursor, last_column),
            CursorMovement::Down => Self::move_down(rope, cursor, last_column),
        }?;

        (target != cursor).then_some(target)
    }

    fn move_left(rope: &Rope, cursor: Cursor) -> Option<Cursor> {
        let offset = rope.cursor_to_offset(cursor);
        let target = offset.checked_sub(1)?;
        Some(rope.offset_to_cursor(target))
    }

    fn move_right(rope: &Rope, cursor: Cursor) -> Option<Cursor> {
        let offset = rope.cursor_to_offset(cursor);
        if offset >= rope.len() {
            return None;
        }
        Some(rope.offset_to_cursor(offset + 1))
    }

    fn move_up(rope: &Rope, cursor: Cursor, last_column: usize) -> Option<Cursor> {
        let target_line = cursor.line.checked_sub(1)?;
        Some(Self::vertical_target(rope, target_line, last_column))
    }

    fn move_down(rope: &Rope, cursor: Cursor, last_column: usize) -> Option<Cursor> {
        let target_line = cursor.line + 1;
        if target_line >= rope.line_count() {
            return None;
        }
        Some(Self::vertical_target(rope, target_line, last_column))
    }

    /// 記憶している列を目標行の長さでクランプする
    fn vertical_target(rope: &Rope, line: usize, last_column: usize) -> Cursor {
        Cursor::new(line, last_column.min(rope.line_len(line)))
    }
}

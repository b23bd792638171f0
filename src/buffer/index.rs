//! オフセットと (行, 列) の相互変換
//!
//! いずれもロープを読むだけで変更しない。各ノードの行数キャッシュを使って
//! ルートから一度降りるだけで位置を求めるため、計算量は木の深さに比例する。

use crate::buffer::cursor::Cursor;
use crate::buffer::rope::{Rope, RopeNode};

/// 行の先頭オフセット
///
/// 行 0 は常に 0。行番号は最終行にクランプされる。
pub fn line_to_offset(root: &RopeNode, line: usize) -> usize {
    let line = line.min(root.line_count() - 1);
    if line == 0 {
        return 0;
    }

    // (line - 1) 番目の改行の直後が行頭
    let mut remaining = line - 1;
    let mut base = 0;
    let mut node = root;

    loop {
        match node {
            RopeNode::Internal(inner) => {
                let left = inner.left();
                let left_newlines = left.newline_count();
                if remaining < left_newlines {
                    node = left;
                } else {
                    remaining -= left_newlines;
                    base += left.len();
                    node = inner.right();
                }
            }
            RopeNode::Leaf(leaf) => {
                return base + leaf.newline_offsets()[remaining] + 1;
            }
        }
    }
}

/// 行末のオフセット（最終行なら文書長、それ以外は終端の改行位置）
pub fn line_end_offset(root: &RopeNode, line: usize) -> usize {
    let line = line.min(root.line_count() - 1);
    if line + 1 >= root.line_count() {
        root.len()
    } else {
        line_to_offset(root, line + 1) - 1
    }
}

/// 改行を含まない行の文字数
pub fn line_len(root: &RopeNode, line: usize) -> usize {
    line_end_offset(root, line) - line_to_offset(root, line)
}

/// カーソル位置をオフセットに変換（行・列はクランプされる）
pub fn cursor_to_offset(root: &RopeNode, cursor: Cursor) -> usize {
    let start = line_to_offset(root, cursor.line);
    let len = line_len(root, cursor.line);
    start + cursor.column.min(len)
}

/// オフセットをカーソル位置に変換（文書長を超えるオフセットは末尾になる）
pub fn offset_to_cursor(root: &RopeNode, offset: usize) -> Cursor {
    let offset = offset.min(root.len());
    let mut line = 0;
    let mut base = 0;
    let mut node = root;

    loop {
        match node {
            RopeNode::Internal(inner) => {
                let left = inner.left();
                if offset - base < left.len() {
                    node = left;
                } else {
                    line += left.newline_count();
                    base += left.len();
                    node = inner.right();
                }
            }
            RopeNode::Leaf(leaf) => {
                let local = offset - base;
                let newlines = leaf.newline_offsets();
                let before = newlines.partition_point(|&pos| pos < local);
                line += before;

                let column = if before > 0 {
                    local - newlines[before - 1] - 1
                } else {
                    // 行頭はこの葉より前にある
                    offset - line_to_offset(root, line)
                };
                return Cursor::new(line, column);
            }
        }
    }
}

/// カーソル位置を有効範囲にクランプ
pub fn clamp_cursor(root: &RopeNode, cursor: Cursor) -> Cursor {
    let line = cursor.line.min(root.line_count() - 1);
    Cursor::new(line, cursor.column.min(line_len(root, line)))
}

/// オフセット位置の文字
pub fn char_at(root: &RopeNode, offset: usize) -> Option<char> {
    if offset >= root.len() {
        return None;
    }

    let mut base = 0;
    let mut node = root;
    loop {
        match node {
            RopeNode::Internal(inner) => {
                let left = inner.left();
                if offset - base < left.len() {
                    node = left;
                } else {
                    base += left.len();
                    node = inner.right();
                }
            }
            RopeNode::Leaf(leaf) => return leaf.char_at(offset - base),
        }
    }
}

/// `[start, end)` のテキストを、範囲に重なる葉だけから集める
pub fn slice(root: &RopeNode, start: usize, end: usize) -> String {
    let end = end.min(root.len());
    if start >= end {
        return String::new();
    }

    let mut out = String::new();
    collect_range(root, start, end, &mut out);
    out
}

fn collect_range(node: &RopeNode, start: usize, end: usize, out: &mut String) {
    match node {
        RopeNode::Leaf(leaf) => out.push_str(leaf.slice(start, end)),
        RopeNode::Internal(inner) => {
            let left_len = inner.left().len();
            if start < left_len {
                collect_range(inner.left(), start, end.min(left_len), out);
            }
            if end > left_len {
                collect_range(inner.right(), start.saturating_sub(left_len), end - left_len, out);
            }
        }
    }
}

impl Rope {
    pub fn line_to_offset(&self, line: usize) -> usize {
        line_to_offset(self.root(), line)
    }

    pub fn line_end_offset(&self, line: usize) -> usize {
        line_end_offset(self.root(), line)
    }

    pub fn line_len(&self, line: usize) -> usize {
        line_len(self.root(), line)
    }

    pub fn cursor_to_offset(&self, cursor: Cursor) -> usize {
        cursor_to_offset(self.root(), cursor)
    }

    pub fn offset_to_cursor(&self, offset: usize) -> Cursor {
        offset_to_cursor(self.root(), offset)
    }

    pub fn clamp_cursor(&self, cursor: Cursor) -> Cursor {
        clamp_cursor(self.root(), cursor)
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        char_at(self.root(), offset)
    }

    pub fn slice(&self, start: usize, end: usize) -> String {
        slice(self.root(), start, end)
    }
}

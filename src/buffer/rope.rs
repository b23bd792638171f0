//! ロープ木
//!
//! テキストを葉（連続したチャンク）と内部ノードの二分木として保持する。
//! ノードは構築後に変更されない。編集は常に新しい木を作り、
//! 古い木を参照しているスナップショットはそのまま有効に残る。
//!
//! 長さ・オフセットはすべて `char` 単位で数える。

use std::fmt;
use std::rc::Rc;

/// 空（None）を許す部分木
pub type Subtree = Option<Rc<RopeNode>>;

/// 葉ノード：連続したテキストと改行位置のキャッシュ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    text: String,
    len: usize,
    /// 葉先頭からの `\n` の位置（昇順、文字単位）
    newline_offsets: Vec<usize>,
}

impl Leaf {
    pub fn new(text: String) -> Self {
        let mut len = 0;
        let mut newline_offsets = Vec::new();
        for ch in text.chars() {
            if ch == '\n' {
                newline_offsets.push(len);
            }
            len += 1;
        }

        Self {
            text,
            len,
            newline_offsets,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn line_count(&self) -> usize {
        self.newline_offsets.len() + 1
    }

    pub fn newline_offsets(&self) -> &[usize] {
        &self.newline_offsets
    }

    /// 文字位置をバイト位置に変換
    fn byte_index(&self, char_offset: usize) -> usize {
        if char_offset >= self.len {
            return self.text.len();
        }
        self.text
            .char_indices()
            .nth(char_offset)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }

    /// `[start, end)` の部分文字列（文字単位、範囲はクランプされる）
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.len);
        let start = start.min(end);
        &self.text[self.byte_index(start)..self.byte_index(end)]
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.text[self.byte_index(offset)..].chars().next()
    }
}

/// 内部ノード：左右の子と集計値
#[derive(Debug, Clone)]
pub struct Internal {
    left: Rc<RopeNode>,
    right: Rc<RopeNode>,
    len: usize,
    line_count: usize,
    depth: usize,
}

impl Internal {
    pub fn left(&self) -> &Rc<RopeNode> {
        &self.left
    }

    pub fn right(&self) -> &Rc<RopeNode> {
        &self.right
    }
}

/// ロープのノード
#[derive(Debug, Clone)]
pub enum RopeNode {
    Leaf(Leaf),
    Internal(Internal),
}

impl RopeNode {
    /// 葉ノードを作成
    pub fn leaf(text: impl Into<String>) -> Rc<RopeNode> {
        Rc::new(RopeNode::Leaf(Leaf::new(text.into())))
    }

    /// 空の葉ノードを作成
    pub fn empty() -> Rc<RopeNode> {
        Self::leaf(String::new())
    }

    /// 内部ノードを作成（長さ・行数は子から集計）
    pub fn internal(left: Rc<RopeNode>, right: Rc<RopeNode>) -> Rc<RopeNode> {
        let len = left.len() + right.len();
        // 各子の行数は 1 以上なので減算はアンダーフローしない
        let line_count = left.line_count() + right.line_count() - 1;
        let depth = left.depth().max(right.depth()) + 1;

        Rc::new(RopeNode::Internal(Internal {
            left,
            right,
            len,
            line_count,
            depth,
        }))
    }

    pub fn len(&self) -> usize {
        match self {
            RopeNode::Leaf(leaf) => leaf.len,
            RopeNode::Internal(node) => node.len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn line_count(&self) -> usize {
        match self {
            RopeNode::Leaf(leaf) => leaf.line_count(),
            RopeNode::Internal(node) => node.line_count,
        }
    }

    /// 部分木に含まれる `\n` の数
    pub fn newline_count(&self) -> usize {
        self.line_count() - 1
    }

    /// 葉を 0 とする木の高さ
    pub fn depth(&self) -> usize {
        match self {
            RopeNode::Leaf(_) => 0,
            RopeNode::Internal(node) => node.depth,
        }
    }
}

/// テキストから木を構築
///
/// `max_chunk` 文字以下なら単一の葉、それ以上なら `max_chunk` 文字ごとに
/// 切り分けた葉から平衡木をボトムアップに組み立てる。
pub fn from_text(text: &str, max_chunk: usize) -> Rc<RopeNode> {
    let leaves: Vec<Rc<RopeNode>> = chunk_text(text, max_chunk)
        .into_iter()
        .map(RopeNode::leaf)
        .collect();
    build_balanced(&leaves)
}

/// テキストを `max_chunk` 文字ごとの断片に分割
fn chunk_text(text: &str, max_chunk: usize) -> Vec<String> {
    let max_chunk = max_chunk.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == max_chunk {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// 葉の並びを中点で再帰的に分割して平衡木を作る
fn build_balanced(leaves: &[Rc<RopeNode>]) -> Rc<RopeNode> {
    match leaves.len() {
        0 => RopeNode::empty(),
        1 => Rc::clone(&leaves[0]),
        n => {
            let mid = n / 2;
            let left = build_balanced(&leaves[..mid]);
            let right = build_balanced(&leaves[mid..]);
            RopeNode::internal(left, right)
        }
    }
}

/// `offset` で木を二分する
///
/// 返る二つの部分木を連結すると元の木と同じテキストになる。
pub fn split(node: &Rc<RopeNode>, offset: usize) -> (Subtree, Subtree) {
    if offset == 0 {
        return (None, Some(Rc::clone(node)));
    }
    if offset >= node.len() {
        return (Some(Rc::clone(node)), None);
    }

    match node.as_ref() {
        RopeNode::Leaf(leaf) => (
            Some(RopeNode::leaf(leaf.slice(0, offset))),
            Some(RopeNode::leaf(leaf.slice(offset, leaf.len))),
        ),
        RopeNode::Internal(inner) => {
            let left_len = inner.left.len();
            if offset < left_len {
                let (ll, lr) = split(&inner.left, offset);
                (ll, concat(lr, Some(Rc::clone(&inner.right))))
            } else if offset == left_len {
                (Some(Rc::clone(&inner.left)), Some(Rc::clone(&inner.right)))
            } else {
                let (rl, rr) = split(&inner.right, offset - left_len);
                (concat(Some(Rc::clone(&inner.left)), rl), rr)
            }
        }
    }
}

/// 二つの部分木を連結（どちらかが空ならもう一方をそのまま返す）
///
/// 小さな葉同士を即座に結合することはしない。
pub fn concat(left: Subtree, right: Subtree) -> Subtree {
    let left = left.filter(|node| !node.is_empty());
    let right = right.filter(|node| !node.is_empty());

    match (left, right) {
        (None, right) => right,
        (left, None) => left,
        (Some(left), Some(right)) => Some(RopeNode::internal(left, right)),
    }
}

/// 葉から平衡木を再構築
///
/// 空でない葉を左から順に集め、`2 * max_chunk` を超えた葉は切り直し、
/// 隣接する小さな葉は `max_chunk` に収まる範囲で結合してから組み立てる。
pub fn rebalance(node: &Rc<RopeNode>, max_chunk: usize) -> Rc<RopeNode> {
    let mut collector = LeafCollector::new(max_chunk);
    let mut stack: Vec<&Rc<RopeNode>> = vec![node];

    while let Some(current) = stack.pop() {
        match current.as_ref() {
            RopeNode::Internal(inner) => {
                stack.push(&inner.right);
                stack.push(&inner.left);
            }
            RopeNode::Leaf(leaf) => collector.push(current, leaf),
        }
    }

    build_balanced(&collector.leaves)
}

/// 再バランス用の葉収集器
struct LeafCollector {
    max_chunk: usize,
    leaves: Vec<Rc<RopeNode>>,
}

impl LeafCollector {
    fn new(max_chunk: usize) -> Self {
        Self {
            max_chunk: max_chunk.max(1),
            leaves: Vec::new(),
        }
    }

    fn push(&mut self, node: &Rc<RopeNode>, leaf: &Leaf) {
        if leaf.is_empty() {
            return;
        }

        if leaf.len > self.max_chunk * 2 {
            for piece in chunk_text(&leaf.text, self.max_chunk) {
                let piece = RopeNode::leaf(piece);
                if let RopeNode::Leaf(inner) = piece.as_ref() {
                    self.push(&piece, inner);
                }
            }
            return;
        }

        if let Some(last) = self.leaves.last_mut() {
            if let RopeNode::Leaf(prev) = last.as_ref() {
                if prev.len + leaf.len <= self.max_chunk {
                    let mut merged = String::with_capacity(prev.text.len() + leaf.text.len());
                    merged.push_str(&prev.text);
                    merged.push_str(&leaf.text);
                    *last = RopeNode::leaf(merged);
                    return;
                }
            }
        }

        self.leaves.push(Rc::clone(node));
    }
}

/// 不変なロープ
///
/// 複製は O(1) で、複製した時点のテキストを表すスナップショットになる。
#[derive(Debug, Clone)]
pub struct Rope {
    root: Rc<RopeNode>,
}

impl Rope {
    /// 空のロープを作成
    pub fn new() -> Self {
        Self {
            root: RopeNode::empty(),
        }
    }

    /// テキストからロープを作成
    pub fn from_text(text: &str, max_chunk: usize) -> Self {
        Self {
            root: from_text(text, max_chunk),
        }
    }

    /// ルートノードからロープを作成
    pub fn from_root(root: Rc<RopeNode>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Rc<RopeNode> {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.root.line_count()
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// 空でない葉の数
    pub fn leaf_count(&self) -> usize {
        self.chunks().count()
    }

    /// 同じ木を共有しているか
    pub fn ptr_eq(&self, other: &Rope) -> bool {
        Rc::ptr_eq(&self.root, &other.root)
    }

    /// 葉を左から順に返すイテレータ
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks {
            stack: vec![self.root.as_ref()],
            offset: 0,
        }
    }

    /// 葉ごとにコールバックを呼ぶ（連結はしない）
    pub fn for_each_chunk<F>(&self, mut callback: F)
    where
        F: FnMut(&str, usize, usize),
    {
        for chunk in self.chunks() {
            callback(chunk.text, chunk.start, chunk.end);
        }
    }

    /// 全ノードの集計値を検証
    ///
    /// 不一致は構築時の欠陥なので panic する。
    pub fn assert_invariants(&self) {
        fn walk(node: &RopeNode) -> (usize, usize, usize) {
            match node {
                RopeNode::Leaf(leaf) => {
                    let len = leaf.text.chars().count();
                    let newlines: Vec<usize> = leaf
                        .text
                        .chars()
                        .enumerate()
                        .filter(|(_, ch)| *ch == '\n')
                        .map(|(idx, _)| idx)
                        .collect();
                    assert_eq!(leaf.len, len, "leaf length out of sync with text");
                    assert_eq!(
                        leaf.newline_offsets, newlines,
                        "leaf newline offsets out of sync with text"
                    );
                    (len, newlines.len() + 1, 0)
                }
                RopeNode::Internal(inner) => {
                    let (left_len, left_lines, left_depth) = walk(&inner.left);
                    let (right_len, right_lines, right_depth) = walk(&inner.right);
                    assert_eq!(inner.len, left_len + right_len, "internal length mismatch");
                    assert_eq!(
                        inner.line_count,
                        left_lines + right_lines - 1,
                        "internal line count mismatch"
                    );
                    assert_eq!(
                        inner.depth,
                        left_depth.max(right_depth) + 1,
                        "internal depth mismatch"
                    );
                    (inner.len, inner.line_count, inner.depth)
                }
            }
        }

        walk(&self.root);
    }
}

impl Default for Rope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.chunks() {
            f.write_str(chunk.text)?;
        }
        Ok(())
    }
}

/// 葉一つ分のテキストと文書内の位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// 明示的なスタックで葉を左から辿るイテレータ
pub struct Chunks<'a> {
    stack: Vec<&'a RopeNode>,
    offset: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                RopeNode::Internal(inner) => {
                    self.stack.push(inner.right.as_ref());
                    self.stack.push(inner.left.as_ref());
                }
                RopeNode::Leaf(leaf) => {
                    if leaf.is_empty() {
                        continue;
                    }
                    let start = self.offset;
                    self.offset += leaf.len;
                    return Some(Chunk {
                        text: &leaf.text,
                        start,
                        end: self.offset,
                    });
                }
            }
        }
        None
    }
}

//! TextBuffer public API property tests
//!
//! Every edit is mirrored on a plain `String` model; small chunk sizes force
//! deep trees so splits and rebalances happen on nearly every operation.

use proptest::test_runner::Config as ProptestConfig;
use proptest::{prelude::*, prop_oneof};
use ropebuf::{BufferConfig, Cursor, RebalancePolicy, TextBuffer};

#[derive(Debug, Clone)]
enum Operation {
    Insert { pos: usize, text: String },
    Delete { pos: usize, count: usize },
    InsertChar { ch: char },
    DeleteChar,
    Move { pos: usize },
}

fn text_char() -> impl Strategy<Value = char> {
    prop_oneof![
        6 => proptest::char::range('a', 'z'),
        2 => Just('\n'),
        1 => any::<char>(),
    ]
}

fn small_text(max: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(text_char(), 0..max)
        .prop_map(|chars| chars.into_iter().collect::<String>())
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    let insert = (0u16..256u16, small_text(6))
        .prop_map(|(pos, text)| Operation::Insert { pos: pos as usize, text });
    let delete = (0u16..256u16, 0usize..8)
        .prop_map(|(pos, count)| Operation::Delete { pos: pos as usize, count });
    let insert_char = text_char().prop_map(|ch| Operation::InsertChar { ch });
    let movement = (0u16..256u16).prop_map(|pos| Operation::Move { pos: pos as usize });

    prop_oneof![insert, delete, insert_char, Just(Operation::DeleteChar), movement]
}

fn chunk_config() -> impl Strategy<Value = BufferConfig> {
    let policy = prop_oneof![
        Just(RebalancePolicy::Always),
        (1usize..6).prop_map(|max_depth| RebalancePolicy::DepthExceeds { max_depth }),
    ];
    (1usize..6, policy).prop_map(|(size, policy)| {
        BufferConfig::default()
            .with_max_chunk_size(size)
            .with_rebalance(policy)
    })
}

fn char_to_byte_index(s: &str, char_pos: usize) -> usize {
    s.char_indices()
        .nth(char_pos)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}

fn model_slice(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// バッファとモデルに同じ操作を適用する
fn apply(buffer: &mut TextBuffer, model: &mut String, op: &Operation) {
    let len = model.chars().count();
    match op {
        Operation::Insert { pos, text } => {
            let offset = (*pos).min(len);
            let cursor = buffer.offset_to_cursor(offset);
            buffer.insert(cursor.line, cursor.column, text);
            model.insert_str(char_to_byte_index(model, offset), text);
        }
        Operation::Delete { pos, count } => {
            let end = (*pos).min(len);
            let start = end.saturating_sub(*count);
            let cursor = buffer.offset_to_cursor(end);
            let removed = buffer.delete(cursor.line, cursor.column, *count);
            assert_eq!(removed, model_slice(model, start, end));
            let (from, to) = (char_to_byte_index(model, start), char_to_byte_index(model, end));
            model.replace_range(from..to, "");
        }
        Operation::InsertChar { ch } => {
            let offset = buffer.cursor_offset();
            buffer.insert_char(*ch);
            model.insert(char_to_byte_index(model, offset), *ch);
        }
        Operation::DeleteChar => {
            let offset = buffer.cursor_offset();
            let removed = buffer.delete_char();
            if offset == 0 {
                assert_eq!(removed, None);
            } else {
                let byte = char_to_byte_index(model, offset - 1);
                assert_eq!(removed, Some(model.remove(byte)));
            }
        }
        Operation::Move { pos } => {
            let cursor = buffer.offset_to_cursor((*pos).min(len));
            buffer.set_cursor(cursor);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn construction_round_trips(text in small_text(200), config in chunk_config()) {
        let buffer = TextBuffer::with_config(&text, config).unwrap();
        prop_assert_eq!(buffer.get_all(), text.clone());
        prop_assert_eq!(buffer.len(), text.chars().count());
        prop_assert_eq!(buffer.line_count(), text.matches('\n').count() + 1);
        buffer.snapshot().assert_invariants();
    }

    #[test]
    fn offset_cursor_bijection(text in small_text(120), config in chunk_config()) {
        let buffer = TextBuffer::with_config(&text, config).unwrap();
        for offset in 0..=buffer.len() {
            let cursor = buffer.offset_to_cursor(offset);
            prop_assert!(cursor.line < buffer.line_count());
            prop_assert!(cursor.column <= buffer.line_len(cursor.line));
            prop_assert_eq!(buffer.cursor_to_offset(cursor), offset);
        }
    }

    #[test]
    fn lines_match_model(text in small_text(120), config in chunk_config()) {
        let buffer = TextBuffer::with_config(&text, config).unwrap();
        for (line, expected) in text.split('\n').enumerate() {
            prop_assert_eq!(buffer.get_line(line), Some(expected.to_string()));
        }
        prop_assert_eq!(buffer.get_line(buffer.line_count()), None);
    }

    #[test]
    fn operations_match_string_model(
        initial in small_text(64),
        config in chunk_config(),
        ops in proptest::collection::vec(operation_strategy(), 0..40)
    ) {
        let mut buffer = TextBuffer::with_config(&initial, config).unwrap();
        let mut model = initial.clone();

        for op in &ops {
            apply(&mut buffer, &mut model, op);
            prop_assert_eq!(buffer.get_all(), model.clone());
            let cursor = buffer.cursor();
            prop_assert!(cursor.line < buffer.line_count());
            prop_assert!(cursor.column <= buffer.line_len(cursor.line));
        }
        buffer.snapshot().assert_invariants();
    }

    #[test]
    fn undo_redo_symmetry(
        initial in small_text(64),
        config in chunk_config(),
        ops in proptest::collection::vec(operation_strategy(), 0..30)
    ) {
        let mut buffer = TextBuffer::with_config(&initial, config).unwrap();
        let mut model = initial.clone();
        // (編集前の状態, 編集後の状態)
        let mut edits = Vec::new();

        for op in &ops {
            let before = (buffer.get_all(), buffer.cursor());
            apply(&mut buffer, &mut model, op);
            if buffer.get_all() != before.0 {
                edits.push((before, (buffer.get_all(), buffer.cursor())));
            }
        }

        for (before, _) in edits.iter().rev() {
            prop_assert!(buffer.undo());
            prop_assert_eq!(&(buffer.get_all(), buffer.cursor()), before);
        }
        prop_assert!(!buffer.undo());
        prop_assert_eq!(buffer.get_all(), initial);

        for (_, after) in &edits {
            prop_assert!(buffer.redo());
            prop_assert_eq!(&(buffer.get_all(), buffer.cursor()), after);
        }
        prop_assert!(!buffer.redo());
        prop_assert_eq!(buffer.get_all(), model);
    }

    #[test]
    fn insert_then_delete_is_inverse(
        initial in small_text(80),
        config in chunk_config(),
        pos in 0usize..100,
        text in small_text(12)
    ) {
        let mut buffer = TextBuffer::with_config(&initial, config).unwrap();
        let offset = pos.min(buffer.len());
        let start = buffer.offset_to_cursor(offset);
        buffer.set_cursor(start);

        buffer.insert(start.line, start.column, &text);
        let end = buffer.cursor();
        let removed = buffer.delete(end.line, end.column, text.chars().count());

        prop_assert_eq!(removed, text);
        prop_assert_eq!(buffer.get_all(), initial);
        prop_assert_eq!(buffer.cursor(), start);
    }

    #[test]
    fn chunks_cover_document(
        initial in small_text(100),
        config in chunk_config(),
        ops in proptest::collection::vec(operation_strategy(), 0..20)
    ) {
        let mut buffer = TextBuffer::with_config(&initial, config).unwrap();
        let mut model = initial;
        for op in &ops {
            apply(&mut buffer, &mut model, op);
        }

        let mut collected = String::new();
        let mut expected_start = 0;
        for chunk in buffer.chunks() {
            prop_assert_eq!(chunk.start, expected_start);
            prop_assert_eq!(chunk.end - chunk.start, chunk.text.chars().count());
            prop_assert!(!chunk.text.is_empty());
            expected_start = chunk.end;
            collected.push_str(chunk.text);
        }
        prop_assert_eq!(expected_start, buffer.len());
        prop_assert_eq!(collected, model);
    }

    #[test]
    fn text_in_range_matches_model(
        text in small_text(100),
        config in chunk_config(),
        a in 0usize..120,
        b in 0usize..120
    ) {
        let buffer = TextBuffer::with_config(&text, config).unwrap();
        let start = buffer.offset_to_cursor(a);
        let end = buffer.offset_to_cursor(b);
        let (a, b) = (a.min(buffer.len()), b.min(buffer.len()));
        prop_assert_eq!(
            buffer.get_text_in_range(start, end),
            model_slice(&text, a, b)
        );
    }

    #[test]
    fn snapshots_are_never_mutated(
        initial in small_text(64),
        ops in proptest::collection::vec(operation_strategy(), 1..20)
    ) {
        let mut buffer = TextBuffer::new(&initial);
        let snapshot = buffer.snapshot();
        let mut model = initial.clone();
        for op in &ops {
            apply(&mut buffer, &mut model, op);
        }
        prop_assert_eq!(snapshot.to_string(), initial);
        buffer.set_cursor(Cursor::origin());
        prop_assert_eq!(buffer.cursor(), Cursor::origin());
    }
}

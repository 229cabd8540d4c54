use manos_doc_core::{
    ApplyError, Block, BlockKind, Document, Editor, Op, Point, Selection, Transaction,
};

fn sample_doc() -> Document {
    Document::new(vec![
        Block::heading("h1", 1, "Intro"),
        Block::paragraph("p1", "hello"),
        Block::table("t1", "Results"),
    ])
}

#[test]
fn transaction_is_one_undo_record() {
    let mut editor = Editor::new(sample_doc());

    editor
        .apply(
            Transaction::new(vec![
                Op::RemoveNode { path: vec![1] },
                Op::InsertNode {
                    path: vec![1],
                    node: Block::paragraph("p2", "replacement"),
                },
            ])
            .source("test"),
        )
        .unwrap();

    assert_eq!(editor.revision(), 1);
    assert_eq!(editor.doc().children[1].id(), Some("p2"));
    assert_eq!(editor.undo_sources().collect::<Vec<_>>(), vec![Some("test")]);

    assert!(editor.undo());
    assert_eq!(editor.doc(), &sample_doc());
    assert!(!editor.can_undo());

    assert!(editor.redo());
    assert_eq!(editor.doc().children[1].id(), Some("p2"));
}

#[test]
fn failing_op_rolls_back_the_whole_transaction() {
    let mut editor = Editor::new(sample_doc());

    let err = editor
        .apply(Transaction::new(vec![
            Op::RemoveNode { path: vec![0] },
            Op::RemoveNode { path: vec![9] },
        ]))
        .unwrap_err();

    assert!(matches!(err, ApplyError::InvalidPath(_)));
    assert_eq!(editor.doc(), &sample_doc());
    assert_eq!(editor.revision(), 0);
    assert!(!editor.can_undo());
}

#[test]
fn stale_base_revision_is_rejected() {
    let mut editor = Editor::new(sample_doc());
    editor
        .apply(Transaction::new(vec![Op::InsertText {
            path: vec![1],
            offset: 5,
            text: "!".to_string(),
        }]))
        .unwrap();

    let err = editor
        .apply(Transaction::new(vec![Op::RemoveNode { path: vec![0] }]).base_revision(0))
        .unwrap_err();
    assert!(matches!(
        err,
        ApplyError::StaleRevision {
            expected: 0,
            actual: 1
        }
    ));
    assert_eq!(editor.doc().children.len(), 3);
}

#[test]
fn caption_and_kind_ops_invert() {
    let mut editor = Editor::new(sample_doc());
    editor
        .apply(Transaction::new(vec![
            Op::SetCaption {
                path: vec![2],
                caption: Some("Updated".to_string()),
            },
            Op::SetKind {
                path: vec![0],
                kind: BlockKind::heading(2),
            },
        ]))
        .unwrap();

    assert_eq!(editor.doc().children[2].caption(), "Updated");
    assert_eq!(editor.doc().children[0].heading_level(), Some(2));

    editor.undo();
    assert_eq!(editor.doc().children[2].caption(), "Results");
    assert_eq!(editor.doc().children[0].heading_level(), Some(1));
}

#[test]
fn selection_follows_node_insert_and_remove() {
    let mut editor = Editor::new(sample_doc());
    editor.set_selection(Selection::collapsed(Point::new(vec![2], 0)));

    editor
        .apply(Transaction::new(vec![Op::InsertNode {
            path: vec![0],
            node: Block::paragraph("p0", "first"),
        }]))
        .unwrap();
    assert_eq!(editor.selection().focus.path, vec![3]);

    editor
        .apply(Transaction::new(vec![Op::RemoveNode { path: vec![3] }]))
        .unwrap();
    assert_eq!(editor.selection().focus.path, vec![2]);
    assert_eq!(editor.selection().focus.offset, 0);
}

#[test]
fn text_ops_clamp_to_char_boundaries() {
    let mut editor = Editor::new(Document::new(vec![Block::paragraph("p", "héllo")]));
    editor
        .apply(Transaction::new(vec![Op::RemoveText {
            path: vec![0],
            range: 1..2,
        }]))
        .unwrap();
    // Byte 2 falls inside "é", so the range collapses and nothing is removed.
    assert_eq!(editor.doc().children[0].text, "héllo");

    editor
        .apply(Transaction::new(vec![Op::InsertText {
            path: vec![0],
            offset: 100,
            text: "!".to_string(),
        }]))
        .unwrap();
    assert_eq!(editor.doc().children[0].text, "héllo!");
}

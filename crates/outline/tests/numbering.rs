use manos_doc_core::{Block, BlockKind, Document, ListKind};
use manos_outline::{heading_number, heading_numbers, ordered_headings, toc};

fn prefixes(doc: &Document) -> Vec<(String, String)> {
    toc(doc)
        .into_iter()
        .map(|item| (item.id, item.prefix))
        .collect()
}

fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected
        .iter()
        .map(|(id, prefix)| (id.to_string(), prefix.to_string()))
        .collect()
}

#[test]
fn numbers_follow_document_order() {
    let doc = Document::new(vec![
        Block::heading("a", 1, "A"),
        Block::heading("b", 2, "B"),
        Block::paragraph("p", "body"),
        Block::heading("c", 2, "C"),
        Block::heading("d", 1, "D"),
        Block::heading("e", 2, "E"),
    ]);

    assert_eq!(
        prefixes(&doc),
        pairs(&[("a", "1"), ("b", "1.1"), ("c", "1.2"), ("d", "2"), ("e", "2.1")])
    );
}

#[test]
fn deeper_levels_reset_under_each_parent() {
    let doc = Document::new(vec![
        Block::heading("a", 1, ""),
        Block::heading("b", 2, ""),
        Block::heading("c", 3, ""),
        Block::heading("d", 3, ""),
        Block::heading("e", 2, ""),
        Block::heading("f", 3, ""),
        Block::heading("g", 1, ""),
        Block::heading("h", 2, ""),
        Block::heading("i", 3, ""),
    ]);

    assert_eq!(
        prefixes(&doc),
        pairs(&[
            ("a", "1"),
            ("b", "1.1"),
            ("c", "1.1.1"),
            ("d", "1.1.2"),
            ("e", "1.2"),
            ("f", "1.2.1"),
            ("g", "2"),
            ("h", "2.1"),
            ("i", "2.1.1"),
        ])
    );

    for item in toc(&doc) {
        assert_eq!(item.prefix.split('.').count(), item.level as usize);
    }
}

#[test]
fn missing_parent_scope_shortens_the_number() {
    let doc = Document::new(vec![
        Block::heading("orphan", 2, "Before any chapter"),
        Block::heading("a", 1, "Chapter"),
    ]);
    let numbers = heading_numbers(&ordered_headings(&doc));
    assert_eq!(numbers["orphan"], "");
    assert_eq!(numbers["a"], "1");

    let doc = Document::new(vec![
        Block::heading("a", 1, "Chapter"),
        Block::heading("skip", 3, "Skipped a level"),
    ]);
    // No level-2 heading in scope counts as 0, and with no level-2 parent the
    // number stops there.
    assert_eq!(heading_number(&doc, "skip").as_deref(), Some("1.0"));
}

#[test]
fn nested_headings_are_ordered_by_path() {
    let doc = Document::new(vec![
        Block::heading("a", 1, "A"),
        Block::new("cell", BlockKind::TableCell).with_children(vec![
            Block::heading("inner", 2, "Inner"),
            Block::paragraph("p", "x"),
        ]),
        Block::heading("b", 2, "B"),
    ]);

    assert_eq!(
        prefixes(&doc),
        pairs(&[("a", "1"), ("inner", "1.1"), ("b", "1.2")])
    );
    assert_eq!(toc(&doc)[1].path, vec![1, 0]);
}

#[test]
fn generated_and_bibliography_headings_are_not_numbered() {
    let doc = Document::new(vec![
        Block::heading("a", 1, "A"),
        Block::new("gh", BlockKind::GeneratedHeading)
            .with_text("List of Tables")
            .generated(ListKind::Tables),
        Block::heading("fake", 1, "Inside generated").generated(ListKind::Tables),
        Block::heading("b", 1, "B"),
        Block::heading("bib", 1, "References").bibliography(),
    ]);

    let items = toc(&doc);
    let summary: Vec<_> = items
        .iter()
        .map(|item| (item.id.as_str(), item.prefix.as_str(), item.text.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![("a", "1", "A"), ("b", "2", "B"), ("bib", "", "References")]
    );
    assert_eq!(heading_number(&doc, "bib"), None);
}

#[test]
fn bibliography_only_document_has_one_toc_item() {
    let doc = Document::new(vec![
        Block::heading("bib", 2, "Bibliography").bibliography(),
        Block::paragraph("ref", "Knuth, 1968").bibliography(),
    ]);

    let items = toc(&doc);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "bib");
    assert_eq!(items[0].prefix, "");
    assert_eq!(items[0].level, 2);
}

#[test]
fn empty_document_and_headings_without_ids() {
    assert!(toc(&Document::default()).is_empty());
    assert_eq!(heading_number(&Document::default(), "x"), None);

    let doc = Document::new(vec![
        Block::heading("gone", 1, "No id").without_id(),
        Block::heading("a", 1, "A"),
    ]);
    assert_eq!(prefixes(&doc), pairs(&[("a", "1")]));
}

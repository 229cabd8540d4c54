use manos_doc_core::{ApplyError, Block, BlockKind, Document, Editor, ListKind, Op, Transaction};
use manos_outline::{
    EditorSurface, IndexerConfig, MATERIALIZE_SOURCE, MaterializeOutcome, RegistryEntry,
    RenderHandle, Surface, desired_blocks, existing_range, materialize, plan,
};

fn entries(items: &[(&str, &str)]) -> Vec<RegistryEntry> {
    items
        .iter()
        .enumerate()
        .map(|(ix, (id, caption))| RegistryEntry {
            id: id.to_string(),
            index: ix + 1,
            caption: caption.to_string(),
            path: Vec::new(),
        })
        .collect()
}

fn report_doc() -> Document {
    Document::new(vec![
        Block::heading("h", 1, "Report"),
        Block::table("t1", "Revenue"),
        Block::table("t2", ""),
        Block::heading("bib", 1, "References").bibliography(),
    ])
}

fn texts(doc: &Document, list: ListKind) -> Vec<String> {
    existing_range(doc, list)
        .into_iter()
        .map(|ix| doc.children[ix].text.clone())
        .collect()
}

#[test]
fn desired_blocks_carry_markers_and_labels() {
    let blocks = desired_blocks(
        ListKind::Tables,
        "List of Tables",
        "Table",
        &entries(&[("t1", "Revenue"), ("t2", "")]),
    );

    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].id(), Some("generated-tables-heading"));
    assert_eq!(blocks[0].text, "List of Tables");
    assert_eq!(blocks[1].id(), Some("generated-tables-t1"));
    assert_eq!(blocks[1].text, "Table 1: Revenue");
    assert_eq!(blocks[1].markers.target.as_deref(), Some("t1"));
    assert_eq!(blocks[2].text, "Table 2");
    assert!(blocks.iter().all(|b| b.markers.generated == Some(ListKind::Tables)));
    assert!(blocks.iter().all(|b| !b.is_bibliography()));

    let bib = desired_blocks(
        ListKind::Bibliography,
        "Bibliography",
        "",
        &entries(&[("c1", "Knuth, 1968")]),
    );
    assert_eq!(bib[1].text, "[1] Knuth, 1968");
    assert!(bib.iter().all(Block::is_bibliography));

    assert!(desired_blocks(ListKind::Figures, "List of Figures", "Figure", &[]).is_empty());
}

#[test]
fn new_list_goes_before_the_bibliography_and_is_idempotent() {
    let config = IndexerConfig::default();
    let mut surface = EditorSurface::new(Editor::new(report_doc()));
    let items = entries(&[("t1", "Revenue"), ("t2", "")]);

    let outcome = materialize(&mut surface, ListKind::Tables, &items, &config);
    assert_eq!(
        outcome,
        MaterializeOutcome::Applied {
            removed: 0,
            inserted: 3
        }
    );
    assert_eq!(existing_range(surface.document(), ListKind::Tables), vec![3, 4, 5]);
    assert_eq!(surface.document().children[6].id(), Some("bib"));

    let before = serde_json::to_string(surface.document()).unwrap();
    let revision = surface.revision();
    let outcome = materialize(&mut surface, ListKind::Tables, &items, &config);
    assert_eq!(outcome, MaterializeOutcome::Unchanged);
    assert_eq!(serde_json::to_string(surface.document()).unwrap(), before);
    assert_eq!(surface.revision(), revision);
}

#[test]
fn existing_list_is_replaced_in_place_as_one_undo_step() {
    let config = IndexerConfig::default();
    let mut surface = EditorSurface::new(Editor::new(report_doc()));
    materialize(
        &mut surface,
        ListKind::Tables,
        &entries(&[("t1", "Revenue")]),
        &config,
    );
    let undo_depth = surface.editor().undo_sources().count();

    let outcome = materialize(
        &mut surface,
        ListKind::Tables,
        &entries(&[("t1", "Revenue (net)"), ("t2", "Costs")]),
        &config,
    );
    assert_eq!(
        outcome,
        MaterializeOutcome::Applied {
            removed: 2,
            inserted: 3
        }
    );
    assert_eq!(
        texts(surface.document(), ListKind::Tables),
        vec!["List of Tables", "Table 1: Revenue (net)", "Table 2: Costs"]
    );
    assert_eq!(existing_range(surface.document(), ListKind::Tables)[0], 3);

    let sources: Vec<_> = surface.editor().undo_sources().collect();
    assert_eq!(sources.len(), undo_depth + 1);
    assert_eq!(sources.last().copied().flatten(), Some(MATERIALIZE_SOURCE));

    assert!(surface.editor_mut().undo());
    assert_eq!(
        texts(surface.document(), ListKind::Tables),
        vec!["List of Tables", "Table 1: Revenue"]
    );
}

#[test]
fn empty_registry_removes_the_section() {
    let config = IndexerConfig::default();
    let mut surface = EditorSurface::new(Editor::new(report_doc()));
    materialize(
        &mut surface,
        ListKind::Tables,
        &entries(&[("t1", "Revenue")]),
        &config,
    );

    let outcome = materialize(&mut surface, ListKind::Tables, &[], &config);
    assert_eq!(
        outcome,
        MaterializeOutcome::Applied {
            removed: 2,
            inserted: 0
        }
    );
    assert!(existing_range(surface.document(), ListKind::Tables).is_empty());
    assert_eq!(
        materialize(&mut surface, ListKind::Tables, &[], &config),
        MaterializeOutcome::Unchanged
    );
}

#[test]
fn bibliography_list_is_appended_and_other_lists_go_before_it() {
    let config = IndexerConfig::default();
    let doc = Document::new(vec![
        Block::paragraph("p", "See [1]."),
        Block::citation("c1", "Knuth, 1968"),
        Block::figure("f1", "Diagram"),
    ]);
    let mut surface = EditorSurface::new(Editor::new(doc));

    materialize(
        &mut surface,
        ListKind::Bibliography,
        &entries(&[("c1", "Knuth, 1968")]),
        &config,
    );
    assert_eq!(existing_range(surface.document(), ListKind::Bibliography), vec![3, 4]);

    materialize(
        &mut surface,
        ListKind::Figures,
        &entries(&[("f1", "Diagram")]),
        &config,
    );
    assert_eq!(existing_range(surface.document(), ListKind::Figures), vec![3, 4]);
    assert_eq!(existing_range(surface.document(), ListKind::Bibliography), vec![5, 6]);
    assert_eq!(
        texts(surface.document(), ListKind::Bibliography),
        vec!["Bibliography", "[1] Knuth, 1968"]
    );
}

#[test]
fn stray_generated_blocks_are_gathered_back_together() {
    let doc = Document::new(vec![
        Block::table("t1", "Revenue"),
        Block::new("old-1", BlockKind::GeneratedEntry).generated(ListKind::Tables),
        Block::paragraph("p", "user text"),
        Block::new("old-2", BlockKind::GeneratedEntry).generated(ListKind::Tables),
    ]);
    let desired = desired_blocks(ListKind::Tables, "Tables", "Table", &entries(&[("t1", "Revenue")]));
    let tx = plan(&doc, 0, ListKind::Tables, desired).unwrap();

    let mut editor = Editor::new(doc);
    editor.apply(tx).unwrap();
    let doc = editor.doc();
    assert_eq!(existing_range(doc, ListKind::Tables), vec![1, 2]);
    assert_eq!(doc.children[3].id(), Some("p"));
    assert_eq!(doc.children.len(), 4);
}

#[test]
fn plan_is_rejected_once_the_document_moves_on() {
    let doc = report_doc();
    let desired = desired_blocks(ListKind::Tables, "Tables", "Table", &entries(&[("t1", "A")]));
    let mut editor = Editor::new(doc);
    let tx = plan(editor.doc(), editor.revision(), ListKind::Tables, desired).unwrap();

    editor
        .apply(Transaction::new(vec![Op::InsertText {
            path: vec![0],
            offset: 0,
            text: "Draft ".into(),
        }]))
        .unwrap();
    let before = editor.doc().clone();

    let err = editor.apply(tx).unwrap_err();
    assert!(matches!(err, ApplyError::StaleRevision { .. }));
    assert_eq!(editor.doc(), &before);
}

/// Reports the revision it saw before a concurrent edit landed.
struct LaggingSurface(EditorSurface);

impl Surface for LaggingSurface {
    type Handle = RenderHandle;

    fn document(&self) -> &Document {
        self.0.document()
    }

    fn revision(&self) -> u64 {
        self.0.revision().saturating_sub(1)
    }

    fn mutate(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        self.0.mutate(tx)
    }

    fn resolve_render_handle(&self, id: &str) -> Option<RenderHandle> {
        self.0.resolve_render_handle(id)
    }

    fn scroll_into_view(&mut self, handle: &RenderHandle) {
        self.0.scroll_into_view(handle)
    }
}

#[test]
fn stale_surface_aborts_without_touching_the_document() {
    let mut editor = Editor::new(report_doc());
    editor
        .apply(Transaction::new(vec![Op::InsertText {
            path: vec![0],
            offset: 6,
            text: "!".into(),
        }]))
        .unwrap();
    let before = editor.doc().clone();
    let mut surface = LaggingSurface(EditorSurface::new(editor));

    let outcome = materialize(
        &mut surface,
        ListKind::Tables,
        &entries(&[("t1", "Revenue")]),
        &IndexerConfig::default(),
    );
    assert_eq!(outcome, MaterializeOutcome::Aborted);
    assert_eq!(surface.document(), &before);
}

use std::time::{Duration, Instant};

use anyhow::Context as _;
use manos_doc_core::{Block, Document, DocumentValue, Editor, ListKind, Op, Transaction};
use manos_outline::{
    CollapseStore, DocumentIndexer, EditorSurface, IndexerConfig, MemoryCollapseStore, Surface,
    TrackedKind,
};

fn sample() -> Document {
    Document::new(vec![
        Block::heading("intro", 1, "Introduction"),
        Block::paragraph("intro-p", "Why outlines matter."),
        Block::heading("method", 2, "Method"),
        Block::table("t-setup", "Experimental setup"),
        Block::heading("results", 1, "Results"),
        Block::figure("f-latency", "Latency by load"),
        Block::table("t-summary", "Summary"),
        Block::citation("c-knuth", "Knuth, The Art of Computer Programming"),
        Block::heading("discussion", 2, "Discussion"),
    ])
}

fn load(path: Option<String>) -> anyhow::Result<Document> {
    let Some(path) = path else {
        return Ok(sample());
    };
    let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let value = DocumentValue::from_json_str(&json).with_context(|| format!("parsing {path}"))?;
    Ok(value.into_document())
}

fn print_state(indexer: &DocumentIndexer, doc: &Document) {
    println!("== table of contents ==");
    for item in indexer.toc() {
        let indent = "  ".repeat(item.level.saturating_sub(1) as usize);
        println!("{indent}{} {}", item.prefix, item.text);
    }

    for kind in TrackedKind::ALL {
        let entries = indexer.snapshot(kind);
        if entries.is_empty() {
            continue;
        }
        println!("== {kind:?} ==");
        for entry in entries {
            println!("  {} {} {:?}", entry.index, entry.id, entry.caption);
        }
    }

    for list in ListKind::ALL {
        let blocks: Vec<&Block> = doc
            .children
            .iter()
            .filter(|block| block.markers.generated == Some(list))
            .collect();
        if blocks.is_empty() {
            continue;
        }
        println!("== generated {} ==", list.as_str());
        for block in blocks {
            println!("  {}", block.text);
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let doc = load(std::env::args().nth(1))?;
    let config = IndexerConfig::default();
    let mut surface = EditorSurface::new(Editor::new(doc));
    let mut indexer = DocumentIndexer::new("demo", config.clone());

    let t0 = Instant::now();
    indexer.on_change(surface.document(), t0);
    let settle = config.caption_debounce() + config.materialize_debounce();
    indexer.poll(&mut surface, t0 + settle);
    print_state(&indexer, surface.document());

    // Rename the first table and let both debounces run out.
    if let Some(entry) = indexer.snapshot(TrackedKind::Table).first() {
        let tx = Transaction::new(vec![Op::SetCaption {
            path: entry.path.clone(),
            caption: Some(format!("{} (revised)", entry.caption)),
        }]);
        surface.mutate(tx).context("renaming table caption")?;

        let edited = t0 + settle + Duration::from_millis(100);
        indexer.on_change(surface.document(), edited);
        indexer.poll(&mut surface, edited + config.caption_debounce());
        let report = indexer.poll(&mut surface, edited + settle);
        println!("\nafter caption edit: {:?}", report.materialized);
    }

    let mut store = MemoryCollapseStore::new();
    if let Some(first) = indexer.toc().first() {
        store.toggle(indexer.document_id(), &first.id);
    }
    indexer.on_collapse_changed(surface.document(), &store);
    let diff = indexer.run_frame(&mut surface);
    println!("collapsed {:?}: hide {:?}", store.get(indexer.document_id()), diff.hide);

    indexer.teardown(&mut surface);
    print_state(&indexer, surface.document());

    let value = DocumentValue::from_document(surface.document().clone());
    println!("\n{}", value.to_json_pretty().context("serializing document")?);
    Ok(())
}

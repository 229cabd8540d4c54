//! Writes generated lists (tables, figures, bibliography) back into the
//! document.
//!
//! A generated section is a contiguous run of top-level blocks carrying the
//! same [`ListKind`] marker. It is always replaced whole, in one transaction,
//! so undo sees a single edit and no half-written range is ever visible.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use manos_doc_core::{Block, BlockKind, Document, ListKind, Op, Transaction};
use tracing::{debug, warn};

use crate::config::IndexerConfig;
use crate::error::IndexError;
use crate::registry::RegistryEntry;
use crate::schedule::Debouncer;
use crate::surface::Surface;

pub const MATERIALIZE_SOURCE: &str = "outline.materialize";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeOutcome {
    /// The document already holds exactly the desired blocks.
    Unchanged,
    Applied { removed: usize, inserted: usize },
    /// The document moved under us; the next cycle reconciles.
    Aborted,
}

pub fn entry_text(list: ListKind, label: &str, entry: &RegistryEntry) -> String {
    match (list, entry.caption.is_empty()) {
        (ListKind::Bibliography, _) => format!("[{}] {}", entry.index, entry.caption)
            .trim_end()
            .to_string(),
        (_, true) => format!("{label} {}", entry.index),
        (_, false) => format!("{label} {}: {}", entry.index, entry.caption),
    }
}

/// Blocks for one generated list: a heading followed by one entry per
/// registry member. Empty when there are no members.
pub fn desired_blocks(
    list: ListKind,
    title: &str,
    label: &str,
    entries: &[RegistryEntry],
) -> Vec<Block> {
    if entries.is_empty() {
        return Vec::new();
    }

    let mark = |block: Block| {
        let block = block.generated(list);
        if list == ListKind::Bibliography {
            block.bibliography()
        } else {
            block
        }
    };

    let mut blocks = Vec::with_capacity(entries.len() + 1);
    blocks.push(mark(
        Block::new(
            format!("generated-{}-heading", list.as_str()),
            BlockKind::GeneratedHeading,
        )
        .with_text(title),
    ));
    for entry in entries {
        let mut block = Block::new(
            format!("generated-{}-{}", list.as_str(), entry.id),
            BlockKind::GeneratedEntry,
        )
        .with_text(entry_text(list, label, entry));
        block.markers.target = Some(entry.id.clone());
        blocks.push(mark(block));
    }
    blocks
}

/// Top-level indices of every block marked as part of `list`.
pub fn existing_range(doc: &Document, list: ListKind) -> Vec<usize> {
    let indices: Vec<usize> = doc
        .children
        .iter()
        .enumerate()
        .filter(|(_, block)| block.markers.generated == Some(list))
        .map(|(ix, _)| ix)
        .collect();

    let contiguous = indices.windows(2).all(|pair| pair[1] == pair[0] + 1);
    if !contiguous {
        warn!(
            list = list.as_str(),
            blocks = indices.len(),
            "generated section is not contiguous; replacing every marked block"
        );
    }
    indices
}

/// Where a freshly generated list goes when none exists yet: right before
/// the bibliography, else at the end.
fn insertion_index(doc: &Document, list: ListKind) -> usize {
    if list != ListKind::Bibliography {
        if let Some(ix) = doc.children.iter().position(Block::is_bibliography) {
            return ix;
        }
    }
    doc.children.len()
}

/// Builds the replacing transaction, or `None` when the document already
/// holds the desired blocks. An existing section is replaced in place.
pub fn plan(doc: &Document, revision: u64, list: ListKind, desired: Vec<Block>) -> Option<Transaction> {
    let existing = existing_range(doc, list);

    let current: Vec<&Block> = existing.iter().map(|&ix| &doc.children[ix]).collect();
    if current.len() == desired.len() && current.iter().zip(&desired).all(|(a, b)| *a == b) {
        return None;
    }

    let at = match existing.first() {
        Some(&first) => first,
        None => insertion_index(doc, list),
    };

    let mut ops: Vec<Op> = existing
        .iter()
        .rev()
        .map(|&ix| Op::RemoveNode { path: vec![ix] })
        .collect();
    ops.extend(
        desired
            .into_iter()
            .enumerate()
            .map(|(offset, node)| Op::InsertNode {
                path: vec![at + offset],
                node,
            }),
    );

    Some(
        Transaction::new(ops)
            .base_revision(revision)
            .source(MATERIALIZE_SOURCE),
    )
}

fn try_materialize<S: Surface>(
    surface: &mut S,
    list: ListKind,
    entries: &[RegistryEntry],
    config: &IndexerConfig,
) -> Result<MaterializeOutcome, IndexError> {
    let desired = desired_blocks(
        list,
        config.titles.get(list),
        config.entry_labels.get(list),
        entries,
    );
    let inserted = desired.len();
    let Some(tx) = plan(surface.document(), surface.revision(), list, desired) else {
        return Ok(MaterializeOutcome::Unchanged);
    };
    let removed = tx.ops.len() - inserted;

    surface.mutate(tx)?;
    Ok(MaterializeOutcome::Applied { removed, inserted })
}

/// Replaces the generated section for `list` with one built from `entries`.
/// Never fails: a rejected transaction is reported as aborted.
pub fn materialize<S: Surface>(
    surface: &mut S,
    list: ListKind,
    entries: &[RegistryEntry],
    config: &IndexerConfig,
) -> MaterializeOutcome {
    match try_materialize(surface, list, entries, config) {
        Ok(outcome) => {
            debug!(list = list.as_str(), ?outcome, "materialized generated list");
            outcome
        }
        Err(err) => {
            debug!(list = list.as_str(), %err, "materialization aborted");
            MaterializeOutcome::Aborted
        }
    }
}

/// Debounced set of lists awaiting materialization.
#[derive(Debug)]
pub struct Materializer {
    pending: Debouncer<BTreeSet<ListKind>>,
}

impl Materializer {
    pub fn new(delay: Duration) -> Self {
        Self {
            pending: Debouncer::new(delay),
        }
    }

    /// Adds `list` to the pending set and restarts the timer.
    pub fn request(&mut self, list: ListKind, now: Instant) {
        let mut lists = self.pending.flush().unwrap_or_default();
        lists.insert(list);
        self.pending.schedule(now, lists);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    pub fn poll(&mut self, now: Instant) -> BTreeSet<ListKind> {
        self.pending.poll(now).unwrap_or_default()
    }

    pub fn flush(&mut self) -> BTreeSet<ListKind> {
        self.pending.flush().unwrap_or_default()
    }
}

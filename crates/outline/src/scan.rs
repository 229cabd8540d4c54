use std::collections::HashSet;

use manos_doc_core::{Ancestry, Block, Document, Path};
use tracing::warn;

use crate::order::sort_by_path;

/// Which parts of the document a scan may see.
///
/// Scans that decide whether to regenerate a generated section must use a
/// scope that excludes generated blocks, otherwise the regeneration would
/// trigger itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanScope {
    All,
    ExcludeGenerated,
    /// Excludes generated sections and the bibliography.
    Body,
}

impl ScanScope {
    pub fn admits(self, block: &Block, ancestry: &Ancestry) -> bool {
        let generated = block.is_generated() || ancestry.generated.is_some();
        let bibliography = block.is_bibliography() || ancestry.bibliography;
        match self {
            ScanScope::All => true,
            ScanScope::ExcludeGenerated => !generated,
            ScanScope::Body => !generated && !bibliography,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Hit<'a> {
    pub id: &'a str,
    pub block: &'a Block,
    pub path: Path,
}

/// Collects the blocks in `scope` matching `filter`, in document order.
/// Blocks without a stable id cannot be tracked across edits and are left out,
/// as are later blocks reusing an id already seen.
pub fn scan<'a>(
    doc: &'a Document,
    scope: ScanScope,
    mut filter: impl FnMut(&Block) -> bool,
) -> Vec<Hit<'a>> {
    scan_with_ancestry(doc, scope, |block, _| filter(block))
}

pub fn scan_with_ancestry<'a>(
    doc: &'a Document,
    scope: ScanScope,
    mut filter: impl FnMut(&Block, &Ancestry) -> bool,
) -> Vec<Hit<'a>> {
    let mut missing_ids = 0usize;
    let mut hits: Vec<Hit<'a>> = doc
        .scan(|block, ancestry| scope.admits(block, ancestry) && filter(block, ancestry))
        .into_iter()
        .filter_map(|(block, path)| match block.id() {
            Some(id) => Some(Hit { id, block, path }),
            None => {
                missing_ids += 1;
                None
            }
        })
        .collect();

    if missing_ids > 0 {
        warn!(missing_ids, "blocks without a stable id excluded from indexing");
    }

    sort_by_path(&mut hits, |hit| hit.path.as_slice());

    // Ids are keys downstream; only the first block carrying one is tracked.
    let mut seen = HashSet::with_capacity(hits.len());
    let before = hits.len();
    hits.retain(|hit| seen.insert(hit.id));
    if hits.len() < before {
        warn!(duplicates = before - hits.len(), "duplicate block ids excluded from indexing");
    }
    hits
}

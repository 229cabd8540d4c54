//! Sequential per-kind index (tables, figures, citations, comment anchors).
//!
//! Two change tracks run side by side. The structural track, `(id, kind)` in
//! document order, is checked on every change and rebuilds positions at once.
//! The content track, `(id, caption)`, goes through a debounce so that typing
//! inside a caption settles before anything downstream is notified.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use manos_doc_core::{Block, BlockKind, Document, ListKind, Path};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scan::{Hit, ScanScope, scan};
use crate::schedule::Debouncer;
use crate::signature::Signature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedKind {
    Table,
    Figure,
    Citation,
    CommentAnchor,
}

impl TrackedKind {
    pub const ALL: [TrackedKind; 4] = [
        TrackedKind::Table,
        TrackedKind::Figure,
        TrackedKind::Citation,
        TrackedKind::CommentAnchor,
    ];

    pub fn block_kind(self) -> BlockKind {
        match self {
            TrackedKind::Table => BlockKind::Table,
            TrackedKind::Figure => BlockKind::Figure,
            TrackedKind::Citation => BlockKind::Citation,
            TrackedKind::CommentAnchor => BlockKind::CommentAnchor,
        }
    }

    pub fn matches(self, block: &Block) -> bool {
        block.kind == self.block_kind()
    }

    /// The generated list fed by this registry, if any.
    pub fn list(self) -> Option<ListKind> {
        match self {
            TrackedKind::Table => Some(ListKind::Tables),
            TrackedKind::Figure => Some(ListKind::Figures),
            TrackedKind::Citation => Some(ListKind::Bibliography),
            TrackedKind::CommentAnchor => None,
        }
    }

    pub fn for_list(list: ListKind) -> Self {
        match list {
            ListKind::Tables => TrackedKind::Table,
            ListKind::Figures => TrackedKind::Figure,
            ListKind::Bibliography => TrackedKind::Citation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntry {
    pub id: String,
    /// 1-based rank in document order among blocks of the same kind.
    pub index: usize,
    pub caption: String,
    pub path: Path,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryChange {
    pub structural: bool,
    pub content: bool,
}

impl RegistryChange {
    pub fn any(&self) -> bool {
        self.structural || self.content
    }
}

type Captions = Vec<(String, String)>;

#[derive(Debug)]
pub struct Registry {
    kind: TrackedKind,
    structural: Option<Signature>,
    content: Option<Signature>,
    pending_content: Debouncer<(Signature, Captions)>,
    order: Vec<String>,
    index: HashMap<String, usize>,
    paths: HashMap<String, Path>,
    captions: HashMap<String, String>,
}

impl Registry {
    pub fn new(kind: TrackedKind, caption_delay: Duration) -> Self {
        Self {
            kind,
            structural: None,
            content: None,
            pending_content: Debouncer::new(caption_delay),
            order: Vec::new(),
            index: HashMap::new(),
            paths: HashMap::new(),
            captions: HashMap::new(),
        }
    }

    pub fn kind(&self) -> TrackedKind {
        self.kind
    }

    /// Runs on every document change. Generated lists are never part of the
    /// scan, so materializing a list cannot retrigger it.
    pub fn observe(&mut self, doc: &Document, now: Instant) -> RegistryChange {
        let kind = self.kind;
        let hits = scan(doc, ScanScope::ExcludeGenerated, |block| kind.matches(block));
        let mut change = RegistryChange::default();

        let structural = Signature::structural(&hits);
        if self.structural.as_ref() != Some(&structural) {
            debug!(kind = ?self.kind, members = hits.len(), "registry structure changed");
            self.rebuild_positions(&hits);
            self.structural = Some(structural);
            change.structural = true;
        } else {
            // Paths shift when unrelated blocks move; ranks do not.
            for hit in &hits {
                self.paths.insert(hit.id.to_string(), hit.path.clone());
            }
        }

        let content = Signature::content(&hits);
        if self.content.as_ref() == Some(&content) {
            self.pending_content.cancel();
        } else if change.structural {
            // Structural edits are not keystrokes; settle captions right away.
            self.pending_content.cancel();
            self.apply_content(content, captions_of(&hits));
            change.content = true;
        } else if self
            .pending_content
            .pending()
            .is_none_or(|(pending, _)| *pending != content)
        {
            // Only caption edits restart the window; other edits keep it.
            self.pending_content
                .schedule(now, (content, captions_of(&hits)));
        }

        change
    }

    /// Applies debounced caption changes whose window has elapsed. Returns
    /// true when dependents should be notified.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending_content.poll(now) {
            Some((content, captions)) => {
                debug!(kind = ?self.kind, "registry captions settled");
                self.apply_content(content, captions);
                true
            }
            None => false,
        }
    }

    /// Applies pending caption changes immediately.
    pub fn flush(&mut self) -> bool {
        match self.pending_content.flush() {
            Some((content, captions)) => {
                self.apply_content(content, captions);
                true
            }
            None => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending_content.is_pending()
    }

    fn rebuild_positions(&mut self, hits: &[Hit<'_>]) {
        self.order = hits.iter().map(|hit| hit.id.to_string()).collect();
        self.index = hits
            .iter()
            .enumerate()
            .map(|(ix, hit)| (hit.id.to_string(), ix + 1))
            .collect();
        self.paths = hits
            .iter()
            .map(|hit| (hit.id.to_string(), hit.path.clone()))
            .collect();
    }

    fn apply_content(&mut self, content: Signature, captions: Captions) {
        self.captions = captions.into_iter().collect();
        self.content = Some(content);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn path_of(&self, id: &str) -> Option<&Path> {
        self.paths.get(id)
    }

    pub fn caption_of(&self, id: &str) -> Option<&str> {
        self.captions.get(id).map(String::as_str)
    }

    pub fn snapshot(&self) -> Vec<RegistryEntry> {
        self.order
            .iter()
            .enumerate()
            .map(|(ix, id)| RegistryEntry {
                id: id.clone(),
                index: ix + 1,
                caption: self.captions.get(id).cloned().unwrap_or_default(),
                path: self.paths.get(id).cloned().unwrap_or_default(),
            })
            .collect()
    }
}

fn captions_of(hits: &[Hit<'_>]) -> Captions {
    hits.iter()
        .map(|hit| (hit.id.to_string(), hit.block.caption().to_string()))
        .collect()
}

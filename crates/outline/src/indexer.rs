use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;

use manos_doc_core::{Document, ListKind};
use tracing::debug;

use crate::collapse::CollapseStore;
use crate::config::IndexerConfig;
use crate::materialize::{MaterializeOutcome, Materializer, existing_range, materialize};
use crate::navigate::{NavTarget, navigate};
use crate::numbering::{
    HeadingEntry, TocItem, bibliography_heading, build_toc, heading_entries, heading_hits,
    heading_numbers,
};
use crate::registry::{Registry, RegistryEntry, TrackedKind};
use crate::scan::{ScanScope, scan};
use crate::schedule::{FrameBatch, FrameDiff};
use crate::signature::{Memo, Signature};
use crate::surface::Surface;
use crate::visibility::{HiddenSet, VisibilitySink, hidden_ids};

#[derive(Debug, Default)]
struct Outline {
    headings: Vec<HeadingEntry>,
    numbers: HashMap<String, String>,
    toc: Vec<TocItem>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub settled: Vec<TrackedKind>,
    pub materialized: Vec<(ListKind, MaterializeOutcome)>,
}

/// Derived views for one open document.
///
/// The host calls [`DocumentIndexer::on_change`] after every edit,
/// [`DocumentIndexer::poll`] from its timer loop,
/// [`DocumentIndexer::run_frame`] once per paint, and
/// [`DocumentIndexer::teardown`] before the document goes away.
pub struct DocumentIndexer {
    document_id: String,
    config: IndexerConfig,
    outline: Memo<Outline>,
    layout: Option<Signature>,
    collapsed: BTreeSet<String>,
    hidden: HiddenSet,
    frame: FrameBatch,
    registries: BTreeMap<TrackedKind, Registry>,
    materializer: Materializer,
}

impl DocumentIndexer {
    pub fn new(document_id: impl Into<String>, config: IndexerConfig) -> Self {
        let config = config.with_defaults();
        let registries = TrackedKind::ALL
            .into_iter()
            .map(|kind| (kind, Registry::new(kind, config.caption_debounce())))
            .collect();
        Self {
            document_id: document_id.into(),
            materializer: Materializer::new(config.materialize_debounce()),
            config,
            outline: Memo::default(),
            layout: None,
            collapsed: BTreeSet::new(),
            hidden: HiddenSet::new(),
            frame: FrameBatch::default(),
            registries,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// One recompute cycle over the current snapshot.
    pub fn on_change(&mut self, doc: &Document, now: Instant) {
        self.refresh_outline(doc);
        self.refresh_visibility(doc, false);

        for (kind, registry) in &mut self.registries {
            let change = registry.observe(doc, now);
            if change.any() && list_may_change(doc, registry) {
                request_list(&mut self.materializer, &self.config, *kind, now);
            }
        }
    }

    /// Re-reads the collapsed set for this document from `store`.
    pub fn on_collapse_changed(&mut self, doc: &Document, store: &dyn CollapseStore) {
        let collapsed = store.get(&self.document_id);
        if collapsed == self.collapsed {
            return;
        }
        self.collapsed = collapsed;
        self.refresh_visibility(doc, true);
    }

    /// Fires due timers: settled captions first, then generated lists.
    pub fn poll<S: Surface>(&mut self, surface: &mut S, now: Instant) -> PollReport {
        let mut report = PollReport::default();
        for (kind, registry) in &mut self.registries {
            if registry.poll(now) {
                report.settled.push(*kind);
                request_list(&mut self.materializer, &self.config, *kind, now);
            }
        }

        let due = self.materializer.poll(now);
        report.materialized = self.materialize_lists(surface, due, now);
        report
    }

    /// Synchronously writes anything still pending so the last edit is not
    /// lost. A list that aborts gets one immediate retry against the fresh
    /// revision.
    pub fn teardown<S: Surface>(&mut self, surface: &mut S) -> Vec<(ListKind, MaterializeOutcome)> {
        let now = Instant::now();
        for (kind, registry) in &mut self.registries {
            if registry.flush() {
                request_list(&mut self.materializer, &self.config, *kind, now);
            }
        }
        let due = self.materializer.flush();
        let mut outcomes = self.materialize_lists(surface, due, now);

        let retry = self.materializer.flush();
        if !retry.is_empty() {
            outcomes.extend(self.materialize_lists(surface, retry, now));
        }
        outcomes
    }

    /// Applies the latest hidden set to the render tree, if it changed.
    pub fn run_frame(&mut self, sink: &mut dyn VisibilitySink) -> FrameDiff {
        self.frame.run(sink)
    }

    pub fn frame_pending(&self) -> bool {
        self.frame.is_pending()
    }

    pub fn materialization_pending(&self) -> bool {
        self.materializer.is_pending()
    }

    pub fn navigate<S: Surface>(&self, surface: &mut S, target: &NavTarget) -> bool {
        navigate(surface, target)
    }

    pub fn toc(&self) -> &[TocItem] {
        &self.outline.get().toc
    }

    pub fn number(&self, heading_id: &str) -> Option<&str> {
        self.outline.get().numbers.get(heading_id).map(String::as_str)
    }

    pub fn hidden(&self) -> &HiddenSet {
        &self.hidden
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden.contains(id)
    }

    pub fn registry(&self, kind: TrackedKind) -> Option<&Registry> {
        self.registries.get(&kind)
    }

    pub fn snapshot(&self, kind: TrackedKind) -> Vec<RegistryEntry> {
        self.registries
            .get(&kind)
            .map(Registry::snapshot)
            .unwrap_or_default()
    }

    fn refresh_outline(&mut self, doc: &Document) {
        let hits = heading_hits(doc);
        let mut tracked = hits.clone();
        tracked.extend(bibliography_heading(doc));
        let signature = Signature::with_text(&tracked);
        let recomputed = self.outline.update(signature, || {
            let headings = heading_entries(&hits);
            Outline {
                numbers: heading_numbers(&headings),
                toc: build_toc(doc, &headings),
                headings,
            }
        });
        if recomputed {
            debug!(headings = self.outline.get().headings.len(), "outline recomputed");
        } else {
            self.refresh_toc_paths(doc);
        }
    }

    /// Heading paths move when other blocks are inserted above them.
    fn refresh_toc_paths(&mut self, doc: &Document) {
        let stale = self
            .outline
            .get()
            .toc
            .iter()
            .any(|item| doc.block(&item.path).and_then(|b| b.id()) != Some(item.id.as_str()));
        if stale {
            self.outline.invalidate();
            self.refresh_outline(doc);
        }
    }

    fn refresh_visibility(&mut self, doc: &Document, force: bool) {
        let layout = Signature::structural(&scan(doc, ScanScope::Body, |_| true));
        if !force && self.layout.as_ref() == Some(&layout) {
            return;
        }
        self.layout = Some(layout);

        let hidden = hidden_ids(doc, &self.collapsed);
        if hidden == self.hidden {
            return;
        }
        debug!(hidden = hidden.len(), "hidden set changed");
        self.hidden = hidden;
        self.frame.request(self.hidden.clone());
    }

    fn materialize_lists<S: Surface>(
        &mut self,
        surface: &mut S,
        lists: BTreeSet<ListKind>,
        now: Instant,
    ) -> Vec<(ListKind, MaterializeOutcome)> {
        let mut outcomes = Vec::new();
        for list in lists {
            let entries = self.snapshot(TrackedKind::for_list(list));
            let outcome = materialize(surface, list, &entries, &self.config);
            if outcome == MaterializeOutcome::Aborted {
                // Retried on the next timer, even if no registry changes.
                self.materializer.request(list, now);
            }
            outcomes.push((list, outcome));
        }

        if outcomes
            .iter()
            .any(|(_, outcome)| matches!(outcome, MaterializeOutcome::Applied { .. }))
        {
            // Generated blocks are outside every signature, so this refreshes
            // paths without requesting another materialization.
            self.on_change(surface.document(), now);
        }
        outcomes
    }
}

/// An empty registry with no generated section on the page has nothing to
/// write.
fn list_may_change(doc: &Document, registry: &Registry) -> bool {
    !registry.is_empty()
        || registry
            .kind()
            .list()
            .is_some_and(|list| !existing_range(doc, list).is_empty())
}

fn request_list(
    materializer: &mut Materializer,
    config: &IndexerConfig,
    kind: TrackedKind,
    now: Instant,
) {
    if let Some(list) = kind.list() {
        if config.materializes(list) {
            materializer.request(list, now);
        }
    }
}

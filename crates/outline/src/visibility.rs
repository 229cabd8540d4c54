use std::collections::BTreeSet;

use manos_doc_core::Document;

use crate::scan::{ScanScope, scan};

pub type HiddenSet = BTreeSet<String>;

/// Receives per-block visibility flags when a frame is applied.
pub trait VisibilitySink {
    fn set_hidden(&mut self, id: &str, hidden: bool);
}

#[derive(Debug, Clone, Copy)]
struct OpenScope {
    level: u8,
}

/// Ids of every block hidden by the collapsed headings.
///
/// A collapsed heading hides everything after it in document order up to the
/// next heading of the same or a higher level. Headings nested inside an open
/// scope are hidden along with it and their own collapse flag is ignored.
pub fn hidden_ids(doc: &Document, collapsed: &BTreeSet<String>) -> HiddenSet {
    let mut hidden = HiddenSet::new();
    if collapsed.is_empty() {
        return hidden;
    }

    let mut open: Option<OpenScope> = None;
    for hit in scan(doc, ScanScope::Body, |_| true) {
        let Some(level) = hit.block.heading_level() else {
            if open.is_some() {
                hidden.insert(hit.id.to_string());
            }
            continue;
        };

        if open.is_some_and(|scope| level <= scope.level) {
            open = None;
        }

        if open.is_some() {
            hidden.insert(hit.id.to_string());
        } else if hit.block.kind.is_collapsible() && collapsed.contains(hit.id) {
            open = Some(OpenScope { level });
        }
    }
    hidden
}

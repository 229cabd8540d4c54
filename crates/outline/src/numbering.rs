//! Hierarchical heading numbers and the table of contents.
//!
//! Numbers depend on the document order of headings, not on tree nesting, so
//! they are always recomputed for the whole document from the ordered heading
//! list rather than patched per heading.

use std::collections::HashMap;

use manos_doc_core::{Block, BlockKind, Document, Path};
use serde::Serialize;

use crate::order::sort_by_path;
use crate::scan::{Hit, ScanScope, scan, scan_with_ancestry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingEntry {
    pub id: String,
    pub level: u8,
    pub text: String,
    pub path: Path,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocItem {
    pub id: String,
    /// Empty when the heading is unnumbered.
    pub prefix: String,
    pub text: String,
    pub level: u8,
    pub path: Path,
}

pub fn heading_hits(doc: &Document) -> Vec<Hit<'_>> {
    scan(doc, ScanScope::Body, |block| block.kind.is_heading())
}

/// Body headings in document order; generated and bibliography headings are
/// left out.
pub fn ordered_headings(doc: &Document) -> Vec<HeadingEntry> {
    heading_entries(&heading_hits(doc))
}

pub fn heading_entries(hits: &[Hit<'_>]) -> Vec<HeadingEntry> {
    hits.iter()
        .filter_map(|hit| {
            Some(HeadingEntry {
                id: hit.id.to_string(),
                level: hit.block.heading_level()?,
                text: hit.block.text.clone(),
                path: hit.path.clone(),
            })
        })
        .collect()
}

/// Number string for the heading at index `k` of an ordered heading list.
///
/// A missing parent scope ends the number early, so the result may have fewer
/// components than the heading's level or be empty.
pub fn number_at(headings: &[HeadingEntry], k: usize) -> String {
    let Some(heading) = headings.get(k) else {
        return String::new();
    };

    let mut parts: Vec<usize> = Vec::with_capacity(heading.level as usize);
    for level in 1..=heading.level {
        if level == 1 {
            let Some(top) = nearest_at_or_before(headings, k, 1) else {
                break;
            };
            parts.push(count_level(&headings[..=top], 1));
            continue;
        }

        let Some(parent) = nearest_before(headings, k, level - 1) else {
            break;
        };
        let count = match nearest_at_or_before(headings, k, level) {
            Some(nearest) if nearest >= parent => count_level(&headings[parent..=nearest], level),
            _ => 0,
        };
        parts.push(count);
    }

    parts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

fn nearest_at_or_before(headings: &[HeadingEntry], k: usize, level: u8) -> Option<usize> {
    (0..=k).rev().find(|&ix| headings[ix].level == level)
}

fn nearest_before(headings: &[HeadingEntry], k: usize, level: u8) -> Option<usize> {
    (0..k).rev().find(|&ix| headings[ix].level == level)
}

fn count_level(headings: &[HeadingEntry], level: u8) -> usize {
    headings.iter().filter(|h| h.level == level).count()
}

/// Numbers for every body heading, keyed by id.
pub fn heading_numbers(headings: &[HeadingEntry]) -> HashMap<String, String> {
    (0..headings.len())
        .map(|k| (headings[k].id.clone(), number_at(headings, k)))
        .collect()
}

/// Number of a single heading. Still computed over the whole document since
/// numbering is order-global.
pub fn heading_number(doc: &Document, id: &str) -> Option<String> {
    let headings = ordered_headings(doc);
    let k = headings.iter().position(|h| h.id == id)?;
    Some(number_at(&headings, k))
}

/// First heading inside the bibliography, if any.
pub fn bibliography_heading(doc: &Document) -> Option<Hit<'_>> {
    scan_with_ancestry(doc, ScanScope::All, |block, ancestry| {
        (block.is_bibliography() || ancestry.bibliography) && is_heading_like(block)
    })
    .into_iter()
    .next()
}

fn is_heading_like(block: &Block) -> bool {
    matches!(
        block.kind,
        BlockKind::Heading { .. } | BlockKind::GeneratedHeading
    )
}

/// Numbered body headings plus one unnumbered item for the bibliography
/// heading, in document order.
pub fn build_toc(doc: &Document, headings: &[HeadingEntry]) -> Vec<TocItem> {
    let mut items: Vec<TocItem> = headings
        .iter()
        .enumerate()
        .map(|(k, heading)| TocItem {
            id: heading.id.clone(),
            prefix: number_at(headings, k),
            text: heading.text.clone(),
            level: heading.level,
            path: heading.path.clone(),
        })
        .collect();

    if let Some(hit) = bibliography_heading(doc) {
        items.push(TocItem {
            id: hit.id.to_string(),
            prefix: String::new(),
            text: hit.block.text.clone(),
            level: hit.block.heading_level().unwrap_or(1),
            path: hit.path,
        });
        sort_by_path(&mut items, |item| item.path.as_slice());
    }

    items
}

pub fn toc(doc: &Document) -> Vec<TocItem> {
    build_toc(doc, &ordered_headings(doc))
}

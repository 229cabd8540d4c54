use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::{Block, Document};
use crate::ops::{Op, Path, Transaction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub inverse_ops: Vec<Op>,
    pub selection_before: Selection,
    pub selection_after: Selection,
    pub source: Option<String>,
}

#[derive(Debug, Default)]
pub struct EditorConfig {
    pub max_undo: usize,
}

impl EditorConfig {
    fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        self
    }
}

#[derive(Debug, Error)]
pub enum PathError {
    #[error("Empty path")]
    Empty,
    #[error("Path out of bounds at depth {depth}: {index} >= {len}")]
    OutOfBounds {
        depth: usize,
        index: usize,
        len: usize,
    },
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),
    #[error("Stale transaction: based on revision {expected}, document is at {actual}")]
    StaleRevision { expected: u64, actual: u64 },
}

/// Owns a document and applies transactions to it. Every applied
/// transaction becomes exactly one undo record.
pub struct Editor {
    doc: Document,
    selection: Selection,
    config: EditorConfig,
    revision: u64,
    focused: bool,
    undo_stack: Vec<UndoRecord>,
    redo_stack: Vec<UndoRecord>,
}

impl Editor {
    pub fn new(doc: Document) -> Self {
        Self::with_config(doc, EditorConfig::default())
    }

    pub fn with_config(doc: Document, config: EditorConfig) -> Self {
        Self {
            doc,
            selection: Selection::collapsed(Point::new(vec![0], 0)),
            config: config.with_defaults(),
            revision: 0,
            focused: false,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_sources(&self) -> impl Iterator<Item = Option<&str>> {
        self.undo_stack.iter().map(|record| record.source.as_deref())
    }

    pub fn undo(&mut self) -> bool {
        let Some(record) = self.undo_stack.pop() else {
            return false;
        };

        let UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
            source,
        } = record;

        let Ok(mut redo_ops) = self.apply_ops_atomic(inverse_ops.clone()) else {
            self.undo_stack.push(UndoRecord {
                inverse_ops,
                selection_before,
                selection_after,
                source,
            });
            return false;
        };
        redo_ops.reverse();

        self.selection = selection_before.clone();
        self.revision += 1;

        self.redo_stack.push(UndoRecord {
            inverse_ops: redo_ops,
            selection_before,
            selection_after,
            source,
        });
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(record) = self.redo_stack.pop() else {
            return false;
        };

        let UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
            source,
        } = record;

        let Ok(mut undo_ops) = self.apply_ops_atomic(inverse_ops.clone()) else {
            self.redo_stack.push(UndoRecord {
                inverse_ops,
                selection_before,
                selection_after,
                source,
            });
            return false;
        };
        undo_ops.reverse();

        self.selection = selection_after.clone();
        self.revision += 1;

        self.undo_stack.push(UndoRecord {
            inverse_ops: undo_ops,
            selection_before,
            selection_after,
            source,
        });
        true
    }

    /// Applies all ops or none of them. No normalization runs between ops.
    pub fn apply(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        if let Some(expected) = tx.base_revision {
            if expected != self.revision {
                return Err(ApplyError::StaleRevision {
                    expected,
                    actual: self.revision,
                });
            }
        }

        let selection_before = self.selection.clone();
        let mut inverse_ops = self.apply_ops_atomic(tx.ops)?;
        inverse_ops.reverse();

        if let Some(sel) = tx.selection_after {
            self.selection = sel;
        }
        let selection_after = self.selection.clone();

        self.revision += 1;
        self.undo_stack.push(UndoRecord {
            inverse_ops,
            selection_before,
            selection_after,
            source: tx.meta.source,
        });
        self.redo_stack.clear();
        if self.undo_stack.len() > self.config.max_undo {
            self.undo_stack.remove(0);
        }

        Ok(())
    }

    /// Returns the inverse ops in application order. On failure the ops that
    /// already ran are reverted and the selection restored.
    fn apply_ops_atomic(&mut self, ops: Vec<Op>) -> Result<Vec<Op>, ApplyError> {
        let selection_before = self.selection.clone();
        let mut inverse_ops: Vec<Op> = Vec::new();
        for op in ops {
            match apply_op_to(&mut self.doc, &mut self.selection, op) {
                Ok(inv) => inverse_ops.push(inv),
                Err(err) => {
                    for inv in inverse_ops.into_iter().rev() {
                        let _ = apply_op_to(&mut self.doc, &mut self.selection, inv);
                    }
                    self.selection = selection_before;
                    return Err(err);
                }
            }
        }
        Ok(inverse_ops)
    }
}

fn apply_op_to(doc: &mut Document, selection: &mut Selection, op: Op) -> Result<Op, ApplyError> {
    match op {
        Op::InsertText { path, offset, text } => {
            let block = block_mut(&mut doc.children, &path)?;
            let offset = clamp_to_char_boundary(&block.text, offset);
            block.text.insert_str(offset, &text);
            transform_selection_insert_text(selection, &path, offset, text.len());
            Ok(Op::RemoveText {
                path,
                range: offset..offset + text.len(),
            })
        }
        Op::RemoveText { path, range } => {
            let block = block_mut(&mut doc.children, &path)?;
            let start = clamp_to_char_boundary(&block.text, range.start);
            let end = clamp_to_char_boundary(&block.text, range.end);
            if start >= end {
                return Ok(Op::InsertText {
                    path,
                    offset: start,
                    text: String::new(),
                });
            }
            let removed = block.text[start..end].to_string();
            block.text.replace_range(start..end, "");
            transform_selection_remove_text(selection, &path, start..end);
            Ok(Op::InsertText {
                path,
                offset: start,
                text: removed,
            })
        }
        Op::InsertNode { path, node } => {
            insert_node(doc, &path, node)?;
            transform_selection_insert_node(selection, &path);
            Ok(Op::RemoveNode { path })
        }
        Op::RemoveNode { path } => {
            let removed = remove_node(doc, &path)?;
            transform_selection_remove_node(selection, &path);
            Ok(Op::InsertNode {
                path,
                node: removed,
            })
        }
        Op::SetCaption { path, caption } => {
            let block = block_mut(&mut doc.children, &path)?;
            let old = std::mem::replace(&mut block.markers.caption, caption);
            Ok(Op::SetCaption { path, caption: old })
        }
        Op::SetKind { path, kind } => {
            let block = block_mut(&mut doc.children, &path)?;
            let old = std::mem::replace(&mut block.kind, kind);
            Ok(Op::SetKind { path, kind: old })
        }
    }
}

fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}

fn transform_selection_insert_text(
    selection: &mut Selection,
    path: &[usize],
    offset: usize,
    len: usize,
) {
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path == path && point.offset >= offset {
            point.offset = point.offset.saturating_add(len);
        }
    }
}

fn transform_selection_remove_text(
    selection: &mut Selection,
    path: &[usize],
    range: std::ops::Range<usize>,
) {
    let removed_len = range.end.saturating_sub(range.start);
    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path != path || point.offset <= range.start {
            continue;
        }
        if point.offset >= range.end {
            point.offset = point.offset.saturating_sub(removed_len);
        } else {
            point.offset = range.start;
        }
    }
}

fn transform_selection_insert_node(selection: &mut Selection, path: &[usize]) {
    let Some((&index, parent_path)) = path.split_last() else {
        return;
    };

    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path.len() <= parent_path.len() || !point.path.starts_with(parent_path) {
            continue;
        }
        let depth = parent_path.len();
        if point.path[depth] >= index {
            point.path[depth] += 1;
        }
    }
}

fn transform_selection_remove_node(selection: &mut Selection, path: &[usize]) {
    let Some((&index, parent_path)) = path.split_last() else {
        return;
    };

    for point in [&mut selection.anchor, &mut selection.focus] {
        if point.path.len() <= parent_path.len() || !point.path.starts_with(parent_path) {
            continue;
        }
        let depth = parent_path.len();
        let ix = point.path[depth];
        if ix > index {
            point.path[depth] = ix - 1;
            continue;
        }
        if ix < index {
            continue;
        }

        // Point was inside the removed subtree. Map it to the previous sibling.
        point.path.truncate(depth + 1);
        point.path[depth] = index.saturating_sub(1);
        point.offset = 0;
    }
}

fn block_mut<'a>(children: &'a mut [Block], path: &[usize]) -> Result<&'a mut Block, PathError> {
    descend(children, path, 0)
}

fn descend<'a>(
    children: &'a mut [Block],
    path: &[usize],
    depth: usize,
) -> Result<&'a mut Block, PathError> {
    let (&ix, rest) = path.split_first().ok_or(PathError::Empty)?;
    let len = children.len();
    let block = children.get_mut(ix).ok_or(PathError::OutOfBounds {
        depth,
        index: ix,
        len,
    })?;
    if rest.is_empty() {
        Ok(block)
    } else {
        descend(&mut block.children, rest, depth + 1)
    }
}

fn children_mut<'a>(
    doc: &'a mut Document,
    parent_path: &[usize],
) -> Result<&'a mut Vec<Block>, PathError> {
    if parent_path.is_empty() {
        Ok(&mut doc.children)
    } else {
        Ok(&mut block_mut(&mut doc.children, parent_path)?.children)
    }
}

fn insert_node(doc: &mut Document, path: &[usize], node: Block) -> Result<(), PathError> {
    let (&index, parent_path) = path.split_last().ok_or(PathError::Empty)?;
    let children = children_mut(doc, parent_path)?;
    if index > children.len() {
        return Err(PathError::OutOfBounds {
            depth: parent_path.len(),
            index,
            len: children.len() + 1,
        });
    }
    children.insert(index, node);
    Ok(())
}

fn remove_node(doc: &mut Document, path: &[usize]) -> Result<Block, PathError> {
    let (&index, parent_path) = path.split_last().ok_or(PathError::Empty)?;
    let children = children_mut(doc, parent_path)?;
    if index >= children.len() {
        return Err(PathError::OutOfBounds {
            depth: parent_path.len(),
            index,
            len: children.len(),
        });
    }
    Ok(children.remove(index))
}

use std::collections::BTreeSet;

use manos_doc_core::{ApplyError, Document, Editor, Path, Point, Selection, Transaction};

use crate::visibility::VisibilitySink;

/// What the indexer needs from the host editing surface.
pub trait Surface {
    type Handle;

    fn document(&self) -> &Document;

    /// Bumped by every successful mutation.
    fn revision(&self) -> u64;

    fn path_of(&self, id: &str) -> Option<Path> {
        self.document().path_of(id)
    }

    /// Applies the whole transaction as one edit, or nothing.
    fn mutate(&mut self, tx: Transaction) -> Result<(), ApplyError>;

    /// `None` for blocks that are gone or not rendered.
    fn resolve_render_handle(&self, id: &str) -> Option<Self::Handle>;

    fn scroll_into_view(&mut self, handle: &Self::Handle);

    fn selection_start(&self, _path: &[usize]) -> Option<Point> {
        None
    }

    fn select(&mut self, _point: Point) {}

    fn focus(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderHandle {
    pub id: String,
    pub path: Path,
}

/// In-process surface over a [`Editor`], with a minimal render state that
/// records hidden ids and scroll requests.
pub struct EditorSurface {
    editor: Editor,
    hidden: BTreeSet<String>,
    scrolled_to: Option<RenderHandle>,
}

impl EditorSurface {
    pub fn new(editor: Editor) -> Self {
        Self {
            editor,
            hidden: BTreeSet::new(),
            scrolled_to: None,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn hidden(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    pub fn scrolled_to(&self) -> Option<&RenderHandle> {
        self.scrolled_to.as_ref()
    }
}

impl Surface for EditorSurface {
    type Handle = RenderHandle;

    fn document(&self) -> &Document {
        self.editor.doc()
    }

    fn revision(&self) -> u64 {
        self.editor.revision()
    }

    fn mutate(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        self.editor.apply(tx)
    }

    fn resolve_render_handle(&self, id: &str) -> Option<RenderHandle> {
        let path = self.editor.doc().path_of(id)?;
        Some(RenderHandle {
            id: id.to_string(),
            path,
        })
    }

    fn scroll_into_view(&mut self, handle: &RenderHandle) {
        self.scrolled_to = Some(handle.clone());
    }

    fn selection_start(&self, path: &[usize]) -> Option<Point> {
        self.editor.doc().block(path)?;
        Some(Point::new(path.to_vec(), 0))
    }

    fn select(&mut self, point: Point) {
        self.editor.set_selection(Selection::collapsed(point));
    }

    fn focus(&mut self) {
        self.editor.focus();
    }
}

impl VisibilitySink for EditorSurface {
    fn set_hidden(&mut self, id: &str, hidden: bool) {
        if hidden {
            self.hidden.insert(id.to_string());
        } else {
            self.hidden.remove(id);
        }
    }
}

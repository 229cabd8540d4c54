use manos_doc_core::Path;
use serde::{Deserialize, Serialize};

use crate::surface::Surface;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum NavTarget {
    Id(String),
    Path(Path),
}

/// Scrolls to the target block and puts the caret at its start.
///
/// Ids are resolved against the current document, so a target captured
/// before an edit still lands correctly. Returns false, without touching the
/// surface, when the target no longer exists.
pub fn navigate<S: Surface>(surface: &mut S, target: &NavTarget) -> bool {
    let (id, path) = match target {
        NavTarget::Id(id) => {
            let Some(path) = surface.path_of(id) else {
                return false;
            };
            (id.clone(), path)
        }
        NavTarget::Path(path) => {
            let Some(id) = surface
                .document()
                .block(path)
                .and_then(|block| block.id())
                .map(str::to_string)
            else {
                return false;
            };
            (id, path.clone())
        }
    };

    if let Some(handle) = surface.resolve_render_handle(&id) {
        surface.scroll_into_view(&handle);
    }
    if let Some(point) = surface.selection_start(&path) {
        surface.select(point);
        surface.focus();
    }
    true
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ops::Path;

pub const MAX_HEADING_LEVEL: u8 = 6;

/// Which generated list a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Tables,
    Figures,
    Bibliography,
}

impl ListKind {
    pub const ALL: [ListKind; 3] = [ListKind::Tables, ListKind::Figures, ListKind::Bibliography];

    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::Tables => "tables",
            ListKind::Figures => "figures",
            ListKind::Bibliography => "bibliography",
        }
    }
}

/// Closed set of block kinds. Serialized as the concrete tag returned by
/// [`BlockKind::tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BlockKind {
    Heading { level: u8 },
    Paragraph,
    Table,
    TableRow,
    TableCell,
    Figure,
    Citation,
    CommentAnchor,
    GeneratedHeading,
    GeneratedEntry,
}

impl BlockKind {
    pub fn heading(level: u8) -> Self {
        BlockKind::Heading {
            level: level.clamp(1, MAX_HEADING_LEVEL),
        }
    }

    /// Concrete tag for a logical kind.
    pub fn tag(&self) -> &'static str {
        match self {
            BlockKind::Heading { level } => match level {
                0 | 1 => "h1",
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            },
            BlockKind::Paragraph => "paragraph",
            BlockKind::Table => "table",
            BlockKind::TableRow => "table_row",
            BlockKind::TableCell => "table_cell",
            BlockKind::Figure => "figure",
            BlockKind::Citation => "citation",
            BlockKind::CommentAnchor => "comment_anchor",
            BlockKind::GeneratedHeading => "generated_heading",
            BlockKind::GeneratedEntry => "generated_entry",
        }
    }

    /// Inverse of [`BlockKind::tag`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "h1" => BlockKind::heading(1),
            "h2" => BlockKind::heading(2),
            "h3" => BlockKind::heading(3),
            "h4" => BlockKind::heading(4),
            "h5" => BlockKind::heading(5),
            "h6" => BlockKind::heading(6),
            "paragraph" => BlockKind::Paragraph,
            "table" => BlockKind::Table,
            "table_row" => BlockKind::TableRow,
            "table_cell" => BlockKind::TableCell,
            "figure" => BlockKind::Figure,
            "citation" => BlockKind::Citation,
            "comment_anchor" => BlockKind::CommentAnchor,
            "generated_heading" => BlockKind::GeneratedHeading,
            "generated_entry" => BlockKind::GeneratedEntry,
            _ => return None,
        };
        Some(kind)
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self {
            BlockKind::Heading { level } => Some(*level),
            _ => None,
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, BlockKind::Heading { .. })
    }

    /// Only real headings open a collapsible scope.
    pub fn is_collapsible(&self) -> bool {
        self.is_heading()
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl From<BlockKind> for String {
    fn from(kind: BlockKind) -> Self {
        kind.tag().to_string()
    }
}

impl TryFrom<String> for BlockKind {
    type Error = String;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        BlockKind::from_tag(&tag).ok_or_else(|| format!("Unknown block kind: {tag}"))
    }
}

/// Role markers carried by a block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<ListKind>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bibliography: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Id of the block a generated entry points at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Markers {
    pub fn is_empty(&self) -> bool {
        *self == Markers::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub kind: BlockKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Markers::is_empty")]
    pub markers: Markers,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: Some(id.into()),
            kind,
            text: String::new(),
            markers: Markers::default(),
            children: Vec::new(),
        }
    }

    pub fn heading(id: impl Into<String>, level: u8, text: impl Into<String>) -> Self {
        Self::new(id, BlockKind::heading(level)).with_text(text)
    }

    pub fn paragraph(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, BlockKind::Paragraph).with_text(text)
    }

    pub fn table(id: impl Into<String>, caption: impl Into<String>) -> Self {
        Self::new(id, BlockKind::Table).with_caption(caption)
    }

    pub fn figure(id: impl Into<String>, caption: impl Into<String>) -> Self {
        Self::new(id, BlockKind::Figure).with_caption(caption)
    }

    pub fn citation(id: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::new(id, BlockKind::Citation).with_caption(reference)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.markers.caption = Some(caption.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    pub fn generated(mut self, list: ListKind) -> Self {
        self.markers.generated = Some(list);
        self
    }

    pub fn bibliography(mut self) -> Self {
        self.markers.bibliography = true;
        self
    }

    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn heading_level(&self) -> Option<u8> {
        self.kind.heading_level()
    }

    pub fn caption(&self) -> &str {
        self.markers.caption.as_deref().unwrap_or("")
    }

    pub fn is_generated(&self) -> bool {
        self.markers.generated.is_some()
    }

    pub fn is_bibliography(&self) -> bool {
        self.markers.bibliography
    }
}

/// Markers inherited from a block's ancestors (the block itself excluded).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ancestry {
    pub depth: usize,
    pub generated: Option<ListKind>,
    pub bibliography: bool,
}

impl Ancestry {
    fn child_of(&self, parent: &Block) -> Self {
        Self {
            depth: self.depth + 1,
            generated: self.generated.or(parent.markers.generated),
            bibliography: self.bibliography || parent.markers.bibliography,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Block>,
}

impl Document {
    pub fn new(children: Vec<Block>) -> Self {
        Self { children }
    }

    /// Filtered traversal. Results come back in stack order, not document
    /// order; callers that need reading order must sort by path.
    pub fn scan<'a>(
        &'a self,
        mut predicate: impl FnMut(&Block, &Ancestry) -> bool,
    ) -> Vec<(&'a Block, Path)> {
        let mut out = Vec::new();
        let mut stack: Vec<(&'a Block, Path, Ancestry)> = self
            .children
            .iter()
            .enumerate()
            .map(|(ix, block)| (block, vec![ix], Ancestry::default()))
            .collect();

        while let Some((block, path, ancestry)) = stack.pop() {
            if predicate(block, &ancestry) {
                out.push((block, path.clone()));
            }
            let child_ancestry = ancestry.child_of(block);
            for (ix, child) in block.children.iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(ix);
                stack.push((child, child_path, child_ancestry));
            }
        }
        out
    }

    pub fn block(&self, path: &[usize]) -> Option<&Block> {
        let (&first, rest) = path.split_first()?;
        let mut block = self.children.get(first)?;
        for &ix in rest {
            block = block.children.get(ix)?;
        }
        Some(block)
    }

    pub fn path_of(&self, id: &str) -> Option<Path> {
        fn walk(children: &[Block], id: &str, path: &mut Path) -> bool {
            for (ix, block) in children.iter().enumerate() {
                path.push(ix);
                if block.id() == Some(id) || walk(&block.children, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        walk(&self.children, id, &mut path).then_some(path)
    }

    pub fn find(&self, id: &str) -> Option<&Block> {
        self.path_of(id).and_then(|path| self.block(&path))
    }
}

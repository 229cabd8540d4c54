use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::scan::Hit;

/// Order-sensitive fingerprint of a set of scanned blocks.
///
/// Keeps the entries themselves so equality is exact; the digest only
/// short-circuits the common unequal case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    digest: u64,
    entries: Vec<(String, String)>,
}

impl Signature {
    pub fn from_entries(entries: Vec<(String, String)>) -> Self {
        let mut hasher = DefaultHasher::new();
        entries.hash(&mut hasher);
        Self {
            digest: hasher.finish(),
            entries,
        }
    }

    /// `(id, kind)` pairs.
    pub fn structural(hits: &[Hit<'_>]) -> Self {
        Self::from_entries(
            hits.iter()
                .map(|hit| (hit.id.to_string(), hit.block.kind.tag().to_string()))
                .collect(),
        )
    }

    /// `(id, caption)` pairs.
    pub fn content(hits: &[Hit<'_>]) -> Self {
        Self::from_entries(
            hits.iter()
                .map(|hit| (hit.id.to_string(), hit.block.caption().to_string()))
                .collect(),
        )
    }

    /// `(id, kind + text)` pairs, for views that render block text.
    pub fn with_text(hits: &[Hit<'_>]) -> Self {
        Self::from_entries(
            hits.iter()
                .map(|hit| {
                    (
                        hit.id.to_string(),
                        format!("{}\u{1f}{}", hit.block.kind.tag(), hit.block.text),
                    )
                })
                .collect(),
        )
    }
}

/// Caches a derived value and recomputes it only when its signature changes.
#[derive(Debug, Clone)]
pub struct Memo<T> {
    signature: Option<Signature>,
    value: T,
}

impl<T: Default> Default for Memo<T> {
    fn default() -> Self {
        Self {
            signature: None,
            value: T::default(),
        }
    }
}

impl<T> Memo<T> {
    /// Returns true when `compute` ran.
    pub fn update(&mut self, signature: Signature, compute: impl FnOnce() -> T) -> bool {
        if self.signature.as_ref() == Some(&signature) {
            return false;
        }
        self.value = compute();
        self.signature = Some(signature);
        true
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn invalidate(&mut self) {
        self.signature = None;
    }
}

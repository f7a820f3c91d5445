//! Diagnostic labels for live allocations.
//!
//! [`LabelRegistry`] maps a chunk's header offset to a human-readable label
//! such as `"texture data - assets/brick.png"`. Labels play no part in
//! allocator correctness; they exist so chunk listings can say who owns
//! what.

use indexmap::IndexMap;

/// Label reported for chunks with no registry entry.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Header offset → label mapping, kept in insertion order.
#[derive(Clone, Debug, Default)]
pub struct LabelRegistry {
    enabled: bool,
    labels: IndexMap<u32, String>,
}

impl LabelRegistry {
    /// Create a registry. A disabled registry ignores every insert.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            labels: IndexMap::new(),
        }
    }

    /// Whether labels are being recorded.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Attach `label` to the chunk whose header sits at `header`.
    ///
    /// Replaces any previous label at the same offset.
    pub fn insert(&mut self, header: u32, label: &str) {
        if self.enabled {
            self.labels.insert(header, label.to_owned());
        }
    }

    /// Drop the label for `header`, returning it if one existed.
    pub fn remove(&mut self, header: u32) -> Option<String> {
        self.labels.shift_remove(&header)
    }

    /// Label for `header`, if any.
    pub fn get(&self, header: u32) -> Option<&str> {
        self.labels.get(&header).map(String::as_str)
    }

    /// Label for `header`, or [`UNKNOWN_LABEL`].
    pub fn get_or_unknown(&self, header: u32) -> &str {
        self.get(header).unwrap_or(UNKNOWN_LABEL)
    }

    /// Iterate `(header, label)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.labels.iter().map(|(&off, label)| (off, label.as_str()))
    }

    /// Whether no chunk is labelled.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

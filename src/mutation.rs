//! DOM Mutation Watcher
//!
//! Filters host insertion batches down to image elements that match the
//! lazy-loading contract and are not yet tracked. Idempotence comes from the
//! registry's node-identity lookup, not from re-scanning the document.

use std::collections::HashSet;

use crate::slot::{ImageElement, SlotRegistry};

/// Discovery filter shared by the initial scan and insertion batches.
#[derive(Debug, Default)]
pub struct MutationWatcher;

impl MutationWatcher {
    pub fn new() -> Self {
        Self
    }

    /// Keep elements that ask for lazy loading and have not been seen, in
    /// batch order. A node delivered twice in one batch is kept once.
    pub fn filter_new(
        &self,
        batch: Vec<ImageElement>,
        registry: &SlotRegistry,
    ) -> Vec<ImageElement> {
        let mut seen = HashSet::new();
        batch
            .into_iter()
            .filter(|element| {
                element.wants_lazy_load()
                    && !registry.contains_node(element.node)
                    && seen.insert(element.node)
            })
            .collect()
    }
}

//! Visibility Observer
//!
//! One shared watcher for every observed slot. A slot fires once, the first
//! time enough of it intersects the margin-expanded viewport, and is
//! unobserved in the same step so it can never re-trigger.

use crate::slot::{Rect, SlotId};

/// Viewport in page coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Grow by a margin on every side (pre-trigger region).
    #[inline]
    pub fn expand(&self, margin: f32) -> Viewport {
        Viewport {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }

    #[inline]
    fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
}

/// Fraction of a rect lying inside the viewport, in 0.0..=1.0. Degenerate
/// rects count as fully visible when their anchor point is inside.
fn visible_fraction(rect: &Rect, viewport: &Viewport) -> f32 {
    let overlap_w = (rect.x + rect.width).min(viewport.right()) - rect.x.max(viewport.x);
    let overlap_h = (rect.y + rect.height).min(viewport.bottom()) - rect.y.max(viewport.y);
    if overlap_w <= 0.0 || overlap_h <= 0.0 {
        if rect.width <= 0.0 && rect.height <= 0.0 && viewport.contains_point(rect.x, rect.y) {
            return 1.0;
        }
        return 0.0;
    }
    let area = rect.width * rect.height;
    if area <= 0.0 {
        return 1.0;
    }
    (overlap_w * overlap_h) / area
}

/// Shared watcher over every observed slot.
#[derive(Debug)]
pub struct VisibilityObserver {
    margin: f32,
    threshold: f32,
    // Insertion order is preserved so downstream admission stays FIFO for
    // slots that become visible in the same update.
    watched: Vec<(SlotId, Rect)>,
}

impl VisibilityObserver {
    pub fn new(margin: f32, threshold: f32) -> Self {
        Self {
            margin,
            threshold,
            watched: Vec::new(),
        }
    }

    /// Start watching a slot. Observing an already-watched slot is a no-op.
    pub fn observe(&mut self, id: SlotId, rect: Rect) {
        if !self.is_watching(id) {
            self.watched.push((id, rect));
        }
    }

    /// Stop watching a slot.
    pub fn unobserve(&mut self, id: SlotId) {
        self.watched.retain(|(watched, _)| *watched != id);
    }

    pub fn is_watching(&self, id: SlotId) -> bool {
        self.watched.iter().any(|(watched, _)| *watched == id)
    }

    /// Number of slots currently watched.
    pub fn watched(&self) -> usize {
        self.watched.len()
    }

    /// Report slots crossing into the pre-trigger region, unobserving each
    /// as it fires (one-shot).
    pub fn update(&mut self, viewport: Viewport) -> Vec<SlotId> {
        let expanded = viewport.expand(self.margin);
        let threshold = self.threshold;
        let mut hits = Vec::new();
        self.watched.retain(|(id, rect)| {
            let fraction = visible_fraction(rect, &expanded);
            if fraction > 0.0 && fraction >= threshold {
                hits.push(*id);
                false
            } else {
                true
            }
        });
        hits
    }

    /// Drop every watched slot.
    pub fn clear(&mut self) {
        self.watched.clear();
    }
}

//! Image Slots
//!
//! One managed image presentation point, tracked from discovery to a
//! terminal state, plus the arena-backed registry that maps host node
//! identities to tracked slots.

use std::collections::HashMap;

use crate::resolve::ImageRole;

/// Host node identity
pub type NodeId = u32;

/// State marker applied while a slot waits for its load.
pub const LOADING_CLASS: &str = "lazy-loading";

/// State marker applied once the real source is in place.
pub const LOADED_CLASS: &str = "lazy-loaded";

/// State marker applied when the load ends in failure.
pub const ERROR_CLASS: &str = "lazy-error";

/// Handle to a tracked slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub u32);

/// Lifecycle of one load attempt. Transitions are monotonic; `Loaded` and
/// `Errored` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Discovered, placeholder applied, not yet observed.
    Placeholder,
    /// Waiting for a visibility transition.
    Observed,
    /// Visible, waiting for a concurrency slot.
    Queued,
    /// Handed to the loader.
    Loading,
    /// Real source swapped in.
    Loaded,
    /// Load failed or timed out.
    Errored,
}

impl SlotState {
    /// Has the slot finished its load attempt?
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SlotState::Loaded | SlotState::Errored)
    }
}

/// Bounding rect of a slot in page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// An image presentation element as the host describes it, with the
/// presentation fields this pipeline mutates (source, state markers,
/// fade-in flag).
#[derive(Debug, Clone, Default)]
pub struct ImageElement {
    /// Host node identity.
    pub node: NodeId,
    /// Currently presented source.
    pub src: String,
    /// Deferred source, cleared once the real source is swapped in.
    pub data_src: Option<String>,
    /// Explicit lazy-loading marker.
    pub lazy_marker: bool,
    /// Declared width, used for placeholder sizing.
    pub width: Option<u32>,
    /// Declared height, used for placeholder sizing.
    pub height: Option<u32>,
    /// Class list, including pipeline state markers.
    pub classes: Vec<String>,
    /// Class of the enclosing element, a role hint.
    pub parent_class: Option<String>,
    /// Cover-fit styling, a background-role hint.
    pub object_fit_cover: bool,
    /// Bounding rect for visibility testing.
    pub rect: Rect,
    /// Set when the loaded source should fade in.
    pub fade_in: bool,
}

impl ImageElement {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            ..Default::default()
        }
    }

    pub fn with_src(mut self, src: &str) -> Self {
        self.src = src.to_string();
        self
    }

    pub fn with_data_src(mut self, src: &str) -> Self {
        self.data_src = Some(src.to_string());
        self
    }

    pub fn with_lazy_marker(mut self) -> Self {
        self.lazy_marker = true;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_parent_class(mut self, class: &str) -> Self {
        self.parent_class = Some(class.to_string());
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Does this element ask for deferred loading?
    pub fn wants_lazy_load(&self) -> bool {
        self.data_src.is_some() || self.lazy_marker
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }
}

/// One tracked slot
#[derive(Debug)]
pub struct Slot {
    pub id: SlotId,
    pub element: ImageElement,
    pub role: ImageRole,
    pub state: SlotState,
    /// Author-supplied source, captured at registration.
    pub original: Option<String>,
}

/// Arena of tracked slots with a node-identity lookup, so the node-to-slot
/// mapping is inspectable instead of hidden in callback captures.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    slots: Vec<Option<Slot>>,
    by_node: HashMap<NodeId, SlotId>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an element. Re-inserting a node already tracked returns the
    /// existing slot unchanged.
    pub fn insert(&mut self, element: ImageElement, role: ImageRole) -> SlotId {
        if let Some(&id) = self.by_node.get(&element.node) {
            return id;
        }
        let id = SlotId(self.slots.len() as u32);
        let original = element.data_src.clone().or_else(|| {
            (!element.src.is_empty() && !element.src.starts_with("data:"))
                .then(|| element.src.clone())
        });
        self.by_node.insert(element.node, id);
        self.slots.push(Some(Slot {
            id,
            element,
            role,
            state: SlotState::Placeholder,
            original,
        }));
        id
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.by_node.contains_key(&node)
    }

    pub fn lookup(&self, node: NodeId) -> Option<SlotId> {
        self.by_node.get(&node).copied()
    }

    pub fn get(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.slots.get_mut(id.0 as usize)?.as_mut()
    }

    /// Stop tracking a node, returning its slot.
    pub fn remove(&mut self, node: NodeId) -> Option<Slot> {
        let id = self.by_node.remove(&node)?;
        self.slots.get_mut(id.0 as usize)?.take()
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.by_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }
}

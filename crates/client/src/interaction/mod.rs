//! Pointer, touch and click interactions, and whether the loader may act on them.

pub mod links;

use page_loader_core::{Document, NodeId};

pub use links::{closest_internal_link, link_is_permissible_for_click, link_is_permissible_for_prefetch};

/// What kind of input produced the interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Click,
    MouseDown,
    TouchStart,
}

/// Modifier keys held during the interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    /// Any modifier signals the user wants the link opened elsewhere.
    pub fn any(&self) -> bool {
        self.alt || self.ctrl || self.meta || self.shift
    }
}

/// An input event targeted at a node of the live document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub kind: InteractionKind,
    pub target: NodeId,
    pub modifiers: Modifiers,
    pub default_prevented: bool,
}

impl Interaction {
    pub fn new(kind: InteractionKind, target: NodeId) -> Self {
        Self { kind, target, modifiers: Modifiers::default(), default_prevented: false }
    }

    pub fn click(target: NodeId) -> Self {
        Self::new(InteractionKind::Click, target)
    }

    pub fn mouse_down(target: NodeId) -> Self {
        Self::new(InteractionKind::MouseDown, target)
    }

    pub fn touch_start(target: NodeId) -> Self {
        Self::new(InteractionKind::TouchStart, target)
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

/// Rejects chorded, already-handled, and editable-target interactions.
pub fn interaction_is_permissible(event: &Interaction, document: &Document) -> bool {
    !(event.modifiers.any() || event.default_prevented || is_content_editable(document, event.target))
}

/// Resolves `contenteditable` inheritance from the nearest ancestor that sets it.
fn is_content_editable(document: &Document, target: NodeId) -> bool {
    for el in document.ancestors(target) {
        match el.attr("contenteditable").map(str::to_ascii_lowercase).as_deref() {
            Some("" | "true" | "plaintext-only") => return true,
            Some("false") => return false,
            _ => {}
        }
    }
    false
}

//! The browsing context the loader drives.
//!
//! [`Window`] covers everything outside the document tree: the history
//! stack, scroll offset, hard navigation, the resource loader used for
//! prefetch hints, network conditions, and transition-end notifications from
//! the rendering layer.

mod headless;

use page_loader_core::NodeId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use url::Url;

pub use headless::{HeadlessWindow, TransitionMode};

/// State stored with each history entry the loader creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    pub path: String,
}

impl HistoryState {
    pub fn new(location: &Url) -> Self {
        Self { path: location.to_string() }
    }

    /// The stored location, if it parses.
    pub fn location(&self) -> Option<Url> {
        Url::parse(&self.path).ok()
    }
}

/// Network conditions reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub save_data: bool,
    pub effective_type: Option<String>,
}

impl ConnectionInfo {
    /// False when the user asked to save data or the link is 2g-class.
    pub fn is_ok_for_prefetching(&self) -> bool {
        let slow = self
            .effective_type
            .as_deref()
            .is_some_and(|kind| kind.contains("2g"));
        !(self.save_data || slow)
    }
}

/// A finished CSS transition on one property of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEnd {
    pub target: NodeId,
    pub property_name: String,
}

/// Host browsing context.
pub trait Window: Send + Sync {
    /// The address currently shown.
    fn location(&self) -> Url;

    /// State of the current history entry.
    fn history_state(&self) -> Option<HistoryState>;

    fn history_len(&self) -> usize;

    /// Add a history entry and make it current.
    fn push_state(&self, state: HistoryState, url: &Url);

    /// Overwrite the current history entry.
    fn replace_state(&self, state: HistoryState, url: &Url);

    fn scroll_y(&self) -> f64;

    fn scroll_to(&self, y: f64);

    /// Leave the page with a full, native navigation.
    fn assign(&self, location: &Url);

    /// Hand a prefetch hint to the host's resource loader.
    fn prefetch(&self, location: &Url);

    /// Network conditions, if the host exposes them.
    fn connection(&self) -> Option<ConnectionInfo>;

    /// Subscribe to transition-end notifications.
    fn transition_events(&self) -> broadcast::Receiver<TransitionEnd>;

    /// Tell the rendering layer that an element's transition markers changed.
    fn style_changed(&self, element: NodeId);
}

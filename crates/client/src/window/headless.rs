//! In-process [`Window`] for hosts without a browser.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use page_loader_core::NodeId;
use tokio::sync::broadcast;
use url::Url;

use super::{ConnectionInfo, HistoryState, TransitionEnd, Window};

const TRANSITION_CHANNEL_CAPACITY: usize = 64;
const TRANSITION_PROPERTY: &str = "opacity";

/// How the headless rendering layer answers transition markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionMode {
    /// The opacity transition ends as soon as a marker changes.
    Immediate,
    /// The opacity transition ends after the given duration.
    After(Duration),
    /// No transition is defined; waits fall back to their timeout.
    Never,
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    url: Url,
    state: Option<HistoryState>,
}

#[derive(Debug)]
struct WindowState {
    entries: Vec<HistoryEntry>,
    index: usize,
    scroll_y: f64,
    assigned: Vec<Url>,
    prefetch_requests: Vec<Url>,
}

/// History, scroll, and transition bookkeeping kept in memory.
pub struct HeadlessWindow {
    state: Mutex<WindowState>,
    transitions: broadcast::Sender<TransitionEnd>,
    mode: TransitionMode,
    connection: Option<ConnectionInfo>,
}

impl HeadlessWindow {
    pub fn new(location: Url) -> Self {
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(WindowState {
                entries: vec![HistoryEntry { url: location, state: None }],
                index: 0,
                scroll_y: 0.0,
                assigned: Vec::new(),
                prefetch_requests: Vec::new(),
            }),
            transitions,
            mode: TransitionMode::Immediate,
            connection: None,
        }
    }

    pub fn with_transition_mode(mut self, mode: TransitionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_connection(mut self, connection: ConnectionInfo) -> Self {
        self.connection = Some(connection);
        self
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Step back one history entry. Returns false at the start of history.
    ///
    /// The host is expected to call the loader's pop-state router afterwards.
    pub fn back(&self) -> bool {
        let mut state = self.lock();
        if state.index == 0 {
            return false;
        }
        state.index -= 1;
        true
    }

    /// Step forward one history entry. Returns false at the end of history.
    pub fn forward(&self) -> bool {
        let mut state = self.lock();
        if state.index + 1 >= state.entries.len() {
            return false;
        }
        state.index += 1;
        true
    }

    /// Locations handed to [`Window::assign`], oldest first.
    pub fn assigned(&self) -> Vec<Url> {
        self.lock().assigned.clone()
    }

    /// Locations handed to [`Window::prefetch`], oldest first.
    pub fn prefetch_requests(&self) -> Vec<Url> {
        self.lock().prefetch_requests.clone()
    }

    /// Report a finished transition, as a rendering engine would.
    pub fn fire_transition_end(&self, target: NodeId, property_name: &str) {
        let _ = self
            .transitions
            .send(TransitionEnd { target, property_name: property_name.to_string() });
    }
}

impl Window for HeadlessWindow {
    fn location(&self) -> Url {
        let state = self.lock();
        state.entries[state.index].url.clone()
    }

    fn history_state(&self) -> Option<HistoryState> {
        let state = self.lock();
        state.entries[state.index].state.clone()
    }

    fn history_len(&self) -> usize {
        self.lock().entries.len()
    }

    fn push_state(&self, history_state: HistoryState, url: &Url) {
        let mut state = self.lock();
        let next = state.index + 1;
        state.entries.truncate(next);
        state.entries.push(HistoryEntry { url: url.clone(), state: Some(history_state) });
        state.index = next;
    }

    fn replace_state(&self, history_state: HistoryState, url: &Url) {
        let mut state = self.lock();
        let index = state.index;
        state.entries[index] = HistoryEntry { url: url.clone(), state: Some(history_state) };
    }

    fn scroll_y(&self) -> f64 {
        self.lock().scroll_y
    }

    fn scroll_to(&self, y: f64) {
        self.lock().scroll_y = y.max(0.0);
    }

    fn assign(&self, location: &Url) {
        tracing::debug!(%location, "hard navigation");
        self.lock().assigned.push(location.clone());
    }

    fn prefetch(&self, location: &Url) {
        self.lock().prefetch_requests.push(location.clone());
    }

    fn connection(&self) -> Option<ConnectionInfo> {
        self.connection.clone()
    }

    fn transition_events(&self) -> broadcast::Receiver<TransitionEnd> {
        self.transitions.subscribe()
    }

    fn style_changed(&self, element: NodeId) {
        match self.mode {
            TransitionMode::Immediate => self.fire_transition_end(element, TRANSITION_PROPERTY),
            TransitionMode::After(delay) => {
                let transitions = self.transitions.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = transitions
                        .send(TransitionEnd { target: element, property_name: TRANSITION_PROPERTY.to_string() });
                });
            }
            TransitionMode::Never => {}
        }
    }
}

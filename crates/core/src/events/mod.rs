//! Lifecycle signals and the component registry.
//!
//! The loader announces each step of a navigation as a named signal. Every
//! registered component sees the event in registration order, together with
//! the live document, and may suppress the default action of a cancelable
//! signal. Non-cancelable signals are after-the-fact notifications.

pub mod components;
pub mod signal;

pub use components::{CacheRefresher, Component, Listener, LoadingIndicator, Refresher};
pub use signal::{Event, Signal, SignalKind};

use crate::dom::{Document, NodeId};

/// Options for a single dispatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOptions {
    pub cancelable: bool,
    /// Explicit target; `None` dispatches from the document root.
    pub target: Option<NodeId>,
}

impl DispatchOptions {
    pub fn cancelable(cancelable: bool) -> Self {
        Self { cancelable, target: None }
    }
}

/// Delivers lifecycle signals to registered components.
#[derive(Default)]
pub struct EventGateway {
    components: Vec<Component>,
}

impl EventGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, component: Component) {
        self.components.push(component);
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Dispatch `signal` to every component.
    ///
    /// Returns `false` if and only if the signal was cancelable and a
    /// component suppressed it.
    pub fn dispatch(&mut self, signal: Signal<'_>, options: DispatchOptions, document: &mut Document) -> bool {
        let mut event = Event::new(signal, options.cancelable, options.target);
        for component in &mut self.components {
            component.handle(&mut event, document);
        }

        let allowed = !event.default_prevented();
        if !allowed {
            tracing::debug!(signal = event.name(), "default action suppressed by listener");
        }
        allowed
    }

    /// Dispatch from the document root.
    pub fn notify(&mut self, signal: Signal<'_>, cancelable: bool, document: &mut Document) -> bool {
        self.dispatch(signal, DispatchOptions::cancelable(cancelable), document)
    }
}

/// The live page: its document plus the components listening to it.
pub struct Page {
    pub document: Document,
    pub events: EventGateway,
}

impl Page {
    pub fn new(document: Document) -> Self {
        Self { document, events: EventGateway::new() }
    }

    /// Dispatch `signal` against the live document.
    pub fn notify(&mut self, signal: Signal<'_>, cancelable: bool) -> bool {
        self.events.notify(signal, cancelable, &mut self.document)
    }
}

//! Named lifecycle signals and the event wrapper listeners receive.

use url::Url;

use crate::cache::Visit;
use crate::dom::{Link, NodeId};

/// A lifecycle signal with its detail payload.
#[derive(Debug, Clone, Copy)]
pub enum Signal<'a> {
    /// A prefetch candidate passed classification.
    BeforePrefetch { location: &'a Url },
    /// A navigable click passed classification.
    Click { link: &'a Link },
    /// A navigation attempt is about to begin.
    BeforeNavigation { location: &'a Url },
    /// The resolved visit is about to replace the content.
    BeforeLoad { visit: &'a Visit },
    /// The outgoing page is about to be snapshotted into the cache.
    BeforeCache,
    /// Both content roots are in the document, mid-swap.
    BetweenContent { old_content: NodeId, new_content: NodeId },
    /// The navigation has fully settled.
    Load { visit: &'a Visit },
}

/// Payload-free discriminant of a [`Signal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    BeforePrefetch,
    Click,
    BeforeNavigation,
    BeforeLoad,
    BeforeCache,
    BetweenContent,
    Load,
}

impl SignalKind {
    pub fn name(self) -> &'static str {
        match self {
            SignalKind::BeforePrefetch => "page-loader:before-prefetch",
            SignalKind::Click => "page-loader:click",
            SignalKind::BeforeNavigation => "page-loader:before-navigation",
            SignalKind::BeforeLoad => "page-loader:before-load",
            SignalKind::BeforeCache => "page-loader:before-cache",
            SignalKind::BetweenContent => "page-loader:between-content",
            SignalKind::Load => "page-loader:load",
        }
    }
}

impl Signal<'_> {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::BeforePrefetch { .. } => SignalKind::BeforePrefetch,
            Signal::Click { .. } => SignalKind::Click,
            Signal::BeforeNavigation { .. } => SignalKind::BeforeNavigation,
            Signal::BeforeLoad { .. } => SignalKind::BeforeLoad,
            Signal::BeforeCache => SignalKind::BeforeCache,
            Signal::BetweenContent { .. } => SignalKind::BetweenContent,
            Signal::Load { .. } => SignalKind::Load,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// A dispatched signal as seen by listeners.
#[derive(Debug)]
pub struct Event<'a> {
    signal: Signal<'a>,
    cancelable: bool,
    target: Option<NodeId>,
    default_prevented: bool,
}

impl<'a> Event<'a> {
    pub(crate) fn new(signal: Signal<'a>, cancelable: bool, target: Option<NodeId>) -> Self {
        Self { signal, cancelable, target, default_prevented: false }
    }

    pub fn signal(&self) -> &Signal<'a> {
        &self.signal
    }

    pub fn kind(&self) -> SignalKind {
        self.signal.kind()
    }

    pub fn name(&self) -> &'static str {
        self.signal.name()
    }

    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Suppress the default action. Ignored for non-cancelable signals.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

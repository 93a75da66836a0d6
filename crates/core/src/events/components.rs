//! Built-in lifecycle components and the listener seam.

use serde::{Deserialize, Serialize};

use super::signal::{Event, Signal};
use crate::dom::Document;

/// Anything that reacts to lifecycle events.
pub trait Listener: Send {
    fn handle(&mut self, event: &mut Event<'_>, document: &mut Document);
}

impl<F> Listener for F
where
    F: FnMut(&mut Event<'_>, &mut Document) + Send,
{
    fn handle(&mut self, event: &mut Event<'_>, document: &mut Document) {
        self(event, document)
    }
}

/// A registered subscriber.
pub enum Component {
    LoadingIndicator(LoadingIndicator),
    CacheRefresher(CacheRefresher),
    Custom(Box<dyn Listener>),
}

impl Component {
    pub fn custom(listener: impl Listener + 'static) -> Self {
        Component::Custom(Box::new(listener))
    }
}

impl Listener for Component {
    fn handle(&mut self, event: &mut Event<'_>, document: &mut Document) {
        match self {
            Component::LoadingIndicator(indicator) => indicator.handle(event, document),
            Component::CacheRefresher(refresher) => refresher.handle(event, document),
            Component::Custom(listener) => listener.handle(event, document),
        }
    }
}

/// Flags `<body>` while a navigation is in flight.
#[derive(Debug, Clone)]
pub struct LoadingIndicator {
    attr: String,
}

impl LoadingIndicator {
    pub fn new(attr: impl Into<String>) -> Self {
        Self { attr: attr.into() }
    }

    pub fn attr(&self) -> &str {
        &self.attr
    }
}

impl Default for LoadingIndicator {
    fn default() -> Self {
        Self::new("data-loading")
    }
}

impl Listener for LoadingIndicator {
    fn handle(&mut self, event: &mut Event<'_>, document: &mut Document) {
        let Some(body) = document.body_mut() else {
            return;
        };
        match event.signal() {
            Signal::BeforeNavigation { .. } => body.set_attr(&self.attr, ""),
            Signal::Load { .. } => body.remove_attr(&self.attr),
            _ => {}
        }
    }
}

/// One set of classes that must not survive into a cached snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refresher {
    /// Classes stripped before the page is cached.
    pub stale: Vec<String>,
    /// Classes restored when the page comes back from the cache.
    pub fresh: Vec<String>,
    /// Attribute left on stripped elements so they can be found again.
    pub flag: String,
}

/// Strips stale classes before caching and restores fresh ones on cached loads.
#[derive(Debug, Clone, Default)]
pub struct CacheRefresher {
    refreshers: Vec<Refresher>,
}

impl CacheRefresher {
    pub fn new(refreshers: Vec<Refresher>) -> Self {
        Self { refreshers }
    }

    fn remove_stale(document: &mut Document, refresher: &Refresher) {
        document.for_each_element_mut(|el| {
            if refresher.stale.iter().any(|class| el.has_class(class)) {
                for class in &refresher.stale {
                    el.remove_class(class);
                }
                el.set_attr(&refresher.flag, "");
            }
        });
    }

    fn add_fresh(document: &mut Document, refresher: &Refresher) {
        document.for_each_element_mut(|el| {
            if el.has_attr(&refresher.flag) {
                for class in &refresher.fresh {
                    el.add_class(class);
                }
                el.remove_attr(&refresher.flag);
            }
        });
    }
}

impl Listener for CacheRefresher {
    fn handle(&mut self, event: &mut Event<'_>, document: &mut Document) {
        match event.signal() {
            Signal::BeforeCache => {
                for refresher in &self.refreshers {
                    Self::remove_stale(document, refresher);
                }
            }
            Signal::Load { visit } if visit.loaded_from_cache => {
                for refresher in &self.refreshers {
                    Self::add_fresh(document, refresher);
                }
            }
            _ => {}
        }
    }
}

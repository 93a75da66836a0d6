//! Navigation orchestrator.
//!
//! [`PageLoader`] intercepts link activations, resolves the destination from
//! its visit cache or the network, swaps the content root, and settles
//! history, title and scroll the way a real navigation would.
//!
//! ### States
//! - idle-enabled: accepts navigations
//! - navigating: the enabled flag is cleared; further navigations are dropped
//!
//! ### Failure policy
//! Any error during a navigation is logged and answered with a hard
//! navigation to the intended location. The loader stays disabled, since the
//! page is about to be replaced.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use page_loader_core::dom::sanitize;
use page_loader_core::{
    Component, Document, Element, Error, LoaderConfig, Page, Signal, TrackedAssets, Visit, VisitCache,
    VisitSummary,
};
use serde::Serialize;
use tokio::sync::Mutex;
use url::Url;

use crate::fetch::Fetcher;
use crate::interaction::{
    Interaction, InteractionKind, closest_internal_link, interaction_is_permissible, link_is_permissible_for_click,
    link_is_permissible_for_prefetch,
};
use crate::swap::ContentSwapper;
use crate::window::{HistoryState, Window};

/// How a navigation attempt ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    /// Another navigation was in flight, or the loader is not listening.
    Disabled,
    /// A listener suppressed a cancelable signal.
    Prevented,
    /// Content was swapped and page state settled.
    Loaded { location: Url, loaded_from_cache: bool },
    /// The soft path failed; the window was sent to `location` directly.
    HardNavigation { location: Url, reason: String },
}

struct LoaderState {
    cache: VisitCache,
    prefetched: HashSet<Url>,
    tracked_assets: TrackedAssets,
    current_location: Url,
}

/// The soft-navigation state machine.
pub struct PageLoader<F, W> {
    config: LoaderConfig,
    fetcher: F,
    window: W,
    page: Mutex<Page>,
    state: Mutex<LoaderState>,
    use_prefetch: bool,
    started: AtomicBool,
    listening: AtomicBool,
    enabled: AtomicBool,
}

impl<F: Fetcher, W: Window> PageLoader<F, W> {
    /// Create a loader for the page currently shown in `window`.
    ///
    /// Prefetching is switched off when the configuration disables it or the
    /// window reports constrained network conditions.
    pub fn new(config: LoaderConfig, document: Document, window: W, fetcher: F) -> Self {
        let current_location = window.location();
        let use_prefetch = config.use_prefetch
            && window
                .connection()
                .is_none_or(|connection| connection.is_ok_for_prefetching());
        let cache = VisitCache::new(config.use_cache, config.cache_timeout());

        Self {
            config,
            fetcher,
            window,
            page: Mutex::new(Page::new(document)),
            state: Mutex::new(LoaderState {
                cache,
                prefetched: HashSet::from([current_location.clone()]),
                tracked_assets: TrackedAssets::default(),
                current_location,
            }),
            use_prefetch,
            started: AtomicBool::new(false),
            listening: AtomicBool::new(false),
            enabled: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn cache_is_enabled(&self) -> bool {
        self.config.use_cache
    }

    pub fn prefetch_is_enabled(&self) -> bool {
        self.use_prefetch
    }

    pub async fn clear_cache(&self) {
        self.state.lock().await.cache.clear();
    }

    /// Subscribe a component to lifecycle signals.
    pub async fn register(&self, component: Component) {
        self.page.lock().await.events.register(component);
    }

    /// Begin handling interactions. Idempotent.
    pub async fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let current = self.state.lock().await.current_location.clone();
        self.window.replace_state(HistoryState::new(&current), &current);

        let baseline = {
            let page = self.page.lock().await;
            TrackedAssets::from_document(&page.document, &self.config.attributes.track, &current)
        };
        tracing::debug!(assets = baseline.len(), digest = %baseline.digest(), "tracked asset baseline");
        self.state.lock().await.tracked_assets = baseline;

        self.listening.store(true, Ordering::SeqCst);
        self.enable();
    }

    /// Stop handling interactions and drop all cached state.
    pub async fn destroy(&self) {
        {
            let mut state = self.state.lock().await;
            state.cache.clear();
            state.prefetched.clear();
        }
        self.disable();
        self.listening.store(false, Ordering::SeqCst);
    }

    /*
     *  Interactions
     */

    /// Handle a click. When the loader takes over, the interaction is marked
    /// default-prevented and the navigation runs to completion.
    pub async fn handle_click(&self, event: &mut Interaction) -> Option<NavigationOutcome> {
        if !self.listening.load(Ordering::SeqCst) || event.kind != InteractionKind::Click {
            return None;
        }

        let location = {
            let mut page = self.page.lock().await;
            let link = closest_internal_link(&page.document, event.target, &self.window.location())?;

            let permissible = interaction_is_permissible(event, &page.document)
                && link_is_permissible_for_click(&link, &self.config.attributes)
                && page.notify(Signal::Click { link: &link }, true);
            if !permissible {
                return None;
            }
            link.href().clone()
        };

        event.prevent_default();
        Some(self.navigate(location, false).await)
    }

    /// Handle a mousedown or touchstart. Returns true if a prefetch hint was issued.
    pub async fn handle_prefetch_event(&self, event: &Interaction) -> bool {
        if !self.listening.load(Ordering::SeqCst) || !self.use_prefetch || event.kind == InteractionKind::Click {
            return false;
        }

        let current = self.window.location();
        let mut page = self.page.lock().await;
        let Some(link) = closest_internal_link(&page.document, event.target, &current) else {
            return false;
        };
        let location = link.href().clone();

        if !(interaction_is_permissible(event, &page.document)
            && link_is_permissible_for_prefetch(&link, &self.config.attributes, &current)
            && self.location_is_permissible_for_prefetch(&location).await
            && page.notify(Signal::BeforePrefetch { location: &location }, true))
        {
            return false;
        }

        if let Some(head) = page.document.head().map(Element::id) {
            let hint = Element::new("link")
                .with_attr("rel", "prefetch")
                .with_attr("href", location.as_str());
            if let Err(error) = page.document.append_to(head, page_loader_core::Node::Element(hint)) {
                tracing::debug!(%location, %error, "could not append prefetch hint");
            }
        }
        drop(page);

        self.window.prefetch(&location);
        self.state.lock().await.prefetched.insert(location.clone());
        tracing::debug!(%location, "prefetch hint issued");
        true
    }

    async fn location_is_permissible_for_prefetch(&self, location: &Url) -> bool {
        !self.state.lock().await.prefetched.contains(location)
    }

    /// React to a browser-driven history change.
    ///
    /// History and the live document can only be kept in sync when the
    /// loader is idle and the entry carries a location; otherwise the popped
    /// location is loaded directly.
    pub async fn pop_state_router(&self) -> NavigationOutcome {
        if !self.listening.load(Ordering::SeqCst) {
            return NavigationOutcome::Disabled;
        }

        let location = self.window.history_state().and_then(|state| state.location());
        match location {
            Some(location) if self.is_enabled() => self.navigate(location, true).await,
            location => {
                let location = location.unwrap_or_else(|| self.window.location());
                let reason = "popstate while history and page cannot be kept in sync".to_string();
                tracing::warn!(%location, "{}", reason);
                self.window.assign(&location);
                NavigationOutcome::HardNavigation { location, reason }
            }
        }
    }

    /*
     *  Navigate
     */

    /// Soft-navigate to `location`.
    ///
    /// History-driven navigations (`from_pop_state`) cannot be vetoed, do not
    /// push history, and restore the visit's scroll offset.
    pub async fn navigate(&self, location: Url, from_pop_state: bool) -> NavigationOutcome {
        if !self.is_enabled() {
            tracing::debug!(%location, "navigation dropped, another is in flight");
            return NavigationOutcome::Disabled;
        }

        let allowed = self
            .page
            .lock()
            .await
            .notify(Signal::BeforeNavigation { location: &location }, !from_pop_state);
        if !allowed {
            return NavigationOutcome::Prevented;
        }

        // The signal await may have let another navigation in.
        if self
            .enabled
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(%location, "navigation dropped, another is in flight");
            return NavigationOutcome::Disabled;
        }

        self.state.lock().await.cache.organize();

        match self.load(&location, from_pop_state).await {
            Ok(outcome) => outcome,
            Err(error) => {
                self.error_to_location(&error, &location);
                NavigationOutcome::HardNavigation { location, reason: error.to_string() }
            }
        }
    }

    async fn load(&self, location: &Url, from_pop_state: bool) -> Result<NavigationOutcome, Error> {
        let visit = self.get_visit(location).await?;

        if !self.load_is_permissible(&visit, from_pop_state).await {
            self.enable();
            return Ok(NavigationOutcome::Prevented);
        }

        self.cache_current_page().await;

        ContentSwapper::new(&self.window, &self.config.attributes, self.config.transition_timeout())
            .swap(&self.page, &visit.document)
            .await?;

        self.update_page_state(&visit, from_pop_state).await;
        self.enable();

        tracing::info!(
            location = %visit.location,
            loaded_from_cache = visit.loaded_from_cache,
            from_pop_state,
            "navigation complete"
        );

        Ok(NavigationOutcome::Loaded { location: visit.location.clone(), loaded_from_cache: visit.loaded_from_cache })
    }

    async fn get_visit(&self, location: &Url) -> Result<Visit, Error> {
        let cached = self.state.lock().await.cache.get(location).cloned();
        if let Some(visit) = cached {
            tracing::debug!(%location, "cache hit");
            return Ok(visit);
        }

        tracing::debug!(%location, "cache miss");
        self.create_visit(location).await
    }

    async fn create_visit(&self, location: &Url) -> Result<Visit, Error> {
        let document = self.fetcher.fetch(location).await?;
        let assets = TrackedAssets::from_document(&document, &self.config.attributes.track, location);

        let mut state = self.state.lock().await;
        if state.tracked_assets.has_changed(&assets) {
            tracing::debug!(
                baseline = %state.tracked_assets.digest(),
                destination = %assets.digest(),
                "tracked assets differ"
            );
            return Err(Error::AssetMismatch { location: location.to_string() });
        }
        state.tracked_assets = assets;

        let visit = Visit::new(location.clone(), document, 0.0);
        state.cache.insert(visit.clone());
        state.prefetched.insert(location.clone());

        Ok(visit)
    }

    async fn load_is_permissible(&self, visit: &Visit, from_pop_state: bool) -> bool {
        self.page
            .lock()
            .await
            .notify(Signal::BeforeLoad { visit }, !from_pop_state)
    }

    /// Snapshot the outgoing page into the cache, refreshing an existing entry in place.
    async fn cache_current_page(&self) {
        if !self.cache_is_enabled() {
            return;
        }

        let snapshot = {
            let mut page = self.page.lock().await;
            if !self.current_page_allows_caching(&page.document) || !page.notify(Signal::BeforeCache, true) {
                return;
            }
            sanitize(page.document.clone())
        };
        let scroll_position = self.window.scroll_y();

        let mut state = self.state.lock().await;
        let current = state.current_location.clone();
        match state.cache.get_mut(&current) {
            Some(visit) => {
                visit.document = snapshot;
                visit.scroll_position = scroll_position;
            }
            None => {
                state.cache.insert(Visit::new(current, snapshot, scroll_position));
            }
        }
    }

    fn current_page_allows_caching(&self, document: &Document) -> bool {
        let attrs = &self.config.attributes;
        document
            .content_root(&attrs.container, Some(&attrs.no_cache))
            .is_none()
    }

    async fn update_page_state(&self, visit: &Visit, from_pop_state: bool) {
        if !from_pop_state {
            self.update_history(&visit.location);
        }

        let mut page = self.page.lock().await;
        page.document.set_title(&visit.title);

        self.state.lock().await.current_location = self.window.location();

        self.window
            .scroll_to(if from_pop_state { visit.scroll_position } else { 0.0 });

        page.notify(Signal::Load { visit }, false);
    }

    fn update_history(&self, location: &Url) {
        if *location == self.window.location() {
            return;
        }
        self.window.push_state(HistoryState::new(location), location);
    }

    fn error_to_location(&self, error: &Error, location: &Url) {
        tracing::error!(%location, error = %error, "soft navigation failed, loading page directly");
        self.window.assign(location);
    }

    /*
     *  Introspection
     */

    pub async fn current_location(&self) -> Url {
        self.state.lock().await.current_location.clone()
    }

    pub async fn cached_locations(&self) -> Vec<Url> {
        self.state.lock().await.cache.locations()
    }

    pub async fn cached_visit(&self, location: &Url) -> Option<VisitSummary> {
        self.state.lock().await.cache.get(location).map(Visit::summary)
    }

    pub async fn prefetched_locations(&self) -> Vec<Url> {
        let mut locations: Vec<Url> = self.state.lock().await.prefetched.iter().cloned().collect();
        locations.sort();
        locations
    }

    pub async fn tracked_assets(&self) -> TrackedAssets {
        self.state.lock().await.tracked_assets.clone()
    }

    /// Run `f` against the live document.
    pub async fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.page.lock().await.document)
    }
}

#[cfg(test)]
mod tests;

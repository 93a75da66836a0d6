use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use page_loader_core::{Component, Document, Error, Event, LoaderConfig, NodeId, SignalKind};
use tokio::sync::Notify;
use url::Url;

use super::*;
use crate::interaction::{Interaction, Modifiers};
use crate::window::{ConnectionInfo, HeadlessWindow};

fn url(path: &str) -> Url {
    Url::parse("https://example.com/").unwrap().join(path).unwrap()
}

fn page(title: &str, content: &str) -> String {
    page_with(title, content, "/app.js", "data-page-container")
}

fn page_with(title: &str, content: &str, script: &str, container: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title><script src="{script}" data-page-track></script></head>
        <body>
            <nav>
                <a id="to-a" href="/a">A</a>
                <a id="to-b" href="/b">B</a>
                <a id="to-c" href="/c">C</a>
                <a id="to-search" href="/search?q=x">Search</a>
                <a id="external" href="https://other.com/">Other</a>
            </nav>
            <main {container}><p>{content}</p></main>
        </body></html>"#
    )
}

#[derive(Default)]
struct StubFetcher {
    pages: HashMap<String, String>,
    requests: StdMutex<Vec<Url>>,
    gate: Option<Arc<Notify>>,
}

impl StubFetcher {
    fn site() -> Self {
        let mut pages = HashMap::new();
        pages.insert("/a".to_string(), page("A", "content a"));
        pages.insert("/b".to_string(), page("B", "content b"));
        pages.insert("/c".to_string(), page("C", "content c"));
        pages.insert("/v2".to_string(), page_with("V2", "new build", "/app-v2.js", "data-page-container"));
        Self { pages, ..Default::default() }
    }

    fn gated(gate: Arc<Notify>) -> Self {
        Self { gate: Some(gate), ..Self::site() }
    }

    fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, location: &Url) -> Result<Document, Error> {
        self.requests.lock().unwrap().push(location.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.pages.get(location.path()) {
            Some(html) => Ok(Document::parse(html)),
            None => Err(Error::Network { location: location.to_string(), status: 404 }),
        }
    }
}

type Loader = PageLoader<StubFetcher, HeadlessWindow>;

async fn started(config: LoaderConfig, initial: &str, fetcher: StubFetcher) -> Loader {
    let loader = PageLoader::new(config, Document::parse(initial), HeadlessWindow::new(url("/a")), fetcher);
    loader.start().await;
    loader
}

async fn default_loader() -> Loader {
    started(LoaderConfig::default(), &page("A", "content a"), StubFetcher::site()).await
}

async fn node(loader: &Loader, id: &str) -> NodeId {
    loader
        .with_document(|doc| doc.query(|el| el.attr("id") == Some(id)).map(|el| el.id()))
        .await
        .unwrap()
}

async fn content(loader: &Loader) -> String {
    loader
        .with_document(|doc| doc.content_root("data-page-container", None).map(|el| el.text()))
        .await
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn record(log: &Arc<StdMutex<Vec<SignalKind>>>) -> Component {
    let log = Arc::clone(log);
    Component::custom(move |event: &mut Event<'_>, _: &mut Document| {
        log.lock().unwrap().push(event.kind());
    })
}

fn prevent(kind: SignalKind) -> Component {
    Component::custom(move |event: &mut Event<'_>, _: &mut Document| {
        if event.kind() == kind {
            event.prevent_default();
        }
    })
}

#[tokio::test]
async fn test_click_runs_full_lifecycle() {
    let loader = default_loader().await;
    let log = Arc::new(StdMutex::new(Vec::new()));
    loader.register(record(&log)).await;

    let mut click = Interaction::click(node(&loader, "to-b").await);
    let outcome = loader.handle_click(&mut click).await;

    assert_eq!(outcome, Some(NavigationOutcome::Loaded { location: url("/b"), loaded_from_cache: false }));
    assert!(click.default_prevented);
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            SignalKind::Click,
            SignalKind::BeforeNavigation,
            SignalKind::BeforeLoad,
            SignalKind::BeforeCache,
            SignalKind::BetweenContent,
            SignalKind::Load,
        ]
    );
    assert_eq!(loader.fetcher().requests(), vec![url("/b")]);
    assert_eq!(content(&loader).await, "content b");
    assert_eq!(loader.with_document(Document::title).await, "B");
    assert_eq!(loader.window().history_len(), 2);
    assert_eq!(loader.window().location(), url("/b"));
    assert_eq!(loader.current_location().await, url("/b"));
    assert!(loader.is_enabled());
}

#[tokio::test]
async fn test_swap_leaves_single_content_root_without_markers() {
    let loader = default_loader().await;
    loader.navigate(url("/b"), false).await;

    let (roots, staged) = loader
        .with_document(|doc| {
            (
                doc.query_all(|el| el.has_attr("data-page-container")).len(),
                doc.query_all(|el| el.has_attr("data-page-new") || el.has_attr("data-page-out")).len(),
            )
        })
        .await;
    assert_eq!(roots, 1);
    assert_eq!(staged, 0);
}

#[tokio::test]
async fn test_ignored_clicks() {
    let loader = default_loader().await;

    let mut chorded = Interaction::click(node(&loader, "to-b").await)
        .with_modifiers(Modifiers { meta: true, ..Default::default() });
    assert_eq!(loader.handle_click(&mut chorded).await, None);
    assert!(!chorded.default_prevented);

    let mut external = Interaction::click(node(&loader, "external").await);
    assert_eq!(loader.handle_click(&mut external).await, None);

    let mut vetoed = Interaction::click(node(&loader, "to-c").await);
    loader.register(prevent(SignalKind::Click)).await;
    assert_eq!(loader.handle_click(&mut vetoed).await, None);
    assert!(!vetoed.default_prevented);

    assert!(loader.fetcher().requests().is_empty());
}

#[tokio::test]
async fn test_click_before_start_is_ignored() {
    let loader =
        PageLoader::new(LoaderConfig::default(), Document::parse(&page("A", "a")), HeadlessWindow::new(url("/a")), StubFetcher::site());
    let mut click = Interaction::click(node(&loader, "to-b").await);
    assert_eq!(loader.handle_click(&mut click).await, None);
    assert!(!loader.is_enabled());
}

#[tokio::test]
async fn test_revisit_served_from_cache() {
    let loader = default_loader().await;
    loader.navigate(url("/b"), false).await;

    let outcome = loader.navigate(url("/a"), false).await;

    assert_eq!(outcome, NavigationOutcome::Loaded { location: url("/a"), loaded_from_cache: true });
    assert_eq!(loader.fetcher().requests(), vec![url("/b")]);
    assert_eq!(content(&loader).await, "content a");
    assert_eq!(loader.cached_locations().await, vec![url("/a"), url("/b")]);
}

#[tokio::test(start_paused = true)]
async fn test_stale_entry_is_refetched() {
    let loader = default_loader().await;
    loader.navigate(url("/b"), false).await;

    tokio::time::advance(Duration::from_secs(11 * 60)).await;
    let outcome = loader.navigate(url("/a"), false).await;

    assert_eq!(outcome, NavigationOutcome::Loaded { location: url("/a"), loaded_from_cache: false });
    assert_eq!(loader.fetcher().requests(), vec![url("/b"), url("/a")]);
}

#[tokio::test]
async fn test_failed_fetch_escapes_to_hard_navigation() {
    let loader = default_loader().await;

    let outcome = loader.navigate(url("/missing"), false).await;

    match outcome {
        NavigationOutcome::HardNavigation { location, reason } => {
            assert_eq!(location, url("/missing"));
            assert!(reason.contains("NETWORK_ERROR"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(loader.window().assigned(), vec![url("/missing")]);
    assert_eq!(content(&loader).await, "content a");
    assert_eq!(loader.window().history_len(), 1);
    assert!(!loader.is_enabled());
}

#[tokio::test]
async fn test_asset_mismatch_escapes_to_hard_navigation() {
    let loader = default_loader().await;

    let outcome = loader.navigate(url("/v2"), false).await;

    assert!(matches!(outcome, NavigationOutcome::HardNavigation { ref reason, .. } if reason.contains("ASSET_MISMATCH")));
    assert_eq!(loader.window().assigned(), vec![url("/v2")]);
    assert_eq!(content(&loader).await, "content a");
    assert!(loader.cached_locations().await.is_empty());
}

#[tokio::test]
async fn test_missing_incoming_root_escapes_to_hard_navigation() {
    let mut fetcher = StubFetcher::site();
    fetcher.pages.insert("/bare".to_string(), page_with("Bare", "x", "/app.js", "class=\"main\""));
    let loader = started(LoaderConfig::default(), &page("A", "content a"), fetcher).await;

    let outcome = loader.navigate(url("/bare"), false).await;

    assert!(matches!(outcome, NavigationOutcome::HardNavigation { ref reason, .. } if reason.contains("new content not found")));
    assert_eq!(content(&loader).await, "content a");
}

#[tokio::test]
async fn test_second_navigation_dropped_while_in_flight() {
    let gate = Arc::new(Notify::new());
    let loader = started(LoaderConfig::default(), &page("A", "content a"), StubFetcher::gated(Arc::clone(&gate))).await;

    let (first, second) = tokio::join!(loader.navigate(url("/b"), false), async {
        tokio::task::yield_now().await;
        let second = loader.navigate(url("/c"), false).await;
        gate.notify_one();
        second
    });

    assert_eq!(first, NavigationOutcome::Loaded { location: url("/b"), loaded_from_cache: false });
    assert_eq!(second, NavigationOutcome::Disabled);
    assert_eq!(loader.fetcher().requests(), vec![url("/b")]);
}

#[tokio::test]
async fn test_prefetch_once_per_location() {
    let loader = default_loader().await;
    let target = node(&loader, "to-b").await;

    assert!(loader.handle_prefetch_event(&Interaction::mouse_down(target)).await);
    assert!(!loader.handle_prefetch_event(&Interaction::touch_start(target)).await);

    assert_eq!(loader.window().prefetch_requests(), vec![url("/b")]);
    let hints = loader
        .with_document(|doc| {
            doc.query_all(|el| el.name() == "link" && el.attr("rel") == Some("prefetch"))
                .iter()
                .filter_map(|el| el.attr("href").map(str::to_string))
                .collect::<Vec<_>>()
        })
        .await;
    assert_eq!(hints, vec!["https://example.com/b".to_string()]);
    assert!(loader.prefetched_locations().await.contains(&url("/b")));
}

#[tokio::test]
async fn test_prefetch_rules() {
    let loader = default_loader().await;

    for id in ["to-a", "to-search", "external"] {
        let target = node(&loader, id).await;
        assert!(!loader.handle_prefetch_event(&Interaction::mouse_down(target)).await, "{id}");
    }

    loader.register(prevent(SignalKind::BeforePrefetch)).await;
    let target = node(&loader, "to-c").await;
    assert!(!loader.handle_prefetch_event(&Interaction::mouse_down(target)).await);
    assert!(loader.window().prefetch_requests().is_empty());
}

#[tokio::test]
async fn test_prefetch_disabled_on_save_data() {
    let window = HeadlessWindow::new(url("/a")).with_connection(ConnectionInfo { save_data: true, effective_type: None });
    let loader = PageLoader::new(LoaderConfig::default(), Document::parse(&page("A", "a")), window, StubFetcher::site());
    loader.start().await;

    assert!(!loader.prefetch_is_enabled());
    let target = node(&loader, "to-b").await;
    assert!(!loader.handle_prefetch_event(&Interaction::mouse_down(target)).await);
}

#[tokio::test]
async fn test_pop_state_restores_content_and_scroll() {
    let loader = default_loader().await;
    loader.window().scroll_to(250.0);
    loader.navigate(url("/b"), false).await;
    assert_eq!(loader.window().scroll_y(), 0.0);

    let log = Arc::new(StdMutex::new(Vec::new()));
    loader.register(prevent(SignalKind::BeforeNavigation)).await;
    loader.register(record(&log)).await;

    assert!(loader.window().back());
    let outcome = loader.pop_state_router().await;

    assert_eq!(outcome, NavigationOutcome::Loaded { location: url("/a"), loaded_from_cache: true });
    assert_eq!(content(&loader).await, "content a");
    assert_eq!(loader.window().scroll_y(), 250.0);
    assert_eq!(loader.window().history_len(), 2);
    assert_eq!(loader.current_location().await, url("/a"));
    assert_eq!(log.lock().unwrap().first(), Some(&SignalKind::BeforeNavigation));
}

#[tokio::test]
async fn test_pop_state_while_disabled_loads_directly() {
    let loader = default_loader().await;
    loader.navigate(url("/b"), false).await;
    loader.disable();

    assert!(loader.window().back());
    let outcome = loader.pop_state_router().await;

    assert!(matches!(outcome, NavigationOutcome::HardNavigation { ref location, .. } if *location == url("/a")));
    assert_eq!(loader.window().assigned(), vec![url("/a")]);
    assert_eq!(content(&loader).await, "content b");
}

#[tokio::test]
async fn test_before_navigation_prevented() {
    let loader = default_loader().await;
    loader.register(prevent(SignalKind::BeforeNavigation)).await;

    assert_eq!(loader.navigate(url("/b"), false).await, NavigationOutcome::Prevented);
    assert!(loader.fetcher().requests().is_empty());
    assert!(loader.is_enabled());
}

#[tokio::test]
async fn test_before_load_prevented_reenables() {
    let loader = default_loader().await;
    loader.register(prevent(SignalKind::BeforeLoad)).await;

    assert_eq!(loader.navigate(url("/b"), false).await, NavigationOutcome::Prevented);
    assert!(loader.is_enabled());
    assert_eq!(content(&loader).await, "content a");
    assert_eq!(loader.window().history_len(), 1);
}

#[tokio::test]
async fn test_no_cache_page_is_not_snapshotted() {
    let initial = page_with("A", "private", "/app.js", "data-page-container data-page-no-cache");
    let loader = started(LoaderConfig::default(), &initial, StubFetcher::site()).await;
    let log = Arc::new(StdMutex::new(Vec::new()));
    loader.register(record(&log)).await;

    loader.navigate(url("/b"), false).await;

    assert_eq!(loader.cached_locations().await, vec![url("/b")]);
    assert!(!log.lock().unwrap().contains(&SignalKind::BeforeCache));
}

#[tokio::test]
async fn test_before_cache_prevented_skips_snapshot() {
    let loader = default_loader().await;
    loader.register(prevent(SignalKind::BeforeCache)).await;

    let outcome = loader.navigate(url("/b"), false).await;

    assert!(matches!(outcome, NavigationOutcome::Loaded { .. }));
    assert_eq!(loader.cached_locations().await, vec![url("/b")]);
}

#[tokio::test]
async fn test_cache_disabled_always_fetches() {
    let config = LoaderConfig { use_cache: false, ..Default::default() };
    let loader = started(config, &page("A", "content a"), StubFetcher::site()).await;
    assert!(!loader.cache_is_enabled());

    loader.navigate(url("/b"), false).await;
    let outcome = loader.navigate(url("/a"), false).await;

    assert_eq!(outcome, NavigationOutcome::Loaded { location: url("/a"), loaded_from_cache: false });
    assert_eq!(loader.fetcher().requests(), vec![url("/b"), url("/a")]);
    assert!(loader.cached_locations().await.is_empty());
}

#[tokio::test]
async fn test_cached_snapshot_keeps_scroll_position() {
    let loader = default_loader().await;
    loader.window().scroll_to(120.0);
    loader.navigate(url("/b"), false).await;

    let summary = loader.cached_visit(&url("/a")).await.unwrap();
    assert_eq!(summary.scroll_position, 120.0);
    assert_eq!(summary.title, "A");
}

#[tokio::test]
async fn test_destroy_clears_state() {
    let loader = default_loader().await;
    loader.navigate(url("/b"), false).await;

    loader.destroy().await;

    assert!(loader.cached_locations().await.is_empty());
    assert!(loader.prefetched_locations().await.is_empty());
    assert!(!loader.is_enabled());
    let mut click = Interaction::click(node(&loader, "to-c").await);
    assert_eq!(loader.handle_click(&mut click).await, None);
    assert_eq!(loader.pop_state_router().await, NavigationOutcome::Disabled);
}

#[tokio::test]
async fn test_clear_cache() {
    let loader = default_loader().await;
    loader.navigate(url("/b"), false).await;
    loader.clear_cache().await;
    assert!(loader.cached_locations().await.is_empty());
}

#[tokio::test]
async fn test_start_records_baseline_and_history_state() {
    let loader = default_loader().await;

    assert_eq!(loader.tracked_assets().await.as_slice(), ["https://example.com/app.js".to_string()]);
    assert_eq!(loader.window().history_state().and_then(|s| s.location()), Some(url("/a")));
}

#[tokio::test]
async fn test_before_navigation_sees_idle_loader() {
    let loader = Arc::new(default_loader().await);
    let seen = Arc::new(StdMutex::new(Vec::new()));
    let (weak, sink) = (Arc::downgrade(&loader), Arc::clone(&seen));
    loader
        .register(Component::custom(move |event: &mut Event<'_>, _: &mut Document| {
            if let Some(loader) = weak.upgrade() {
                sink.lock().unwrap().push((event.kind(), loader.is_enabled()));
            }
        }))
        .await;

    loader.navigate(url("/b"), false).await;

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.first(), Some(&(SignalKind::BeforeNavigation, true)));
    assert!(seen[1..].iter().all(|(_, enabled)| !enabled));
    assert!(loader.is_enabled());
}

#[tokio::test]
async fn test_interaction_kinds_route_to_their_handler() {
    let loader = default_loader().await;
    let target = node(&loader, "to-b").await;

    let mut press = Interaction::mouse_down(target);
    assert_eq!(loader.handle_click(&mut press).await, None);
    assert!(!press.default_prevented);

    assert!(!loader.handle_prefetch_event(&Interaction::click(target)).await);
    assert!(loader.fetcher().requests().is_empty());
    assert!(loader.window().prefetch_requests().is_empty());
}

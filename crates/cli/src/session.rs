//! Drives a [`PageLoader`] from line commands.
//!
//! A hard navigation replaces the whole page, so the session answers it the
//! way a browser would: it fetches the location afresh and boots a new loader.

use anyhow::{Context, Result};
use page_loader_client::fetch::resolve;
use page_loader_client::{FetchConfig, HeadlessWindow, HttpFetcher, Interaction, NavigationOutcome, PageLoader, Window};
use page_loader_core::events::LoadingIndicator;
use page_loader_core::{Component, Element, LoaderConfig, NodeId, VisitSummary};
use serde::Serialize;
use url::Url;

use crate::command::Command;

type Loader = PageLoader<HttpFetcher, HeadlessWindow>;

/// One JSON line written to stdout per command.
#[derive(Debug, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    Navigation { outcome: NavigationOutcome },
    /// The loader declined; a browser would follow the link natively.
    Ignored { location: Url },
    Prefetch { location: Url, issued: bool },
    History { moved: bool, outcome: Option<NavigationOutcome> },
    Status(Status),
    Error { message: String },
}

impl Reply {
    pub fn error(err: impl std::fmt::Display) -> Self {
        Reply::Error { message: err.to_string() }
    }
}

#[derive(Debug, Serialize)]
pub struct Status {
    pub location: Url,
    pub title: String,
    pub enabled: bool,
    pub history_len: usize,
    pub scroll_y: f64,
    pub cached: Vec<VisitSummary>,
    pub prefetched: Vec<Url>,
    pub tracked_assets: String,
}

pub struct Session {
    config: LoaderConfig,
    loader: Loader,
}

impl Session {
    /// Load `location` in full and start a loader on it.
    pub async fn boot(config: LoaderConfig, location: Url) -> Result<Self> {
        let loader = boot_loader(&config, location).await?;
        Ok(Self { config, loader })
    }

    pub async fn run(&mut self, command: Command) -> Result<Reply> {
        let reply = match command {
            Command::Click(href) => self.click(&href).await?,
            Command::Hover(href) => self.hover(&href).await?,
            Command::Back => {
                let moved = self.loader.window().back();
                self.pop_state(moved).await?
            }
            Command::Forward => {
                let moved = self.loader.window().forward();
                self.pop_state(moved).await?
            }
            Command::Status => Reply::Status(self.status().await),
            Command::Quit => Reply::Status(self.status().await),
        };
        Ok(reply)
    }

    pub async fn shutdown(self) {
        self.loader.destroy().await;
    }

    async fn click(&mut self, href: &str) -> Result<Reply> {
        let (target, location) = self.find_link(href).await?;
        let mut event = Interaction::click(target);
        match self.loader.handle_click(&mut event).await {
            Some(outcome) => self.settle(outcome).await.map(|outcome| Reply::Navigation { outcome }),
            None => Ok(Reply::Ignored { location }),
        }
    }

    async fn hover(&self, href: &str) -> Result<Reply> {
        let (target, location) = self.find_link(href).await?;
        let issued = self
            .loader
            .handle_prefetch_event(&Interaction::mouse_down(target))
            .await;
        Ok(Reply::Prefetch { location, issued })
    }

    async fn pop_state(&mut self, moved: bool) -> Result<Reply> {
        if !moved {
            return Ok(Reply::History { moved, outcome: None });
        }
        let outcome = self.loader.pop_state_router().await;
        let outcome = self.settle(outcome).await?;
        Ok(Reply::History { moved, outcome: Some(outcome) })
    }

    /// Replace the loader after a hard navigation.
    ///
    /// When the location cannot be loaded at all, the current page stays and
    /// its loader accepts navigations again.
    async fn settle(&mut self, outcome: NavigationOutcome) -> Result<NavigationOutcome> {
        let NavigationOutcome::HardNavigation { location, .. } = &outcome else {
            return Ok(outcome);
        };

        tracing::info!(%location, "reloading page");
        match boot_loader(&self.config, location.clone()).await {
            Ok(loader) => {
                std::mem::replace(&mut self.loader, loader).destroy().await;
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(%location, error = %format!("{err:#}"), "reload failed, staying on current page");
                self.loader.enable();
                Err(err)
            }
        }
    }

    async fn find_link(&self, href: &str) -> Result<(NodeId, Url)> {
        let current = self.loader.current_location().await;
        let location = resolve(&current, href)?;
        let target = self
            .loader
            .with_document(|doc| {
                doc.query(|el| {
                    el.name() == "a"
                        && el
                            .attr("href")
                            .and_then(|raw| current.join(raw).ok())
                            .is_some_and(|url| url == location)
                })
                .map(Element::id)
            })
            .await
            .with_context(|| format!("INVALID_INPUT: no link to {location} on this page"))?;
        Ok((target, location))
    }

    async fn status(&self) -> Status {
        let mut cached = Vec::new();
        for location in self.loader.cached_locations().await {
            if let Some(summary) = self.loader.cached_visit(&location).await {
                cached.push(summary);
            }
        }

        Status {
            location: self.loader.current_location().await,
            title: self.loader.with_document(|doc| doc.title()).await,
            enabled: self.loader.is_enabled(),
            history_len: self.loader.window().history_len(),
            scroll_y: self.loader.window().scroll_y(),
            cached,
            prefetched: self.loader.prefetched_locations().await,
            tracked_assets: self.loader.tracked_assets().await.digest(),
        }
    }
}

async fn boot_loader(config: &LoaderConfig, location: Url) -> Result<Loader> {
    let fetcher = HttpFetcher::new(FetchConfig::from(config))?;
    let document = fetcher
        .load_page(&location)
        .await
        .with_context(|| format!("failed to load {location}"))?;

    let loader = PageLoader::new(config.clone(), document, HeadlessWindow::new(location), fetcher);
    loader
        .register(Component::LoadingIndicator(LoadingIndicator::default()))
        .await;
    loader.start().await;

    tracing::info!(location = %loader.current_location().await, "page loaded");
    Ok(loader)
}

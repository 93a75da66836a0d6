//! Content swapping synchronized to CSS transitions.
//!
//! The incoming content root is inserted next to the outgoing one before the
//! outgoing one is removed, so the page always has primary content:
//!
//! 1. Insert the incoming root right after the outgoing one, marked as staging
//! 2. Mark the outgoing root and wait for its opacity transition (or the fallback)
//! 3. Remove the outgoing root
//! 4. Swap the staging marker for the incoming marker and wait again
//! 5. Clear the incoming marker

use std::time::Duration;

use page_loader_core::{ContentSide, Document, ElementAttrs, Error, NodeId, Page, Signal};
use tokio::sync::{Mutex, broadcast};

use crate::window::{TransitionEnd, Window};

/// The property whose transition gates each phase.
pub const TRACKED_PROPERTY: &str = "opacity";

/// Replaces the live content root with one taken from another document.
pub struct ContentSwapper<'a, W: Window + ?Sized> {
    window: &'a W,
    attrs: &'a ElementAttrs,
    timeout: Duration,
}

impl<'a, W: Window + ?Sized> ContentSwapper<'a, W> {
    pub fn new(window: &'a W, attrs: &'a ElementAttrs, timeout: Duration) -> Self {
        Self { window, attrs, timeout }
    }

    /// Swap the content root of `page` for a detached copy of `incoming`'s.
    ///
    /// # Errors
    ///
    /// Returns `Error::ContentNotFound` if either document lacks a content
    /// root. Nothing is mutated in that case.
    pub async fn swap(&self, page: &Mutex<Page>, incoming: &Document) -> Result<(), Error> {
        let (old_content, new_content) = {
            let mut page = page.lock().await;

            let old_content = page
                .document
                .content_root(&self.attrs.container, None)
                .map(|el| el.id())
                .ok_or(Error::ContentNotFound(ContentSide::Outgoing))?;

            let mut new_root = incoming
                .content_root(&self.attrs.container, None)
                .ok_or(Error::ContentNotFound(ContentSide::Incoming))?
                .clone_detached();
            new_root.set_attr(&self.attrs.new_container, "");
            let new_content = new_root.id();

            page.document.insert_after(old_content, new_root)?;
            page.notify(Signal::BetweenContent { old_content, new_content }, false);

            (old_content, new_content)
        };

        self.transition_out(page, old_content).await;
        page.lock().await.document.remove(old_content);
        self.transition_in(page, new_content).await;

        Ok(())
    }

    async fn transition_out(&self, page: &Mutex<Page>, old_content: NodeId) {
        let events = self.window.transition_events();
        {
            let mut page = page.lock().await;
            if let Some(el) = page.document.get_mut(old_content) {
                el.remove_attr(&self.attrs.transition_in);
                el.set_attr(&self.attrs.transition_out, "");
            }
        }
        self.window.style_changed(old_content);
        transition_end(events, old_content, TRACKED_PROPERTY, self.timeout).await;
    }

    async fn transition_in(&self, page: &Mutex<Page>, new_content: NodeId) {
        let events = self.window.transition_events();
        {
            let mut page = page.lock().await;
            if let Some(el) = page.document.get_mut(new_content) {
                el.remove_attr(&self.attrs.new_container);
                el.set_attr(&self.attrs.transition_in, "");
            }
        }
        self.window.style_changed(new_content);
        transition_end(events, new_content, TRACKED_PROPERTY, self.timeout).await;

        let mut page = page.lock().await;
        if let Some(el) = page.document.get_mut(new_content) {
            el.remove_attr(&self.attrs.transition_in);
        }
    }
}

/// Wait for `property` to finish transitioning on `target`, or for `timeout`.
///
/// Returns true if the transition reported in, false on fallback.
pub async fn transition_end(
    mut events: broadcast::Receiver<TransitionEnd>, target: NodeId, property: &str, timeout: Duration,
) -> bool {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(event) if event.target == target && event.property_name == property => return,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
            }
        }
    };

    match tokio::time::timeout(timeout, wait).await {
        Ok(()) => true,
        Err(_) => {
            tracing::debug!(%target, property, "transition did not report in, continuing after {:?}", timeout);
            false
        }
    }
}

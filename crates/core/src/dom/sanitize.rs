//! Cleanup applied to fetched documents and cached snapshots.

use super::{Document, Element};

/// Remove `<noscript>` fallbacks and inline `on*` event-handler attributes.
///
/// Snapshots are re-inserted into a page that already runs scripts, so neither
/// should survive into the cache.
pub fn sanitize(mut document: Document) -> Document {
    let noscripts: Vec<_> = document
        .query_all(|el| el.name() == "noscript")
        .into_iter()
        .map(Element::id)
        .collect();
    for id in noscripts {
        document.remove(id);
    }

    document.for_each_element_mut(|el| {
        el.retain_attrs(|(name, _)| !is_event_handler(name));
    });

    document
}

fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name.as_bytes()[..2].eq_ignore_ascii_case(b"on")
}

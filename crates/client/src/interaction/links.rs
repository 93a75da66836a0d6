//! Link classification: which anchors the loader may navigate to or prefetch.

use page_loader_core::dom::link::host_of;
use page_loader_core::{Document, ElementAttrs, Link, NodeId};
use url::Url;

/// Nearest enclosing same-origin `<a href>` of `target`.
///
/// Anchors with a `target` starting with `_` or a `download` attribute are
/// passed over. Returns `None` when no anchor qualifies or the nearest one
/// points at another host.
pub fn closest_internal_link(document: &Document, target: NodeId, current: &Url) -> Option<Link> {
    let anchor = document.ancestors(target).into_iter().find(|el| {
        el.name() == "a"
            && el.has_attr("href")
            && !el.attr("target").is_some_and(|t| t.starts_with('_'))
            && !el.has_attr("download")
    })?;

    let link = Link::from_element(anchor, current)?;
    if link.host() != host_of(current) {
        return None;
    }
    Some(link)
}

/// Links marked with the forbid-load attribute fall through to native navigation.
pub fn link_is_permissible_for_click(link: &Link, attrs: &ElementAttrs) -> bool {
    !link.has_attr(&attrs.forbid_load)
}

/// HTTPS only, not the current path, no query string, no forbid-prefetch marker.
pub fn link_is_permissible_for_prefetch(link: &Link, attrs: &ElementAttrs, current: &Url) -> bool {
    let href = link.href();
    let is_https = href.scheme() == "https";
    let has_forbid_attribute = link.has_attr(&attrs.forbid_prefetch);
    let is_for_same_page = href.path() == current.path();
    // `?logout` or `?add-to-cart` could trigger actions
    let has_query_string = href.query().is_some_and(|q| !q.is_empty());

    is_https && !has_forbid_attribute && !is_for_same_page && !has_query_string
}

//! Anchors resolved against the document location.

use url::Url;

use super::{Element, NodeId};

/// An `<a href>` element with its href resolved to an absolute URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    element: NodeId,
    href: Url,
    attrs: Vec<(String, String)>,
}

impl Link {
    /// Resolve `el` as a link relative to `base`.
    ///
    /// Returns `None` for non-anchors, anchors without `href`, and hrefs
    /// that do not resolve to a URL.
    pub fn from_element(el: &Element, base: &Url) -> Option<Self> {
        if el.name() != "a" {
            return None;
        }
        let href = base.join(el.attr("href")?.trim()).ok()?;
        Some(Self {
            element: el.id(),
            href,
            attrs: el.attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        })
    }

    /// Id of the anchor element in the document it was found in.
    pub fn element(&self) -> NodeId {
        self.element
    }

    pub fn href(&self) -> &Url {
        &self.href
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// `host[:port]`, the way `HTMLAnchorElement.host` reports it.
    pub fn host(&self) -> Option<String> {
        host_of(&self.href)
    }
}

/// `host[:port]` of a URL, omitting the scheme's default port.
pub fn host_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

//! Owned document model.
//!
//! A [`Document`] is a plain tree of owned nodes. Cloning a document yields a
//! detached copy: nothing done to the live page afterwards can reach it.
//! Elements carry a process-unique [`NodeId`] so hosts and the loader can refer
//! to a node across mutations; [`Element::clone_detached`] re-numbers a subtree
//! before it is inserted next to existing nodes.

pub mod link;
mod parse;
mod sanitize;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use link::Link;
pub use sanitize::sanitize;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an element within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// An element with its attributes (in source order) and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    id: NodeId,
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an empty element with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: NodeId::next(), name: name.into().to_ascii_lowercase(), attrs: Vec::new(), children: Vec::new() }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    pub(crate) fn retain_attrs(&mut self, keep: impl FnMut(&(String, String)) -> bool) {
        self.attrs.retain(keep);
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut classes: Vec<&str> = self.classes().collect();
        classes.push(class);
        let joined = classes.join(" ");
        self.set_attr("class", &joined);
    }

    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let joined = self.classes().filter(|c| *c != class).collect::<Vec<_>>().join(" ");
        self.set_attr("class", &joined);
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn append_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(el) => el.collect_text(out),
                Node::Comment(_) => {}
            }
        }
    }

    /// Deep copy of this subtree with fresh ids throughout.
    pub fn clone_detached(&self) -> Element {
        Element {
            id: NodeId::next(),
            name: self.name.clone(),
            attrs: self.attrs.clone(),
            children: self
                .children
                .iter()
                .map(|child| match child {
                    Node::Element(el) => Node::Element(el.clone_detached()),
                    other => other.clone(),
                })
                .collect(),
        }
    }

    fn descendants<'a>(&'a self, out: &mut Vec<&'a Element>) {
        out.push(self);
        for child in &self.children {
            if let Node::Element(el) = child {
                el.descendants(out);
            }
        }
    }

    fn find_first(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find_map(|el| el.find_first(pred))
    }

    fn find_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        if self.id == id {
            return Some(self);
        }
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find_map(|el| el.find_mut(id))
    }

    fn for_each_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        f(self);
        for child in self.children.iter_mut().filter_map(Node::as_element_mut) {
            child.for_each_mut(f);
        }
    }

    fn path_to<'a>(&'a self, id: NodeId, path: &mut Vec<&'a Element>) -> bool {
        path.push(self);
        if self.id == id {
            return true;
        }
        for child in self.children.iter().filter_map(Node::as_element) {
            if child.path_to(id, path) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Removes the element with `id` from this subtree.
    fn remove_descendant(&mut self, id: NodeId) -> Option<Element> {
        if let Some(pos) = self
            .children
            .iter()
            .position(|c| c.as_element().is_some_and(|el| el.id == id))
        {
            return match self.children.remove(pos) {
                Node::Element(el) => Some(el),
                _ => None,
            };
        }
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find_map(|el| el.remove_descendant(id))
    }

    /// Inserts `node` right after the child element `sibling`, searching the subtree.
    fn insert_after_descendant(&mut self, sibling: NodeId, node: Node) -> Result<(), Node> {
        if let Some(pos) = self
            .children
            .iter()
            .position(|c| c.as_element().is_some_and(|el| el.id == sibling))
        {
            self.children.insert(pos + 1, node);
            return Ok(());
        }
        let mut node = node;
        for child in self.children.iter_mut().filter_map(Node::as_element_mut) {
            match child.insert_after_descendant(sibling, node) {
                Ok(()) => return Ok(()),
                Err(returned) => node = returned,
            }
        }
        Err(node)
    }
}

/// An owned HTML document rooted at its `<html>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Wrap an existing `<html>` element.
    pub fn from_root(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn head(&self) -> Option<&Element> {
        self.query(|el| el.name() == "head")
    }

    pub fn body(&self) -> Option<&Element> {
        self.query(|el| el.name() == "body")
    }

    pub fn body_mut(&mut self) -> Option<&mut Element> {
        let id = self.body()?.id();
        self.get_mut(id)
    }

    /// First element, in document order, matching `pred`.
    pub fn query(&self, pred: impl Fn(&Element) -> bool) -> Option<&Element> {
        self.root.find_first(&pred)
    }

    /// All elements, in document order, matching `pred`.
    pub fn query_all(&self, pred: impl Fn(&Element) -> bool) -> Vec<&Element> {
        let mut all = Vec::new();
        self.root.descendants(&mut all);
        all.retain(|el| pred(*el));
        all
    }

    /// The swappable content root: first element with `container`, and with
    /// `additional` too when given.
    pub fn content_root(&self, container: &str, additional: Option<&str>) -> Option<&Element> {
        self.query(|el| el.has_attr(container) && additional.is_none_or(|extra| el.has_attr(extra)))
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.query(|el| el.id() == id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.root.find_mut(id)
    }

    /// Apply `f` to every element, in document order.
    pub fn for_each_element_mut(&mut self, mut f: impl FnMut(&mut Element)) {
        self.root.for_each_mut(&mut f);
    }

    /// The element with `id` followed by its ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<&Element> {
        let mut path = Vec::new();
        if self.root.path_to(id, &mut path) {
            path.reverse();
            path
        } else {
            Vec::new()
        }
    }

    /// Remove and return the element with `id`. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> Option<Element> {
        self.root.remove_descendant(id)
    }

    /// Insert `element` as the next sibling of `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, element: Element) -> Result<(), crate::Error> {
        self.root
            .insert_after_descendant(sibling, Node::Element(element))
            .map_err(|_| crate::Error::InvalidInput(format!("no element {sibling} to insert after")))
    }

    /// Append `child` to the element with `parent`.
    pub fn append_to(&mut self, parent: NodeId, child: Node) -> Result<(), crate::Error> {
        let parent_el = self
            .get_mut(parent)
            .ok_or_else(|| crate::Error::InvalidInput(format!("no element {parent} to append to")))?;
        parent_el.append_child(child);
        Ok(())
    }

    /// Text of the first `<title>`, trimmed; empty when absent.
    pub fn title(&self) -> String {
        self.query(|el| el.name() == "title")
            .map(|el| el.text().trim().to_string())
            .unwrap_or_default()
    }

    /// Replace the `<title>` text, creating the element in `<head>` if needed.
    pub fn set_title(&mut self, title: &str) {
        let existing = self.query(|el| el.name() == "title").map(Element::id);
        if let Some(id) = existing
            && let Some(el) = self.get_mut(id)
        {
            el.children = vec![Node::Text(title.to_string())];
            return;
        }

        let head = match self.head().map(Element::id) {
            Some(id) => id,
            None => {
                let head = Element::new("head");
                let id = head.id();
                self.root.children.insert(0, Node::Element(head));
                id
            }
        };
        let title_el = Element::new("title").with_child(Node::Text(title.to_string()));
        let _ = self.append_to(head, Node::Element(title_el));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
        <html>
        <head><title> Home </title></head>
        <body>
            <header>Site</header>
            <main data-page-container class="fade in">
                <p id="intro">Hello <a href="/about"><span>About</span></a></p>
            </main>
            <footer>Footer</footer>
        </body>
        </html>"#;

    #[test]
    fn test_title() {
        let doc = Document::parse(PAGE);
        assert_eq!(doc.title(), "Home");
    }

    #[test]
    fn test_set_title_existing() {
        let mut doc = Document::parse(PAGE);
        doc.set_title("About");
        assert_eq!(doc.title(), "About");
        assert_eq!(doc.query_all(|el| el.name() == "title").len(), 1);
    }

    #[test]
    fn test_set_title_missing() {
        let mut doc = Document::parse("<p>no title</p>");
        doc.set_title("Created");
        assert_eq!(doc.title(), "Created");
        assert!(doc.head().unwrap().children().iter().any(|n| n.as_element().is_some_and(|el| el.name() == "title")));
    }

    #[test]
    fn test_content_root() {
        let doc = Document::parse(PAGE);
        let root = doc.content_root("data-page-container", None).unwrap();
        assert_eq!(root.name(), "main");
        assert!(doc.content_root("data-page-container", Some("data-page-no-cache")).is_none());
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let doc = Document::parse(PAGE);
        let span = doc.query(|el| el.name() == "span").unwrap();
        let names: Vec<&str> = doc.ancestors(span.id()).iter().map(|el| el.name()).collect();
        assert_eq!(names, vec!["span", "a", "p", "main", "body", "html"]);
    }

    #[test]
    fn test_clone_is_detached() {
        let mut live = Document::parse(PAGE);
        let snapshot = live.clone();
        let id = live.query(|el| el.name() == "main").unwrap().id();
        live.get_mut(id).unwrap().set_attr("data-changed", "");
        assert!(snapshot.get(id).is_some_and(|el| !el.has_attr("data-changed")));
    }

    #[test]
    fn test_clone_detached_fresh_ids() {
        let doc = Document::parse(PAGE);
        let main = doc.content_root("data-page-container", None).unwrap();
        let copy = main.clone_detached();
        assert_ne!(copy.id(), main.id());
        assert_eq!(copy.text(), main.text());
        assert!(doc.get(copy.id()).is_none());
    }

    #[test]
    fn test_insert_after_and_remove() {
        let mut doc = Document::parse(PAGE);
        let main_id = doc.content_root("data-page-container", None).unwrap().id();
        let replacement = Element::new("main").with_attr("data-page-container", "");
        let new_id = replacement.id();
        doc.insert_after(main_id, replacement).unwrap();

        let body = doc.body().unwrap();
        let order: Vec<NodeId> = body.children().iter().filter_map(Node::as_element).map(Element::id).collect();
        let main_pos = order.iter().position(|id| *id == main_id).unwrap();
        assert_eq!(order[main_pos + 1], new_id);

        assert!(doc.remove(main_id).is_some());
        assert!(doc.get(main_id).is_none());
        assert_eq!(doc.content_root("data-page-container", None).unwrap().id(), new_id);
    }

    #[test]
    fn test_insert_after_unknown_sibling() {
        let mut doc = Document::parse(PAGE);
        let stray = Element::new("div");
        let unknown = Element::new("div").id();
        assert!(matches!(doc.insert_after(unknown, stray), Err(crate::Error::InvalidInput(_))));
    }

    #[test]
    fn test_classes() {
        let mut doc = Document::parse(PAGE);
        let id = doc.content_root("data-page-container", None).unwrap().id();
        let main = doc.get_mut(id).unwrap();
        main.remove_class("in");
        main.add_class("out");
        main.add_class("out");
        assert_eq!(main.attr("class"), Some("fade out"));
        assert!(main.has_class("fade"));
    }
}

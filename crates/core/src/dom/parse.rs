//! HTML parsing into the owned tree, via scraper (html5ever).

use scraper::{ElementRef, Html};

use super::{Document, Element, Node};

impl Document {
    /// Parse a complete HTML document. Parsing never fails: html5ever repairs
    /// malformed markup and always produces `<html>`, `<head>` and `<body>`.
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        Document::from_root(convert_element(parsed.root_element()))
    }
}

fn convert_element(source: ElementRef<'_>) -> Element {
    let mut element = Element::new(source.value().name());
    for (name, value) in source.value().attrs() {
        element.set_attr(name, value);
    }

    for child in source.children() {
        match child.value() {
            scraper::Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    element.append_child(Node::Element(convert_element(child_ref)));
                }
            }
            scraper::Node::Text(text) => element.append_child(Node::Text(String::from(&**text))),
            scraper::Node::Comment(comment) => element.append_child(Node::Comment(String::from(&**comment))),
            _ => {}
        }
    }

    element
}

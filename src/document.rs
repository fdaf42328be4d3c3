//! Minimal structured-document interface over parsed HTML.
//!
//! The normalizer only needs a handful of tree operations: find one element,
//! find all elements below it, read and write attributes, and serialize. They
//! live behind [`StructuredDocument`] so normalization logic never touches a
//! concrete HTML library and can be exercised against synthetic trees.
//!
//! [`ScraperDocument`] is the production implementation on top of `scraper`.
//! Attribute writes edit the parsed tree in place and serialization is left to
//! html5ever.

use crate::error::{CompareError, Result};
use ego_tree::NodeId;
use html5ever::{LocalName, Namespace, QualName};
use scraper::{ElementRef, Html, Node, Selector};

pub trait StructuredDocument {
    /// Handle to an element inside the document.
    type Node: Copy;

    /// First element in document order matching `selector`.
    fn select_one(&self, selector: &str) -> Result<Option<Self::Node>>;

    /// Every element strictly below `scope` matching `selector`, in document order.
    fn select_all(&self, scope: Self::Node, selector: &str) -> Result<Vec<Self::Node>>;

    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);

    /// Serialized markup of the children of `node`, without `node` itself.
    fn inner_markup(&self, node: Self::Node) -> String;

    /// Concatenated text of every text node below `node`.
    fn text_content(&self, node: Self::Node) -> String;

    /// The outermost element of the document.
    fn root(&self) -> Self::Node;
}

pub struct ScraperDocument {
    html: Html,
}

impl ScraperDocument {
    pub fn parse_document(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub fn parse_fragment(markup: &str) -> Self {
        Self {
            html: Html::parse_fragment(markup),
        }
    }

    fn element(&self, node: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(node).and_then(ElementRef::wrap)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|_| CompareError::InvalidSelector(selector.to_string()))
}

impl StructuredDocument for ScraperDocument {
    type Node = NodeId;

    fn select_one(&self, selector: &str) -> Result<Option<NodeId>> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).next().map(|e| e.id()))
    }

    fn select_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let selector = parse_selector(selector)?;
        Ok(self
            .element(scope)
            .map(|e| e.select(&selector).map(|m| m.id()).collect())
            .unwrap_or_default())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)
            .and_then(|e| e.value().attr(name))
            .map(str::to_string)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(mut node_mut) = self.html.tree.get_mut(node) else {
            return;
        };
        let Node::Element(element) = node_mut.value() else {
            return;
        };
        let key = QualName::new(None, Namespace::from(""), LocalName::from(name));
        match element.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value.into(),
            None => element.attrs.push((key, value.into())),
        }
    }

    fn inner_markup(&self, node: NodeId) -> String {
        self.element(node)
            .map(|e| e.inner_html())
            .unwrap_or_default()
    }

    fn text_content(&self, node: NodeId) -> String {
        self.element(node)
            .map(|e| e.text().collect::<String>())
            .unwrap_or_default()
    }

    fn root(&self) -> NodeId {
        self.html.root_element().id()
    }
}

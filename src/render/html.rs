//! Owned HTML fragment tree.
//!
//! Post bodies are parsed once with html5ever into an `RcDom`, then copied
//! into a plain owned tree of [`Node`]s. Everything downstream (quote repair,
//! image lookup, Markdown rendering) works on that tree and never touches
//! `Rc`/`RefCell`.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Node {
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Element {
    /// Lower-case local tag name.
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

/// The children of a post body, in document order.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Fragment {
    /// Parse an HTML snippet. html5ever never fails on malformed markup; it
    /// repairs it the way a browser would.
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        let nodes = find_body(&dom.document)
            .map(|body| body.children.borrow().iter().filter_map(convert).collect())
            .unwrap_or_default();
        Self { nodes }
    }

    /// `src` of the first `<img>` in document order.
    pub fn first_image_src(&self) -> Option<&str> {
        fn walk(nodes: &[Node]) -> Option<&str> {
            nodes.iter().find_map(|node| match node {
                Node::Element(el) if el.name == "img" => el
                    .attr("src")
                    .filter(|src| !src.trim().is_empty())
                    .or_else(|| walk(&el.children)),
                Node::Element(el) => walk(&el.children),
                Node::Text(_) => None,
            })
        }
        walk(&self.nodes)
    }

    #[cfg(test)]
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.nodes, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) => collect_text(&el.children, out),
        }
    }
}

fn find_body(handle: &Handle) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &handle.data {
        if name.local.as_ref() == "body" {
            return Some(handle.clone());
        }
    }
    handle.children.borrow().iter().find_map(find_body)
}

fn convert(handle: &Handle) -> Option<Node> {
    match &handle.data {
        NodeData::Text { contents } => Some(Node::Text(contents.borrow().to_string())),
        NodeData::Element { name, attrs, .. } => Some(Node::Element(Element {
            name: name.local.to_string(),
            attrs: attrs
                .borrow()
                .iter()
                .map(|a| (a.name.local.to_string(), a.value.to_string()))
                .collect(),
            children: handle.children.borrow().iter().filter_map(convert).collect(),
        })),
        _ => None,
    }
}

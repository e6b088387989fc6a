//! Quote-author repair.
//!
//! Spectrum and the Reddit-style forum markup both put the quoted user's
//! name in a bare `<div>` right before the quoted text, with nothing
//! separating them once the markup is flattened. After every such marker we
//! insert a colon and two line breaks so the rendered quote reads
//! `Name:` followed by the quoted paragraphs.

use super::html::{Element, Fragment, Node};

/// Marker classes, one per source platform.
const AUTHOR_CLASSES: [&str; 2] = ["quoteauthor", "bb_quoteauthor"];

pub fn repair(fragment: Fragment) -> Fragment {
    Fragment {
        nodes: repair_nodes(fragment.nodes),
    }
}

fn repair_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(mut el) => {
                let marker = is_author_marker(&el);
                el.children = repair_nodes(el.children);
                out.push(Node::Element(el));
                if marker {
                    out.push(Node::Text(":".to_string()));
                    out.push(Node::Element(Element::new("br")));
                    out.push(Node::Element(Element::new("br")));
                }
            }
            text => out.push(text),
        }
    }
    out
}

fn is_author_marker(el: &Element) -> bool {
    el.name == "div" && AUTHOR_CLASSES.iter().any(|class| el.has_class(class))
}

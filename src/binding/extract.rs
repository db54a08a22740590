//! Fragment walker
//!
//! Visits elements (attributes first, then children) and text nodes; comments
//! are ignored. Text runs containing placeholders are split into one text
//! node per token so each expression owns the node it renders into.

use tracing::trace;

use super::{Binding, Target};
use crate::dom::{Node, NodeKind};
use crate::template::{is_static, tokenize};

/// Collect the bindings of a fragment, rewriting its text runs in place
pub fn extract(root: &Node) -> Vec<Binding> {
    let mut bindings = Vec::new();
    walk(root, &mut bindings);
    bindings
}

fn walk(node: &Node, bindings: &mut Vec<Binding>) {
    // Snapshot: text runs replace themselves while we iterate
    for child in node.children() {
        match child.kind() {
            NodeKind::Element => {
                bind_attributes(&child, bindings);
                walk(&child, bindings);
            }
            NodeKind::Text => bind_text(&child, bindings),
            NodeKind::Fragment | NodeKind::Comment => {}
        }
    }
}

fn bind_attributes(element: &Node, bindings: &mut Vec<Binding>) {
    for attr in element.attributes() {
        let tokens = tokenize(&attr.value());
        for token in tokens.iter().filter(|token| token.is_expression()) {
            trace!(attribute = attr.name(), path = %token.text, "attribute binding");
            bindings.push(Binding::new(Target::Attribute(attr.clone()), &token.text));
        }
    }
}

fn bind_text(node: &Node, bindings: &mut Vec<Binding>) {
    let tokens = tokenize(&node.text_content());
    if is_static(&tokens) {
        return;
    }
    let Some(parent) = node.parent() else {
        return;
    };

    for token in tokens.iter() {
        let text = Node::text(&token.text);
        parent.insert_before(&text, node);
        if token.is_expression() {
            trace!(path = %token.text, "text binding");
            bindings.push(Binding::new(Target::Text(text), &token.text));
        }
    }

    parent.remove_child(node);
}

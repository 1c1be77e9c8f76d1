// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

use super::ids::assign_node_ids;
use super::node::{Node, NodeKind};

/// A five-node tree with ids `node-0` through `node-4`:
/// root > heading("Intro"), paragraph("Welcome.").
pub(crate) fn intro_tree() -> Node {
    let mut root = Node::container(NodeKind::Root);

    let mut heading = Node::heading(1);
    heading.push_child(Node::text("Intro"));
    root.push_child(heading);

    let mut paragraph = Node::container(NodeKind::Paragraph);
    paragraph.push_child(Node::text("Welcome."));
    root.push_child(paragraph);

    assign_node_ids(&mut root);
    root
}

/// A larger tree exercising every structural kind the serializer emits.
pub(crate) fn kitchen_sink_tree() -> Node {
    let mut root = Node::container(NodeKind::Root);

    let mut heading = Node::heading(2);
    heading.push_child(Node::text("Setup"));
    root.push_child(heading);

    let mut list = Node::container(NodeKind::List);
    list.set_property("ordered", serde_json::json!(false));
    for label in ["one", "two"] {
        let mut item = Node::container(NodeKind::ListItem);
        let mut paragraph = Node::container(NodeKind::Paragraph);
        paragraph.push_child(Node::text(label));
        item.push_child(paragraph);
        list.push_child(item);
    }
    root.push_child(list);

    let mut code = Node::leaf(NodeKind::Code);
    code.set_value(Some("cargo run"));
    code.set_property("lang", serde_json::json!("sh"));
    root.push_child(code);

    let mut quote = Node::container(NodeKind::Blockquote);
    let mut paragraph = Node::container(NodeKind::Paragraph);
    paragraph.push_child(Node::text("cited"));
    quote.push_child(paragraph);
    root.push_child(quote);

    root.push_child(Node::leaf(NodeKind::ThematicBreak));

    assign_node_ids(&mut root);
    root
}

// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};

use crate::model::{Node, NodeKind};

/// Parses Markdown text into an unstamped node tree.
///
/// The returned root carries no ids; callers stamp them with
/// [`crate::model::assign_node_ids`] (documents do this on construction).
/// Adjacent inline text runs are merged, so escapes and soft breaks never
/// split a text node.
pub fn parse_markdown(text: &str) -> Node {
    let mut stack: Vec<Node> = vec![Node::container(NodeKind::Root)];

    for event in Parser::new(text) {
        match event {
            Event::Start(tag) => stack.push(open_tag(tag)),
            Event::End(tag_end) => {
                let node = stack.pop().expect("start/end events are balanced");
                let node = close_tag(tag_end, node);
                attach(&mut stack, node);
            }
            Event::Text(text) => append_text(&mut stack, &text),
            Event::Code(code) => {
                let mut node = Node::leaf(NodeKind::InlineCode);
                node.set_value(Some(code.as_ref()));
                attach(&mut stack, node);
            }
            Event::Html(html) | Event::InlineHtml(html) => append_html(&mut stack, &html),
            Event::SoftBreak => append_text(&mut stack, " "),
            Event::HardBreak => attach(&mut stack, Node::leaf(NodeKind::Break)),
            Event::Rule => attach(&mut stack, Node::leaf(NodeKind::ThematicBreak)),
            // Footnotes, task markers, and math only appear with extension
            // options this parser does not enable.
            _ => {}
        }
    }

    let mut root = stack.pop().expect("root remains on the stack");
    debug_assert!(stack.is_empty());
    trim_block_values(&mut root);
    root
}

fn open_tag(tag: Tag<'_>) -> Node {
    match tag {
        Tag::Paragraph => Node::container(NodeKind::Paragraph),
        Tag::Heading { level, .. } => Node::heading(heading_depth(level)),
        Tag::BlockQuote(_) => Node::container(NodeKind::Blockquote),
        Tag::CodeBlock(kind) => {
            let mut node = Node::leaf(NodeKind::Code);
            node.set_value(Some(String::new()));
            if let CodeBlockKind::Fenced(info) = kind {
                let lang = info.split_whitespace().next().unwrap_or_default();
                if !lang.is_empty() {
                    node.set_property("lang", serde_json::json!(lang));
                }
            }
            node
        }
        Tag::List(start) => {
            let mut node = Node::container(NodeKind::List);
            node.set_property("ordered", serde_json::json!(start.is_some()));
            if let Some(start) = start {
                node.set_property("start", serde_json::json!(start));
            }
            node
        }
        Tag::Item => Node::container(NodeKind::ListItem),
        Tag::Emphasis => Node::container(NodeKind::Emphasis),
        Tag::Strong => Node::container(NodeKind::Strong),
        Tag::Link {
            dest_url, title, ..
        } => {
            let mut node = Node::container(NodeKind::Link);
            node.set_property("url", serde_json::json!(dest_url.as_ref()));
            if !title.is_empty() {
                node.set_property("title", serde_json::json!(title.as_ref()));
            }
            node
        }
        Tag::Image {
            dest_url, title, ..
        } => {
            // Alt text arrives as inner text events; accumulate in `value`
            // and shift it into the `alt` property on close.
            let mut node = Node::leaf(NodeKind::Image);
            node.set_value(Some(String::new()));
            node.set_property("url", serde_json::json!(dest_url.as_ref()));
            if !title.is_empty() {
                node.set_property("title", serde_json::json!(title.as_ref()));
            }
            node
        }
        Tag::HtmlBlock => {
            let mut node = Node::leaf(NodeKind::Html);
            node.set_value(Some(String::new()));
            node
        }
        other => Node::container(NodeKind::Other(extension_tag_name(&other).to_owned())),
    }
}

fn close_tag(tag_end: TagEnd, mut node: Node) -> Node {
    if tag_end == TagEnd::Image {
        let alt = node.value().unwrap_or_default().to_owned();
        node.set_value(None::<String>);
        if !alt.is_empty() {
            node.set_property("alt", serde_json::json!(alt));
        }
    }
    node
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// mdast-style tags for extension constructs. These only occur when a caller
/// parses with extension options enabled; the core parser never emits them,
/// but the tree model carries them through untouched.
fn extension_tag_name(tag: &Tag<'_>) -> &'static str {
    match tag {
        Tag::Strikethrough => "delete",
        Tag::Table(_) => "table",
        Tag::TableHead | Tag::TableRow => "tableRow",
        Tag::TableCell => "tableCell",
        Tag::FootnoteDefinition(_) => "footnoteDefinition",
        Tag::DefinitionList => "definitionList",
        Tag::DefinitionListTitle => "definitionListTitle",
        Tag::DefinitionListDefinition => "definitionListDefinition",
        Tag::MetadataBlock(_) => "metadata",
        Tag::Superscript => "superscript",
        Tag::Subscript => "subscript",
        _ => "unknown",
    }
}

fn attach(stack: &mut Vec<Node>, node: Node) {
    let parent = stack.last_mut().expect("root remains on the stack");
    parent.push_child(node);
}

fn append_text(stack: &mut Vec<Node>, text: &str) {
    let top = stack.last_mut().expect("root remains on the stack");

    // Value-accumulating leaves (code, html, image alt) swallow their inner
    // text directly.
    if !top.is_container() {
        let mut value = top.value().unwrap_or_default().to_owned();
        value.push_str(text);
        top.set_value(Some(value));
        return;
    }

    // Merge with a preceding text sibling so escapes and soft breaks do not
    // fragment the run.
    if let Some(last) = top.children_mut().and_then(|children| children.last_mut()) {
        if last.kind() == &NodeKind::Text {
            let mut value = last.value().unwrap_or_default().to_owned();
            value.push_str(text);
            last.set_value(Some(value));
            return;
        }
    }

    top.push_child(Node::text(text));
}

fn append_html(stack: &mut Vec<Node>, html: &str) {
    let top = stack.last_mut().expect("root remains on the stack");

    if top.kind() == &NodeKind::Html && !top.is_container() {
        let mut value = top.value().unwrap_or_default().to_owned();
        value.push_str(html);
        top.set_value(Some(value));
        return;
    }

    let mut node = Node::leaf(NodeKind::Html);
    node.set_value(Some(html.trim_end_matches('\n')));
    attach(stack, node);
}

/// Code blocks and html blocks keep the parser's trailing newline; drop it so
/// values are stable across a serialize/parse round trip.
fn trim_block_values(node: &mut Node) {
    if matches!(node.kind(), NodeKind::Code | NodeKind::Html) {
        if let Some(value) = node.value() {
            let trimmed = value.trim_end_matches('\n');
            if trimmed.len() != value.len() {
                let trimmed = trimmed.to_owned();
                node.set_value(Some(trimmed));
            }
        }
    }
    for child in node.children_mut().into_iter().flatten() {
        trim_block_values(child);
    }
}

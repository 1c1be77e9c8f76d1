// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

use crate::model::{Node, NodeKind};

/// Serializes a tree back to Markdown text.
///
/// Output ends with a single trailing newline unless the document is empty.
/// Unknown kinds degrade gracefully: containers render their children,
/// leaves render their value.
pub fn serialize_markdown(root: &Node) -> String {
    let blocks = root
        .children()
        .into_iter()
        .flatten()
        .map(block_to_string)
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>();

    let mut out = blocks.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn block_to_string(node: &Node) -> String {
    match node.kind() {
        NodeKind::Heading => {
            let depth = usize::from(node.depth().unwrap_or(1).clamp(1, 6));
            format!("{} {}", "#".repeat(depth), inline_content(node))
        }
        NodeKind::Paragraph => escape_block_start(inline_content(node)),
        NodeKind::Code => fenced_code(node),
        NodeKind::Blockquote => {
            let inner = node
                .children()
                .into_iter()
                .flatten()
                .map(block_to_string)
                .filter(|block| !block.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n");
            prefix_quote(&inner)
        }
        NodeKind::List => list_to_string(node),
        NodeKind::ThematicBreak => "---".to_owned(),
        NodeKind::Html => node.value().unwrap_or_default().to_owned(),
        // A block slot holding an inline or unknown node still renders.
        _ => inline_to_string(node),
    }
}

fn inline_content(node: &Node) -> String {
    let children = node.children().unwrap_or_default();
    if children.is_empty() {
        return node.value().map(escape_inline).unwrap_or_default();
    }
    children.iter().map(inline_to_string).collect()
}

fn inline_to_string(node: &Node) -> String {
    match node.kind() {
        NodeKind::Text => escape_inline(node.value().unwrap_or_default()),
        NodeKind::InlineCode => inline_code(node.value().unwrap_or_default()),
        NodeKind::Emphasis => format!("*{}*", inline_content(node)),
        NodeKind::Strong => format!("**{}**", inline_content(node)),
        NodeKind::Link => {
            let url = string_property(node, "url");
            format!("[{}]({})", inline_content(node), url_and_title(node, &url))
        }
        NodeKind::Image => {
            let url = string_property(node, "url");
            let alt = string_property(node, "alt");
            format!("![{}]({})", alt, url_and_title(node, &url))
        }
        NodeKind::Break => "\\\n".to_owned(),
        NodeKind::Html => node.value().unwrap_or_default().to_owned(),
        _ => {
            if node.is_container() {
                inline_content(node)
            } else {
                node.value().map(escape_inline).unwrap_or_default()
            }
        }
    }
}

fn string_property(node: &Node, key: &str) -> String {
    node.properties()
        .and_then(|map| map.get(key))
        .and_then(|value| value.as_str())
        .unwrap_or_default()
        .to_owned()
}

fn url_and_title(node: &Node, url: &str) -> String {
    let title = string_property(node, "title");
    if title.is_empty() {
        url.to_owned()
    } else {
        format!("{url} \"{}\"", title.replace('"', "\\\""))
    }
}

fn list_to_string(node: &Node) -> String {
    let items = node.children().unwrap_or_default();
    let ordered = node
        .properties()
        .and_then(|map| map.get("ordered"))
        .and_then(|value| value.as_bool())
        .unwrap_or(false);
    let start = node
        .properties()
        .and_then(|map| map.get("start"))
        .and_then(|value| value.as_u64())
        .unwrap_or(1);

    // An item holding block children marks the whole list as loose; loose
    // lists keep blank lines between items so the shape survives a reparse.
    let loose = items.iter().any(|item| {
        item.children()
            .into_iter()
            .flatten()
            .any(|child| is_block_kind(child.kind()))
    });

    let rendered_items = items
        .iter()
        .enumerate()
        .map(|(offset, item)| {
            let marker = if ordered {
                format!("{}. ", start.saturating_add(offset as u64))
            } else {
                "- ".to_owned()
            };
            render_list_item(item, &marker)
        })
        .collect::<Vec<_>>();

    rendered_items.join(if loose { "\n\n" } else { "\n" })
}

fn render_list_item(item: &Node, marker: &str) -> String {
    let children = item.children().unwrap_or_default();
    let content = if children.iter().any(|child| is_block_kind(child.kind())) {
        children
            .iter()
            .map(block_to_string)
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    } else {
        inline_content(item)
    };

    let indent = " ".repeat(marker.len());
    let mut lines = content.lines();
    let mut rendered = format!("{marker}{}", lines.next().unwrap_or_default());
    for line in lines {
        rendered.push('\n');
        if !line.is_empty() {
            rendered.push_str(&indent);
            rendered.push_str(line);
        }
    }
    rendered
}

fn is_block_kind(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Paragraph
            | NodeKind::Heading
            | NodeKind::Code
            | NodeKind::Blockquote
            | NodeKind::List
            | NodeKind::ThematicBreak
    )
}

fn fenced_code(node: &Node) -> String {
    let value = node.value().unwrap_or_default();
    let fence = "`".repeat((longest_backtick_run(value) + 1).max(3));
    let lang = string_property(node, "lang");

    if value.is_empty() {
        format!("{fence}{lang}\n{fence}")
    } else {
        format!("{fence}{lang}\n{value}\n{fence}")
    }
}

fn inline_code(value: &str) -> String {
    let run = longest_backtick_run(value);
    if run == 0 {
        format!("`{value}`")
    } else {
        let fence = "`".repeat(run + 1);
        format!("{fence} {value} {fence}")
    }
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<usize> = None;

    for index in memchr::memchr_iter(b'`', text.as_bytes()) {
        run = match previous {
            Some(prev) if index == prev + 1 => run + 1,
            _ => 1,
        };
        previous = Some(index);
        longest = longest.max(run);
    }

    longest
}

fn escape_inline(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '*' | '_' | '[' | ']' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// A paragraph whose text begins with a block-introducing character would
/// reparse as that block; escape the first character. Ordered-list markers
/// (`1.` / `2)`) get the backslash on the delimiter after the digits.
fn escape_block_start(text: String) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first @ ('#' | '>' | '-' | '+')) => format!("\\{first}{}", chars.as_str()),
        Some('0'..='9') => {
            let digits = text.bytes().take_while(u8::is_ascii_digit).count();
            match text.as_bytes().get(digits) {
                Some(b'.' | b')') => format!("{}\\{}", &text[..digits], &text[digits..]),
                _ => text,
            }
        }
        _ => text,
    }
}

fn prefix_quote(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_owned()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

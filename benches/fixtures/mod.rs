// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use std::fmt::Write;

use scriven::format::markdown::parse_markdown;
use scriven::model::{assign_node_ids, Node, NodeKind};
use scriven::ops::{Command, CommandBatch, NodeSpec, Position};

#[derive(Debug, Clone, Copy)]
pub enum Case {
    Small,
    Medium,
    Large,
}

impl Case {
    pub fn id(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    fn sections(self) -> usize {
        match self {
            Self::Small => 4,
            Self::Medium => 32,
            Self::Large => 128,
        }
    }
}

/// A document with `sections()` H2 sections, each holding prose, a list, and
/// a fenced code block. Word choice cycles deterministically.
pub fn markdown(case: Case) -> String {
    const WORDS: [&str; 8] = [
        "latency", "baseline", "cursor", "replica", "payload", "window", "offset", "digest",
    ];

    let mut out = String::from("# Benchmark corpus\n");
    for section in 0..case.sections() {
        let _ = write!(out, "\n## Section {section}\n\n");
        for sentence in 0..3 {
            for word in 0..12 {
                let pick = WORDS[(section + sentence * 3 + word) % WORDS.len()];
                out.push_str(pick);
                out.push(if word == 11 { '.' } else { ' ' });
            }
            out.push(' ');
        }
        out.push('\n');

        out.push('\n');
        for item in 0..4 {
            let pick = WORDS[(section + item) % WORDS.len()];
            let _ = writeln!(out, "- {pick} check {item}");
        }

        let _ = write!(out, "\n```rust\nlet section_{section} = {section};\n```\n");
    }
    out
}

pub fn tree(case: Case) -> Node {
    let mut root = parse_markdown(&markdown(case));
    assign_node_ids(&mut root);
    root
}

fn text_spec(value: &str) -> NodeSpec {
    let mut spec = NodeSpec::default();
    spec.value = Some(value.to_owned());
    let mut child = NodeSpec::default();
    child.kind = Some(NodeKind::Text);
    child.value = Some(value.to_owned());
    spec.children = Some(vec![child]);
    spec
}

/// `count` paragraph inserts appended to the root, each with one text child.
pub fn insert_batch(count: usize) -> CommandBatch {
    let commands = (0..count)
        .map(|index| Command::Insert {
            target: "node-0".parse().expect("node id"),
            position: Position::LastChild,
            node: text_spec(&format!("appended paragraph {index}")),
        })
        .collect();
    CommandBatch::parsed(commands)
}

/// `count` value rewrites spread over the first text nodes of the tree.
pub fn modify_batch(count: usize) -> CommandBatch {
    let commands = (0..count)
        .map(|index| Command::Modify {
            // Pre-order text ids cluster early; cycle a window of them.
            target: format!("node-{}", 2 + (index * 7) % 90).parse().expect("node id"),
            properties: None,
            value: Some(format!("rewritten {index}")),
        })
        .collect();
    CommandBatch::parsed(commands)
}

// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

use super::ids::{assign_node_ids, DocumentId};
use super::node::{Node, NodeKind};

/// A single Markdown document, held as an id-stamped tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    document_id: DocumentId,
    name: String,
    root: Node,
    /// The Markdown text `root` was last parsed from or serialized to.
    /// Used to detect out-of-band edits without reparsing on every sync.
    source: Option<String>,
    rev: u64,
}

impl Document {
    /// Wraps a parsed tree, stamping fresh pre-order ids onto every node.
    pub fn new(document_id: DocumentId, name: impl Into<String>, mut root: Node) -> Self {
        assign_node_ids(&mut root);
        Self {
            document_id,
            name: name.into(),
            root,
            source: None,
            rev: 0,
        }
    }

    pub fn empty(document_id: DocumentId, name: impl Into<String>) -> Self {
        Self::new(document_id, name, Node::container(NodeKind::Root))
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Swaps in a new tree, stamping fresh ids. Any node ids a caller held
    /// onto before the replacement are void afterwards.
    pub fn replace_root(&mut self, mut root: Node) {
        assign_node_ids(&mut root);
        self.root = root;
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, source: Option<String>) {
        self.source = source;
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn set_rev(&mut self, rev: u64) {
        self.rev = rev;
    }

    pub fn bump_rev(&mut self) {
        self.rev = self.rev.saturating_add(1);
    }
}

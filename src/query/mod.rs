// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

//! Read-only queries over document trees.
//!
//! Queries provide lookups and derived views that power the MCP tools.

pub mod search;
pub mod tree;

pub use search::{search_by_text, TextMatch};
pub use tree::{
    find_node_and_parent, find_node_by_id, find_node_by_id_mut, find_nodes_by_kind,
    find_parent_and_index, find_parent_and_index_mut,
};

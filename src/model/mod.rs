// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

//! Core data model.
//!
//! Sessions contain Markdown documents, each held as an id-stamped node tree.

pub mod document;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod ids;
pub mod node;
pub mod session;

pub use document::Document;
pub use ids::{assign_node_ids, DocumentId, Id, IdAllocator, IdError, NodeId, SessionId};
pub use node::{Node, NodeKind};
pub use session::Session;

// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

//! Scriven — Markdown document sessions with agent-driven structural edits.
//!
//! Documents are held as id-stamped ASTs; agents take a tree snapshot over
//! MCP, address nodes by id, and mutate them with command batches.

pub mod format;
pub mod llm;
pub mod mcp;
pub mod model;
pub mod ops;
pub mod query;
pub mod store;

#[cfg(test)]
mod tests {
    #[test]
    fn sanity() {
        assert_eq!(2 + 2, 4);
    }
}

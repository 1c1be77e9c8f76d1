// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

//! Persistence for sessions on disk.
//!
//! The store module reads/writes the workspace folder format (meta file plus
//! one Markdown file per document) used by both the CLI and MCP server.

pub mod workspace;

pub use workspace::{
    apply_batch_to_file, process_markdown_files, FileBatchOutcome, SessionMeta,
    SessionMetaDocument, StoreError, WorkspaceFolder, WriteDurability,
};

// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentSummary {
    pub document_id: String,
    pub name: String,
    pub rev: u64,
    pub nodes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListDocumentsResponse {
    pub documents: Vec<DocumentSummary>,
    pub active_document_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DocumentOpenParams {
    pub document_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentOpenResponse {
    pub active_document_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentCurrentResponse {
    pub active_document_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DocumentCreateFromMarkdownParams {
    pub markdown: String,
    pub document_id: Option<String>,
    pub name: Option<String>,
    pub make_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentCreateFromMarkdownResponse {
    pub document: DocumentSummary,
    pub active_document_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DocumentTreeParams {
    pub document_id: Option<String>,
}

/// The AST snapshot an agent works from. `root` is the id-stamped node tree;
/// the ids in it are the only valid command targets until the next snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentTreeResponse {
    pub document_id: String,
    pub rev: u64,
    pub root: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DocumentRenderMarkdownParams {
    pub document_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentRenderMarkdownResponse {
    pub document_id: String,
    pub rev: u64,
    pub markdown: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DocumentSearchParams {
    pub query: String,
    pub document_id: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpTextMatch {
    pub node_id: String,
    pub kind: String,
    pub excerpt: String,
    pub score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentSearchResponse {
    pub document_id: String,
    pub matches: Vec<McpTextMatch>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CommandsApplyParams {
    pub document_id: Option<String>,
    /// The document rev the command batch was produced against, as returned
    /// by `document.tree`. A mismatch rejects the whole batch.
    pub base_rev: u64,
    /// Raw command objects in the wire format: each is
    /// `{"action": "...", "target": "node-N", ...}`.
    pub commands: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CommandOutcomeSummary {
    pub index: u64,
    pub applied: bool,
    /// `inserted`/`deleted`/`moved`/`modified`/`replaced` when applied, the
    /// error message when skipped.
    pub detail: String,
    /// The id of the node an insert or replace created.
    pub new_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CommandsApplyResponse {
    pub document_id: String,
    pub new_rev: u64,
    pub applied: u64,
    pub skipped: u64,
    pub outcomes: Vec<CommandOutcomeSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentSaveResponse {
    pub saved_documents: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DocumentDeleteParams {
    pub document_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentDeleteResponse {
    pub deleted_document_id: String,
    pub active_document_id: Option<String>,
}

// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use tokio::sync::Mutex;

use crate::format::markdown::{parse_markdown, serialize_markdown};
use crate::model::{Document, DocumentId, Session};
use crate::ops::{
    execute_commands, CommandBatch, CommandEffect, CommandEntry, CommandOutcome,
};
use crate::query::search_by_text;
use crate::store::WorkspaceFolder;

use super::types::*;

const DEFAULT_SEARCH_LIMIT: u64 = 10;

#[derive(Debug)]
struct McpState {
    session: Session,
}

#[derive(Clone)]
pub struct ScrivenMcp {
    state: Arc<Mutex<McpState>>,
    workspace: Option<Arc<WorkspaceFolder>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ScrivenMcp {
    pub fn new(session: Session) -> Self {
        Self {
            state: Arc::new(Mutex::new(McpState { session })),
            workspace: None,
            tool_router: Self::tool_router(),
        }
    }

    pub fn new_persistent(session: Session, workspace: WorkspaceFolder) -> Self {
        Self {
            state: Arc::new(Mutex::new(McpState { session })),
            workspace: Some(Arc::new(workspace)),
            tool_router: Self::tool_router(),
        }
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    /// In persistent mode, picks up out-of-band workspace edits before a tool
    /// acts. Documents changed on disk are reparsed and their node ids are
    /// restamped, so a client holding ids for such a document must take a
    /// fresh `document.tree` snapshot.
    async fn lock_state_synced(&self) -> Result<tokio::sync::MutexGuard<'_, McpState>, ErrorData> {
        let mut state = self.state.lock().await;
        if let Some(workspace) = &self.workspace {
            workspace.sync_session(&mut state.session).map_err(|err| {
                ErrorData::internal_error(
                    format!("failed to sync session with workspace: {err}"),
                    None,
                )
            })?;
        }
        Ok(state)
    }

    fn persist_candidate(
        &self,
        state: &mut McpState,
        mut candidate: Session,
    ) -> Result<(), ErrorData> {
        if let Some(workspace) = &self.workspace {
            workspace.save_session(&mut candidate).map_err(|err| {
                ErrorData::internal_error(format!("failed to persist session: {err}"), None)
            })?;
        }
        state.session = candidate;
        Ok(())
    }

    /// List documents in the current session; start here, then call
    /// `document.current` or `document.open` (bootstrap with
    /// `document.create_from_markdown` if empty).
    #[tool(name = "document.list")]
    async fn document_list(&self) -> Result<Json<ListDocumentsResponse>, ErrorData> {
        let state = self.lock_state_synced().await?;
        let documents = state
            .session
            .documents()
            .iter()
            .map(|(document_id, document)| document_summary(document_id, document))
            .collect::<Vec<_>>();
        let active_document_id = state
            .session
            .active_document_id()
            .map(|document_id| document_id.as_str().to_owned());

        Ok(Json(ListDocumentsResponse {
            documents,
            active_document_id,
        }))
    }

    /// Set the active document default for document-scoped tools; typically
    /// follows `document.list` or `document.create_from_markdown`.
    #[tool(name = "document.open")]
    async fn document_open(
        &self,
        params: Parameters<DocumentOpenParams>,
    ) -> Result<Json<DocumentOpenResponse>, ErrorData> {
        let parsed = parse_document_id(&params.0.document_id)?;

        let mut state = self.lock_state_synced().await?;
        if !state.session.documents().contains_key(&parsed) {
            return Err(ErrorData::resource_not_found(
                "document not found",
                Some(serde_json::json!({ "document_id": parsed.as_str() })),
            ));
        }

        let mut candidate = state.session.clone();
        candidate.set_active_document_id(Some(parsed.clone()));
        self.persist_candidate(&mut state, candidate)?;

        Ok(Json(DocumentOpenResponse {
            active_document_id: parsed.as_str().to_owned(),
        }))
    }

    /// Get the active document id (`null` when unset); check this before
    /// deciding whether to call `document.open`, then continue with
    /// `document.tree`.
    #[tool(name = "document.current")]
    async fn document_current(&self) -> Result<Json<DocumentCurrentResponse>, ErrorData> {
        let state = self.lock_state_synced().await?;
        let active_document_id = state
            .session
            .active_document_id()
            .map(|document_id| document_id.as_str().to_owned());

        Ok(Json(DocumentCurrentResponse { active_document_id }))
    }

    /// Create a document from raw Markdown; use to bootstrap a session, then
    /// continue with `document.tree`.
    #[tool(name = "document.create_from_markdown")]
    async fn document_create_from_markdown(
        &self,
        params: Parameters<DocumentCreateFromMarkdownParams>,
    ) -> Result<Json<DocumentCreateFromMarkdownResponse>, ErrorData> {
        let DocumentCreateFromMarkdownParams {
            markdown,
            document_id,
            name,
            make_active,
        } = params.0;
        let make_active = make_active.unwrap_or(true);

        let mut state = self.lock_state_synced().await?;
        let document_id = match document_id {
            Some(document_id) => {
                let parsed = parse_document_id(&document_id)?;
                if state.session.documents().contains_key(&parsed) {
                    return Err(ErrorData::invalid_params(
                        "document_id already exists",
                        Some(serde_json::json!({ "document_id": parsed.as_str() })),
                    ));
                }
                parsed
            }
            None => allocate_document_id(&state.session),
        };
        let name = name.unwrap_or_else(|| document_id.as_str().to_owned());

        let document = Document::new(document_id.clone(), name, parse_markdown(&markdown));
        let summary = document_summary(&document_id, &document);

        let mut candidate = state.session.clone();
        candidate
            .documents_mut()
            .insert(document_id.clone(), document);
        if make_active {
            candidate.set_active_document_id(Some(document_id));
        }
        self.persist_candidate(&mut state, candidate)?;

        Ok(Json(DocumentCreateFromMarkdownResponse {
            document: summary,
            active_document_id: state
                .session
                .active_document_id()
                .map(|document_id| document_id.as_str().to_owned()),
        }))
    }

    /// Get the full AST with node ids — the snapshot every command batch is
    /// written against. Ids from an earlier snapshot are void once the
    /// document has been reparsed, so take a fresh tree after out-of-band
    /// edits and before composing commands.
    #[tool(name = "document.tree")]
    async fn document_tree(
        &self,
        params: Parameters<DocumentTreeParams>,
    ) -> Result<Json<DocumentTreeResponse>, ErrorData> {
        let state = self.lock_state_synced().await?;
        let document_id = resolve_document_id(&state.session, params.0.document_id.as_deref())?;
        let document = state
            .session
            .documents()
            .get(&document_id)
            .ok_or_else(|| ErrorData::resource_not_found("document not found", None))?;

        let root = serde_json::to_value(document.root()).map_err(|err| {
            ErrorData::internal_error(format!("failed to serialize document tree: {err}"), None)
        })?;

        Ok(Json(DocumentTreeResponse {
            document_id: document_id.as_str().to_owned(),
            rev: document.rev(),
            root,
        }))
    }

    /// Render a document back to Markdown text.
    #[tool(name = "document.render_markdown")]
    async fn document_render_markdown(
        &self,
        params: Parameters<DocumentRenderMarkdownParams>,
    ) -> Result<Json<DocumentRenderMarkdownResponse>, ErrorData> {
        let state = self.lock_state_synced().await?;
        let document_id = resolve_document_id(&state.session, params.0.document_id.as_deref())?;
        let document = state
            .session
            .documents()
            .get(&document_id)
            .ok_or_else(|| ErrorData::resource_not_found("document not found", None))?;

        Ok(Json(DocumentRenderMarkdownResponse {
            document_id: document_id.as_str().to_owned(),
            rev: document.rev(),
            markdown: serialize_markdown(document.root()),
        }))
    }

    /// Fuzzy-search document text and get node ids back; use the ids as
    /// command targets instead of walking the whole tree.
    #[tool(name = "document.search")]
    async fn document_search(
        &self,
        params: Parameters<DocumentSearchParams>,
    ) -> Result<Json<DocumentSearchResponse>, ErrorData> {
        let DocumentSearchParams {
            query,
            document_id,
            limit,
        } = params.0;
        let limit = usize::try_from(limit.unwrap_or(DEFAULT_SEARCH_LIMIT)).unwrap_or(usize::MAX);

        let state = self.lock_state_synced().await?;
        let document_id = resolve_document_id(&state.session, document_id.as_deref())?;
        let document = state
            .session
            .documents()
            .get(&document_id)
            .ok_or_else(|| ErrorData::resource_not_found("document not found", None))?;

        let matches = search_by_text(document.root(), &query, limit)
            .into_iter()
            .map(|text_match| McpTextMatch {
                node_id: text_match.node_id.as_str().to_owned(),
                kind: text_match.kind.as_str().to_owned(),
                excerpt: text_match.excerpt,
                score: text_match.score,
            })
            .collect();

        Ok(Json(DocumentSearchResponse {
            document_id: document_id.as_str().to_owned(),
            matches,
        }))
    }

    /// Apply a command batch gated by `base_rev` from `document.tree`.
    /// Commands fail one by one, never as a group: the response lists every
    /// outcome in batch order, and on a stale `base_rev` nothing is applied —
    /// refresh with `document.tree` and retry.
    #[tool(name = "commands.apply")]
    async fn commands_apply(
        &self,
        params: Parameters<CommandsApplyParams>,
    ) -> Result<Json<CommandsApplyResponse>, ErrorData> {
        let CommandsApplyParams {
            document_id,
            base_rev,
            commands,
        } = params.0;

        let mut state = self.lock_state_synced().await?;
        let document_id = resolve_document_id(&state.session, document_id.as_deref())?;
        let document = state
            .session
            .documents()
            .get(&document_id)
            .ok_or_else(|| ErrorData::resource_not_found("document not found", None))?;

        let current_rev = document.rev();
        if base_rev != current_rev {
            return Err(ErrorData::invalid_request(
                "conflict: stale base_rev",
                Some(serde_json::json!({
                    "base_rev": base_rev,
                    "current_rev": current_rev,
                    "snapshot_tool": "document.tree",
                })),
            ));
        }

        let entries = commands
            .into_iter()
            .map(serde_json::from_value::<CommandEntry>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| {
                ErrorData::invalid_params(format!("malformed command payload: {err}"), None)
            })?;
        let batch = CommandBatch { commands: entries };

        let mut candidate_document = document.clone();
        let report = execute_commands(candidate_document.root_mut(), &batch);
        if report.applied() > 0 {
            candidate_document.bump_rev();
        }
        let new_rev = candidate_document.rev();

        let mut candidate = state.session.clone();
        candidate
            .documents_mut()
            .insert(document_id.clone(), candidate_document);
        self.persist_candidate(&mut state, candidate)?;

        Ok(Json(CommandsApplyResponse {
            document_id: document_id.as_str().to_owned(),
            new_rev,
            applied: report.applied() as u64,
            skipped: report.skipped() as u64,
            outcomes: report.outcomes.iter().map(outcome_summary).collect(),
        }))
    }

    /// Persist the session to the workspace folder now. Mutating tools
    /// already save on success; this exists for an explicit flush.
    #[tool(name = "document.save")]
    async fn document_save(&self) -> Result<Json<DocumentSaveResponse>, ErrorData> {
        let Some(workspace) = &self.workspace else {
            return Err(ErrorData::invalid_request(
                "server is running without a workspace folder; nothing to save",
                None,
            ));
        };

        let mut state = self.state.lock().await;
        workspace.save_session(&mut state.session).map_err(|err| {
            ErrorData::internal_error(format!("failed to persist session: {err}"), None)
        })?;

        Ok(Json(DocumentSaveResponse {
            saved_documents: state.session.documents().len() as u64,
        }))
    }

    /// Remove a document by id and retarget the active document when needed.
    #[tool(name = "document.delete")]
    async fn document_delete(
        &self,
        params: Parameters<DocumentDeleteParams>,
    ) -> Result<Json<DocumentDeleteResponse>, ErrorData> {
        let parsed = parse_document_id(&params.0.document_id)?;

        let mut state = self.lock_state_synced().await?;
        if !state.session.documents().contains_key(&parsed) {
            return Err(ErrorData::resource_not_found(
                "document not found",
                Some(serde_json::json!({ "document_id": parsed.as_str() })),
            ));
        }

        let mut candidate = state.session.clone();
        candidate.remove_document(&parsed);
        if candidate.active_document_id().is_none() {
            let next_active = candidate.documents().keys().next().cloned();
            candidate.set_active_document_id(next_active);
        }
        self.persist_candidate(&mut state, candidate)?;

        Ok(Json(DocumentDeleteResponse {
            deleted_document_id: parsed.as_str().to_owned(),
            active_document_id: state
                .session
                .active_document_id()
                .map(|document_id| document_id.as_str().to_owned()),
        }))
    }
}

#[tool_handler]
impl ServerHandler for ScrivenMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Scriven Markdown editing server (tools: document.list, document.open, \
document.current, document.create_from_markdown, document.tree, \
document.render_markdown, document.search, commands.apply, document.save, \
document.delete). Take a `document.tree` snapshot, address nodes by the ids \
in it, and apply edits with `commands.apply` gated by the snapshot's rev."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// Extracted mapping/parsing helpers for MCP tool handlers.
include!("server/helpers.rs");

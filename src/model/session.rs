// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use super::document::Document;
use super::ids::{DocumentId, SessionId};

/// The top-level container the MCP server runs against.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    session_id: SessionId,
    documents: BTreeMap<DocumentId, Document>,
    active_document_id: Option<DocumentId>,
}

impl Session {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            documents: BTreeMap::new(),
            active_document_id: None,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn documents(&self) -> &BTreeMap<DocumentId, Document> {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut BTreeMap<DocumentId, Document> {
        &mut self.documents
    }

    pub fn active_document_id(&self) -> Option<&DocumentId> {
        self.active_document_id.as_ref()
    }

    pub fn set_active_document_id(&mut self, document_id: Option<DocumentId>) {
        self.active_document_id = document_id;
    }

    pub fn active_document(&self) -> Option<&Document> {
        self.active_document_id
            .as_ref()
            .and_then(|document_id| self.documents.get(document_id))
    }

    pub fn active_document_mut(&mut self) -> Option<&mut Document> {
        let document_id = self.active_document_id.clone()?;
        self.documents.get_mut(&document_id)
    }

    /// Drops a document, clearing the active marker if it pointed at it.
    pub fn remove_document(&mut self, document_id: &DocumentId) -> Option<Document> {
        let removed = self.documents.remove(document_id);
        if removed.is_some() && self.active_document_id.as_ref() == Some(document_id) {
            self.active_document_id = None;
        }
        removed
    }
}

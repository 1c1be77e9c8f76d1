// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

fn parse_document_id(document_id: &str) -> Result<DocumentId, ErrorData> {
    DocumentId::new(document_id.to_owned()).map_err(|err| {
        ErrorData::invalid_params(
            format!("invalid document_id: {err}"),
            Some(serde_json::json!({ "document_id": document_id })),
        )
    })
}

/// Explicit id wins; otherwise the session's active document. No active
/// document and no explicit id is a caller error, not a crash.
fn resolve_document_id(
    session: &Session,
    document_id: Option<&str>,
) -> Result<DocumentId, ErrorData> {
    match document_id {
        Some(document_id) => parse_document_id(document_id),
        None => session.active_document_id().cloned().ok_or_else(|| {
            ErrorData::invalid_request(
                "no active document; pass document_id or call document.open first",
                None,
            )
        }),
    }
}

fn allocate_document_id(session: &Session) -> DocumentId {
    let mut counter = session.documents().len();
    loop {
        let candidate = format!("doc-{counter}");
        counter += 1;
        if !session.documents().contains_key(candidate.as_str()) {
            return DocumentId::new(candidate).expect("doc-<n> ids are non-empty and slash-free");
        }
    }
}

fn document_summary(document_id: &DocumentId, document: &Document) -> DocumentSummary {
    DocumentSummary {
        document_id: document_id.as_str().to_owned(),
        name: document.name().to_owned(),
        rev: document.rev(),
        nodes: document.root().node_count() as u64,
    }
}

fn outcome_summary(outcome: &CommandOutcome) -> CommandOutcomeSummary {
    let (applied, detail, new_id) = match &outcome.result {
        Ok(CommandEffect::Inserted { new_id }) => (
            true,
            format!("inserted {new_id}"),
            Some(new_id.as_str().to_owned()),
        ),
        Ok(CommandEffect::Deleted { node_id }) => (true, format!("deleted {node_id}"), None),
        Ok(CommandEffect::Moved { node_id }) => (true, format!("moved {node_id}"), None),
        Ok(CommandEffect::Modified { node_id }) => (true, format!("modified {node_id}"), None),
        Ok(CommandEffect::Replaced { node_id, new_id }) => (
            true,
            format!("replaced {node_id} with {new_id}"),
            Some(new_id.as_str().to_owned()),
        ),
        Err(error) => (false, error.to_string(), None),
    };

    CommandOutcomeSummary {
        index: outcome.index as u64,
        applied,
        detail,
        new_id,
    }
}

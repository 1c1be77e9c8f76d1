// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::format::markdown::{parse_markdown, serialize_markdown};
use crate::model::{Document, DocumentId, IdError, Session, SessionId};
use crate::ops::{execute_commands, BatchReport, CommandBatch};

const SESSION_META_FILENAME: &str = "scriven-session.meta.json";

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidId {
        field: &'static str,
        value: String,
        source: Box<IdError>,
    },
    InvalidRelativePath {
        field: &'static str,
        value: PathBuf,
    },
    PathOutsideWorkspace {
        workspace_dir: PathBuf,
        path: PathBuf,
    },
    SymlinkRefused {
        path: PathBuf,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
            Self::InvalidId {
                field,
                value,
                source,
            } => write!(f, "invalid id for {field}: {value:?}: {source}"),
            Self::InvalidRelativePath { field, value } => {
                write!(f, "invalid relative path for {field}: {value:?}")
            }
            Self::PathOutsideWorkspace {
                workspace_dir,
                path,
            } => write!(
                f,
                "path is outside workspace dir: workspace_dir={workspace_dir:?} path={path:?}"
            ),
            Self::SymlinkRefused { path } => {
                write!(f, "refusing to write through symlink at {path:?}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::InvalidId { source, .. } => Some(source),
            Self::InvalidRelativePath { .. }
            | Self::PathOutsideWorkspace { .. }
            | Self::SymlinkRefused { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMeta {
    pub session_id: SessionId,
    pub active_document_id: Option<DocumentId>,
    pub documents: Vec<SessionMetaDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetaDocument {
    pub document_id: DocumentId,
    pub name: String,
    pub md_path: PathBuf,
    pub rev: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to
    /// stable storage where possible. Exact guarantees are
    /// platform/filesystem-dependent.
    Durable,
}

/// A workspace directory holding one session: the meta file plus one
/// Markdown file per document.
#[derive(Debug, Clone)]
pub struct WorkspaceFolder {
    root: PathBuf,
    durability: WriteDurability,
}

impl WorkspaceFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_path(&self) -> PathBuf {
        self.root.join(SESSION_META_FILENAME)
    }

    pub fn default_document_md_path(&self, document_id: &DocumentId) -> PathBuf {
        let file_stem = encode_persisted_id_segment(document_id.as_str());
        self.root.join("documents").join(format!("{file_stem}.md"))
    }

    fn initial_session_id(&self) -> SessionId {
        let candidate = self
            .root
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .map(|name| format!("s:{name}"))
            .unwrap_or_else(|| "s:workspace".to_owned());

        SessionId::new(candidate).unwrap_or_else(|_| {
            SessionId::new("s:workspace").expect("hard-coded fallback session id is valid")
        })
    }

    fn initial_session(&self) -> Session {
        let mut session = Session::new(self.initial_session_id());
        let document_id =
            DocumentId::new("d:welcome").expect("hard-coded initial document id is valid");

        let root = parse_markdown("# Welcome\n\nThis workspace is empty so far.\n");
        let mut document = Document::new(document_id.clone(), "Welcome", root);
        document.set_source(Some(serialize_markdown(document.root())));

        session.documents_mut().insert(document_id.clone(), document);
        session.set_active_document_id(Some(document_id));
        session
    }

    pub fn load_or_init_session(&self) -> Result<Session, StoreError> {
        match self.load_session() {
            Ok(session) => Ok(session),
            Err(StoreError::Io { path, source })
                if source.kind() == io::ErrorKind::NotFound && path == self.meta_path() =>
            {
                let mut session = self.initial_session();
                self.save_session(&mut session)?;
                Ok(session)
            }
            Err(err) => Err(err),
        }
    }

    /// Persists the session: meta file plus Markdown text for every document
    /// whose revision changed (or whose file is missing). Updates each saved
    /// document's cached source text. Orphaned document files are removed.
    pub fn save_session(&self, session: &mut Session) -> Result<(), StoreError> {
        let existing_meta = match self.load_meta() {
            Ok(meta) => Some(meta),
            Err(StoreError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => None,
            Err(err) => return Err(err),
        };

        let mut existing_revs = BTreeMap::<DocumentId, u64>::new();
        if let Some(meta) = existing_meta.as_ref() {
            for document in &meta.documents {
                existing_revs.insert(document.document_id.clone(), document.rev);
            }
        }

        let mut meta = SessionMeta {
            session_id: session.session_id().clone(),
            active_document_id: session.active_document_id().cloned(),
            documents: Vec::new(),
        };

        for (document_id, document) in session.documents_mut() {
            let md_path = self.default_document_md_path(document_id);

            let rev_unchanged = existing_revs
                .get(document_id)
                .copied()
                .is_some_and(|rev| rev == document.rev())
                && md_path.is_file();

            if !rev_unchanged {
                let text = serialize_markdown(document.root());
                write_atomic_in_workspace(
                    self.root(),
                    &md_path,
                    text.as_bytes(),
                    self.durability,
                )?;
                document.set_source(Some(text));
            }

            meta.documents.push(SessionMetaDocument {
                document_id: document_id.clone(),
                name: document.name().to_owned(),
                md_path,
                rev: document.rev(),
            });
        }

        self.garbage_collect_document_files(&meta.documents)?;
        self.save_meta(&meta)?;
        Ok(())
    }

    fn garbage_collect_document_files(
        &self,
        documents: &[SessionMetaDocument],
    ) -> Result<(), StoreError> {
        let mut keep_stems = std::collections::BTreeSet::<String>::new();
        for document in documents {
            keep_stems.insert(document.document_id.to_string());
            keep_stems.insert(encode_persisted_id_segment(document.document_id.as_str()));
        }

        let documents_dir = self.root.join("documents");
        let entries = match fs::read_dir(&documents_dir) {
            Ok(entries) => entries,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: documents_dir,
                    source,
                });
            }
        };

        for entry in entries.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(document_stem) = file_name.strip_suffix(".md") else {
                continue;
            };
            if keep_stems.contains(document_stem) {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(source) if source.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(StoreError::Io { path, source });
                }
            }
        }

        Ok(())
    }

    pub fn load_session(&self) -> Result<Session, StoreError> {
        let meta = self.load_meta()?;

        let mut session = Session::new(meta.session_id);

        for document_meta in meta.documents {
            let md_path = document_meta.md_path;
            let text = fs::read_to_string(&md_path).map_err(|source| StoreError::Io {
                path: md_path.clone(),
                source,
            })?;

            let root = parse_markdown(&text);
            let mut document =
                Document::new(document_meta.document_id.clone(), document_meta.name, root);
            document.set_rev(document_meta.rev);
            document.set_source(Some(text));
            session
                .documents_mut()
                .insert(document_meta.document_id, document);
        }

        // The active marker only survives if the document it names does.
        if let Some(active) = meta.active_document_id {
            if session.documents().contains_key(&active) {
                session.set_active_document_id(Some(active));
            }
        }

        Ok(session)
    }

    /// Reconciles an in-memory session with out-of-band changes on disk.
    ///
    /// A document whose file content differs from the session's cached source
    /// is reparsed, which restamps its node ids; documents added or removed
    /// on disk are added or removed in memory. Untouched documents keep their
    /// trees, so node ids a caller holds for them stay valid.
    pub fn sync_session(&self, session: &mut Session) -> Result<(), StoreError> {
        let meta = match self.load_meta() {
            Ok(meta) => meta,
            Err(StoreError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return self.save_session(session);
            }
            Err(err) => return Err(err),
        };

        let mut disk_ids = std::collections::BTreeSet::new();
        for document_meta in &meta.documents {
            disk_ids.insert(document_meta.document_id.clone());

            let text = fs::read_to_string(&document_meta.md_path).map_err(|source| {
                StoreError::Io {
                    path: document_meta.md_path.clone(),
                    source,
                }
            })?;

            match session.documents_mut().get_mut(&document_meta.document_id) {
                Some(document) if document.source() == Some(text.as_str()) => {
                    // Unchanged on disk; in-memory tree stays authoritative.
                }
                Some(document) => {
                    document.replace_root(parse_markdown(&text));
                    document.set_source(Some(text));
                    document.set_rev(document_meta.rev.max(document.rev()));
                }
                None => {
                    let root = parse_markdown(&text);
                    let mut document = Document::new(
                        document_meta.document_id.clone(),
                        document_meta.name.clone(),
                        root,
                    );
                    document.set_rev(document_meta.rev);
                    document.set_source(Some(text));
                    session
                        .documents_mut()
                        .insert(document_meta.document_id.clone(), document);
                }
            }
        }

        let removed = session
            .documents()
            .keys()
            .filter(|document_id| !disk_ids.contains(*document_id))
            .cloned()
            .collect::<Vec<_>>();
        for document_id in removed {
            session.remove_document(&document_id);
        }

        if session.active_document().is_none() {
            let next_active = meta
                .active_document_id
                .filter(|active| session.documents().contains_key(active));
            session.set_active_document_id(next_active);
        }

        Ok(())
    }

    pub fn load_meta(&self) -> Result<SessionMeta, StoreError> {
        let meta_path = self.meta_path();
        let meta_str = fs::read_to_string(&meta_path).map_err(|source| StoreError::Io {
            path: meta_path.clone(),
            source,
        })?;

        let meta_json: SessionMetaJson =
            serde_json::from_str(&meta_str).map_err(|source| StoreError::Json {
                path: meta_path.clone(),
                source,
            })?;

        session_meta_from_json(self.root(), meta_json)
    }

    pub fn save_meta(&self, meta: &SessionMeta) -> Result<(), StoreError> {
        fs::create_dir_all(self.root()).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        let meta_path = self.meta_path();
        let meta_json = session_meta_to_json(self.root(), meta)?;
        let meta_str =
            serde_json::to_string_pretty(&meta_json).map_err(|source| StoreError::Json {
                path: meta_path.clone(),
                source,
            })?;

        write_atomic_in_workspace(
            self.root(),
            &meta_path,
            format!("{meta_str}\n").as_bytes(),
            self.durability,
        )
    }
}

/// Result of applying one command batch to one standalone Markdown file.
#[derive(Debug)]
pub struct FileBatchOutcome {
    pub path: PathBuf,
    pub result: Result<BatchReport, StoreError>,
}

/// Applies the same command batch to many Markdown files in parallel.
///
/// Each file is parsed, stamped with fresh ids, edited, and written back
/// atomically. Files fail independently; one unreadable file never blocks
/// the rest.
pub fn process_markdown_files(
    paths: &[PathBuf],
    batch: &CommandBatch,
    durability: WriteDurability,
) -> Vec<FileBatchOutcome> {
    paths
        .par_iter()
        .map(|path| FileBatchOutcome {
            path: path.clone(),
            result: apply_batch_to_file(path, path, batch, durability),
        })
        .collect()
}

/// Parses `input`, applies `batch`, and writes the serialized result to
/// `output` atomically.
pub fn apply_batch_to_file(
    input: &Path,
    output: &Path,
    batch: &CommandBatch,
    durability: WriteDurability,
) -> Result<BatchReport, StoreError> {
    let text = fs::read_to_string(input).map_err(|source| StoreError::Io {
        path: input.to_path_buf(),
        source,
    })?;

    let mut root = parse_markdown(&text);
    crate::model::assign_node_ids(&mut root);
    let report = execute_commands(&mut root, batch);
    let serialized = serialize_markdown(&root);

    let workspace_dir = output.parent().unwrap_or_else(|| Path::new("."));
    write_atomic_in_workspace(workspace_dir, output, serialized.as_bytes(), durability)?;

    Ok(report)
}

// Extracted persistence helpers for `WorkspaceFolder`.
include!("workspace/helpers.rs");

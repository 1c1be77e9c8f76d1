// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

// On-disk JSON shape for the session meta file. Paths are stored relative to
// the workspace root so the folder can be moved or checked into a repo.
#[derive(Debug, Serialize, Deserialize)]
struct SessionMetaJson {
    session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_document_id: Option<String>,
    documents: Vec<SessionMetaDocumentJson>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionMetaDocumentJson {
    document_id: String,
    name: String,
    md_path: PathBuf,
    #[serde(default)]
    rev: u64,
}

fn session_meta_to_json(
    workspace_dir: &Path,
    meta: &SessionMeta,
) -> Result<SessionMetaJson, StoreError> {
    let mut documents = Vec::with_capacity(meta.documents.len());
    for document in &meta.documents {
        documents.push(SessionMetaDocumentJson {
            document_id: document.document_id.to_string(),
            name: document.name.clone(),
            md_path: to_relative_path(workspace_dir, &document.md_path)?,
            rev: document.rev,
        });
    }

    Ok(SessionMetaJson {
        session_id: meta.session_id.to_string(),
        active_document_id: meta
            .active_document_id
            .as_ref()
            .map(|document_id| document_id.to_string()),
        documents,
    })
}

fn session_meta_from_json(
    workspace_dir: &Path,
    meta_json: SessionMetaJson,
) -> Result<SessionMeta, StoreError> {
    let session_id =
        SessionId::new(meta_json.session_id.clone()).map_err(|source| StoreError::InvalidId {
            field: "session_id",
            value: meta_json.session_id,
            source: Box::new(source),
        })?;

    let active_document_id = meta_json
        .active_document_id
        .map(|value| {
            DocumentId::new(value.clone()).map_err(|source| StoreError::InvalidId {
                field: "active_document_id",
                value,
                source: Box::new(source),
            })
        })
        .transpose()?;

    let mut documents = Vec::with_capacity(meta_json.documents.len());
    for document_json in meta_json.documents {
        let document_id = DocumentId::new(document_json.document_id.clone()).map_err(|source| {
            StoreError::InvalidId {
                field: "documents[].document_id",
                value: document_json.document_id,
                source: Box::new(source),
            }
        })?;

        validate_relative_path("documents[].md_path", &document_json.md_path)?;
        documents.push(SessionMetaDocument {
            document_id,
            name: document_json.name,
            md_path: workspace_dir.join(document_json.md_path),
            rev: document_json.rev,
        });
    }

    Ok(SessionMeta {
        session_id,
        active_document_id,
        documents,
    })
}

/// Encodes an id as a filesystem-safe file stem.
///
/// Characters outside `[A-Za-z0-9._ -]`, plus a few patterns Windows rejects
/// (device names, trailing dots/spaces), are escaped as `~XX` hex. The
/// encoding is injective, so distinct ids never collide on disk.
fn encode_persisted_id_segment(id: &str) -> String {
    fn push_escaped(out: &mut String, byte: u8) {
        out.push('~');
        out.push(char::from_digit(u32::from(byte >> 4), 16).expect("nibble is < 16"));
        out.push(char::from_digit(u32::from(byte & 0xf), 16).expect("nibble is < 16"));
    }

    let escape_all = is_windows_device_name(id);
    let mut out = String::with_capacity(id.len());
    let last_index = id.len().saturating_sub(1);
    for (index, byte) in id.bytes().enumerate() {
        let safe =
            matches!(byte, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b' ' | b'-');
        let trailing_unsafe = index == last_index && matches!(byte, b'.' | b' ');
        if safe && !escape_all && !trailing_unsafe {
            out.push(char::from(byte));
        } else {
            push_escaped(&mut out, byte);
        }
    }
    out
}

fn is_windows_device_name(stem: &str) -> bool {
    let base = stem.split('.').next().unwrap_or(stem);
    let upper = base.to_ascii_uppercase();
    matches!(upper.as_str(), "CON" | "PRN" | "AUX" | "NUL")
        || (upper.len() == 4
            && (upper.starts_with("COM") || upper.starts_with("LPT"))
            && upper.as_bytes()[3].is_ascii_digit())
}

/// Rejects absolute paths and any `..`/prefix components. `.` is tolerated.
fn validate_relative_path(field: &'static str, path: &Path) -> Result<(), StoreError> {
    let ok = !path.as_os_str().is_empty()
        && path.components().all(|component| {
            matches!(component, Component::Normal(_) | Component::CurDir)
        });
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidRelativePath {
            field,
            value: path.to_path_buf(),
        })
    }
}

fn to_relative_path(workspace_dir: &Path, path: &Path) -> Result<PathBuf, StoreError> {
    path.strip_prefix(workspace_dir)
        .map(Path::to_path_buf)
        .map_err(|_| StoreError::PathOutsideWorkspace {
            workspace_dir: workspace_dir.to_path_buf(),
            path: path.to_path_buf(),
        })
}

fn create_dir_all_safe(workspace_dir: &Path, path: &Path) -> Result<(), StoreError> {
    if !path.starts_with(workspace_dir) {
        return Err(StoreError::PathOutsideWorkspace {
            workspace_dir: workspace_dir.to_path_buf(),
            path: path.to_path_buf(),
        });
    }
    fs::create_dir_all(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Renames `from` to `to`, replacing `to` if it exists.
///
/// On Unix `fs::rename` already does this atomically. On Windows it fails if
/// the destination exists, so fall back to remove-then-rename there.
fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }

    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(_) => {
                match fs::remove_file(to) {
                    Ok(()) => {}
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => return Err(err),
                }
                fs::rename(from, to)
            }
        }
    }
}

/// Writes `contents` to `path` atomically: a uniquely-named temp file in the
/// same directory, then a rename over the destination. Refuses to write
/// through a symlink and refuses paths outside `workspace_dir`.
fn write_atomic_in_workspace(
    workspace_dir: &Path,
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    if !path.starts_with(workspace_dir) {
        return Err(StoreError::PathOutsideWorkspace {
            workspace_dir: workspace_dir.to_path_buf(),
            path: path.to_path_buf(),
        });
    }

    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => {
            return Err(StoreError::SymlinkRefused {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(source) if source.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    if let Some(parent) = path.parent() {
        create_dir_all_safe(workspace_dir, parent)?;
    }

    write_atomic_inner(path, contents, durability).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_atomic_inner(
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or(0);
    let tmp_path = parent.join(format!(".scriven.tmp.{file_name}.{nanos}"));

    let result = (|| {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(contents)?;
        if durability == WriteDurability::Durable {
            file.sync_all()?;
        }
        drop(file);
        rename_overwrite(&tmp_path, path)?;

        if durability == WriteDurability::Durable && !parent.as_os_str().is_empty() {
            // Flush the rename itself by syncing the containing directory.
            #[cfg(unix)]
            {
                fs::File::open(parent)?.sync_all()?;
            }
        }
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

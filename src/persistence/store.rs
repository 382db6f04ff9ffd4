use super::{DocumentRecord, PersistenceError, PersistenceResult};
use crate::config::EditorConfig;
use crate::document::Document;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const EXTENSION: &str = "json";

/// Index entry for one stored document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub name: String,
    pub updated_at: DateTime<Utc>,
    pub path: PathBuf,
}

/// Recently edited documents, newest first, capped in size
#[derive(Debug, Clone, Default)]
pub struct RecentDocuments {
    entries: Vec<DocumentSummary>,
    capacity: usize,
}

impl RecentDocuments {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn entries(&self) -> &[DocumentSummary] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&DocumentSummary> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Inserts or replaces an entry and returns the entries pushed past the cap
    pub fn upsert(&mut self, summary: DocumentSummary) -> Vec<DocumentSummary> {
        self.entries.retain(|entry| entry.id != summary.id);
        self.entries.push(summary);
        self.sort_and_truncate()
    }

    /// Like `upsert`, but never evicts the inserted entry itself. If it is
    /// older than everything indexed, the oldest other entry goes instead.
    pub fn upsert_pinned(&mut self, summary: DocumentSummary) -> Vec<DocumentSummary> {
        let id = summary.id;
        let mut evicted = self.upsert(summary);
        if let Some(position) = evicted.iter().position(|entry| entry.id == id) {
            let pinned = evicted.remove(position);
            evicted.extend(self.entries.pop());
            self.entries.push(pinned);
        }
        evicted
    }

    pub fn remove(&mut self, id: Uuid) -> Option<DocumentSummary> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(index))
    }

    fn sort_and_truncate(&mut self) -> Vec<DocumentSummary> {
        self.entries
            .sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        if self.entries.len() > self.capacity {
            self.entries.split_off(self.capacity)
        } else {
            Vec::new()
        }
    }
}

/// One JSON file per document in a single directory, plus the recent index
/// rebuilt from that directory.
#[derive(Debug)]
pub struct DocumentStore {
    root: PathBuf,
    config: EditorConfig,
    recent: RecentDocuments,
}

impl DocumentStore {
    /// Opens (creating if needed) the store directory and indexes its contents
    pub fn open(root: impl Into<PathBuf>, config: &EditorConfig) -> PersistenceResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let mut store = Self {
            root,
            config: config.clone(),
            recent: RecentDocuments::new(config.max_recent_documents),
        };
        store.rescan()?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn recent(&self) -> &RecentDocuments {
        &self.recent
    }

    pub fn path_for(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{id}.{EXTENSION}"))
    }

    /// Writes the document atomically. On failure the previous file, if
    /// any, is left untouched.
    pub fn save(&mut self, document: &Document) -> PersistenceResult<()> {
        let record = DocumentRecord::from(document);
        let json = serde_json::to_vec_pretty(&record)?;
        let path = self.path_for(document.id());
        write_atomically(&path, &json)?;
        log::info!("Saved document {} to {}", document.id(), path.display());

        let evicted = self.recent.upsert_pinned(DocumentSummary {
            id: document.id(),
            name: document.name().to_string(),
            updated_at: document.updated_at(),
            path,
        });
        self.remove_files(&evicted);
        Ok(())
    }

    pub fn load(&self, id: Uuid) -> PersistenceResult<Document> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(PersistenceError::NotFound(id));
        }
        let record = read_record(&path)?;
        record.into_document(&self.config)
    }

    pub fn delete(&mut self, id: Uuid) -> PersistenceResult<()> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => {
                self.recent.remove(id);
                log::info!("Deleted document {id}");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                self.recent.remove(id);
                Err(PersistenceError::NotFound(id))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Rebuilds the recent index from the directory. Unreadable files and
    /// files not named `{id}.json` are skipped; documents beyond the cap are
    /// deleted from disk.
    pub fn rescan(&mut self) -> PersistenceResult<()> {
        let mut recent = RecentDocuments::new(self.config.max_recent_documents);
        let mut overflow = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(err) => {
                    log::warn!("Skipping unreadable directory entry: {err}");
                    continue;
                }
            };
            if !is_document_file(&path) {
                continue;
            }
            match read_summary(&path, &self.config) {
                Ok(summary) => overflow.extend(recent.upsert(summary)),
                Err(err) => log::warn!("Skipping {}: {err}", path.display()),
            }
        }

        self.remove_files(&overflow);
        log::info!(
            "Indexed {} documents in {}",
            recent.len(),
            self.root.display()
        );
        self.recent = recent;
        Ok(())
    }

    fn remove_files(&self, summaries: &[DocumentSummary]) {
        for summary in summaries {
            match fs::remove_file(&summary.path) {
                Ok(()) => log::info!("Removed old document {}", summary.id),
                Err(err) => log::error!(
                    "Failed to remove old document {}: {err}",
                    summary.path.display()
                ),
            }
        }
    }
}

fn is_document_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_none_or(|name| name.starts_with('.'));
    path.is_file() && !hidden && path.extension().is_some_and(|ext| ext == EXTENSION)
}

fn read_record(path: &Path) -> PersistenceResult<DocumentRecord> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn read_summary(path: &Path, config: &EditorConfig) -> PersistenceResult<DocumentSummary> {
    let record = read_record(path)?;
    // load and delete find documents by file name, so it must match the id
    let stem = path.file_stem().and_then(|stem| stem.to_str());
    if stem != Some(record.id.to_string().as_str()) {
        return Err(PersistenceError::InvalidDocument(format!(
            "file name does not match document id {}",
            record.id
        )));
    }
    let document = record.into_document(config)?;
    Ok(DocumentSummary {
        id: document.id(),
        name: document.name().to_string(),
        updated_at: document.updated_at(),
        path: path.to_path_buf(),
    })
}

/// Writes to a hidden sibling temp file, syncs, then renames over `path`
fn write_atomically(path: &Path, bytes: &[u8]) -> PersistenceResult<()> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PersistenceError::InvalidDocument(format!("bad path {}", path.display())))?;
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

    if let Err(err) = write_and_rename(&temp_path, path, bytes) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }
    Ok(())
}

fn write_and_rename(temp_path: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(temp_path, path)
}

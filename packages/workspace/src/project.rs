//! Document/Project manager: the public surface the transport layer calls.
//!
//! Owns the path→document map and is the only place documents are created
//! or destroyed. Edits, queries and watcher revalidation all run through
//! `&mut self`, so a document's tree is never observed mid-mutation.
//! In-memory state (text, tree, revision log) commits synchronously; only
//! the disk write is asynchronous.

use crate::errors::{ProjectError, ProjectResult};
use crate::formatter::{Formatter, PassthroughFormatter};
use crate::subscription::{Registry, Subscription};
use crate::watcher::FileWatcher;
use stagehand_editor::{
    element_index, lookup_id, Document, EditBuffer, EditError, EditOutcome, EditResult,
    ElementPositionNode, TravelOutcome,
};
use stagehand_inference::{resolve_module, DocumentStore, InferenceEngine, PropSchema};
use stagehand_parser::SceneDocument;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const NEW_DOCUMENT_TEMPLATE: &str =
    "export default function Scene() {\n  return (\n    <>\n    </>\n  );\n}\n";

type DocCallback = Box<dyn Fn(&Path) + Send + Sync>;
type DepCallback = Box<dyn Fn(&Path, &Path) + Send + Sync>;

/// Loaded documents, keyed by project path. Kept as its own type so the
/// inference engine can borrow the map while the project holds the engine
/// mutably.
#[derive(Default)]
struct DocumentMap {
    inner: HashMap<PathBuf, Document>,
}

impl DocumentMap {
    fn get(&self, path: &Path) -> Option<&Document> {
        self.inner.get(path)
    }
    fn get_mut(&mut self, path: &Path) -> Option<&mut Document> {
        self.inner.get_mut(path)
    }
    fn contains(&self, path: &Path) -> bool {
        self.inner.contains_key(path)
    }
    fn insert(&mut self, path: PathBuf, doc: Document) {
        self.inner.insert(path, doc);
    }
    fn remove(&mut self, path: &Path) -> Option<Document> {
        self.inner.remove(path)
    }
    fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Document)> {
        self.inner.iter()
    }
}

impl DocumentStore for DocumentMap {
    fn document(&self, path: &Path) -> Option<&SceneDocument> {
        self.inner.get(path).map(|doc| doc.ast())
    }
}

pub struct Project {
    root: PathBuf,
    documents: DocumentMap,
    engine: InferenceEngine,
    formatter: Box<dyn Formatter>,
    watcher: Option<FileWatcher>,
    document_feed: Registry<DocCallback>,
    dependency_feed: Registry<DepCallback>,
    untitled_counter: u32,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            documents: DocumentMap::default(),
            engine: InferenceEngine::new(),
            formatter: Box::new(PassthroughFormatter),
            watcher: None,
            document_feed: Registry::default(),
            dependency_feed: Registry::default(),
            untitled_counter: 0,
        }
    }

    pub fn with_formatter(root: impl Into<PathBuf>, formatter: Box<dyn Formatter>) -> Self {
        let mut project = Self::new(root);
        project.formatter = formatter;
        project
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create-or-return the document at `path`, loading it from disk on
    /// first reference.
    pub async fn get_source_file(&mut self, path: &Path) -> ProjectResult<&Document> {
        if !self.documents.contains(path) {
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ProjectError::load(path, e))?;
            let doc = Document::open(path, text)?;
            tracing::info!("loaded {}", path.display());
            self.documents.insert(path.to_path_buf(), doc);
        }
        self.documents
            .get(path)
            .ok_or_else(|| ProjectError::document_not_found(path))
    }

    /// Synthesize a new in-memory document from the template. A requested
    /// `name` is used as the base; without one the base is `untitled`.
    /// Either way, collisions fall back to a numeric suffix (`untitled`,
    /// `untitled1`, ...).
    pub fn create_source_file(&mut self, name: Option<&str>) -> ProjectResult<&Document> {
        let base = name.unwrap_or("untitled");
        let mut counter = match name {
            Some(_) => 0,
            None => self.untitled_counter,
        };
        let path = loop {
            let file_name = if counter == 0 {
                base.to_string()
            } else {
                format!("{}{}", base, counter)
            };
            counter += 1;
            let candidate = self.root.join(format!("{}.tsx", file_name));
            if !self.documents.contains(&candidate) && !candidate.exists() {
                break candidate;
            }
        };
        if name.is_none() {
            self.untitled_counter = counter;
        }
        let doc = Document::new_untitled(&path, NEW_DOCUMENT_TEMPLATE.to_string())?;
        tracing::info!("created {}", path.display());
        self.documents.insert(path.clone(), doc);
        self.documents
            .get(&path)
            .ok_or_else(|| ProjectError::document_not_found(&path))
    }

    pub fn document(&self, path: &Path) -> ProjectResult<&Document> {
        self.documents
            .get(path)
            .ok_or_else(|| ProjectError::document_not_found(path))
    }

    fn document_mut(&mut self, path: &Path) -> ProjectResult<&mut Document> {
        self.documents
            .get_mut(path)
            .ok_or_else(|| ProjectError::document_not_found(path))
    }

    /// Mark an export as open for editing at a display index (clamped).
    pub fn open(
        &mut self,
        path: &Path,
        export_name: &str,
        index: Option<usize>,
    ) -> ProjectResult<()> {
        self.document_mut(path)?.open_export(export_name, index);
        Ok(())
    }

    /// Remove a document from the project. Unsaved changes are discarded.
    pub fn close(&mut self, path: &Path) -> ProjectResult<()> {
        self.documents
            .remove(path)
            .map(|_| tracing::info!("closed {}", path.display()))
            .ok_or_else(|| ProjectError::document_not_found(path))
    }

    /// Run a transaction against one document. Committed edits notify the
    /// document feed and the dependency feeds of documents importing it.
    pub fn edit<T>(
        &mut self,
        path: &Path,
        f: impl FnOnce(&mut EditBuffer) -> EditResult<T>,
    ) -> ProjectResult<(EditOutcome, T)> {
        let (outcome, value) = self.document_mut(path)?.edit(f)?;
        if matches!(outcome, EditOutcome::Committed { .. }) {
            self.notify_changed(path);
        }
        Ok((outcome, value))
    }

    pub fn undo(&mut self, path: &Path, id: Option<u32>) -> ProjectResult<TravelOutcome> {
        let outcome = self.document_mut(path)?.undo(id)?;
        if matches!(outcome, TravelOutcome::Moved { .. }) {
            self.notify_changed(path);
        }
        Ok(outcome)
    }

    pub fn redo(&mut self, path: &Path, id: Option<u32>) -> ProjectResult<TravelOutcome> {
        let outcome = self.document_mut(path)?.redo(id)?;
        if matches!(outcome, TravelOutcome::Moved { .. }) {
            self.notify_changed(path);
        }
        Ok(outcome)
    }

    /// Persist one document: format, write, clear the dirty flag. The
    /// revision log survives a save. `new_path` re-homes the document
    /// (saving an untitled document for the first time).
    pub async fn save(&mut self, path: &Path, new_path: Option<&Path>) -> ProjectResult<()> {
        let target = match new_path {
            Some(new_path) => {
                let mut doc = self
                    .documents
                    .remove(path)
                    .ok_or_else(|| ProjectError::document_not_found(path))?;
                doc.set_path(new_path);
                self.documents.insert(new_path.to_path_buf(), doc);
                new_path.to_path_buf()
            }
            None => path.to_path_buf(),
        };

        let doc = self
            .documents
            .get(&target)
            .ok_or_else(|| ProjectError::document_not_found(&target))?;
        let formatted = self
            .formatter
            .format(&target, doc.source())
            .map_err(|e| ProjectError::persistence(&target, e))?;
        tokio::fs::write(&target, &formatted)
            .await
            .map_err(|e| ProjectError::persistence(&target, e))?;

        if let Some(doc) = self.documents.get_mut(&target) {
            doc.mark_saved();
        }
        tracing::info!("saved {}", target.display());
        Ok(())
    }

    /// Persist every dirty document. New (never-saved) documents are
    /// silently skipped until saved with an explicit destination.
    pub async fn save_all(&mut self) -> ProjectResult<Vec<PathBuf>> {
        let dirty: Vec<PathBuf> = self
            .documents
            .iter()
            .filter(|(_, doc)| doc.is_dirty() && !doc.is_new())
            .map(|(path, _)| path.clone())
            .collect();
        for path in &dirty {
            self.save(path, None).await?;
        }
        Ok(dirty)
    }

    /// Reload a document from disk, discarding in-memory edits and the
    /// revision log.
    pub async fn reset(&mut self, path: &Path) -> ProjectResult<()> {
        if !self.documents.contains(path) {
            return Err(ProjectError::document_not_found(path));
        }
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ProjectError::load(path, e))?;
        self.document_mut(path)?.reset(text)?;
        tracing::info!("reset {}", path.display());
        self.notify_changed(path);
        Ok(())
    }

    pub fn locate(
        &self,
        path: &Path,
        export_name: &str,
    ) -> ProjectResult<Vec<ElementPositionNode>> {
        let doc = self.document(path)?;
        Ok(element_index::locate(
            doc.ast(),
            path,
            doc.positions(),
            export_name,
        )?)
    }

    pub fn lookup(
        &self,
        path: &Path,
        line: u32,
        column: u32,
    ) -> ProjectResult<Option<ElementPositionNode>> {
        let doc = self.document(path)?;
        Ok(element_index::lookup(
            doc.ast(),
            path,
            doc.positions(),
            line,
            column,
        ))
    }

    /// Infer the prop schema of the element at `line:column`. Resolution
    /// may cross into any already-loaded document.
    pub fn infer_prop_schema(
        &mut self,
        path: &Path,
        line: u32,
        column: u32,
    ) -> ProjectResult<PropSchema> {
        let id = {
            let doc = self.document(path)?;
            lookup_id(doc.ast(), doc.positions(), line, column)
                .ok_or(EditError::ElementNotFound { line, column })?
        };
        Ok(self.engine.infer_element_schema(&self.documents, path, id))
    }

    /// Start watching the project root for external changes.
    pub fn watch(&mut self) -> ProjectResult<()> {
        self.watcher = Some(FileWatcher::new(&self.root)?);
        tracing::info!("watching {}", self.root.display());
        Ok(())
    }

    /// Drain pending filesystem events and revalidate tracked documents
    /// that changed on disk: reload, clear the dirty flag and revision
    /// log, and notify the feeds. Returns the revalidated paths.
    pub async fn poll_fs_events(&mut self) -> ProjectResult<Vec<PathBuf>> {
        let changed = match &self.watcher {
            Some(watcher) => watcher.drain_changed(),
            None => return Ok(Vec::new()),
        };

        let mut revalidated = Vec::new();
        for path in changed {
            if !self.documents.contains(&path) {
                continue;
            }
            // A path can vanish between the event and the poll; skip it
            // rather than dropping the rest of the drained batch
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("skipping unreadable {}: {}", path.display(), e);
                    continue;
                }
            };
            // Our own saves echo back as events; skip unchanged content
            if self
                .documents
                .get(&path)
                .is_some_and(|doc| doc.source() == text)
            {
                continue;
            }
            self.document_mut(&path)?.reset(text)?;
            tracing::debug!("revalidated {}", path.display());
            self.notify_changed(&path);
            revalidated.push(path);
        }
        Ok(revalidated)
    }

    /// Subscribe to the per-document change feed: one call per committed
    /// mutation or revalidation, with the document's path.
    pub fn on_document_changed(
        &mut self,
        callback: impl Fn(&Path) + Send + Sync + 'static,
    ) -> Subscription {
        self.document_feed.subscribe(Box::new(callback))
    }

    /// Subscribe to the dependency feed: called with `(dependent, changed)`
    /// when a document one of `dependent`'s imports resolves to changes.
    pub fn on_dependency_changed(
        &mut self,
        callback: impl Fn(&Path, &Path) + Send + Sync + 'static,
    ) -> Subscription {
        self.dependency_feed.subscribe(Box::new(callback))
    }

    /// Synchronous, fire-and-continue notification of both feeds.
    fn notify_changed(&self, path: &Path) {
        self.document_feed.for_each(|callback| callback(path));

        for (dependent, doc) in self.documents.iter() {
            if dependent.as_path() == path {
                continue;
            }
            let depends = doc.ast().imports.iter().any(|import| {
                resolve_module(dependent, &import.module).as_deref() == Some(path)
            });
            if depends {
                self.dependency_feed
                    .for_each(|callback| callback(dependent, path));
            }
        }
    }
}

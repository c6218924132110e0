//! In-memory document: source text, parsed tree, revision log, edit state.
//!
//! The source text is the source of truth. Every mutation goes through
//! [`Document::edit`], which hands the callback a scratch [`EditBuffer`];
//! the document only adopts the buffer when the callback succeeds, so a
//! failed transaction leaves text, tree and log exactly as they were.

use crate::errors::{EditError, EditResult};
use crate::revision_log::{EditOutcome, RevisionLog, TravelOutcome};
use stagehand_parser::{parse, PositionMap, SceneDocument};
use std::ops::Range;
use std::path::{Path, PathBuf};

pub struct Document {
    path: PathBuf,
    source: String,
    ast: SceneDocument,
    positions: PositionMap,
    revisions: RevisionLog,
    dirty: bool,
    is_new: bool,
    /// Export names currently open for editing, in display order.
    open_exports: Vec<String>,
}

impl Document {
    pub fn open(path: impl Into<PathBuf>, source: String) -> EditResult<Self> {
        let ast = parse(&source)?;
        let positions = PositionMap::new(&source);
        Ok(Self {
            path: path.into(),
            revisions: RevisionLog::new(source.clone()),
            source,
            ast,
            positions,
            dirty: false,
            is_new: false,
            open_exports: Vec::new(),
        })
    }

    /// Create a document that exists only in memory, never saved to disk.
    pub fn new_untitled(path: impl Into<PathBuf>, source: String) -> EditResult<Self> {
        let mut doc = Self::open(path, source)?;
        doc.is_new = true;
        Ok(doc)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &SceneDocument {
        &self.ast
    }

    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn open_exports(&self) -> &[String] {
        &self.open_exports
    }

    /// Mark an export as open for editing at `index` in display order.
    /// Out-of-range indices clamp to append; reopening moves the entry.
    pub fn open_export(&mut self, export_name: &str, index: Option<usize>) {
        self.open_exports.retain(|e| e != export_name);
        let index = index
            .unwrap_or(self.open_exports.len())
            .min(self.open_exports.len());
        self.open_exports.insert(index, export_name.to_string());
    }

    /// Run a transaction. The callback mutates a scratch buffer; the
    /// document adopts it only on success. Byte-identical results leave
    /// the log and dirty flag untouched.
    pub fn edit<T>(
        &mut self,
        f: impl FnOnce(&mut EditBuffer) -> EditResult<T>,
    ) -> EditResult<(EditOutcome, T)> {
        let mut buffer = EditBuffer::from_document(self);
        let value = f(&mut buffer)?;
        if buffer.text == self.source {
            return Ok((EditOutcome::Unmodified, value));
        }
        let outcome = self.revisions.commit(buffer.text.clone());
        self.source = buffer.text;
        self.ast = buffer.ast;
        self.positions = buffer.positions;
        self.dirty = true;
        Ok((outcome, value))
    }

    pub fn undo(&mut self, id: Option<u32>) -> EditResult<TravelOutcome> {
        let Some(revision) = self.revisions.undo(id) else {
            return Ok(TravelOutcome::Unmodified);
        };
        let revision_id = revision.id;
        let text = revision.text.clone();
        self.adopt_text(text)?;
        Ok(TravelOutcome::Moved { revision_id })
    }

    pub fn redo(&mut self, id: Option<u32>) -> EditResult<TravelOutcome> {
        let Some(revision) = self.revisions.redo(id) else {
            return Ok(TravelOutcome::Unmodified);
        };
        let revision_id = revision.id;
        let text = revision.text.clone();
        self.adopt_text(text)?;
        Ok(TravelOutcome::Moved { revision_id })
    }

    /// Replace the document with text reloaded from disk. Clears the
    /// revision log and the dirty flag; saving never does either.
    pub fn reset(&mut self, source: String) -> EditResult<()> {
        self.ast = parse(&source)?;
        self.positions = PositionMap::new(&source);
        self.revisions.reset(source.clone());
        self.source = source;
        self.dirty = false;
        self.is_new = false;
        Ok(())
    }

    /// Called after a successful persist; the log keeps its history.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
        self.is_new = false;
    }

    fn adopt_text(&mut self, text: String) -> EditResult<()> {
        // Every revision held valid text when committed; a reparse failure
        // here means the log itself is corrupt.
        self.ast = parse(&text)
            .map_err(|e| EditError::invariant(format!("revision text failed to parse: {e}")))?;
        self.positions = PositionMap::new(&text);
        self.source = text;
        self.dirty = true;
        Ok(())
    }
}

/// Scratch state for one transaction: text plus the tree and position map
/// kept in sync by reparsing after every splice.
pub struct EditBuffer {
    pub(crate) text: String,
    pub(crate) ast: SceneDocument,
    pub(crate) positions: PositionMap,
}

impl EditBuffer {
    fn from_document(doc: &Document) -> Self {
        Self {
            text: doc.source.clone(),
            ast: doc.ast.clone(),
            positions: doc.positions.clone(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn ast(&self) -> &SceneDocument {
        &self.ast
    }

    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    /// Replace a byte range and reparse. The transaction fails (and the
    /// document stays untouched) if the result no longer parses.
    pub fn splice(&mut self, range: Range<usize>, replacement: &str) -> EditResult<()> {
        self.text.replace_range(range, replacement);
        self.reparse()
    }

    /// Apply several splices in one pass. Ranges must not overlap; they
    /// are applied back-to-front so earlier offsets stay valid.
    pub fn splice_all(&mut self, mut edits: Vec<(Range<usize>, String)>) -> EditResult<()> {
        edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
        for window in edits.windows(2) {
            if window[1].0.end > window[0].0.start {
                return Err(EditError::invariant("overlapping splice ranges"));
            }
        }
        for (range, replacement) in edits {
            self.text.replace_range(range, &replacement);
        }
        self.reparse()
    }

    fn reparse(&mut self) -> EditResult<()> {
        self.ast = parse(&self.text)?;
        self.positions = PositionMap::new(&self.text);
        Ok(())
    }
}

//! Per-document revision log.
//!
//! A linear vector of full-text snapshots with a cursor. Mutations are text
//! splices, so snapshotting the resulting text keeps travel trivial: moving
//! the cursor swaps the document text wholesale and reparses. Revision ids
//! are monotonic across the document's lifetime; ids on a pruned future
//! branch are never reused.

use serde::Serialize;

/// One addressable point in a document's edit history.
#[derive(Debug, Clone)]
pub struct Revision {
    pub id: u32,
    pub kind: RevisionKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionKind {
    /// The document's initial text (or the text after a reload).
    Origin,
    Edit,
}

/// Result of committing a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum EditOutcome {
    /// The transaction changed the text. `undo_id` addresses the pre-state
    /// revision, `redo_id` the new one.
    #[serde(rename_all = "camelCase")]
    Committed { undo_id: u32, redo_id: u32 },
    /// The transaction produced byte-identical text; the log did not
    /// advance.
    Unmodified,
}

/// Result of an undo/redo travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum TravelOutcome {
    #[serde(rename_all = "camelCase")]
    Moved { revision_id: u32 },
    /// Travel past either end, or to an id not in the travel direction.
    Unmodified,
}

#[derive(Debug)]
pub struct RevisionLog {
    revisions: Vec<Revision>,
    cursor: usize,
    next_id: u32,
}

impl RevisionLog {
    pub fn new(origin_text: String) -> Self {
        Self {
            revisions: vec![Revision {
                id: 0,
                kind: RevisionKind::Origin,
                text: origin_text,
            }],
            cursor: 0,
            next_id: 1,
        }
    }

    pub fn current(&self) -> &Revision {
        &self.revisions[self.cursor]
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }

    /// Append a revision for `text`, discarding any redoable future.
    pub fn commit(&mut self, text: String) -> EditOutcome {
        if self.current().text == text {
            return EditOutcome::Unmodified;
        }
        self.revisions.truncate(self.cursor + 1);
        let undo_id = self.current().id;
        let redo_id = self.next_id;
        self.next_id += 1;
        self.revisions.push(Revision {
            id: redo_id,
            kind: RevisionKind::Edit,
            text,
        });
        self.cursor = self.revisions.len() - 1;
        EditOutcome::Committed { undo_id, redo_id }
    }

    /// Move the cursor backward: one step, or to `id` when given. `id` must
    /// address a revision strictly behind the cursor.
    pub fn undo(&mut self, id: Option<u32>) -> Option<&Revision> {
        let target = match id {
            Some(id) => {
                let pos = self.revisions.iter().position(|r| r.id == id)?;
                if pos >= self.cursor {
                    return None;
                }
                pos
            }
            None => self.cursor.checked_sub(1)?,
        };
        self.cursor = target;
        Some(&self.revisions[self.cursor])
    }

    /// Move the cursor forward: one step, or to `id` when given. `id` must
    /// address a revision strictly ahead of the cursor.
    pub fn redo(&mut self, id: Option<u32>) -> Option<&Revision> {
        let target = match id {
            Some(id) => {
                let pos = self.revisions.iter().position(|r| r.id == id)?;
                if pos <= self.cursor {
                    return None;
                }
                pos
            }
            None => {
                if self.cursor + 1 >= self.revisions.len() {
                    return None;
                }
                self.cursor + 1
            }
        };
        self.cursor = target;
        Some(&self.revisions[self.cursor])
    }

    /// Drop all history and restart from `origin_text`. Used on reload.
    pub fn reset(&mut self, origin_text: String) {
        self.revisions = vec![Revision {
            id: 0,
            kind: RevisionKind::Origin,
            text: origin_text,
        }];
        self.cursor = 0;
        self.next_id = 1;
    }
}

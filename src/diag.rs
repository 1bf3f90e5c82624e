//! Diagnostics attached to parsed scripts: severities, notes, and the
//! per-node metadata table keyed by [`Id`](crate::ast::Id).

use std::collections::HashMap;

use crate::ast::Id;
use crate::source::SourcePosition;

/// How urgent a diagnostic is, from mildest to most severe. The derived
/// ordering governs how diagnostics sort within a source position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// A stylistic suggestion; the script works as written.
    Style,
    /// Something worth knowing about, like use of a deprecated construct.
    Info,
    /// A construct that is probably not doing what the author intended.
    Warning,
    /// A construct that is broken or that prevented parsing.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Style => "style",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// A diagnostic attached to a specific syntax tree node. It has no position
/// of its own; it inherits the node's recorded position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    /// The urgency of the diagnostic.
    pub severity: Severity,
    /// The human-readable message.
    pub message: String,
}

/// Per-node bookkeeping: where the node started, and any notes attached to
/// it. Notes are kept most-recent-first; [`notes_from_map`] and
/// [`sort_notes`] produce the caller-facing ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    /// Position of the node's first character.
    pub position: SourcePosition,
    /// Notes attached to the node, most recently attached first.
    pub notes: Vec<Note>,
}

/// A free-standing diagnostic anchored to a source position rather than a
/// node. Used when no node exists yet, or when the problem concerns the
/// surrounding source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseNote {
    /// Where in the source the diagnostic applies.
    pub position: SourcePosition,
    /// The urgency of the diagnostic.
    pub severity: Severity,
    /// The human-readable message.
    pub message: String,
}

impl PartialOrd for ParseNote {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ParseNote {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.position, self.severity, &self.message).cmp(&(
            &other.position,
            other.severity,
            &other.message,
        ))
    }
}

impl std::fmt::Display for ParseNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{} {}: {}",
            self.position, self.severity, self.message
        ))
    }
}

/// Flattens the per-node notes in a metadata map into free-standing
/// [`ParseNote`]s, each anchored at its node's recorded position.
pub fn notes_from_map(map: &HashMap<Id, Metadata>) -> Vec<ParseNote> {
    let mut result = vec![];
    for metadata in map.values() {
        for note in &metadata.notes {
            result.push(ParseNote {
                position: metadata.position.clone(),
                severity: note.severity,
                message: note.message.clone(),
            });
        }
    }
    result
}

/// Sorts notes by position, then severity. Messages break remaining ties so
/// the result is deterministic.
pub fn sort_notes(notes: &mut [ParseNote]) {
    notes.sort();
}

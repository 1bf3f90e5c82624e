use std::collections::HashMap;
use std::sync::Arc;

use winnow::error::ContextError;
use winnow::stream::{LocatingSlice, Location, Stateful};

use crate::ast::Id;
use crate::diag::{Metadata, Note, ParseNote, Severity};
use crate::source::SourcePosition;

/// Type alias for parser errors.
pub(crate) type PError = winnow::error::ErrMode<ContextError>;

/// Type alias for the input stream.
///
/// `LocatingSlice` supplies absolute byte offsets; `Stateful` threads the
/// parser state through every rule. Winnow's checkpoint/reset machinery
/// rewinds only the inner input, so identifiers and notes allocated along a
/// discarded alternative are retained. That retention is load-bearing:
/// diagnostics produced on a speculatively tried path must survive.
pub(crate) type Stream<'a> = Stateful<LocatingSlice<&'a str>, ParserState>;

/// Mutable state threaded through all parsing rules: the id counter, the
/// id-to-metadata map, and the position-anchored note list.
#[derive(Clone, Debug)]
pub(crate) struct ParserState {
    next_id: usize,
    pub(crate) metadata: HashMap<Id, Metadata>,
    pub(crate) notes: Vec<ParseNote>,
    file: Arc<str>,
    /// Byte offsets of every newline, cached once for O(log n) line lookup.
    line_breaks: Vec<usize>,
}

impl ParserState {
    pub(crate) fn new(file: &str, input: &str) -> Self {
        let line_breaks = input
            .bytes()
            .enumerate()
            .filter_map(|(i, b)| (b == b'\n').then_some(i))
            .collect();

        Self {
            next_id: 0,
            metadata: HashMap::new(),
            notes: vec![],
            file: Arc::from(file),
            line_breaks,
        }
    }

    /// Computes the 1-based line/column position of a byte offset.
    pub(crate) fn position_at(&self, offset: usize) -> SourcePosition {
        let line = match self.line_breaks.binary_search(&offset) {
            Ok(n) | Err(n) => n + 1,
        };
        let line_start = if line > 1 {
            self.line_breaks[line - 2] + 1
        } else {
            0
        };

        SourcePosition {
            file: self.file.clone(),
            line,
            column: offset.saturating_sub(line_start) + 1,
        }
    }

    /// Allocates the next node id and records its metadata entry.
    pub(crate) fn fresh_id(&mut self, position: SourcePosition) -> Id {
        let id = Id(self.next_id);
        self.next_id += 1;
        self.metadata.insert(
            id,
            Metadata {
                position,
                notes: vec![],
            },
        );
        id
    }

    /// Appends a free-standing diagnostic anchored at a source position.
    pub(crate) fn note_at(
        &mut self,
        position: SourcePosition,
        severity: Severity,
        message: impl Into<String>,
    ) {
        self.notes.push(ParseNote {
            position,
            severity,
            message: message.into(),
        });
    }

    /// Prepends a diagnostic onto the metadata entry for a specific node.
    pub(crate) fn attach_note(&mut self, id: Id, severity: Severity, message: impl Into<String>) {
        if let Some(metadata) = self.metadata.get_mut(&id) {
            metadata.notes.insert(
                0,
                Note {
                    severity,
                    message: message.into(),
                },
            );
        }
    }
}

/// Builds the input stream for one parse.
pub(crate) fn new_stream<'a>(file: &str, input: &'a str) -> Stream<'a> {
    Stateful {
        input: LocatingSlice::new(input),
        state: ParserState::new(file, input),
    }
}

/// The source position of the next character to be consumed.
pub(crate) fn cur_pos(input: &Stream<'_>) -> SourcePosition {
    input.state.position_at(input.current_token_start())
}

/// A plain backtracking error with no context.
pub(crate) fn backtrack() -> PError {
    winnow::error::ErrMode::Backtrack(ContextError::new())
}

//! The parser proper: grammar rules threaded over a stateful input stream,
//! and the `parse_shell` driver that turns raw source into a tree plus a
//! sorted, deduplicated diagnostic list.

mod and_or;
mod arithmetic;
mod combinators;
mod commands;
mod compound;
mod conditions;
mod helpers;
mod pipelines;
mod program;
mod redirections;
mod types;
mod words;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use winnow::error::{ContextError, ErrMode, StrContext};
use winnow::stream::Location;
use winnow::Parser;

use crate::ast::{Id, Token};
use crate::diag::{notes_from_map, sort_notes, Metadata, ParseNote, Severity};

use self::types::PError;

/// The outcome of parsing one script: the annotated tree (absent after a
/// fatal parse failure) and all diagnostics, sorted by position and
/// severity with duplicates collapsed.
pub struct ParseResult {
    /// The root `Script` node and the metadata for every node in it.
    pub tree: Option<(Token, HashMap<Id, Metadata>)>,
    /// All diagnostics, node-attached and free-standing alike.
    pub notes: Vec<ParseNote>,
}

/// The category a fatal parse failure falls into, in reporting priority
/// order.
#[derive(Debug, thiserror::Error)]
enum Failure {
    #[error("Aborting due to unexpected {0}. Is this even valid?")]
    Unexpected(String),
    #[error("Expected {0}")]
    Expected(String),
    #[error("Message: {0}")]
    Message(String),
}

/// Parses a shell script, producing the syntax tree and all diagnostics.
///
/// This is the sole entry point. Recoverable problems become notes and
/// parsing continues; only when no grammar alternative matches at all is the
/// tree withheld, with the failure folded into a single `Error` note at the
/// failure position.
pub fn parse_shell(filename: &str, contents: &str) -> ParseResult {
    tracing::debug!(target: "parse", "parsing {filename} ({} bytes)", contents.len());

    let mut stream = types::new_stream(filename, contents);
    let parsed = program::read_script()
        .parse_next(&mut stream)
        .and_then(|root| {
            winnow::combinator::eof::<_, PError>
                .parse_next(&mut stream)
                .map(|_| root)
        });

    match parsed {
        Ok(root) => {
            let metadata = std::mem::take(&mut stream.state.metadata);
            let mut notes = std::mem::take(&mut stream.state.notes);
            notes.extend(notes_from_map(&metadata));
            sort_notes(&mut notes);
            notes.dedup();
            ParseResult {
                tree: Some((root, metadata)),
                notes,
            }
        }
        Err(err) => {
            tracing::debug!(target: "parse", "fatal parse failure in {filename}");

            let offset = stream.current_token_start();
            let position = stream.state.position_at(offset);
            let cursor_token = contents[offset..]
                .chars()
                .next()
                .map(|c| format!("\"{}\"", c.escape_default()));
            let failure = classify_failure(&err, cursor_token);

            let mut notes = std::mem::take(&mut stream.state.notes);
            notes.push(ParseNote {
                position,
                severity: Severity::Error,
                message: failure.to_string(),
            });
            sort_notes(&mut notes);
            notes.dedup();
            ParseResult { tree: None, notes }
        }
    }
}

/// Picks the most useful description of a fatal failure: the unexpected
/// token at the cursor, then any recorded expectations, then a bare message.
/// An exhausted input reads as the literal token `eof`.
fn classify_failure(err: &PError, cursor_token: Option<String>) -> Failure {
    if let Some(token) = cursor_token {
        return Failure::Unexpected(token);
    }

    let inner: Option<&ContextError> = match err {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => Some(e),
        ErrMode::Incomplete(_) => None,
    };
    if let Some(e) = inner {
        let expected: Vec<String> = e
            .context()
            .filter_map(|c| match c {
                StrContext::Expected(value) => Some(value.to_string()),
                _ => None,
            })
            .collect();
        if !expected.is_empty() {
            return Failure::Expected(expected.join(" or "));
        }
        if let Some(cause) = e.cause() {
            return Failure::Message(cause.to_string());
        }
    }

    Failure::Unexpected("eof".to_string())
}

//! Parser tests, split by grammar area. Assertions are structural: parse a
//! script, peel the list/redirect wrappers, and match on the node shapes
//! and diagnostics that matter.

mod arithmetic;
mod commands;
mod here_docs;
mod invariants;
mod words;

use crate::ast::Token;
use crate::diag::{ParseNote, Severity};
use crate::parser::{parse_shell, ParseResult};

pub(crate) fn parse(script: &str) -> ParseResult {
    parse_shell("script.sh", script)
}

/// Parse a script we expect to produce a tree, returning it with the notes.
pub(crate) fn parse_ok(script: &str) -> (Token, Vec<ParseNote>) {
    let result = parse(script);
    match result.tree {
        Some((root, _)) => (root, result.notes),
        None => panic!(
            "expected {script:?} to produce a tree, got notes: {:?}",
            result.notes
        ),
    }
}

/// Parse a script we expect to produce a tree and zero diagnostics.
pub(crate) fn parse_clean(script: &str) -> Token {
    let (root, notes) = parse_ok(script);
    assert!(
        notes.is_empty(),
        "expected no notes for {script:?}, got: {notes:?}"
    );
    root
}

pub(crate) fn commands_of(root: &Token) -> &[Token] {
    match root {
        Token::Script(_, commands) => commands,
        other => panic!("not a script root: {other:?}"),
    }
}

/// Strips single-command pipelines and empty redirect wrappers.
pub(crate) fn peel(token: &Token) -> &Token {
    match token {
        Token::Pipeline(_, commands) if commands.len() == 1 => peel(&commands[0]),
        Token::Redirecting(_, redirects, inner) if redirects.is_empty() => peel(inner),
        _ => token,
    }
}

/// The script's single top-level command, peeled.
pub(crate) fn single_command(root: &Token) -> &Token {
    let commands = commands_of(root);
    assert_eq!(commands.len(), 1, "expected one command in {root:?}");
    peel(&commands[0])
}

/// The words of a peeled simple command.
pub(crate) fn words_of(token: &Token) -> &[Token] {
    match token {
        Token::SimpleCommand(_, _, words) => words,
        other => panic!("not a simple command: {other:?}"),
    }
}

/// Flattens a word down to its literal text, for words built purely from
/// literal-ish parts.
pub(crate) fn word_text(word: &Token) -> String {
    match word {
        Token::NormalWord(_, parts) => parts.iter().map(word_text).collect(),
        Token::Literal(_, text) | Token::SingleQuoted(_, text) => text.clone(),
        Token::DoubleQuoted(_, parts) => parts.iter().map(word_text).collect(),
        other => panic!("word has non-literal parts: {other:?}"),
    }
}

pub(crate) fn has_note(notes: &[ParseNote], severity: Severity, fragment: &str) -> bool {
    notes
        .iter()
        .any(|note| note.severity == severity && note.message.contains(fragment))
}

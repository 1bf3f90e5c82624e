//! Lexical primitives: character classes, whitespace and comments, line
//! feeds, and keyword recognition.

use winnow::combinator::opt;
use winnow::stream::Stream as _;
use winnow::token::take_while;
use winnow::Parser;

use crate::diag::Severity;

use super::types::{backtrack, cur_pos, PError, Stream};

// ============================================================================
// Character classes
// ============================================================================

pub(crate) fn is_variable_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub(crate) fn is_variable_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub(crate) fn is_special_variable(c: char) -> bool {
    matches!(c, '@' | '*' | '#' | '?' | '$' | '!' | '-')
}

/// Characters that end an unquoted literal; anything here must be quoted or
/// escaped to appear in a word.
pub(crate) fn is_quotable(c: char) -> bool {
    matches!(
        c,
        '#' | '|'
            | '&'
            | ';'
            | '<'
            | '>'
            | '('
            | ')'
            | '$'
            | '`'
            | '\\'
            | ' '
            | '"'
            | '\''
            | '\t'
            | '\n'
    )
}

/// Characters special inside double quotes.
pub(crate) fn is_double_quotable(c: char) -> bool {
    matches!(c, '"' | '$' | '`' | '\\')
}

pub(crate) fn is_extglob_start(c: char) -> bool {
    matches!(c, '?' | '*' | '@' | '!' | '+')
}

// ============================================================================
// Whitespace, comments, line feeds
// ============================================================================

/// Peek at the next character without consuming it. `None` at end of input.
pub(crate) fn peek_char(input: &mut Stream<'_>) -> Option<char> {
    let start = input.checkpoint();
    let c = winnow::token::any::<_, PError>.parse_next(input).ok();
    input.reset(&start);
    c
}

/// Peek whether the input continues with the given text.
pub(crate) fn peek_str(input: &mut Stream<'_>, s: &str) -> bool {
    let start = input.checkpoint();
    let matched = winnow::token::literal::<_, _, PError>(s)
        .parse_next(input)
        .is_ok();
    input.reset(&start);
    matched
}

/// Parse a comment: `#` up to but excluding the following newline.
pub(crate) fn comment<'a>() -> impl Parser<Stream<'a>, (), PError> {
    ('#', take_while(0.., |c: char| c != '\n')).void()
}

/// Consumes any mix of horizontal whitespace and backslash-newline line
/// continuations, then an optional comment. Returns the accumulated
/// whitespace (continuations contribute nothing), which callers inspect for
/// spacing-sensitive diagnostics.
pub(crate) fn spacing<'a>() -> impl Parser<Stream<'a>, String, PError> {
    move |input: &mut Stream<'a>| {
        let mut accumulated = String::new();
        loop {
            let start = input.checkpoint();
            if let Ok(ws) =
                take_while::<_, _, PError>(1.., |c: char| c == ' ' || c == '\t').parse_next(input)
            {
                accumulated.push_str(ws);
                continue;
            }
            input.reset(&start);
            if winnow::token::literal::<_, _, PError>("\\\n")
                .parse_next(input)
                .is_ok()
            {
                continue;
            }
            input.reset(&start);
            break;
        }
        opt(comment()).parse_next(input)?;
        Ok(accumulated)
    }
}

/// Parse a newline, tolerating (and flagging) a preceding literal carriage
/// return.
pub(crate) fn linefeed<'a>() -> impl Parser<Stream<'a>, (), PError> {
    move |input: &mut Stream<'a>| {
        let start = input.checkpoint();
        let pos = cur_pos(input);
        if opt('\r').parse_next(input)?.is_some() {
            input.state.note_at(
                pos,
                Severity::Error,
                "Literal carriage return. Run script through tr -d '\\r' .",
            );
        }
        match '\n'.parse_next(input) {
            Ok(_) => Ok(()),
            Err(e) => {
                input.reset(&start);
                Err(e)
            }
        }
    }
}

/// Like [`spacing`], but newlines too, recursively.
pub(crate) fn all_spacing<'a>() -> impl Parser<Stream<'a>, (), PError> {
    move |input: &mut Stream<'a>| {
        loop {
            spacing().parse_next(input)?;
            let start = input.checkpoint();
            if linefeed().parse_next(input).is_err() {
                input.reset(&start);
                break;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Keywords
// ============================================================================

/// Whether a character may directly follow a keyword. Without one of these
/// (or end of input) the keyword is just the prefix of an ordinary word.
fn is_keyword_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | ';' | '(' | ')')
}

/// Match a shell reserved word: leading spacing, the word itself, and a
/// keyword separator lookahead. Trailing spacing is consumed.
pub(crate) fn keyword<'a>(word: &'static str) -> impl Parser<Stream<'a>, (), PError> {
    move |input: &mut Stream<'a>| {
        let start = input.checkpoint();
        spacing().parse_next(input)?;
        if winnow::token::literal::<_, _, PError>(word)
            .parse_next(input)
            .is_err()
        {
            input.reset(&start);
            return Err(backtrack());
        }
        match peek_char(input) {
            Some(c) if !is_keyword_separator(c) => {
                input.reset(&start);
                return Err(backtrack());
            }
            _ => {}
        }
        spacing().parse_next(input)?;
        Ok(())
    }
}

/// Keywords that close an enclosing construct. A pipeline must not start at
/// one of these; the enclosing rule consumes it instead.
const TERMINATING_KEYWORDS: &[&str] = &["then", "else", "elif", "fi", "do", "done", "esac", "}"];

/// Succeeds (without consuming) when the input continues with a construct
/// terminator: a terminating keyword or a `;;` case-arm separator.
pub(crate) fn at_terminating_keyword(input: &mut Stream<'_>) -> bool {
    for &word in TERMINATING_KEYWORDS {
        let start = input.checkpoint();
        let found = keyword(word).parse_next(input).is_ok();
        input.reset(&start);
        if found {
            return true;
        }
    }

    let start = input.checkpoint();
    let _ = spacing().parse_next(input);
    let found = peek_str(input, ";;");
    input.reset(&start);
    found
}

/// Parse a valid variable name.
pub(crate) fn variable_name<'a>() -> impl Parser<Stream<'a>, String, PError> {
    (
        winnow::token::one_of(is_variable_start),
        take_while(0.., is_variable_char),
    )
        .take()
        .map(|s: &str| s.to_string())
}

/// Parse a sequential separator: a `;` (but not `;;`) or a newline, plus any
/// following blank space.
pub(crate) fn sequential_sep<'a>() -> impl Parser<Stream<'a>, (), PError> {
    move |input: &mut Stream<'a>| {
        let start = input.checkpoint();
        spacing().parse_next(input)?;

        if opt(';').parse_next(input)?.is_some() {
            if peek_char(input) == Some(';') {
                input.reset(&start);
                return Err(backtrack());
            }
            all_spacing().parse_next(input)?;
            return Ok(());
        }

        if linefeed().parse_next(input).is_ok() {
            all_spacing().parse_next(input)?;
            return Ok(());
        }

        input.reset(&start);
        Err(backtrack())
    }
}

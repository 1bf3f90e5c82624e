//! Redirections: file redirects, here-documents, and here-strings. Every
//! redirect is wrapped in an `FdRedirect` carrying the optional leading file
//! descriptor digits.

use winnow::combinator::opt;
use winnow::stream::Stream as _;
use winnow::token::take_while;
use winnow::Parser;

use crate::ast::Token;
use crate::diag::Severity;

use super::helpers::{is_quotable, peek_char, peek_str, spacing};
use super::types::{backtrack, cur_pos, PError, Stream};
use super::words::read_normal_word;

/// File redirection operators, longest first.
const FILE_OPS: &[&str] = &["<&", ">&", ">>", "<>", ">|", "<", ">"];

/// Parse one redirection, including any leading fd number.
pub(crate) fn read_io_redirect<'a>() -> impl Parser<Stream<'a>, Token, PError> {
    move |input: &mut Stream<'a>| {
        let pos = cur_pos(input);
        let start = input.checkpoint();

        // Digits immediately before a redirection operator are an fd; digits
        // followed by anything else are a word.
        let fd: String = match take_while::<_, _, PError>(1.., |c: char| c.is_ascii_digit())
            .parse_next(input)
        {
            Ok(digits) if matches!(peek_char(input), Some('<' | '>')) => digits.to_string(),
            _ => {
                input.reset(&start);
                String::new()
            }
        };

        let target = if peek_str(input, "<<<") {
            read_here_string(input)?
        } else if peek_str(input, "<<") {
            read_here_doc(input)?
        } else {
            read_io_file(input)?
        };

        let id = input.state.fresh_id(pos);
        Ok(Token::FdRedirect(id, fd, Box::new(target)))
    }
}

fn read_io_file(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    let mut matched = None;
    for op in FILE_OPS {
        let start = input.checkpoint();
        if winnow::token::literal::<_, _, PError>(*op)
            .parse_next(input)
            .is_ok()
        {
            matched = Some(*op);
            break;
        }
        input.reset(&start);
    }
    let Some(op) = matched else {
        return Err(backtrack());
    };

    spacing().parse_next(input)?;
    let file = read_normal_word().parse_next(input)?;

    let id = input.state.fresh_id(pos);
    Ok(Token::IoFile(id, op.to_string(), Box::new(file)))
}

fn read_here_string(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    "<<<".parse_next(input)?;
    spacing().parse_next(input)?;
    let word = read_normal_word().parse_next(input)?;
    let id = input.state.fresh_id(pos);
    Ok(Token::HereString(id, Box::new(word)))
}

/// Parse the end token of a here-document. Quoted end tokens make the body
/// fully literal.
fn read_here_doc_token(input: &mut Stream<'_>) -> Result<(String, bool), PError> {
    match peek_char(input) {
        Some('\'') => {
            '\''.parse_next(input)?;
            let token: &str = take_while(0.., |c: char| c != '\'').parse_next(input)?;
            let token = token.to_string();
            '\''.parse_next(input)?;
            Ok((token, true))
        }
        Some('"') => {
            '"'.parse_next(input)?;
            let token: &str = take_while(0.., |c: char| c != '"').parse_next(input)?;
            let token = token.to_string();
            '"'.parse_next(input)?;
            Ok((token, true))
        }
        _ => {
            let token: &str = take_while(1.., |c: char| !is_quotable(c)).parse_next(input)?;
            Ok((token.to_string(), false))
        }
    }
}

fn read_here_doc(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    "<<".parse_next(input)?;
    let dashed = opt('-').parse_next(input)?.is_some();
    spacing().parse_next(input)?;

    let (end_token, quoted) = read_here_doc_token(input)?;
    spacing().parse_next(input)?;
    super::helpers::linefeed().parse_next(input)?;

    let mut body = String::new();
    let mut terminated = false;
    loop {
        let line: &str = take_while(0.., |c: char| c != '\n').parse_next(input)?;

        if line.trim() == end_token {
            let indent = &line[..line.len() - line.trim_start().len()];
            verify_here_doc_indent(input, dashed, indent, pos.clone());
            terminated = true;
            break;
        }

        body.push_str(line);
        if opt('\n').parse_next(input)?.is_some() {
            body.push('\n');
        } else {
            break;
        }
    }

    if !terminated {
        report_missing_end_token(input, &end_token, &body, pos.clone());
    }

    let id = input.state.fresh_id(pos);
    Ok(Token::HereDoc(id, dashed, quoted, body))
}

fn verify_here_doc_indent(
    input: &mut Stream<'_>,
    dashed: bool,
    indent: &str,
    pos: crate::source::SourcePosition,
) {
    if !dashed && !indent.is_empty() {
        input.state.note_at(
            pos,
            Severity::Error,
            "Use <<- instead of << if you want to indent the end token.",
        );
    } else if dashed && indent.chars().any(|c| c != '\t') {
        input.state.note_at(
            pos,
            Severity::Error,
            "When using <<-, you can only indent with tabs.",
        );
    }
}

/// Best-effort explanation when input runs out before the end token.
fn report_missing_end_token(
    input: &mut Stream<'_>,
    end_token: &str,
    body: &str,
    pos: crate::source::SourcePosition,
) {
    let message = if body.contains(end_token) {
        format!("Found {end_token} further down, but not by itself at the start of the line.")
    } else if body.to_lowercase().contains(&end_token.to_lowercase()) {
        format!("Found {end_token} further down, but with wrong casing.")
    } else {
        format!("Couldn't find end token `{end_token}' in the here document.")
    };
    input.state.note_at(pos, Severity::Error, message);
}

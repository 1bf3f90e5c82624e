//! And/or lists and the command-list ("term") grammar with its `;`, `&` and
//! newline separators.

use winnow::stream::Stream as _;
use winnow::Parser;

use crate::ast::Token;
use crate::diag::Severity;

use super::combinators::chain_right;
use super::helpers::{all_spacing, linefeed, peek_char, peek_str, spacing};
use super::pipelines::read_pipeline;
use super::types::{backtrack, cur_pos, PError, Stream};

/// Parse an and/or list: pipelines chained (right-associatively) by `&&` and
/// `||`, with line breaks allowed after each operator.
pub(crate) fn read_and_or<'a>() -> impl Parser<Stream<'a>, Token, PError> {
    chain_right(
        read_pipeline(),
        |input: &mut Stream<'_>| {
            let start = input.checkpoint();
            spacing().parse_next(input)?;
            let is_and = if Parser::<_, _, PError>::parse_next(&mut "&&", input).is_ok() {
                true
            } else if Parser::<_, _, PError>::parse_next(&mut "||", input).is_ok() {
                false
            } else {
                input.reset(&start);
                return Err(backtrack());
            };
            all_spacing().parse_next(input)?;
            Ok(is_and)
        },
        |input: &mut Stream<'_>, is_and: bool, left: Token, right: Token| {
            let position = input
                .state
                .metadata
                .get(&left.id())
                .map(|m| m.position.clone())
                .unwrap_or_else(|| cur_pos(input));
            let id = input.state.fresh_id(position);
            if is_and {
                Token::AndIf(id, Box::new(left), Box::new(right))
            } else {
                Token::OrIf(id, Box::new(left), Box::new(right))
            }
        },
    )
}

/// What separated a command from the rest of its list.
enum Separator {
    Background,
    Sequence,
    None,
}

/// Reads the separator after a command, flagging the `&;` mistake.
fn read_separator(input: &mut Stream<'_>) -> Result<Separator, PError> {
    let start = input.checkpoint();
    spacing().parse_next(input)?;

    if Parser::<_, _, PError>::parse_next(&mut '&', input).is_ok() {
        if peek_char(input) == Some('&') {
            input.reset(&start);
            return Ok(Separator::None);
        }
        spacing().parse_next(input)?;
        if peek_char(input) == Some(';') && !peek_str(input, ";;") {
            let pos = cur_pos(input);
            ';'.parse_next(input)?;
            input.state.note_at(
                pos,
                Severity::Error,
                "It's not 'foo &; bar', just 'foo & bar'.",
            );
        }
        all_spacing().parse_next(input)?;
        return Ok(Separator::Background);
    }
    input.reset(&start);
    spacing().parse_next(input)?;

    if peek_char(input) == Some(';') && !peek_str(input, ";;") {
        ';'.parse_next(input)?;
        all_spacing().parse_next(input)?;
        return Ok(Separator::Sequence);
    }

    if linefeed().parse_next(input).is_ok() {
        all_spacing().parse_next(input)?;
        return Ok(Separator::Sequence);
    }

    input.reset(&start);
    Ok(Separator::None)
}

/// Parse a command list: one or more and/or lists with separators. A `&`
/// separator turns its left operand into a background command.
pub(crate) fn read_term<'a>() -> impl Parser<Stream<'a>, Vec<Token>, PError> {
    move |input: &mut Stream<'a>| {
        all_spacing().parse_next(input)?;

        let mut items = vec![];
        loop {
            let start = input.checkpoint();
            let command = match read_and_or().parse_next(input) {
                Ok(command) => command,
                Err(_) => {
                    input.reset(&start);
                    break;
                }
            };

            match read_separator(input)? {
                Separator::Background => {
                    let position = input
                        .state
                        .metadata
                        .get(&command.id())
                        .map(|m| m.position.clone())
                        .unwrap_or_else(|| cur_pos(input));
                    let id = input.state.fresh_id(position);
                    items.push(Token::Backgrounded(id, Box::new(command)));
                }
                Separator::Sequence => items.push(command),
                Separator::None => {
                    items.push(command);
                    break;
                }
            }
        }

        if items.is_empty() {
            return Err(backtrack());
        }
        Ok(items)
    }
}

//! Simple commands: assignment/redirect prefixes, the command name, and the
//! argument/redirect suffix, assembled into `Redirecting(SimpleCommand)`.

use winnow::combinator::opt;
use winnow::stream::Stream as _;
use winnow::Parser;

use crate::ast::Token;
use crate::diag::Severity;

use super::helpers::{all_spacing, peek_char, spacing, variable_name};
use super::redirections::read_io_redirect;
use super::types::{backtrack, cur_pos, PError, Stream};
use super::words::read_normal_word;

/// Parse a simple command. Fails when neither a prefix item nor a command
/// name is present.
pub(crate) fn read_simple_command<'a>() -> impl Parser<Stream<'a>, Token, PError> {
    move |input: &mut Stream<'a>| {
        let pos = cur_pos(input);
        let mut items = vec![];

        // Prefix: assignments and redirections, in any order.
        loop {
            let start = input.checkpoint();
            if let Ok(redirect) = read_io_redirect().parse_next(input) {
                items.push(redirect);
                spacing().parse_next(input)?;
                continue;
            }
            input.reset(&start);
            if let Ok(assignment) = read_assignment_word().parse_next(input) {
                items.push(assignment);
                spacing().parse_next(input)?;
                continue;
            }
            input.reset(&start);
            break;
        }

        // Command name.
        let start = input.checkpoint();
        let has_name = match read_normal_word().parse_next(input) {
            Ok(word) => {
                items.push(word);
                spacing().parse_next(input)?;
                true
            }
            Err(_) => {
                input.reset(&start);
                false
            }
        };

        if items.is_empty() {
            return Err(backtrack());
        }

        // Suffix: redirections and argument words.
        if has_name {
            loop {
                let start = input.checkpoint();
                if let Ok(redirect) = read_io_redirect().parse_next(input) {
                    items.push(redirect);
                    spacing().parse_next(input)?;
                    continue;
                }
                input.reset(&start);
                if let Ok(word) = read_normal_word().parse_next(input) {
                    items.push(word);
                    spacing().parse_next(input)?;
                    continue;
                }
                input.reset(&start);
                break;
            }
        }

        let mut assignments = vec![];
        let mut redirects = vec![];
        let mut words = vec![];
        for item in items {
            match item {
                Token::Assignment(..) => assignments.push(item),
                Token::FdRedirect(..) => redirects.push(item),
                _ => words.push(item),
            }
        }

        let command_id = input.state.fresh_id(pos.clone());
        let redirecting_id = input.state.fresh_id(pos);
        Ok(Token::Redirecting(
            redirecting_id,
            redirects,
            Box::new(Token::SimpleCommand(command_id, assignments, words)),
        ))
    }
}

/// Parse an assignment word: `name=value`, `name+=value`, or an array
/// assignment `name=(a b c)`.
pub(crate) fn read_assignment_word<'a>() -> impl Parser<Stream<'a>, Token, PError> {
    move |input: &mut Stream<'a>| {
        let start = input.checkpoint();
        let pos = cur_pos(input);

        let has_dollar = opt('$').parse_next(input)?.is_some();

        let name = match variable_name().parse_next(input) {
            Ok(name) => name,
            Err(_) => {
                input.reset(&start);
                return Err(backtrack());
            }
        };

        let space_before = spacing().parse_next(input)?;
        let eq_pos = cur_pos(input);

        let mut matched = Parser::<_, _, PError>::parse_next(&mut "+=", input).is_ok();
        if !matched {
            matched = Parser::<_, _, PError>::parse_next(&mut '=', input).is_ok()
                && peek_char(input) != Some('=');
        }
        if !matched {
            input.reset(&start);
            return Err(backtrack());
        }
        let space_after = spacing().parse_next(input)?;

        if has_dollar {
            input.state.note_at(
                pos.clone(),
                Severity::Error,
                "Don't use $ on the left side of assignments.",
            );
        }
        if !space_before.is_empty() || !space_after.is_empty() {
            input.state.note_at(
                eq_pos,
                Severity::Error,
                "Don't put spaces around the = in assignments.",
            );
        }

        let value = if peek_char(input) == Some('(') {
            read_array(input)?
        } else {
            let value_start = input.checkpoint();
            match read_normal_word().parse_next(input) {
                Ok(word) => word,
                Err(_) => {
                    input.reset(&value_start);
                    let id = input.state.fresh_id(cur_pos(input));
                    Token::Literal(id, String::new())
                }
            }
        };

        let id = input.state.fresh_id(pos);
        Ok(Token::Assignment(id, name, Box::new(value)))
    }
}

fn read_array(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    '('.parse_next(input)?;

    let mut words = vec![];
    loop {
        all_spacing().parse_next(input)?;
        if opt(')').parse_next(input)?.is_some() {
            break;
        }
        words.push(read_normal_word().parse_next(input)?);
    }

    let id = input.state.fresh_id(pos);
    Ok(Token::Array(id, words))
}

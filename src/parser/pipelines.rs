//! Pipelines: `!`-negation and `|`-connected command sequences.

use winnow::stream::Stream as _;
use winnow::Parser;

use crate::ast::Token;

use super::compound::read_command;
use super::helpers::{all_spacing, at_terminating_keyword, keyword, peek_char, spacing};
use super::types::{backtrack, cur_pos, PError, Stream};

/// Parse a pipeline. Refuses to start at a keyword that terminates an
/// enclosing construct, so command lists end where compound structure
/// resumes.
pub(crate) fn read_pipeline<'a>() -> impl Parser<Stream<'a>, Token, PError> {
    move |input: &mut Stream<'a>| {
        spacing().parse_next(input)?;
        if at_terminating_keyword(input) {
            return Err(backtrack());
        }

        let pos = cur_pos(input);
        if keyword("!").parse_next(input).is_ok() {
            let pipeline = read_pipeline().parse_next(input)?;
            let id = input.state.fresh_id(pos);
            return Ok(Token::Banged(id, Box::new(pipeline)));
        }

        let mut commands = vec![read_command().parse_next(input)?];
        loop {
            let start = input.checkpoint();
            spacing().parse_next(input)?;
            if Parser::<_, _, PError>::parse_next(&mut '|', input).is_err()
                || peek_char(input) == Some('|')
            {
                input.reset(&start);
                break;
            }
            all_spacing().parse_next(input)?;
            match read_command().parse_next(input) {
                Ok(command) => commands.push(command),
                Err(_) => {
                    input.reset(&start);
                    break;
                }
            }
        }

        let id = input.state.fresh_id(pos);
        Ok(Token::Pipeline(id, commands))
    }
}

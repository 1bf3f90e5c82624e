//! The script root rule.

use winnow::stream::Stream as _;
use winnow::Parser;

use crate::ast::Token;

use super::and_or::read_term;
use super::helpers::all_spacing;
use super::types::{cur_pos, PError, Stream};

/// Parse a whole script: leading blank space, then a command list. An empty
/// script is valid.
pub(crate) fn read_script<'a>() -> impl Parser<Stream<'a>, Token, PError> {
    move |input: &mut Stream<'a>| {
        let pos = cur_pos(input);
        all_spacing().parse_next(input)?;

        let start = input.checkpoint();
        let commands = match read_term().parse_next(input) {
            Ok(commands) => commands,
            Err(_) => {
                input.reset(&start);
                vec![]
            }
        };

        let id = input.state.fresh_id(pos);
        Ok(Token::Script(id, commands))
    }
}

//! The handful of higher-order rules the grammar needs beyond what winnow
//! ships: reluctant repetition and binary-operator chaining. All of them
//! rewind the cursor with checkpoint/reset and leave the threaded state
//! alone, so diagnostics from abandoned attempts stay visible.

use winnow::stream::Stream as _;
use winnow::Parser;

use super::types::{PError, Stream};

/// Greedy repetition of `parse` that halts as soon as a lookahead of `end`
/// succeeds. `end` is never consumed. Also stops (successfully) when `parse`
/// no longer matches.
pub(crate) fn reluctant_till<'a, O, T>(
    mut parse: impl Parser<Stream<'a>, O, PError>,
    mut end: impl Parser<Stream<'a>, T, PError>,
) -> impl Parser<Stream<'a>, Vec<O>, PError> {
    move |input: &mut Stream<'a>| {
        let mut items = vec![];
        loop {
            let start = input.checkpoint();
            if end.parse_next(input).is_ok() {
                input.reset(&start);
                break;
            }
            input.reset(&start);

            match parse.parse_next(input) {
                Ok(item) => items.push(item),
                Err(_) => {
                    input.reset(&start);
                    break;
                }
            }
        }
        Ok(items)
    }
}

/// Left-associative binary operator chaining: `term (op term)*`, folded as
/// `build(op, acc, rhs)`. `build` gets the stream so it can allocate node
/// ids. An operator with no right-hand side is rewound and left unconsumed.
pub(crate) fn chain_left<'a, T, O>(
    mut term: impl Parser<Stream<'a>, T, PError>,
    mut op: impl Parser<Stream<'a>, O, PError>,
    mut build: impl FnMut(&mut Stream<'a>, O, T, T) -> T,
) -> impl Parser<Stream<'a>, T, PError> {
    move |input: &mut Stream<'a>| {
        let mut acc = term.parse_next(input)?;
        loop {
            let start = input.checkpoint();
            let Ok(operator) = op.parse_next(input) else {
                input.reset(&start);
                break;
            };
            match term.parse_next(input) {
                Ok(rhs) => acc = build(input, operator, acc, rhs),
                Err(_) => {
                    input.reset(&start);
                    break;
                }
            }
        }
        Ok(acc)
    }
}

/// Right-associative binary operator chaining: `term (op term)*`, folded as
/// `build(op, lhs, acc)` from the right.
pub(crate) fn chain_right<'a, T, O>(
    mut term: impl Parser<Stream<'a>, T, PError>,
    mut op: impl Parser<Stream<'a>, O, PError>,
    mut build: impl FnMut(&mut Stream<'a>, O, T, T) -> T,
) -> impl Parser<Stream<'a>, T, PError> {
    move |input: &mut Stream<'a>| {
        let first = term.parse_next(input)?;

        let mut operands = vec![first];
        let mut operators = vec![];
        loop {
            let start = input.checkpoint();
            let Ok(operator) = op.parse_next(input) else {
                input.reset(&start);
                break;
            };
            match term.parse_next(input) {
                Ok(rhs) => {
                    operators.push(operator);
                    operands.push(rhs);
                }
                Err(_) => {
                    input.reset(&start);
                    break;
                }
            }
        }

        let mut acc = operands.pop().unwrap();
        while let Some(operator) = operators.pop() {
            let lhs = operands.pop().unwrap();
            acc = build(input, operator, lhs, acc);
        }
        Ok(acc)
    }
}

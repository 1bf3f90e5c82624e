//! The arithmetic expression sublanguage used inside `$(( ))` and `(( ))`.
//! A C-like precedence tower: sequence, assignment, ternary, logical,
//! bitwise, equality, comparison, shift, additive, multiplicative,
//! exponentiation, then the unary layers.

use winnow::combinator::opt;
use winnow::stream::Stream as _;
use winnow::token::take_while;
use winnow::Parser;

use crate::ast::Token;

use super::combinators::chain_left;
use super::helpers::{is_variable_start, peek_char, variable_name};
use super::types::{backtrack, cur_pos, PError, Stream};
use super::words::read_dollar;

/// Whitespace inside arithmetic, where newlines are insignificant.
fn arith_spacing<'a>() -> impl Parser<Stream<'a>, (), PError> {
    take_while(0.., |c: char| matches!(c, ' ' | '\t' | '\n')).void()
}

/// Characters that would turn a just-matched operator into the prefix of a
/// longer one.
const OPERATOR_TAILS: &[char] = &['&', '|', '<', '>', '='];

/// Matches the first operator from `ops` whose following character does not
/// extend it into a longer operator. Leading whitespace is consumed only on
/// success.
fn arith_op<'a>(
    ops: &'static [(&'static str, &'static [char])],
) -> impl Parser<Stream<'a>, &'static str, PError> {
    move |input: &mut Stream<'a>| {
        let start = input.checkpoint();
        arith_spacing().parse_next(input)?;
        for &(op, excluded) in ops {
            let attempt = input.checkpoint();
            if winnow::token::literal::<_, _, PError>(op)
                .parse_next(input)
                .is_ok()
            {
                let collides = peek_char(input).is_some_and(|c| excluded.contains(&c));
                if !collides {
                    return Ok(op);
                }
            }
            input.reset(&attempt);
        }
        input.reset(&start);
        Err(backtrack())
    }
}

/// Builds a binary node anchored at its left operand's position.
fn build_binary(input: &mut Stream<'_>, op: &str, left: Token, right: Token) -> Token {
    let position = input
        .state
        .metadata
        .get(&left.id())
        .map(|m| m.position.clone())
        .unwrap_or_else(|| cur_pos(input));
    let id = input.state.fresh_id(position);
    Token::ArithBinary(id, op.to_string(), Box::new(left), Box::new(right))
}

/// Parse the contents of an arithmetic expansion up to (but excluding) its
/// closing delimiter. Always yields a sequence node, possibly empty.
pub(crate) fn read_arithmetic_contents(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);

    let mut items = vec![];
    let start = input.checkpoint();
    match read_assignment(input) {
        Ok(first) => {
            items.push(first);
            loop {
                let before_comma = input.checkpoint();
                arith_spacing().parse_next(input)?;
                if opt(',').parse_next(input)?.is_none() {
                    input.reset(&before_comma);
                    break;
                }
                items.push(read_assignment(input)?);
            }
        }
        Err(_) => input.reset(&start),
    }
    arith_spacing().parse_next(input)?;

    let id = input.state.fresh_id(pos);
    Ok(Token::ArithSequence(id, items))
}

const ASSIGNMENT_OPS: &[(&str, &[char])] = &[
    ("<<=", &[]),
    (">>=", &[]),
    ("*=", &[]),
    ("/=", &[]),
    ("%=", &[]),
    ("+=", &[]),
    ("-=", &[]),
    ("&=", &[]),
    ("^=", &[]),
    ("|=", &[]),
    ("=", &['=']),
];

fn read_assignment<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    super::combinators::chain_right(
        |i: &mut Stream<'a>| read_trinary(i),
        arith_op(ASSIGNMENT_OPS),
        build_binary,
    )
    .parse_next(input)
}

fn read_trinary<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    let condition = read_logical_or(input)?;

    let start = input.checkpoint();
    let attempt = (|| -> Result<(Token, Token), PError> {
        arith_spacing().parse_next(input)?;
        '?'.parse_next(input)?;
        let then_value = read_assignment(input)?;
        arith_spacing().parse_next(input)?;
        ':'.parse_next(input)?;
        let else_value = read_assignment(input)?;
        Ok((then_value, else_value))
    })();

    match attempt {
        Ok((then_value, else_value)) => {
            let position = input
                .state
                .metadata
                .get(&condition.id())
                .map(|m| m.position.clone())
                .unwrap_or_else(|| cur_pos(input));
            let id = input.state.fresh_id(position);
            Ok(Token::ArithTrinary(
                id,
                Box::new(condition),
                Box::new(then_value),
                Box::new(else_value),
            ))
        }
        Err(_) => {
            input.reset(&start);
            Ok(condition)
        }
    }
}

fn read_logical_or<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    chain_left(
        |i: &mut Stream<'a>| read_logical_and(i),
        arith_op(&[("||", &[])]),
        build_binary,
    )
    .parse_next(input)
}

fn read_logical_and<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    chain_left(
        |i: &mut Stream<'a>| read_bit_or(i),
        arith_op(&[("&&", &[])]),
        build_binary,
    )
    .parse_next(input)
}

fn read_bit_or<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    chain_left(
        |i: &mut Stream<'a>| read_bit_xor(i),
        arith_op(&[("|", OPERATOR_TAILS)]),
        build_binary,
    )
    .parse_next(input)
}

fn read_bit_xor<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    chain_left(
        |i: &mut Stream<'a>| read_bit_and(i),
        arith_op(&[("^", &['='])]),
        build_binary,
    )
    .parse_next(input)
}

fn read_bit_and<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    chain_left(
        |i: &mut Stream<'a>| read_equated(i),
        arith_op(&[("&", OPERATOR_TAILS)]),
        build_binary,
    )
    .parse_next(input)
}

fn read_equated<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    chain_left(
        |i: &mut Stream<'a>| read_compared(i),
        arith_op(&[("==", OPERATOR_TAILS), ("!=", OPERATOR_TAILS)]),
        build_binary,
    )
    .parse_next(input)
}

fn read_compared<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    chain_left(
        |i: &mut Stream<'a>| read_shift(i),
        arith_op(&[
            ("<=", OPERATOR_TAILS),
            (">=", OPERATOR_TAILS),
            ("<", OPERATOR_TAILS),
            (">", OPERATOR_TAILS),
        ]),
        build_binary,
    )
    .parse_next(input)
}

fn read_shift<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    chain_left(
        |i: &mut Stream<'a>| read_added(i),
        arith_op(&[("<<", OPERATOR_TAILS), (">>", OPERATOR_TAILS)]),
        build_binary,
    )
    .parse_next(input)
}

fn read_added<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    chain_left(
        |i: &mut Stream<'a>| read_multiplied(i),
        arith_op(&[("+", &['+', '=']), ("-", &['-', '='])]),
        build_binary,
    )
    .parse_next(input)
}

fn read_multiplied<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    chain_left(
        |i: &mut Stream<'a>| read_exponential(i),
        arith_op(&[("*", &['*', '=']), ("/", &['=']), ("%", &['='])]),
        build_binary,
    )
    .parse_next(input)
}

fn read_exponential<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    chain_left(
        |i: &mut Stream<'a>| read_negated(i),
        arith_op(&[("**", &['='])]),
        build_binary,
    )
    .parse_next(input)
}

fn build_unary(input: &mut Stream<'_>, op: &str, pos: crate::source::SourcePosition, operand: Token) -> Token {
    let id = input.state.fresh_id(pos);
    Token::ArithUnary(id, op.to_string(), Box::new(operand))
}

fn read_negated<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    arith_spacing().parse_next(input)?;
    let pos = cur_pos(input);

    if let Ok(op) = arith_op(&[("!", &['=']), ("~", &[])]).parse_next(input) {
        let operand = read_signed(input)?;
        return Ok(build_unary(input, op, pos, operand));
    }
    read_signed(input)
}

fn read_signed<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    arith_spacing().parse_next(input)?;
    let pos = cur_pos(input);

    // A unary sign is not followed by the same character; `++`/`--` belong
    // to the increment layer.
    if let Ok(op) = arith_op(&[("+", &['+']), ("-", &['-'])]).parse_next(input) {
        let operand = read_incremented(input)?;
        return Ok(build_unary(input, op, pos, operand));
    }
    read_incremented(input)
}

fn read_incremented<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    arith_spacing().parse_next(input)?;
    let pos = cur_pos(input);

    if let Ok(op) = arith_op(&[("++", &[]), ("--", &[])]).parse_next(input) {
        let operand = read_arith_term(input)?;
        let encoded = format!("{op}|");
        return Ok(build_unary(input, &encoded, pos, operand));
    }

    let term = read_arith_term(input)?;

    // Postfix increment binds only when directly adjacent to the operand.
    let start = input.checkpoint();
    let postfix = if winnow::token::literal::<_, _, PError>("++")
        .parse_next(input)
        .is_ok()
    {
        Some("|++")
    } else {
        input.reset(&start);
        if winnow::token::literal::<_, _, PError>("--")
            .parse_next(input)
            .is_ok()
        {
            Some("|--")
        } else {
            input.reset(&start);
            None
        }
    };

    match postfix {
        Some(op) => Ok(build_unary(input, op, pos, term)),
        None => Ok(term),
    }
}

fn read_arith_term<'a>(input: &mut Stream<'a>) -> Result<Token, PError> {
    arith_spacing().parse_next(input)?;
    let pos = cur_pos(input);

    match peek_char(input) {
        Some('(') => {
            '('.parse_next(input)?;
            let inner = read_arithmetic_contents(input)?;
            ')'.parse_next(input)?;
            Ok(inner)
        }
        Some('$') => {
            let word = read_dollar(input)?;
            let id = input.state.fresh_id(pos);
            Ok(Token::ArithExpansion(id, Box::new(word)))
        }
        Some(c) if c.is_ascii_digit() || c == '.' => {
            let digits: &str =
                take_while(1.., |c: char| c.is_ascii_digit() || c == '.').parse_next(input)?;
            let digits = digits.to_string();
            let id = input.state.fresh_id(pos);
            Ok(Token::ArithLiteral(id, digits))
        }
        Some(c) if is_variable_start(c) => {
            let name = variable_name().parse_next(input)?;
            let id = input.state.fresh_id(pos);
            Ok(Token::ArithVariable(id, name))
        }
        _ => Err(backtrack()),
    }
}

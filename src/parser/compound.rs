//! Command dispatch and the compound commands: groups, subshells, the
//! keyword-introduced control structures, and function definitions.

use winnow::combinator::opt;
use winnow::stream::Stream as _;
use winnow::token::take_while;
use winnow::Parser;

use crate::ast::{Id, Token};
use crate::diag::Severity;
use crate::source::SourcePosition;

use super::and_or::read_term;
use super::arithmetic::read_arithmetic_contents;
use super::commands::read_simple_command;
use super::conditions::read_condition;
use super::helpers::{keyword, peek_char, peek_str, spacing, variable_name};
use super::redirections::read_io_redirect;
use super::types::{backtrack, cur_pos, PError, Stream};
use super::words::{literal_word_text, read_wordlist};

/// Parse a command: compound or simple, dispatched on the first character,
/// plus any trailing redirections.
pub(crate) fn read_command<'a>() -> impl Parser<Stream<'a>, Token, PError> {
    move |input: &mut Stream<'a>| {
        spacing().parse_next(input)?;

        let inner = match peek_char(input) {
            Some('{') if lookahead(input, keyword("{")) => read_brace_group(input)?,
            Some('(') => {
                if peek_str(input, "((") {
                    let start = input.checkpoint();
                    match read_arithmetic_command(input) {
                        Ok(token) => token,
                        Err(_) => {
                            input.reset(&start);
                            read_subshell(input)?
                        }
                    }
                } else {
                    read_subshell(input)?
                }
            }
            Some('[') => {
                let start = input.checkpoint();
                match read_condition().parse_next(input) {
                    Ok(token) => token,
                    Err(_) => {
                        // A leading [ can also just be a glob word.
                        input.reset(&start);
                        return read_simple_command().parse_next(input);
                    }
                }
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                match peek_word(input).as_str() {
                    "if" => read_if_expression(input)?,
                    "while" => read_while_expression(input)?,
                    "until" => read_until_expression(input)?,
                    "for" => read_for_in(input)?,
                    "case" => read_case_expression(input)?,
                    "function" => read_function_definition(input)?,
                    _ => {
                        let start = input.checkpoint();
                        match read_function_definition(input) {
                            Ok(token) => token,
                            Err(_) => {
                                input.reset(&start);
                                return read_simple_command().parse_next(input);
                            }
                        }
                    }
                }
            }
            _ => return read_simple_command().parse_next(input),
        };

        let mut redirects = vec![];
        loop {
            let start = input.checkpoint();
            spacing().parse_next(input)?;
            match read_io_redirect().parse_next(input) {
                Ok(redirect) => redirects.push(redirect),
                Err(_) => {
                    input.reset(&start);
                    break;
                }
            }
        }

        let position = input
            .state
            .metadata
            .get(&inner.id())
            .map(|m| m.position.clone())
            .unwrap_or_else(|| cur_pos(input));
        let id = input.state.fresh_id(position);
        Ok(Token::Redirecting(id, redirects, Box::new(inner)))
    }
}

fn lookahead<'a, O>(input: &mut Stream<'a>, mut parser: impl Parser<Stream<'a>, O, PError>) -> bool {
    let start = input.checkpoint();
    let matched = parser.parse_next(input).is_ok();
    input.reset(&start);
    matched
}

/// The first run of word characters, without consuming it.
fn peek_word(input: &mut Stream<'_>) -> String {
    let start = input.checkpoint();
    let word: Result<&str, PError> =
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input);
    let word = word.map(|s| s.to_string()).unwrap_or_default();
    input.reset(&start);
    word
}

fn read_brace_group(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    keyword("{").parse_next(input)?;
    let body = read_term().parse_next(input)?;
    if keyword("}").parse_next(input).is_err() {
        input.state.note_at(
            pos,
            Severity::Error,
            "Couldn't find the closing '}' for this '{'.",
        );
        return Err(backtrack());
    }
    let id = input.state.fresh_id(pos);
    Ok(Token::BraceGroup(id, body))
}

fn read_subshell(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    '('.parse_next(input)?;
    let body = read_term().parse_next(input)?;
    ')'.parse_next(input)?;
    let id = input.state.fresh_id(pos);
    Ok(Token::Subshell(id, body))
}

fn read_arithmetic_command(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    "((".parse_next(input)?;
    let contents = read_arithmetic_contents(input)?;
    "))".parse_next(input)?;
    let id = input.state.fresh_id(pos);
    Ok(Token::Arithmetic(id, Box::new(contents)))
}

/// After `then` or `else`, a semicolon is a syntax error in real shells.
fn check_semicolon_after(input: &mut Stream<'_>, word: &str) -> Result<(), PError> {
    if peek_char(input) == Some(';') && !peek_str(input, ";;") {
        let pos = cur_pos(input);
        ';'.parse_next(input)?;
        input.state.note_at(
            pos,
            Severity::Error,
            format!("No semicolons directly after '{word}'."),
        );
    }
    Ok(())
}

fn read_if_expression(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    keyword("if").parse_next(input)?;

    let mut branches = vec![];
    let condition = read_term().parse_next(input)?;
    keyword("then").parse_next(input)?;
    check_semicolon_after(input, "then")?;
    let body = read_term().parse_next(input)?;
    branches.push((condition, body));

    while keyword("elif").parse_next(input).is_ok() {
        let condition = read_term().parse_next(input)?;
        keyword("then").parse_next(input)?;
        check_semicolon_after(input, "then")?;
        let body = read_term().parse_next(input)?;
        branches.push((condition, body));
    }

    let else_body = if keyword("else").parse_next(input).is_ok() {
        check_semicolon_after(input, "else")?;
        read_term().parse_next(input)?
    } else {
        vec![]
    };

    if keyword("fi").parse_next(input).is_err() {
        input
            .state
            .note_at(pos, Severity::Error, "Couldn't find 'fi' for this 'if'.");
        return Err(backtrack());
    }

    let id = input.state.fresh_id(pos);
    Ok(Token::IfExpression(id, branches, else_body))
}

fn read_while_expression(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    keyword("while").parse_next(input)?;
    let condition = read_term().parse_next(input)?;
    let body = read_do_group(input, pos.clone())?;
    let id = input.state.fresh_id(pos);
    Ok(Token::WhileExpression(id, condition, body))
}

fn read_until_expression(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    keyword("until").parse_next(input)?;
    let condition = read_term().parse_next(input)?;
    let body = read_do_group(input, pos.clone())?;
    let id = input.state.fresh_id(pos);
    Ok(Token::UntilExpression(id, condition, body))
}

/// Parse `do ... done`. A missing `done` at end of input is recovered with a
/// diagnostic; when the body's final command trails off with a literal
/// `done` word, the note lands on that command.
fn read_do_group(
    input: &mut Stream<'_>,
    loop_pos: SourcePosition,
) -> Result<Vec<Token>, PError> {
    let do_pos = cur_pos(input);
    if keyword("do").parse_next(input).is_err() {
        input
            .state
            .note_at(loop_pos, Severity::Error, "Expected 'do'.");
        return Err(backtrack());
    }

    let body = read_term().parse_next(input)?;

    if keyword("done").parse_next(input).is_ok() {
        return Ok(body);
    }

    super::helpers::all_spacing().parse_next(input)?;
    if input.eof_offset() == 0 {
        match find_trailing_done(&body) {
            Some(command_id) => {
                input.state.attach_note(
                    command_id,
                    Severity::Error,
                    "Put a ; or \\n before the done.",
                );
            }
            None => {
                input.state.note_at(
                    do_pos,
                    Severity::Error,
                    "Couldn't find 'done' for this 'do'.",
                );
            }
        }
        return Ok(body);
    }
    Err(backtrack())
}

/// Looks for a final simple command whose last word is the literal `done`,
/// i.e. a `done` that got slurped into the preceding command.
fn find_trailing_done(body: &[Token]) -> Option<Id> {
    let mut token = body.last()?;
    loop {
        token = match token {
            Token::Pipeline(_, commands) => commands.last()?,
            Token::Backgrounded(_, inner) | Token::Banged(_, inner) => inner,
            Token::Redirecting(_, _, inner) => inner,
            Token::SimpleCommand(id, _, words) => {
                let last = words.last()?;
                return (literal_word_text(last) == Some("done")).then_some(*id);
            }
            _ => return None,
        };
    }
}

fn read_for_in(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    keyword("for").parse_next(input)?;
    let name = variable_name().parse_next(input)?;
    spacing().parse_next(input)?;

    let values = if keyword("in").parse_next(input).is_ok() {
        read_wordlist(|i| {
            if lookahead(i, keyword("do")) {
                let pos = cur_pos(i);
                i.state.note_at(
                    pos,
                    Severity::Error,
                    "You need a line feed or semicolon before the 'do'.",
                );
                true
            } else {
                false
            }
        })
        .parse_next(input)?
    } else {
        vec![]
    };

    opt(super::helpers::sequential_sep()).parse_next(input)?;
    let body = read_do_group(input, pos.clone())?;

    let id = input.state.fresh_id(pos);
    Ok(Token::ForIn(id, name, values, body))
}

fn read_case_expression(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    keyword("case").parse_next(input)?;
    let word = super::words::read_normal_word().parse_next(input)?;
    super::helpers::all_spacing().parse_next(input)?;
    keyword("in").parse_next(input)?;
    super::helpers::all_spacing().parse_next(input)?;

    let mut arms = vec![];
    loop {
        if lookahead(input, keyword("esac")) {
            break;
        }

        opt('(').parse_next(input)?;
        spacing().parse_next(input)?;

        let mut patterns = vec![super::words::read_normal_word().parse_next(input)?];
        loop {
            spacing().parse_next(input)?;
            if opt('|').parse_next(input)?.is_none() {
                break;
            }
            spacing().parse_next(input)?;
            patterns.push(super::words::read_normal_word().parse_next(input)?);
        }

        spacing().parse_next(input)?;
        ')'.parse_next(input)?;
        super::helpers::all_spacing().parse_next(input)?;

        let body = if peek_str(input, ";;") || lookahead(input, keyword("esac")) {
            vec![]
        } else {
            read_term().parse_next(input)?
        };

        super::helpers::all_spacing().parse_next(input)?;
        if Parser::<_, _, PError>::parse_next(&mut ";;", input).is_ok() {
            super::helpers::all_spacing().parse_next(input)?;
            arms.push((patterns, body));
        } else if lookahead(input, keyword("esac")) {
            arms.push((patterns, body));
            break;
        } else {
            return Err(backtrack());
        }
    }

    keyword("esac").parse_next(input)?;

    let id = input.state.fresh_id(pos);
    Ok(Token::CaseExpression(id, Box::new(word), arms))
}

fn read_function_definition(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    if keyword("function").parse_next(input).is_ok() {
        input.state.note_at(
            pos.clone(),
            Severity::Info,
            "Drop the keyword 'function'. It's optional and illegal in other shells.",
        );
    }

    let name = variable_name().parse_next(input)?;
    spacing().parse_next(input)?;
    '('.parse_next(input)?;
    spacing().parse_next(input)?;
    ')'.parse_next(input)?;
    super::helpers::all_spacing().parse_next(input)?;

    if peek_char(input) != Some('{') {
        let brace_pos = cur_pos(input);
        input.state.note_at(
            brace_pos,
            Severity::Error,
            "Expected a { to open the function definition.",
        );
        return Err(backtrack());
    }
    let body = read_brace_group(input)?;

    let id = input.state.fresh_id(pos);
    Ok(Token::Function(id, name, Box::new(body)))
}

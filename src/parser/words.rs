//! The word grammar: quoted and unquoted word parts and their composition
//! into normal words.

use winnow::combinator::opt;
use winnow::stream::Stream as _;
use winnow::token::take_while;
use winnow::Parser;

use crate::ast::Token;
use crate::diag::Severity;

use super::and_or::read_term;
use super::arithmetic::read_arithmetic_contents;
use super::combinators::reluctant_till;
use super::helpers::{
    all_spacing, is_double_quotable, is_extglob_start, is_quotable, is_special_variable,
    is_variable_start, peek_char, peek_str, spacing, variable_name,
};
use super::types::{backtrack, cur_pos, PError, Stream};

/// Words that, when they make up a whole word on their own, usually mean the
/// author forgot a separator before a construct terminator.
const TERMINATORS: &[&str] = &["do", "done", "then", "fi", "esac", "}"];

/// Parse a normal word: one or more word parts.
pub(crate) fn read_normal_word<'a>() -> impl Parser<Stream<'a>, Token, PError> {
    move |input: &mut Stream<'a>| {
        let pos = cur_pos(input);
        let mut parts = vec![];
        loop {
            let start = input.checkpoint();
            match word_part(input) {
                Ok(part) => parts.push(part),
                Err(_) => {
                    input.reset(&start);
                    break;
                }
            }
        }
        if parts.is_empty() {
            return Err(backtrack());
        }

        let id = input.state.fresh_id(pos);
        if let [Token::Literal(_, text)] = parts.as_slice() {
            if TERMINATORS.contains(&text.as_str()) {
                let message = format!(
                    "Use semicolon or linefeed before '{text}' (or quote to make it literal)."
                );
                input.state.attach_note(id, Severity::Warning, message);
            }
        }

        Ok(Token::NormalWord(id, parts))
    }
}

/// If the word is exactly one literal part, its text.
pub(crate) fn literal_word_text(word: &Token) -> Option<&str> {
    match word {
        Token::NormalWord(_, parts) => match parts.as_slice() {
            [Token::Literal(_, text)] => Some(text),
            _ => None,
        },
        _ => None,
    }
}

/// Whether the word's last part is a literal ending in the given text.
pub(crate) fn word_ends_with(word: &Token, suffix: &str) -> bool {
    match word {
        Token::NormalWord(_, parts) => match parts.last() {
            Some(Token::Literal(_, text)) => text.ends_with(suffix),
            _ => false,
        },
        _ => false,
    }
}

/// Parse one word part. The alternation order is fixed: single-quoted,
/// double-quoted, extglob, dollar-form, brace expansion, back-ticked, then
/// normal literal; here the first character selects the branch directly.
fn word_part(input: &mut Stream<'_>) -> Result<Token, PError> {
    match peek_char(input) {
        Some('\'') => read_single_quoted(input),
        Some('"') => read_double_quoted(input),
        Some(c) if is_extglob_start(c) => {
            let start = input.checkpoint();
            match read_extglob(input) {
                Ok(token) => Ok(token),
                Err(_) => {
                    // Not an extglob after all; the prefix char is an
                    // ordinary literal.
                    input.reset(&start);
                    let pos = cur_pos(input);
                    let c = winnow::token::any::<_, PError>.parse_next(input)?;
                    let id = input.state.fresh_id(pos);
                    Ok(Token::Literal(id, c.to_string()))
                }
            }
        }
        Some('$') => read_dollar(input),
        Some('{') => {
            let start = input.checkpoint();
            match read_braced(input) {
                Ok(token) => Ok(token),
                Err(_) => {
                    input.reset(&start);
                    read_normal_literal(input)
                }
            }
        }
        Some('`') => read_backticked(input),
        Some('\\') => read_normal_literal(input),
        Some(c) if is_quotable(c) => Err(backtrack()),
        Some(_) => read_normal_literal(input),
        None => Err(backtrack()),
    }
}

// ============================================================================
// Quoted strings
// ============================================================================

fn read_single_quoted(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    '\''.parse_next(input)?;
    let chars: Vec<char> =
        reluctant_till(winnow::token::any::<_, PError>, '\'').parse_next(input)?;
    let content: String = chars.into_iter().collect();

    let close_pos = cur_pos(input);
    '\''.parse_next(input)?;

    if content.ends_with('\\') {
        input.state.note_at(
            close_pos.clone(),
            Severity::Info,
            "Are you trying to escape that single quote? echo 'You'\\''re doing it wrong'.",
        );
    }
    let terminated_early = matches!(peek_char(input), Some(c) if c.is_alphabetic())
        && content.chars().last().is_some_and(|c| c.is_alphabetic());
    if terminated_early {
        input.state.note_at(
            close_pos,
            Severity::Warning,
            "This apostrophe terminated the single quoted string!",
        );
    }

    let id = input.state.fresh_id(pos);
    Ok(Token::SingleQuoted(id, content))
}

fn read_double_quoted(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    '"'.parse_next(input)?;

    let mut parts = vec![];
    loop {
        match peek_char(input) {
            Some('"') => {
                '"'.parse_next(input)?;
                break;
            }
            Some('$') => parts.push(read_dollar(input)?),
            Some('`') => parts.push(read_backticked(input)?),
            Some(_) => parts.push(read_double_literal(input)?),
            None => return Err(backtrack()),
        }
    }

    let id = input.state.fresh_id(pos);
    Ok(Token::DoubleQuoted(id, parts))
}

/// A literal run inside double quotes. Accepts `\"`, `\$`, `` \` `` and
/// `\\` as escapes; any other `\c` is kept as the two characters.
fn read_double_literal(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    let mut text = String::new();
    loop {
        match peek_char(input) {
            Some('\\') => {
                '\\'.parse_next(input)?;
                match opt(winnow::token::any::<_, PError>).parse_next(input)? {
                    Some(c) if is_double_quotable(c) => text.push(c),
                    Some(c) => {
                        text.push('\\');
                        text.push(c);
                    }
                    None => {
                        text.push('\\');
                        break;
                    }
                }
            }
            Some(c) if is_double_quotable(c) => break,
            Some(c) => {
                winnow::token::any::<_, PError>.parse_next(input)?;
                text.push(c);
            }
            None => break,
        }
    }
    if text.is_empty() {
        return Err(backtrack());
    }
    let id = input.state.fresh_id(pos);
    Ok(Token::Literal(id, text))
}

fn read_backticked(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    '`'.parse_next(input)?;
    input.state.note_at(
        pos.clone(),
        Severity::Info,
        "Ignoring deprecated backtick expansion. Use $(..) instead.",
    );

    let mut content = String::new();
    loop {
        match peek_char(input) {
            Some('`') => {
                '`'.parse_next(input)?;
                break;
            }
            Some('\\') => {
                '\\'.parse_next(input)?;
                content.push('\\');
                if let Some(c) = opt(winnow::token::any::<_, PError>).parse_next(input)? {
                    content.push(c);
                }
            }
            Some(c) => {
                winnow::token::any::<_, PError>.parse_next(input)?;
                content.push(c);
            }
            None => {
                input
                    .state
                    .note_at(pos, Severity::Error, "Can't find terminating backtick.");
                return Err(backtrack());
            }
        }
    }

    let id = input.state.fresh_id(pos);
    Ok(Token::Backticked(id, content))
}

// ============================================================================
// Dollar forms
// ============================================================================

/// Parse any `$` form. Ordered choice: `$((..))`, `${..}`, `$(..)`,
/// variables, then the lone dollar.
pub(crate) fn read_dollar(input: &mut Stream<'_>) -> Result<Token, PError> {
    if peek_str(input, "$((") {
        let start = input.checkpoint();
        match read_dollar_arithmetic(input) {
            Ok(token) => return Ok(token),
            // `$((` can also open a command expansion holding a subshell.
            Err(_) => input.reset(&start),
        }
    }
    if peek_str(input, "${") {
        return read_dollar_braced(input);
    }
    if peek_str(input, "$(") {
        return read_dollar_expansion(input);
    }

    let pos = cur_pos(input);
    '$'.parse_next(input)?;

    match peek_char(input) {
        Some(c) if c.is_ascii_digit() => {
            winnow::token::any::<_, PError>.parse_next(input)?;
            warn_about_joined_digits(input, c, |d| d.is_ascii_digit());
            let id = input.state.fresh_id(pos);
            Ok(Token::DollarVariable(id, c.to_string()))
        }
        Some(c) if is_special_variable(c) => {
            winnow::token::any::<_, PError>.parse_next(input)?;
            warn_about_joined_digits(input, c, is_special_variable);
            let id = input.state.fresh_id(pos);
            Ok(Token::DollarVariable(id, c.to_string()))
        }
        Some(c) if is_variable_start(c) => {
            let name = variable_name().parse_next(input)?;
            let id = input.state.fresh_id(pos);
            Ok(Token::DollarVariable(id, name))
        }
        next => {
            // A dollar that expands to nothing. The next character is only
            // inspected, never consumed.
            if next != Some('\'') {
                input.state.note_at(
                    pos.clone(),
                    Severity::Style,
                    "$ is not used specially and should therefore be escaped.",
                );
            }
            let id = input.state.fresh_id(pos);
            Ok(Token::Literal(id, "$".to_string()))
        }
    }
}

/// After `$N`, a directly following run of the same character class means
/// the author almost certainly wanted `${N}...`.
fn warn_about_joined_digits(input: &mut Stream<'_>, first: char, class: fn(char) -> bool) {
    let pos = cur_pos(input);
    let start = input.checkpoint();
    let rest: Result<&str, PError> = take_while(1.., class).parse_next(input);
    if let Ok(rest) = rest {
        let message = format!("${first}{rest} is equivalent to ${{{first}}}{rest}.");
        input.state.note_at(pos, Severity::Error, message);
    }
    input.reset(&start);
}

fn read_dollar_arithmetic(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    "$((".parse_next(input)?;
    let contents = read_arithmetic_contents(input)?;
    "))".parse_next(input)?;
    let id = input.state.fresh_id(pos);
    Ok(Token::DollarArithmetic(id, Box::new(contents)))
}

/// `${...}` with a flat, conservatively parsed interior: escaped characters
/// are honored, but the contents are not given further structure.
fn read_dollar_braced(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    "${".parse_next(input)?;
    let content = read_generic_literal(input, |c| c == '}')?;
    '}'.parse_next(input)?;
    let id = input.state.fresh_id(pos);
    Ok(Token::DollarBraced(id, content))
}

fn read_dollar_expansion(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    "$(".parse_next(input)?;
    all_spacing().parse_next(input)?;
    let commands = match peek_char(input) {
        Some(')') => vec![],
        _ => read_term().parse_next(input)?,
    };
    all_spacing().parse_next(input)?;
    ')'.parse_next(input)?;
    let id = input.state.fresh_id(pos);
    Ok(Token::DollarExpansion(id, commands))
}

/// A flat character run that honors backslash escapes and stops before the
/// terminator (or end of input).
fn read_generic_literal(
    input: &mut Stream<'_>,
    terminator: fn(char) -> bool,
) -> Result<String, PError> {
    let mut text = String::new();
    loop {
        match peek_char(input) {
            Some('\\') => {
                '\\'.parse_next(input)?;
                text.push('\\');
                if let Some(c) = opt(winnow::token::any::<_, PError>).parse_next(input)? {
                    text.push(c);
                }
            }
            Some(c) if terminator(c) => break,
            Some(c) => {
                winnow::token::any::<_, PError>.parse_next(input)?;
                text.push(c);
            }
            None => break,
        }
    }
    Ok(text)
}

// ============================================================================
// Extglobs and brace expansion
// ============================================================================

fn read_extglob(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    let prefix = winnow::token::one_of::<_, _, PError>(is_extglob_start).parse_next(input)?;
    '('.parse_next(input)?;

    let mut alternatives = vec![];
    loop {
        let alt_pos = cur_pos(input);
        let mut parts = vec![];
        loop {
            let start = input.checkpoint();
            match word_part(input) {
                Ok(part) => parts.push(part),
                Err(_) => {
                    input.reset(&start);
                    break;
                }
            }
        }
        let closing = match peek_char(input) {
            Some(c @ ('|' | ')')) => c,
            _ => return Err(backtrack()),
        };

        let alternative = if parts.is_empty() {
            let id = input.state.fresh_id(alt_pos);
            Token::Literal(id, String::new())
        } else {
            let id = input.state.fresh_id(alt_pos);
            Token::NormalWord(id, parts)
        };
        alternatives.push(alternative);

        winnow::token::any::<_, PError>.parse_next(input)?;
        if closing == ')' {
            break;
        }
    }

    let id = input.state.fresh_id(pos);
    Ok(Token::Extglob(id, prefix, alternatives))
}

/// A brace expansion like `{1..10}` or `{a,"b c"}`. The parsed value is the
/// concatenated textual representation of its segments.
fn read_braced(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    '{'.parse_next(input)?;

    let mut text = String::new();
    let mut any_segment = false;
    loop {
        match peek_char(input) {
            Some('"') => {
                text.push('"');
                text.push_str(&read_braced_quoted_segment(input)?);
                text.push('"');
                any_segment = true;
            }
            Some(c) if c == '}' || c.is_whitespace() => break,
            Some(_) => {
                let segment = read_braced_literal_segment(input)?;
                if segment.is_empty() {
                    break;
                }
                text.push_str(&segment);
                any_segment = true;
            }
            None => break,
        }
    }

    if !any_segment {
        return Err(backtrack());
    }
    '}'.parse_next(input)?;

    let id = input.state.fresh_id(pos);
    Ok(Token::BraceExpansion(id, text))
}

fn read_braced_quoted_segment(input: &mut Stream<'_>) -> Result<String, PError> {
    '"'.parse_next(input)?;
    let mut text = String::new();
    loop {
        match peek_char(input) {
            Some('"') => {
                '"'.parse_next(input)?;
                return Ok(text);
            }
            Some('\\') => {
                '\\'.parse_next(input)?;
                match opt(winnow::token::any::<_, PError>).parse_next(input)? {
                    Some(c) if is_double_quotable(c) => text.push(c),
                    Some(c) => {
                        text.push('\\');
                        text.push(c);
                    }
                    None => return Err(backtrack()),
                }
            }
            Some(c) if is_double_quotable(c) => return Err(backtrack()),
            Some(c) => {
                winnow::token::any::<_, PError>.parse_next(input)?;
                text.push(c);
            }
            None => return Err(backtrack()),
        }
    }
}

fn read_braced_literal_segment(input: &mut Stream<'_>) -> Result<String, PError> {
    let mut text = String::new();
    loop {
        match peek_char(input) {
            Some('\\') => {
                '\\'.parse_next(input)?;
                text.push('\\');
                if let Some(c) = opt(winnow::token::any::<_, PError>).parse_next(input)? {
                    text.push(c);
                }
            }
            Some(c) if c == '}' || c == '"' || c.is_whitespace() => break,
            Some(c) => {
                winnow::token::any::<_, PError>.parse_next(input)?;
                text.push(c);
            }
            None => break,
        }
    }
    Ok(text)
}

// ============================================================================
// Literals
// ============================================================================

/// Characters a backslash straightforwardly escapes in an unquoted word.
fn is_escapable(c: char) -> bool {
    is_quotable(c) || is_extglob_start(c) || c == '[' || c == ']'
}

/// An escaped character in an unquoted word. `\` before a newline is a line
/// continuation and contributes nothing.
fn read_normal_escaped(input: &mut Stream<'_>) -> Result<Option<char>, PError> {
    let pos = cur_pos(input);
    '\\'.parse_next(input)?;
    let c = winnow::token::any::<_, PError>.parse_next(input)?;
    if c == '\n' {
        return Ok(None);
    }
    if !is_escapable(c) {
        let message =
            format!("Did you mean \"$(printf '\\{c}')\"? The shell just ignores the \\ here.");
        input.state.note_at(pos, Severity::Warning, message);
    }
    Ok(Some(c))
}

fn read_normal_literal(input: &mut Stream<'_>) -> Result<Token, PError> {
    let pos = cur_pos(input);
    let mut text = String::new();
    loop {
        match peek_char(input) {
            Some('\\') => {
                let start = input.checkpoint();
                match read_normal_escaped(input) {
                    Ok(Some(c)) => text.push(c),
                    Ok(None) => {}
                    Err(_) => {
                        input.reset(&start);
                        break;
                    }
                }
            }
            Some(c) if is_quotable(c) || is_extglob_start(c) || c == '\r' => break,
            Some(c) => {
                winnow::token::any::<_, PError>.parse_next(input)?;
                text.push(c);
            }
            None => break,
        }
    }
    if text.is_empty() {
        return Err(backtrack());
    }
    let id = input.state.fresh_id(pos);
    Ok(Token::Literal(id, text))
}

/// A word list: words separated by spacing, as in `for x in a b c`.
pub(crate) fn read_wordlist<'a>(
    mut stop: impl FnMut(&mut Stream<'a>) -> bool,
) -> impl Parser<Stream<'a>, Vec<Token>, PError> {
    move |input: &mut Stream<'a>| {
        let mut words = vec![];
        loop {
            spacing().parse_next(input)?;
            if stop(input) {
                break;
            }
            let start = input.checkpoint();
            match read_normal_word().parse_next(input) {
                Ok(word) => words.push(word),
                Err(_) => {
                    input.reset(&start);
                    break;
                }
            }
        }
        Ok(words)
    }
}

//! The test-condition sublanguage entered at `[` and `[[`. Both forms share
//! one grammar; the bracket kind rides along so diagnostics can tell the
//! user which dialect rule they broke.

use winnow::stream::Stream as _;
use winnow::Parser;

use crate::ast::{ConditionKind, Token};
use crate::diag::Severity;

use super::helpers::{peek_char, peek_str, spacing};
use super::types::{backtrack, cur_pos, PError, Stream};
use super::words::{literal_word_text, read_normal_word, word_ends_with};

const UNARY_OPS: &[&str] = &[
    "-a", "-b", "-c", "-d", "-e", "-f", "-g", "-h", "-L", "-k", "-p", "-r", "-s", "-S", "-t",
    "-u", "-w", "-x", "-O", "-G", "-N", "-z", "-n", "-o",
];

const BINARY_OPS: &[(&str, &[char])] = &[
    ("-nt", &[]),
    ("-ot", &[]),
    ("-ef", &[]),
    ("==", &[]),
    ("!=", &[]),
    ("<=", &[]),
    (">=", &[]),
    ("-eq", &[]),
    ("-ne", &[]),
    ("-lt", &[]),
    ("-le", &[]),
    ("-gt", &[]),
    ("-ge", &[]),
    ("=~", &[]),
    (">", &['=']),
    ("<", &['=']),
    ("=", &['=', '~']),
];

/// Utilities people habitually (and pointlessly) wrap in `[ ]` to test
/// whether they succeed.
const COMMON_COMMANDS: &[&str] = &[
    "alias", "ar", "at", "awk", "basename", "batch", "bc", "bg", "cal", "cat", "cd", "chgrp",
    "chmod", "chown", "cksum", "cmp", "comm", "command", "compress", "cp", "crontab", "csplit",
    "cut", "date", "dd", "df", "diff", "dirname", "du", "echo", "ed", "env", "ex", "expand",
    "expr", "false", "fc", "fg", "file", "find", "fold", "fuser", "getconf", "getopts", "grep",
    "hash", "head", "iconv", "jobs", "join", "kill", "lex", "link", "ln", "locale", "logger",
    "logname", "lp", "ls", "m4", "mailx", "make", "man", "mesg", "mkdir", "mkfifo", "more", "mv",
    "newgrp", "nice", "nl", "nm", "nohup", "od", "paste", "patch", "pathchk", "pax", "pr",
    "printf", "ps", "pwd", "read", "renice", "rm", "rmdir", "sed", "sh", "sleep", "sort", "split",
    "strings", "strip", "stty", "tail", "talk", "tee", "test", "time", "touch", "tput", "tr",
    "true", "tsort", "tty", "type", "ulimit", "umask", "unalias", "uname", "uncompress",
    "unexpand", "uniq", "unlink", "uucp", "uudecode", "uuencode", "vi", "wait", "wc", "who",
    "write", "xargs", "yacc", "zcat",
];

/// Parse a `[ .. ]` or `[[ .. ]]` condition.
pub(crate) fn read_condition<'a>() -> impl Parser<Stream<'a>, Token, PError> {
    move |input: &mut Stream<'a>| {
        let pos = cur_pos(input);
        let kind = if Parser::<_, _, PError>::parse_next(&mut "[[", input).is_ok() {
            ConditionKind::DoubleBracket
        } else if Parser::<_, _, PError>::parse_next(&mut '[', input).is_ok() {
            ConditionKind::SingleBracket
        } else {
            return Err(backtrack());
        };

        let after_open = cur_pos(input);
        let space = spacing().parse_next(input)?;
        if space.is_empty() {
            input
                .state
                .note_at(after_open, Severity::Error, "You need a space here.");
        }

        let expr = read_cond_expr(input, kind)?;

        match kind {
            ConditionKind::DoubleBracket => "]]".parse_next(input).map(|_| ())?,
            ConditionKind::SingleBracket => ']'.parse_next(input).map(|_| ())?,
        }

        if let Token::CondNoary(_, _, word) = &expr {
            if let Some(name) = literal_word_text(word) {
                if COMMON_COMMANDS.contains(&name) {
                    let word_pos = input
                        .state
                        .metadata
                        .get(&word.id())
                        .map(|m| m.position.clone())
                        .unwrap_or_else(|| pos.clone());
                    input.state.note_at(
                        word_pos,
                        Severity::Warning,
                        "To check a command, skip [] and just do 'if foo | grep bar; then'.",
                    );
                }
            }
        }

        let id = input.state.fresh_id(pos);
        Ok(Token::Condition(id, kind, Box::new(expr)))
    }
}

/// Missing spacing here is merely suspicious, not broken.
fn soft_spacing(input: &mut Stream<'_>) -> Result<(), PError> {
    let pos = cur_pos(input);
    let space = spacing().parse_next(input)?;
    if space.is_empty() {
        input
            .state
            .note_at(pos, Severity::Info, "You need a space here.");
    }
    Ok(())
}

/// Missing spacing here changes what the shell parses.
fn hard_spacing(input: &mut Stream<'_>) -> Result<(), PError> {
    let pos = cur_pos(input);
    let space = spacing().parse_next(input)?;
    if space.is_empty() {
        input
            .state
            .note_at(pos, Severity::Error, "You need a space here.");
    }
    Ok(())
}

fn read_cond_expr<'a>(input: &mut Stream<'a>, kind: ConditionKind) -> Result<Token, PError> {
    super::combinators::chain_left(
        |i: &mut Stream<'a>| read_cond_and(i, kind),
        move |i: &mut Stream<'a>| read_logical_op(i, kind, "||", "-o"),
        move |i: &mut Stream<'a>, note: Option<String>, l: Token, r: Token| {
            build_logical(i, kind, note, l, r, false)
        },
    )
    .parse_next(input)
}

fn read_cond_and<'a>(input: &mut Stream<'a>, kind: ConditionKind) -> Result<Token, PError> {
    super::combinators::chain_left(
        |i: &mut Stream<'a>| read_cond_term(i, kind),
        move |i: &mut Stream<'a>| read_logical_op(i, kind, "&&", "-a"),
        move |i: &mut Stream<'a>, note: Option<String>, l: Token, r: Token| {
            build_logical(i, kind, note, l, r, true)
        },
    )
    .parse_next(input)
}

/// Matches `&&`/`||` or the `-a`/`-o` spellings, returning the dialect
/// complaint to attach (if any). Terms consume their trailing spacing, so
/// this starts at the operator itself.
fn read_logical_op(
    input: &mut Stream<'_>,
    kind: ConditionKind,
    symbolic: &'static str,
    flag: &'static str,
) -> Result<Option<String>, PError> {
    let start = input.checkpoint();

    let note = if winnow::token::literal::<_, _, PError>(symbolic)
        .parse_next(input)
        .is_ok()
    {
        match kind {
            ConditionKind::SingleBracket => Some(format!(
                "You can't use {symbolic} inside [..]. Use [[..]] instead."
            )),
            ConditionKind::DoubleBracket => None,
        }
    } else if winnow::token::literal::<_, _, PError>(flag)
        .parse_next(input)
        .is_ok()
    {
        // Reject when this is just the start of a longer word like `-and`.
        if peek_char(input).is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            input.reset(&start);
            return Err(backtrack());
        }
        match kind {
            ConditionKind::SingleBracket => None,
            ConditionKind::DoubleBracket => Some(format!(
                "In [[..]], use {symbolic} instead of {flag}."
            )),
        }
    } else {
        input.reset(&start);
        return Err(backtrack());
    };

    soft_spacing(input)?;
    Ok(note)
}

fn build_logical(
    input: &mut Stream<'_>,
    kind: ConditionKind,
    note: Option<String>,
    left: Token,
    right: Token,
    is_and: bool,
) -> Token {
    let position = input
        .state
        .metadata
        .get(&left.id())
        .map(|m| m.position.clone())
        .unwrap_or_else(|| cur_pos(input));
    let id = input.state.fresh_id(position);
    if let Some(message) = note {
        input.state.attach_note(id, Severity::Error, message);
    }
    if is_and {
        Token::CondAnd(id, kind, Box::new(left), Box::new(right))
    } else {
        Token::CondOr(id, kind, Box::new(left), Box::new(right))
    }
}

fn read_cond_term<'a>(input: &mut Stream<'a>, kind: ConditionKind) -> Result<Token, PError> {
    match peek_char(input) {
        Some('!') => {
            let pos = cur_pos(input);
            '!'.parse_next(input)?;
            soft_spacing(input)?;
            let operand = read_cond_term(input, kind)?;
            let id = input.state.fresh_id(pos);
            Ok(Token::CondNot(id, kind, Box::new(operand)))
        }
        Some('(') => read_cond_group(input, kind, false),
        Some('\\') if peek_str(input, "\\(") => read_cond_group(input, kind, true),
        _ => read_cond_unary_or_word(input, kind),
    }
}

fn read_cond_group<'a>(
    input: &mut Stream<'a>,
    kind: ConditionKind,
    open_escaped: bool,
) -> Result<Token, PError> {
    let pos = cur_pos(input);
    if open_escaped {
        "\\(".parse_next(input).map(|_| ())?;
    } else {
        '('.parse_next(input).map(|_| ())?;
    }
    note_group_escaping(input, kind, open_escaped, pos.clone());
    spacing().parse_next(input)?;

    let expr = read_cond_expr(input, kind)?;

    let close_pos = cur_pos(input);
    let close_escaped = if peek_str(input, "\\)") {
        "\\)".parse_next(input).map(|_| ())?;
        true
    } else if Parser::<_, _, PError>::parse_next(&mut ')', input).is_ok() {
        false
    } else {
        return Err(backtrack());
    };
    note_group_escaping(input, kind, close_escaped, close_pos.clone());
    if open_escaped != close_escaped {
        input.state.note_at(
            close_pos,
            Severity::Error,
            "Did you just escape one half of \\( \\) ?",
        );
    }
    soft_spacing(input)?;

    let id = input.state.fresh_id(pos);
    Ok(Token::CondGroup(id, kind, Box::new(expr)))
}

fn note_group_escaping(
    input: &mut Stream<'_>,
    kind: ConditionKind,
    escaped: bool,
    pos: crate::source::SourcePosition,
) {
    match kind {
        ConditionKind::SingleBracket if !escaped => {
            input.state.note_at(
                pos,
                Severity::Error,
                "In [..] you have to escape \\( \\).",
            );
        }
        ConditionKind::DoubleBracket if escaped => {
            input.state.note_at(
                pos,
                Severity::Error,
                "In [[..]] you shouldn't escape \\( \\).",
            );
        }
        _ => {}
    }
}

fn read_cond_unary_or_word<'a>(input: &mut Stream<'a>, kind: ConditionKind) -> Result<Token, PError> {
    // Unary operator?
    let start = input.checkpoint();
    let pos = cur_pos(input);
    for op in UNARY_OPS {
        if winnow::token::literal::<_, _, PError>(*op)
            .parse_next(input)
            .is_ok()
        {
            if peek_char(input).is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
                input.reset(&start);
                break;
            }
            let space_pos = cur_pos(input);
            let space = spacing().parse_next(input)?;
            match read_cond_word(input, kind) {
                Ok(operand) => {
                    if space.is_empty() {
                        input
                            .state
                            .note_at(space_pos, Severity::Error, "You need a space here.");
                    }
                    let id = input.state.fresh_id(pos);
                    return Ok(Token::CondUnary(id, kind, (*op).to_string(), Box::new(operand)));
                }
                Err(_) => {
                    input.reset(&start);
                    break;
                }
            }
        }
        input.reset(&start);
    }

    // Bare word, possibly the left side of a binary test.
    let left = read_cond_word(input, kind)?;

    let op_start = input.checkpoint();
    let op_pos = cur_pos(input);
    for (op, excluded) in BINARY_OPS {
        if winnow::token::literal::<_, _, PError>(*op)
            .parse_next(input)
            .is_ok()
        {
            let next = peek_char(input);
            let collides = next.is_some_and(|c| excluded.contains(&c));
            let word_op = op.starts_with('-');
            let runs_on = word_op && next.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
            if !collides && !runs_on {
                hard_spacing(input)?;
                match read_cond_word(input, kind) {
                    Ok(right) => {
                        let position = input
                            .state
                            .metadata
                            .get(&left.id())
                            .map(|m| m.position.clone())
                            .unwrap_or_else(|| op_pos.clone());
                        let id = input.state.fresh_id(position);
                        return Ok(Token::CondBinary(
                            id,
                            kind,
                            (*op).to_string(),
                            Box::new(left),
                            Box::new(right),
                        ));
                    }
                    Err(_) => {
                        input.reset(&op_start);
                        break;
                    }
                }
            }
        }
        input.reset(&op_start);
    }

    let position = input
        .state
        .metadata
        .get(&left.id())
        .map(|m| m.position.clone())
        .unwrap_or(op_pos);
    let id = input.state.fresh_id(position);
    Ok(Token::CondNoary(id, kind, Box::new(left)))
}

/// A word operand in a condition. Consumes trailing spacing. Flags `[` used
/// for grouping and words that run into the closing bracket.
fn read_cond_word<'a>(input: &mut Stream<'a>, kind: ConditionKind) -> Result<Token, PError> {
    match peek_char(input) {
        Some('[') => {
            let pos = cur_pos(input);
            let suggestion = match kind {
                ConditionKind::SingleBracket => "Use \\( .. \\).",
                ConditionKind::DoubleBracket => "Use ( .. ).",
            };
            input.state.note_at(
                pos,
                Severity::Error,
                format!("Don't use [ ] for grouping. {suggestion}"),
            );
            return Err(backtrack());
        }
        Some(']') | None => return Err(backtrack()),
        _ => {}
    }

    let word = read_normal_word().parse_next(input)?;

    let close = match kind {
        ConditionKind::SingleBracket => "]",
        ConditionKind::DoubleBracket => "]]",
    };
    if word_ends_with(&word, "]") {
        let pos = cur_pos(input);
        input.state.note_at(
            pos,
            Severity::Error,
            format!("You need a space before the {close}."),
        );
        return Err(backtrack());
    }

    spacing().parse_next(input)?;
    Ok(word)
}

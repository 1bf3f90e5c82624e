//! Word grammar tests: quoting, expansions, escapes, and their diagnostics.

use crate::ast::Token;
use crate::diag::Severity;

use super::{has_note, parse, parse_clean, parse_ok, single_command, word_text, words_of};

#[test]
fn plain_words() {
    let root = parse_clean("echo hello world");
    let words = words_of(single_command(&root)).to_vec();
    assert_eq!(words.len(), 3);
    assert_eq!(word_text(&words[0]), "echo");
    assert_eq!(word_text(&words[1]), "hello");
    assert_eq!(word_text(&words[2]), "world");
}

#[test]
fn single_quoted_word() {
    let root = parse_clean("echo 'hi there'");
    let words = words_of(single_command(&root)).to_vec();
    match &words[1] {
        Token::NormalWord(_, parts) => {
            assert!(matches!(&parts[0], Token::SingleQuoted(_, s) if s == "hi there"));
        }
        other => panic!("unexpected word: {other:?}"),
    }
}

#[test]
fn apostrophe_that_ends_the_string() {
    let (root, notes) = parse_ok("echo 'don't");
    assert!(has_note(
        &notes,
        Severity::Warning,
        "This apostrophe terminated the single quoted string!"
    ));
    let words = words_of(single_command(&root)).to_vec();
    assert_eq!(word_text(&words[1]), "dont");
}

#[test]
fn escaped_quote_inside_single_quotes() {
    let (_root, notes) = parse_ok("echo 'foo bar\\'");
    assert_eq!(notes.len(), 1);
    assert!(has_note(
        &notes,
        Severity::Info,
        "escape that single quote"
    ));
}

#[test]
fn double_quoted_with_expansions() {
    let root = parse_clean("echo \"a $b c\"");
    let words = words_of(single_command(&root)).to_vec();
    match &words[1] {
        Token::NormalWord(_, parts) => match &parts[0] {
            Token::DoubleQuoted(_, inner) => {
                assert!(matches!(&inner[0], Token::Literal(_, s) if s == "a "));
                assert!(matches!(&inner[1], Token::DollarVariable(_, name) if name == "b"));
                assert!(matches!(&inner[2], Token::Literal(_, s) if s == " c"));
            }
            other => panic!("expected double quoted part: {other:?}"),
        },
        other => panic!("unexpected word: {other:?}"),
    }
}

#[test]
fn double_quoted_escapes() {
    let root = parse_clean("echo \"a\\\"b\\$c\\\\d\\ne\"");
    let words = words_of(single_command(&root)).to_vec();
    match &words[1] {
        Token::NormalWord(_, parts) => match &parts[0] {
            Token::DoubleQuoted(_, inner) => {
                assert!(matches!(&inner[0], Token::Literal(_, s) if s == "a\"b$c\\d\\ne"));
            }
            other => panic!("expected double quoted part: {other:?}"),
        },
        other => panic!("unexpected word: {other:?}"),
    }
}

#[test]
fn backticks_are_deprecated() {
    let (root, notes) = parse_ok("echo `date`");
    assert!(has_note(
        &notes,
        Severity::Info,
        "Ignoring deprecated backtick expansion. Use $(..) instead."
    ));
    let words = words_of(single_command(&root)).to_vec();
    match &words[1] {
        Token::NormalWord(_, parts) => {
            assert!(matches!(&parts[0], Token::Backticked(_, s) if s == "date"));
        }
        other => panic!("unexpected word: {other:?}"),
    }
}

#[test]
fn unterminated_backtick_is_fatal() {
    let result = parse("echo `date");
    assert!(result.tree.is_none());
    assert!(has_note(
        &result.notes,
        Severity::Error,
        "Can't find terminating backtick."
    ));
}

#[test]
fn dollar_forms() {
    let root = parse_clean("echo ${foo:-bar} $(pwd) $x $1 $?");
    let words = words_of(single_command(&root)).to_vec();
    let part = |i: usize| match &words[i] {
        Token::NormalWord(_, parts) => parts[0].clone(),
        other => panic!("unexpected word: {other:?}"),
    };
    assert!(matches!(part(1), Token::DollarBraced(_, s) if s == "foo:-bar"));
    assert!(matches!(part(2), Token::DollarExpansion(_, cmds) if cmds.len() == 1));
    assert!(matches!(part(3), Token::DollarVariable(_, name) if name == "x"));
    assert!(matches!(part(4), Token::DollarVariable(_, name) if name == "1"));
    assert!(matches!(part(5), Token::DollarVariable(_, name) if name == "?"));
}

#[test]
fn multi_digit_positional_wants_braces() {
    let (root, notes) = parse_ok("echo $10");
    assert!(has_note(
        &notes,
        Severity::Error,
        "$10 is equivalent to ${1}0"
    ));
    let words = words_of(single_command(&root)).to_vec();
    match &words[1] {
        Token::NormalWord(_, parts) => {
            assert!(matches!(&parts[0], Token::DollarVariable(_, name) if name == "1"));
            assert!(matches!(&parts[1], Token::Literal(_, s) if s == "0"));
        }
        other => panic!("unexpected word: {other:?}"),
    }
}

#[test]
fn lone_dollar_is_a_style_note() {
    let (root, notes) = parse_ok("echo $");
    assert!(has_note(
        &notes,
        Severity::Style,
        "$ is not used specially"
    ));
    let words = words_of(single_command(&root)).to_vec();
    assert_eq!(word_text(&words[1]), "$");
}

#[test]
fn dollar_before_single_quote_is_quiet() {
    let (_root, notes) = parse_ok("echo $'x'");
    assert!(notes.is_empty(), "unexpected notes: {notes:?}");
}

#[test]
fn useless_backslash_warns() {
    let (root, notes) = parse_ok("echo \\d");
    assert!(has_note(
        &notes,
        Severity::Warning,
        "just ignores the \\"
    ));
    let words = words_of(single_command(&root)).to_vec();
    assert_eq!(word_text(&words[1]), "d");
}

#[test]
fn escaping_a_quotable_char_is_fine() {
    let root = parse_clean("echo a\\;b");
    let words = words_of(single_command(&root)).to_vec();
    assert_eq!(words.len(), 2);
    assert_eq!(word_text(&words[1]), "a;b");
}

#[test]
fn terminator_word_wants_a_separator() {
    let (_root, notes) = parse_ok("echo done");
    assert!(has_note(
        &notes,
        Severity::Warning,
        "Use semicolon or linefeed before 'done'"
    ));
}

#[test]
fn extglob_alternatives() {
    let root = parse_clean("echo @(foo|bar|)");
    let words = words_of(single_command(&root)).to_vec();
    match &words[1] {
        Token::NormalWord(_, parts) => match &parts[0] {
            Token::Extglob(_, prefix, alternatives) => {
                assert_eq!(*prefix, '@');
                assert_eq!(alternatives.len(), 3);
                assert_eq!(word_text(&alternatives[0]), "foo");
                assert_eq!(word_text(&alternatives[1]), "bar");
                assert!(matches!(&alternatives[2], Token::Literal(_, s) if s.is_empty()));
            }
            other => panic!("expected extglob: {other:?}"),
        },
        other => panic!("unexpected word: {other:?}"),
    }
}

#[test]
fn extglob_prefix_without_parens_is_literal() {
    let root = parse_clean("echo hi!");
    let words = words_of(single_command(&root)).to_vec();
    assert_eq!(word_text(&words[1]), "hi!");
}

#[test]
fn brace_expansions() {
    let root = parse_clean("echo {1..4} {a,b}");
    let words = words_of(single_command(&root)).to_vec();
    let part = |i: usize| match &words[i] {
        Token::NormalWord(_, parts) => parts[0].clone(),
        other => panic!("unexpected word: {other:?}"),
    };
    assert!(matches!(part(1), Token::BraceExpansion(_, s) if s == "1..4"));
    assert!(matches!(part(2), Token::BraceExpansion(_, s) if s == "a,b"));
}

//! Simple command, assignment, and redirection tests.

use crate::ast::Token;
use crate::diag::Severity;

use super::{commands_of, has_note, parse_clean, parse_ok, peel, single_command, word_text, words_of};

#[test]
fn assignment_only_command() {
    let root = parse_clean("a=1");
    match single_command(&root) {
        Token::SimpleCommand(_, assignments, words) => {
            assert!(words.is_empty());
            match &assignments[0] {
                Token::Assignment(_, name, value) => {
                    assert_eq!(name, "a");
                    assert_eq!(word_text(value), "1");
                }
                other => panic!("expected assignment: {other:?}"),
            }
        }
        other => panic!("expected simple command: {other:?}"),
    }
}

#[test]
fn assignments_precede_command_words() {
    let root = parse_clean("FOO=bar BAR=baz env");
    match single_command(&root) {
        Token::SimpleCommand(_, assignments, words) => {
            assert_eq!(assignments.len(), 2);
            assert_eq!(words.len(), 1);
            assert_eq!(word_text(&words[0]), "env");
        }
        other => panic!("expected simple command: {other:?}"),
    }
}

#[test]
fn empty_assignment_value() {
    let root = parse_clean("a=");
    match single_command(&root) {
        Token::SimpleCommand(_, assignments, _) => {
            match &assignments[0] {
                Token::Assignment(_, _, value) => {
                    assert!(matches!(value.as_ref(), Token::Literal(_, s) if s.is_empty()));
                }
                other => panic!("expected assignment: {other:?}"),
            }
        }
        other => panic!("expected simple command: {other:?}"),
    }
}

#[test]
fn append_assignment() {
    let root = parse_clean("a+=x");
    match single_command(&root) {
        Token::SimpleCommand(_, assignments, _) => {
            assert!(matches!(&assignments[0], Token::Assignment(_, name, _) if name == "a"));
        }
        other => panic!("expected simple command: {other:?}"),
    }
}

#[test]
fn spaces_around_equals_are_flagged() {
    let (root, notes) = parse_ok("b += (1 2 3)");
    assert!(has_note(
        &notes,
        Severity::Error,
        "Don't put spaces around the = in assignments."
    ));
    match single_command(&root) {
        Token::SimpleCommand(_, assignments, _) => match &assignments[0] {
            Token::Assignment(_, name, value) => {
                assert_eq!(name, "b");
                assert!(matches!(value.as_ref(), Token::Array(_, words) if words.len() == 3));
            }
            other => panic!("expected assignment: {other:?}"),
        },
        other => panic!("expected simple command: {other:?}"),
    }
}

#[test]
fn dollar_on_assignment_target_is_flagged() {
    let (root, notes) = parse_ok("$var=foo");
    assert!(has_note(
        &notes,
        Severity::Error,
        "Don't use $ on the left side of assignments."
    ));
    match single_command(&root) {
        Token::SimpleCommand(_, assignments, _) => {
            assert!(matches!(&assignments[0], Token::Assignment(_, name, _) if name == "var"));
        }
        other => panic!("expected simple command: {other:?}"),
    }
}

#[test]
fn array_assignment() {
    let root = parse_clean("arr=(a b c)");
    match single_command(&root) {
        Token::SimpleCommand(_, assignments, _) => match &assignments[0] {
            Token::Assignment(_, _, value) => match value.as_ref() {
                Token::Array(_, words) => {
                    let texts: Vec<String> = words.iter().map(word_text).collect();
                    assert_eq!(texts, ["a", "b", "c"]);
                }
                other => panic!("expected array: {other:?}"),
            },
            other => panic!("expected assignment: {other:?}"),
        },
        other => panic!("expected simple command: {other:?}"),
    }
}

#[test]
fn fd_redirect() {
    let root = parse_clean("foo 2>/dev/null");
    let commands = commands_of(&root);
    let piped = match &commands[0] {
        Token::Pipeline(_, items) => &items[0],
        other => panic!("expected pipeline: {other:?}"),
    };
    match piped {
        Token::Redirecting(_, redirects, command) => {
            assert!(matches!(command.as_ref(), Token::SimpleCommand(..)));
            match &redirects[0] {
                Token::FdRedirect(_, fd, target) => {
                    assert_eq!(fd, "2");
                    match target.as_ref() {
                        Token::IoFile(_, op, file) => {
                            assert_eq!(op, ">");
                            assert_eq!(word_text(file), "/dev/null");
                        }
                        other => panic!("expected file redirect: {other:?}"),
                    }
                }
                other => panic!("expected fd redirect: {other:?}"),
            }
        }
        other => panic!("expected redirecting command: {other:?}"),
    }
}

#[test]
fn redirect_between_words() {
    let root = parse_clean("echo a > f b");
    let commands = commands_of(&root);
    let piped = match &commands[0] {
        Token::Pipeline(_, items) => &items[0],
        other => panic!("expected pipeline: {other:?}"),
    };
    match piped {
        Token::Redirecting(_, redirects, command) => {
            assert_eq!(redirects.len(), 1);
            let words = words_of(command);
            let texts: Vec<String> = words.iter().map(word_text).collect();
            assert_eq!(texts, ["echo", "a", "b"]);
        }
        other => panic!("expected redirecting command: {other:?}"),
    }
}

#[test]
fn here_string() {
    let root = parse_clean("cat <<< hello");
    let commands = commands_of(&root);
    let piped = match &commands[0] {
        Token::Pipeline(_, items) => &items[0],
        other => panic!("expected pipeline: {other:?}"),
    };
    match piped {
        Token::Redirecting(_, redirects, _) => match &redirects[0] {
            Token::FdRedirect(_, fd, target) => {
                assert!(fd.is_empty());
                match target.as_ref() {
                    Token::HereString(_, word) => assert_eq!(word_text(word), "hello"),
                    other => panic!("expected here-string: {other:?}"),
                }
            }
            other => panic!("expected fd redirect: {other:?}"),
        },
        other => panic!("expected redirecting command: {other:?}"),
    }
}

#[test]
fn pipeline_of_commands() {
    let root = parse_clean("echo hello | wc -l");
    let commands = commands_of(&root);
    match &commands[0] {
        Token::Pipeline(_, items) => {
            assert_eq!(items.len(), 2);
            assert_eq!(word_text(&words_of(peel(&items[0]))[0]), "echo");
            assert_eq!(word_text(&words_of(peel(&items[1]))[0]), "wc");
        }
        other => panic!("expected pipeline: {other:?}"),
    }
}

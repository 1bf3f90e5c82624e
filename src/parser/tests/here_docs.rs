//! Here-document tests.

use crate::ast::Token;
use crate::diag::Severity;

use super::{commands_of, has_note, parse, parse_clean, parse_ok};

/// The first here-doc in the script's first command.
fn first_here_doc(root: &Token) -> (bool, bool, String) {
    let commands = commands_of(root);
    let piped = match &commands[0] {
        Token::Pipeline(_, items) => &items[0],
        other => panic!("expected pipeline: {other:?}"),
    };
    match piped {
        Token::Redirecting(_, redirects, _) => match &redirects[0] {
            Token::FdRedirect(_, _, target) => match target.as_ref() {
                Token::HereDoc(_, dashed, quoted, body) => (*dashed, *quoted, body.clone()),
                other => panic!("expected here-doc: {other:?}"),
            },
            other => panic!("expected fd redirect: {other:?}"),
        },
        other => panic!("expected redirecting command: {other:?}"),
    }
}

#[test]
fn basic_here_doc() {
    let root = parse_clean("<< foo\nlol\ncow\nfoo");
    let (dashed, quoted, body) = first_here_doc(&root);
    assert!(!dashed);
    assert!(!quoted);
    assert_eq!(body, "lol\ncow\n");
}

#[test]
fn space_indented_end_token_with_dash() {
    let (root, notes) = parse_ok("<<- EOF\n  cow\n  EOF");
    assert!(has_note(
        &notes,
        Severity::Error,
        "When using <<-, you can only indent with tabs."
    ));
    let (dashed, _, body) = first_here_doc(&root);
    assert!(dashed);
    assert_eq!(body, "  cow\n");
}

#[test]
fn tab_indented_end_token_with_dash() {
    let root = parse_clean("cat <<- EOF\n\tx\n\tEOF");
    let (dashed, quoted, body) = first_here_doc(&root);
    assert!(dashed);
    assert!(!quoted);
    assert_eq!(body, "\tx\n");
}

#[test]
fn indented_end_token_without_dash() {
    let (_root, notes) = parse_ok("cat << EOF\nx\n  EOF");
    assert!(has_note(
        &notes,
        Severity::Error,
        "Use <<- instead of << if you want to indent the end token."
    ));
}

#[test]
fn quoted_end_token() {
    let root = parse_clean("cat << 'EOF'\n$x\nEOF");
    let (_, quoted, body) = first_here_doc(&root);
    assert!(quoted);
    assert_eq!(body, "$x\n");
}

#[test]
fn missing_end_token() {
    let (_root, notes) = parse_ok("cat << EOF\nfoo");
    assert!(has_note(
        &notes,
        Severity::Error,
        "Couldn't find end token `EOF'"
    ));
}

#[test]
fn end_token_with_wrong_casing() {
    let (_root, notes) = parse_ok("cat << EOF\nstuff\neof");
    assert!(has_note(
        &notes,
        Severity::Error,
        "Found EOF further down, but with wrong casing."
    ));
}

#[test]
fn end_token_not_alone_on_its_line() {
    let (_root, notes) = parse_ok("cat << EOF\nx EOF y\n");
    assert!(has_note(
        &notes,
        Severity::Error,
        "Found EOF further down, but not by itself at the start of the line."
    ));
}

#[test]
fn commands_continue_after_here_doc() {
    let root = parse_clean("cat << EOF\nbody\nEOF\necho after");
    let commands = commands_of(&root);
    assert_eq!(commands.len(), 2);
}

#[test]
fn here_doc_keeps_following_redirects_apart() {
    let result = parse("cat << EOF > out\nbody\nEOF");
    // The marker line must end after the end token; this is a fatal parse.
    assert!(result.tree.is_none());
}

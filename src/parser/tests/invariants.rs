//! Cross-cutting properties: id/metadata agreement, note ordering,
//! determinism, and fatal-failure behavior.

use std::collections::BTreeSet;

use crate::ast::{Id, Token};
use crate::diag::Severity;

use super::{has_note, parse};

fn collect_ids(token: &Token, out: &mut Vec<Id>) {
    out.push(token.id());
    for child in token.children() {
        collect_ids(child, out);
    }
}

const WELL_FORMED: &[&str] = &[
    "echo hello | wc -l",
    "if true; then x=1; fi",
    "for f in a b; do echo $f; done",
    "[ -f foo ]",
    "cat << EOF\nhi\nEOF",
    "echo $(( 1 + 2 ))",
    "case x in a) echo;; esac",
];

#[test]
fn tree_ids_match_metadata_keys() {
    for script in WELL_FORMED {
        let result = parse(script);
        let (root, metadata) = result.tree.expect("script should parse");

        let mut tree_ids = vec![];
        collect_ids(&root, &mut tree_ids);
        let tree_ids: BTreeSet<Id> = tree_ids.into_iter().collect();
        let map_ids: BTreeSet<Id> = metadata.keys().copied().collect();
        assert_eq!(tree_ids, map_ids, "id mismatch for {script:?}");
    }
}

#[test]
fn ids_form_a_contiguous_range() {
    for script in WELL_FORMED {
        let result = parse(script);
        let (_, metadata) = result.tree.expect("script should parse");
        let ids: BTreeSet<usize> = metadata.keys().map(|id| id.0).collect();
        let expected: BTreeSet<usize> = (0..metadata.len()).collect();
        assert_eq!(ids, expected, "id gap for {script:?}");
    }
}

#[test]
fn every_pipeline_and_word_is_nonempty() {
    fn check(token: &Token) {
        match token {
            Token::Pipeline(_, list) => assert!(!list.is_empty()),
            Token::NormalWord(_, parts) => assert!(!parts.is_empty()),
            _ => {}
        }
        for child in token.children() {
            check(child);
        }
    }

    for script in WELL_FORMED {
        let result = parse(script);
        let (root, _) = result.tree.expect("script should parse");
        check(&root);
    }
}

#[test]
fn condition_kinds_are_consistent() {
    fn kinds(token: &Token, out: &mut Vec<crate::ast::ConditionKind>) {
        match token {
            Token::CondAnd(_, kind, ..)
            | Token::CondOr(_, kind, ..)
            | Token::CondNot(_, kind, ..)
            | Token::CondBinary(_, kind, ..)
            | Token::CondUnary(_, kind, ..)
            | Token::CondNoary(_, kind, ..)
            | Token::CondGroup(_, kind, ..) => out.push(*kind),
            _ => {}
        }
        for child in token.children() {
            kinds(child, out);
        }
    }

    for script in [
        r"[ \( a = b \) -a \( c = d \) ]",
        "[[ (a = b) || (c = d) ]]",
        "[[ ! -f x ]]",
    ] {
        let result = parse(script);
        let (root, _) = result.tree.expect("script should parse");
        fn find_condition(token: &Token) -> Option<&Token> {
            if let Token::Condition(..) = token {
                return Some(token);
            }
            token.children().into_iter().find_map(find_condition)
        }
        let condition = find_condition(&root).expect("script should contain a condition");
        let Token::Condition(_, outer_kind, _) = condition else {
            unreachable!()
        };
        let mut seen = vec![];
        kinds(condition, &mut seen);
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|kind| kind == outer_kind), "{script:?}");
    }
}

#[test]
fn notes_are_sorted_and_deduplicated() {
    let result = parse("echo `a` `b` $\necho $10 $10");
    assert!(result.tree.is_some());
    assert!(!result.notes.is_empty());
    for pair in result.notes.windows(2) {
        assert!(pair[0] <= pair[1], "notes out of order: {:?}", result.notes);
        assert!(pair[0] != pair[1], "duplicate notes: {:?}", result.notes);
    }
}

#[test]
fn reparsing_is_deterministic() {
    let script = "if a; then b; fi\nfor x in 1 2; do echo $x; done";
    let first = parse(script);
    let second = parse(script);
    assert_eq!(first.tree.as_ref().map(|t| &t.0), second.tree.as_ref().map(|t| &t.0));
    assert_eq!(first.notes, second.notes);
}

#[test]
fn empty_scripts_parse() {
    for script in ["", "   \n\n", "# just a comment\n"] {
        let result = parse(script);
        let (root, _) = result.tree.expect("empty script should parse");
        match root {
            Token::Script(_, commands) => assert!(commands.is_empty()),
            other => panic!("expected script root: {other:?}"),
        }
        assert!(result.notes.is_empty());
    }
}

#[test]
fn unparsable_input_reports_a_single_failure() {
    let result = parse("(");
    assert!(result.tree.is_none());
    assert!(has_note(
        &result.notes,
        Severity::Error,
        "Aborting due to unexpected"
    ));
}

#[test]
fn carriage_returns_are_flagged() {
    let result = parse("echo hi\r\necho there\n");
    assert!(result.tree.is_some());
    assert!(has_note(
        &result.notes,
        Severity::Error,
        "Literal carriage return."
    ));
}

#[test]
fn line_continuations_join_lines() {
    let result = parse("echo a \\\nb");
    let (root, _) = result.tree.expect("continuation should parse");
    let commands = super::commands_of(&root);
    assert_eq!(commands.len(), 1);
    let words = super::words_of(super::peel(&commands[0]));
    assert_eq!(words.len(), 3);
}

//! Parser behaviour over whole and partially streamed diffs.

use pretty_assertions::assert_eq;
use relative_path::RelativePath;
use rstest::rstest;

use crate::parsing::{DiffBlock, parse_diff_blocks, parse_final_diff_blocks};

fn parse(raw: &str) -> Vec<DiffBlock> {
    parse_diff_blocks(raw, RelativePath::new("src/lib.rs"))
}

fn parse_final(raw: &str) -> Vec<DiffBlock> {
    parse_final_diff_blocks(raw, RelativePath::new("src/lib.rs"))
}

fn block(search: &str, replace: &str, complete: bool) -> DiffBlock {
    DiffBlock {
        search_text: search.to_string(),
        replace_text: replace.to_string(),
        replace_open: true,
        complete,
    }
}

/// A block whose REPLACE line never arrived
fn truncated(search: &str) -> DiffBlock {
    DiffBlock {
        replace_open: false,
        ..block(search, "", false)
    }
}

const TWO_BLOCKS: &str = "SEARCH
fn one() {}
=======
REPLACE
fn one() -> u8 { 1 }
SEARCH
fn two() {}
=======
REPLACE
fn two() -> u8 { 2 }";

#[test]
fn test_single_block_open_at_end_of_input() {
    let raw = "SEARCH\nlet a = 1;\n=======\nREPLACE\nlet a = 2;";
    assert_eq!(parse(raw), vec![block("let a = 1;", "let a = 2;", false)]);
}

#[test]
fn test_multiline_content_is_verbatim() {
    let raw = "SEARCH\nfn f() {\n\n    body();\n}\n=======\nREPLACE\nfn f() {\n\tother();  \n}";
    assert_eq!(
        parse(raw),
        vec![block(
            "fn f() {\n\n    body();\n}",
            "fn f() {\n\tother();  \n}",
            false
        )]
    );
}

#[test]
fn test_two_blocks_first_is_complete() {
    insta::assert_debug_snapshot!(parse(TWO_BLOCKS), @r#"
    [
        DiffBlock {
            search_text: "fn one() {}",
            replace_text: "fn one() -> u8 { 1 }",
            replace_open: true,
            complete: true,
        },
        DiffBlock {
            search_text: "fn two() {}",
            replace_text: "fn two() -> u8 { 2 }",
            replace_open: true,
            complete: false,
        },
    ]
    "#);
}

#[rstest]
#[case::empty("")]
#[case::partial_search_token("SEA")]
#[case::unterminated_search_token("SEARCH")]
#[case::search_body_only("SEARCH\nlet a = 1;\n")]
#[case::partial_separator("SEARCH\nlet a = 1;\n====")]
#[case::unterminated_separator("SEARCH\nlet a = 1;\n=======")]
fn test_incomplete_input_yields_nothing(#[case] raw: &str) {
    assert!(parse(raw).is_empty());
}

#[rstest]
#[case::separator_only("SEARCH\nlet a = 1;\n=======\n", false)]
#[case::partial_replace_token("SEARCH\nlet a = 1;\n=======\nREP", false)]
#[case::unterminated_replace_token("SEARCH\nlet a = 1;\n=======\nREPLACE", true)]
#[case::replace_token_only("SEARCH\nlet a = 1;\n=======\nREPLACE\n", true)]
fn test_block_reported_once_separator_arrives(#[case] raw: &str, #[case] replace_open: bool) {
    let expected = if replace_open {
        block("let a = 1;", "", false)
    } else {
        truncated("let a = 1;")
    };
    assert_eq!(parse(raw), vec![expected]);
}

#[rstest]
#[case::separator_before_search("=======\nSEARCH\na\n=======\nREPLACE\nb")]
#[case::replace_before_search("REPLACE\nSEARCH\na\n=======\nREPLACE\nb")]
#[case::nested_search("SEARCH\na\nSEARCH\nb\n=======\nREPLACE\nc")]
#[case::replace_inside_search("SEARCH\na\nREPLACE\nb\n=======\nREPLACE\nc")]
#[case::missing_replace_token("SEARCH\na\n=======\nb\n")]
fn test_malformed_input_yields_nothing(#[case] raw: &str) {
    assert!(parse(raw).is_empty());
}

#[test]
fn test_later_malformed_block_hides_earlier_ones() {
    let raw = "SEARCH\na\n=======\nREPLACE\nb\nSEARCH\nc\n=======\nnot a token\n";
    assert!(parse(raw).is_empty());
}

#[test]
fn test_preamble_before_first_block_is_ignored() {
    let raw = "Here is the change you asked for:\n\nSEARCH\nx\n=======\nREPLACE\ny";
    assert_eq!(parse(raw), vec![block("x", "y", false)]);
}

#[test]
fn test_whitespace_around_tokens_is_ignored() {
    let raw = "  SEARCH  \nx\n\t=======\n\n REPLACE\ny";
    assert_eq!(parse(raw), vec![block("x", "y", false)]);
}

#[test]
fn test_windows_line_endings() {
    let raw = "SEARCH\r\nold\r\nline\r\n=======\r\nREPLACE\r\nnew\r\nSEARCH\r\nz\r\n=======\r\nREPLACE\r\nw";
    assert_eq!(
        parse(raw),
        vec![block("old\r\nline", "new", true), block("z", "w", false)]
    );
}

#[test]
fn test_empty_replace_section_is_a_deletion() {
    let raw = "SEARCH\nremove me\n=======\nREPLACE\n\nSEARCH\nkeep\n=======\nREPLACE\nkept";
    assert_eq!(
        parse(raw),
        vec![block("remove me", "", true), block("keep", "kept", false)]
    );
}

#[test]
fn test_trailing_line_break_of_last_block_is_kept() {
    let raw = "SEARCH\na\n=======\nREPLACE\nb\n";
    assert_eq!(parse(raw), vec![block("a", "b\n", false)]);
}

#[test]
fn test_unterminated_search_token_stays_in_replace_while_streaming() {
    let raw = "SEARCH\na\n=======\nREPLACE\nb\nSEARCH";
    assert_eq!(parse(raw), vec![block("a", "b\nSEARCH", false)]);

    let raw = "SEARCH\na\n=======\nREPLACE\nb\nSEARCH\n";
    assert_eq!(parse(raw), vec![block("a", "b", true)]);
}

#[test]
fn test_final_parse_closes_block_at_trailing_search_token() {
    let raw = "SEARCH\na\n=======\nREPLACE\nb\nSEARCH";
    assert_eq!(parse_final(raw), vec![block("a", "b", true)]);

    let raw = "SEARCH\na\n=======\nREPLACE\nb\n  SEARCH  ";
    assert_eq!(parse_final(raw), vec![block("a", "b", true)]);
}

#[rstest]
#[case::after_separator("SEARCH\nimportant();\n=======\n")]
#[case::unterminated_separator("SEARCH\nimportant();\n=======")]
#[case::partial_replace_token("SEARCH\nimportant();\n=======\nREPL")]
fn test_final_parse_reports_missing_replace_token(#[case] raw: &str) {
    assert_eq!(parse_final(raw), vec![truncated("important();")]);
}

#[test]
fn test_final_parse_reports_search_without_separator() {
    let raw = "SEARCH\na\n=======\nREPLACE\nb\nSEARCH\nc\n";
    let blocks = parse_final(raw);

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0], block("a", "b", true));
    assert!(!blocks[1].replace_open);
}

#[rstest]
#[case::no_tokens_yet("")]
#[case::bare_search_token("SEARCH")]
#[case::blank_search_body("SEARCH\n\n")]
fn test_final_parse_drops_empty_trailing_search(#[case] raw: &str) {
    assert!(parse_final(raw).is_empty());
}

#[test]
fn test_final_parse_matches_streaming_parse_for_finished_text() {
    assert_eq!(parse_final(TWO_BLOCKS), parse(TWO_BLOCKS));

    let raw = "SEARCH\na\n=======\nREPLACE\nb\n";
    assert_eq!(parse_final(raw), parse(raw));
}

#[test]
fn test_separator_line_inside_replace_is_content() {
    let raw = "SEARCH\na\n=======\nREPLACE\n=======\nREPLACE";
    assert_eq!(parse(raw), vec![block("a", "=======\nREPLACE", false)]);
}

/// Every prefix of a well-formed diff must only ever report search texts that
/// match the final ones, and replace texts must settle on the final values.
#[test]
fn test_every_prefix_reports_stable_search_text() {
    let final_blocks = parse(TWO_BLOCKS);
    assert_eq!(final_blocks.len(), 2);

    for end in 0..=TWO_BLOCKS.len() {
        let blocks = parse(&TWO_BLOCKS[..end]);
        assert!(blocks.len() <= final_blocks.len());
        for (index, parsed) in blocks.iter().enumerate() {
            assert_eq!(parsed.search_text, final_blocks[index].search_text);
            if parsed.complete {
                assert_eq!(parsed, &final_blocks[index]);
            }
        }
    }
}

#[test]
fn test_parse_is_idempotent() {
    assert_eq!(parse(TWO_BLOCKS), parse(TWO_BLOCKS));
}

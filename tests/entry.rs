use assert_matches::assert_matches;

use calldeck::domain::CategoryCount;
use calldeck::entry::{CategoryCharset, EntryParser, ParsePolicy};
use calldeck::error::CalldeckError;

fn strict() -> EntryParser {
    EntryParser::new(ParsePolicy::Strict, CategoryCharset::Alphanumeric)
}

#[test]
fn parses_example_input() {
    let parsed = strict()
        .parse("Caller Identification:35, Incorrect caller identity:20")
        .unwrap();
    assert_eq!(
        parsed.entries,
        vec![
            CategoryCount::new("Caller Identification", 35),
            CategoryCount::new("Incorrect caller identity", 20),
        ]
    );
}

#[test]
fn tolerates_whitespace_around_pairs() {
    let parsed = strict().parse("  Busy line : 12 ,  Dropped :3  ").unwrap();
    assert_eq!(
        parsed.entries,
        vec![
            CategoryCount::new("Busy line", 12),
            CategoryCount::new("Dropped", 3),
        ]
    );
}

#[test]
fn strict_rejects_any_malformed_pair() {
    let parser = strict();
    for raw in [
        "A:10, B",
        "A:10, B:",
        "A:10, :5",
        "A:ten",
        "A:3.5",
        "A:-2",
        "",
        "   ",
        ",",
    ] {
        let err = parser.parse(raw).unwrap_err();
        assert_matches!(err, CalldeckError::InvalidEntries(_), "input {raw:?}");
    }
}

#[test]
fn strict_rejects_count_overflow() {
    let err = strict().parse("A:99999999999999999999999").unwrap_err();
    assert_matches!(err, CalldeckError::InvalidEntries(_));
}

#[test]
fn zero_counts_are_valid() {
    let parsed = strict().parse("A:0, B:0").unwrap();
    assert_eq!(parsed.entries[0].count, 0);
    assert_eq!(parsed.entries[1].count, 0);
}

#[test]
fn duplicate_categories_are_preserved() {
    let parsed = strict().parse("A:1, A:2").unwrap();
    assert_eq!(
        parsed.entries,
        vec![CategoryCount::new("A", 1), CategoryCount::new("A", 2)]
    );
}

#[test]
fn permissive_keeps_valid_pairs_in_order() {
    let parser = EntryParser::new(ParsePolicy::Permissive, CategoryCharset::Alphanumeric);
    let parsed = parser.parse("A:1, nope, B:2, C:x, D:3").unwrap();
    assert_eq!(
        parsed.entries,
        vec![
            CategoryCount::new("A", 1),
            CategoryCount::new("B", 2),
            CategoryCount::new("D", 3),
        ]
    );
    assert_eq!(parsed.ignored, vec!["nope".to_string(), "C:x".to_string()]);
}

#[test]
fn permissive_with_no_valid_pairs_is_an_error() {
    let parser = EntryParser::new(ParsePolicy::Permissive, CategoryCharset::Alphanumeric);
    let err = parser.parse("nope, also nope").unwrap_err();
    assert_matches!(err, CalldeckError::InvalidEntries(_));
}

#[test]
fn charset_controls_digits_in_categories() {
    let alnum = EntryParser::new(ParsePolicy::Strict, CategoryCharset::Alphanumeric);
    assert!(alnum.parse("Tier2 escalation:4").is_ok());

    let letters = EntryParser::new(ParsePolicy::Strict, CategoryCharset::Letters);
    let err = letters.parse("Tier2 escalation:4").unwrap_err();
    assert_matches!(err, CalldeckError::InvalidEntries(_));
    assert!(letters.parse("Tier escalation:4").is_ok());
}

#[test]
fn round_trip_reproduces_parsed_dataset() {
    let parser = strict();
    let parsed = parser
        .parse(" Caller Identification : 35 , Long hold time:18,Dropped:2 ")
        .unwrap();
    let rendered = EntryParser::render(&parsed.entries);
    let reparsed = parser.parse(&rendered).unwrap();
    assert_eq!(reparsed.entries, parsed.entries);
    assert_eq!(rendered, EntryParser::render(&reparsed.entries));
}

//! Property-based tests for the delimited text codec.

use proptest::prelude::*;

use super::csv::{encode_delimited, parse_delimited, Record};

/// Fields drawn from an alphabet heavy in characters that need quoting.
fn arb_field() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => prop::char::range('a', 'z'),
            1 => Just(','),
            1 => Just('"'),
            1 => Just('\n'),
            1 => Just('\r'),
            1 => Just(' '),
        ],
        0..10,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn arb_records() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(prop::collection::vec(arb_field(), 2..6), 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Encoding then parsing yields the original records.
    #[test]
    fn prop_parse_inverts_encode(records in arb_records()) {
        let text = encode_delimited(&records, ',');
        prop_assert_eq!(parse_delimited(&text, ',').unwrap(), records);
    }

    /// Text produced by the encoder survives a decode/encode cycle unchanged.
    #[test]
    fn prop_encode_inverts_parse(records in arb_records()) {
        let text = encode_delimited(&records, ',');
        let decoded = parse_delimited(&text, ',').unwrap();
        prop_assert_eq!(encode_delimited(&decoded, ','), text);
    }

    /// Any other delimiter round-trips the same way.
    #[test]
    fn prop_round_trip_with_semicolon(records in arb_records()) {
        let text = encode_delimited(&records, ';');
        prop_assert_eq!(parse_delimited(&text, ';').unwrap(), records);
    }
}

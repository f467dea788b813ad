//! Property test: the proposal generator is total and deterministic.
//!
//! Every input, however malformed, yields a proposal set that passes the
//! closed-schema validator, and the same input always yields the same bytes.

use proptest::prelude::*;
use routegate_contract::vocab::{MAX_INPUT_CHARS, MAX_PROPOSALS};
use routegate_proposal::{generate, validate_bytes, RawInput};

proptest! {
    #[test]
    fn any_text_yields_a_valid_set(text in any::<String>()) {
        let set = generate(&RawInput::new(text.clone()));
        let bytes = set.to_canonical_bytes().unwrap();
        prop_assert!(validate_bytes(&bytes).is_valid());
        prop_assert!(set.proposals.len() <= MAX_PROPOSALS);
        prop_assert_eq!(bytes, generate(&RawInput::new(text)).to_canonical_bytes().unwrap());
    }

    #[test]
    fn any_file_bytes_yield_a_valid_set(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let set = generate(&RawInput::from_file_bytes(&bytes));
        prop_assert!(validate_bytes(&set.to_canonical_bytes().unwrap()).is_valid());
    }

    #[test]
    fn grammar_words_in_any_case_yield_a_valid_set(
        words in proptest::collection::vec(
            prop_oneof![
                Just("restart"), Just("stop"), Just("status"), Just("of"),
                Just("ALPHA"), Just("Beta"), Just("gamma"), Just("subsystem"),
                Just("gracefully"), Just("Immediately"), Just("query"),
            ],
            0..6,
        )
    ) {
        let set = generate(&RawInput::new(words.join(" ")));
        prop_assert!(validate_bytes(&set.to_canonical_bytes().unwrap()).is_valid());
        prop_assert!(set.proposals.len() <= 1);
    }
}

#[test]
fn empty_input_yields_no_proposals() {
    for text in ["", " ", "\t  \t"] {
        let set = generate(&RawInput::new(text));
        assert!(set.proposals.is_empty(), "{text:?}");
        assert!(set.errors.is_empty(), "{text:?}");
    }
}

#[test]
fn overlong_input_is_reported_not_matched() {
    let text = format!("status of beta{}", " ".repeat(MAX_INPUT_CHARS + 1 - "status of beta".len()));
    assert_eq!(text.chars().count(), MAX_INPUT_CHARS + 1);

    let set = generate(&RawInput::new(text));
    assert!(set.proposals.is_empty());
    assert_eq!(set.errors, vec!["INPUT_TOO_LONG"]);
    assert_eq!(set.input.raw.chars().count(), MAX_INPUT_CHARS);
}

#[test]
fn input_at_the_bound_is_still_matched() {
    let text = format!("status of beta{}", " ".repeat(MAX_INPUT_CHARS - "status of beta".len()));
    let set = generate(&RawInput::new(text));
    assert_eq!(set.proposals.len(), 1);
}

#[test]
fn undecodable_bytes_are_reported() {
    let set = generate(&RawInput::from_file_bytes(&[0xff, 0xfe, b'\n']));
    assert!(set.proposals.is_empty());
    assert_eq!(set.errors, vec!["INPUT_NOT_UTF8"]);
}

//! Property test: run_id acceptance is exactly `[A-Za-z0-9._-]{1,64}`,
//! excluding `.` and anything containing `..`.

use proptest::prelude::*;
use routegate_contract::RunId;

proptest! {
    #[test]
    fn allowed_alphabet_is_accepted(id in "[A-Za-z0-9_-][A-Za-z0-9._-]{0,63}") {
        prop_assert_eq!(RunId::parse(&id).is_ok(), !id.contains(".."));
    }

    #[test]
    fn any_other_byte_is_refused(
        prefix in "[a-z]{0,8}",
        bad in "[^A-Za-z0-9._-]",
        suffix in "[a-z]{0,8}",
    ) {
        let id = format!("{prefix}{bad}{suffix}");
        prop_assert!(RunId::parse(&id).is_err());
    }

    #[test]
    fn derived_ids_always_parse(input in proptest::collection::vec(any::<u8>(), 0..64)) {
        let derived = RunId::derive_from_input(&input);
        prop_assert!(RunId::parse(derived.as_str()).is_ok());
    }
}

#[test]
fn boundary_cases() {
    assert!(RunId::parse("test_run-1.0").is_ok());
    assert!(RunId::parse(&"a".repeat(64)).is_ok());
    assert!(RunId::parse("v1.2.3").is_ok());

    for bad in ["", ".", "..", "...", "a..b", "a/b", "../x", "a b", "r\u{e9}sum\u{e9}"] {
        assert!(RunId::parse(bad).is_err(), "{bad:?} was accepted");
    }
    assert!(RunId::parse(&"a".repeat(65)).is_err());
}

use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn test_replacement_table() {
    assert_eq!(sanitize_str("x#1"), "xp1");
    assert_eq!(sanitize_str("a+b"), "aaddb");
    assert_eq!(sanitize_str("a-b.c*d/e!"), "asubbdotcmulddiveex");
    assert_eq!(sanitize_str("struct tuple_1"), "structtuple_1");
}

#[test]
fn test_memoized_identity() {
    let interner = StringInterner::new();
    let mut sanitizer = IdentSanitizer::with_capacity(256);
    let name = interner.intern("x#1");

    let first = sanitizer.identifier(name, &interner).unwrap();
    let ptr = sanitizer.text(first).as_ptr();
    let second = sanitizer.identifier(name, &interner).unwrap();

    assert_eq!(first, second);
    assert_eq!(sanitizer.text(second), "xp1");
    assert_eq!(sanitizer.text(second).as_ptr(), ptr);
}

#[test]
fn test_collision_is_reported() {
    let interner = StringInterner::new();
    let mut sanitizer = IdentSanitizer::with_capacity(256);
    sanitizer
        .identifier(interner.intern("a+b"), &interner)
        .unwrap();
    sanitizer
        .identifier(interner.intern("aaddb"), &interner)
        .unwrap();

    let advisories = sanitizer.take_advisories();
    assert_eq!(advisories.len(), 1);
    assert!(advisories[0].message.contains("`aaddb`"));
    assert!(sanitizer.take_advisories().is_empty());
}

#[test]
fn test_no_collision_for_distinct_identifiers() {
    let interner = StringInterner::new();
    let mut sanitizer = IdentSanitizer::with_capacity(256);
    for s in ["x", "y", "x#1", "x#2"] {
        sanitizer.identifier(interner.intern(s), &interner).unwrap();
    }
    assert!(sanitizer.take_advisories().is_empty());
}

#[test]
fn test_identifier_arena_exhaustion() {
    let interner = StringInterner::new();
    let mut sanitizer = IdentSanitizer::with_capacity(4);
    let err = sanitizer
        .identifier(interner.intern("too_long"), &interner)
        .unwrap_err();
    assert!(matches!(err, CodegenError::ArenaExhausted { .. }));
}

proptest! {
    #[test]
    fn sanitized_output_has_no_table_punctuation(raw in "[a-z0-9_#+.*/! -]{0,24}") {
        let out = sanitize_str(&raw);
        prop_assert!(!out.chars().any(|c| " #+-.*/!".contains(c)));
    }

    #[test]
    fn sanitize_is_deterministic(raw in "\\PC{0,16}") {
        prop_assert_eq!(sanitize_str(&raw), sanitize_str(&raw));
    }

    #[test]
    fn alphanumeric_passes_through(raw in "[A-Za-z0-9_]{0,24}") {
        prop_assert_eq!(sanitize_str(&raw), raw);
    }
}

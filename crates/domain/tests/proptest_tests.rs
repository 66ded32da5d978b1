//! Property-based tests for argument matching
//!
//! These tests use proptest to verify matcher and signature invariants across
//! many random inputs.

use domain::{Invocation, InvocationSignature, with};
use proptest::prelude::*;

// ============================================================================
// Argument Matcher Property Tests
// ============================================================================

mod matcher_tests {
    use super::*;

    proptest! {
        #[test]
        fn any_accepts_every_value_of_its_type(value in any::<i64>()) {
            prop_assert!(with::any::<i64>().accepts(&value));
        }

        #[test]
        fn any_never_accepts_another_type(value in any::<i32>()) {
            prop_assert!(!with::any::<i64>().accepts(&value));
        }

        #[test]
        fn exact_accepts_only_equal_values(expected in any::<u32>(), actual in any::<u32>()) {
            let matcher = with::value(expected);
            prop_assert_eq!(matcher.accepts(&actual), expected == actual);
        }

        #[test]
        fn exact_strings_compare_by_content(s in "[a-z]{0,12}") {
            let matcher = with::value(s.clone());
            prop_assert!(matcher.accepts(&s));
            let other = format!("{s}x");
            prop_assert!(!matcher.accepts(&other));
        }

        #[test]
        fn predicate_matches_its_own_condition(threshold in any::<u16>(), value in any::<u16>()) {
            let matcher = with::matching("above threshold", move |v: &u16| *v > threshold);
            prop_assert_eq!(matcher.accepts(&value), value > threshold);
        }
    }
}

// ============================================================================
// Invocation Signature Property Tests
// ============================================================================

mod signature_tests {
    use super::*;

    proptest! {
        #[test]
        fn any_signature_matches_any_id(id in any::<u32>()) {
            let signature = InvocationSignature::new("get_by_id", [with::any::<u32>()]).unwrap();
            prop_assert!(signature.matches(&Invocation::new("get_by_id", &[&id])));
        }

        #[test]
        fn other_method_names_never_match(id in any::<u32>(), name in "[a-z_]{1,16}") {
            prop_assume!(name != "get_by_id");
            let signature = InvocationSignature::new("get_by_id", [with::any::<u32>()]).unwrap();
            prop_assert!(!signature.matches(&Invocation::new(&name, &[&id])));
        }

        #[test]
        fn extra_arguments_never_match(a in any::<u32>(), b in any::<u32>()) {
            let signature = InvocationSignature::new("get_by_id", [with::any::<u32>()]).unwrap();
            prop_assert!(!signature.matches(&Invocation::new("get_by_id", &[&a, &b])));
        }
    }
}

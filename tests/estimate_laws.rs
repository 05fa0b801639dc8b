//! Property-based checks of the estimate algebra's laws, beyond the
//! fixed-example unit tests kept alongside the implementation.

use proptest::prelude::*;
use xplat_execution_core::Pie;
use std::cmp::Ordering;
use xplat_execution_core::estimate::expectation_value_comparator;

fn finite_pie() -> impl Strategy<Value = Pie> {
    (0.0..1.0e6, 0.0..1.0e6, 0.0..=1.0).prop_map(|(a, b, p)| {
        let (lower, upper) = if a <= b { (a, b) } else { (b, a) };
        Pie::new(lower, upper, p)
    })
}

proptest! {
    #[test]
    fn plus_is_commutative(a in finite_pie(), b in finite_pie()) {
        let ab = a.plus(&b);
        let ba = b.plus(&a);
        prop_assert!((ab.lower - ba.lower).abs() < 1e-6);
        prop_assert!((ab.upper - ba.upper).abs() < 1e-6);
        prop_assert_eq!(ab.p, ba.p);
    }

    #[test]
    fn plus_p_never_exceeds_either_input(a in finite_pie(), b in finite_pie()) {
        let sum = a.plus(&b);
        prop_assert!(sum.p <= a.p + 1e-12);
        prop_assert!(sum.p <= b.p + 1e-12);
    }

    #[test]
    fn times_one_is_identity(a in finite_pie()) {
        let scaled = a.times(1.0);
        prop_assert_eq!(scaled, a);
    }

    #[test]
    fn times_preserves_ordering_of_endpoints_for_nonnegative_scalar(a in finite_pie(), scalar in 0.0..10.0) {
        let scaled = a.times(scalar);
        prop_assert!(scaled.lower <= scaled.upper + 1e-6);
    }

    #[test]
    fn comparator_is_reflexive(a in finite_pie()) {
        prop_assert_eq!(expectation_value_comparator(&a, &a), Ordering::Equal);
    }

    #[test]
    fn comparator_orders_zero_confidence_as_worst(a in finite_pie(), informative in finite_pie()) {
        prop_assume!(informative.p > 0.0);
        let uninformative = Pie::new(a.lower, a.upper, 0.0);
        prop_assert_eq!(
            expectation_value_comparator(&uninformative, &informative),
            Ordering::Greater
        );
    }
}

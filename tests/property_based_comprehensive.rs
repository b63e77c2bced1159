//! Comprehensive property-based tests
//!
//! Core properties covered:
//! 1. Q-test partitions its input (residual + removed == original)
//! 2. Q-test validation never panics and flags at most two points
//! 3. Store merge is idempotent
//! 4. Applying a store is idempotent and never adds rows
//! 5. Filter expression parsing never panics

use assay::dataset::Dataset;
use assay::dixon::dixon_test;
use assay::filter::RowFilter;
use assay::reconcile::apply;
use assay::records::OutlierRecord;
use assay::store::OutlierStore;
use proptest::prelude::*;

fn finite_or_nan() -> impl Strategy<Value = f64> {
    prop_oneof![
        9 => -1.0e6f64..1.0e6,
        1 => Just(f64::NAN),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_residual_plus_removed_is_original(
        data in prop::collection::vec(finite_or_nan(), 3..=30),
        left in any::<bool>(),
        right in any::<bool>(),
        level in prop::sample::select(vec![90u32, 95, 99]),
    ) {
        prop_assume!(left || right);
        let outcome = dixon_test(&data, left, right, level).unwrap();

        prop_assert_eq!(outcome.residual.len() + outcome.outliers.len(), data.len());
        prop_assert_eq!(outcome.indices.len(), outcome.outliers.len());
        prop_assert!(outcome.indices.len() <= 2);
        for (&i, &v) in outcome.indices.iter().zip(&outcome.outliers) {
            prop_assert!(v.is_finite());
            prop_assert_eq!(data[i], v);
        }
    }

    #[test]
    fn prop_invalid_confidence_always_rejected(
        data in prop::collection::vec(-100.0f64..100.0, 0..40),
        level in any::<u32>(),
    ) {
        prop_assume!(![90, 95, 99].contains(&level));
        let result = dixon_test(&data, true, true, level);
        if data.len() >= 3 {
            prop_assert!(matches!(result, Err(assay::OutlierError::InvalidConfidenceLevel(l)) if l == level));
        } else {
            let insufficient = matches!(result, Err(assay::OutlierError::InsufficientData { .. }));
            prop_assert!(insufficient);
        }
    }
}

fn record_strategy() -> impl Strategy<Value = OutlierRecord> {
    (0i64..5, prop::sample::select(vec!["d1", "d2"]), prop::sample::select(vec!["Fe", "Cu"]))
        .prop_map(|(id, session, element)| {
            OutlierRecord::sample_session_element(id, session, element)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_merge_is_idempotent(records in prop::collection::vec(record_strategy(), 0..20)) {
        let mut once = OutlierStore::new();
        once.merge(records.clone()).unwrap();

        let mut twice = once.clone();
        let added = twice.merge(records).unwrap();

        prop_assert_eq!(added, 0);
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn prop_store_lists_have_no_duplicates(records in prop::collection::vec(record_strategy(), 0..30)) {
        let mut store = OutlierStore::new();
        store.merge(records).unwrap();
        let list = &store.sample_session_element;
        for (i, a) in list.iter().enumerate() {
            prop_assert!(!list[i + 1..].contains(a));
        }
    }

    #[test]
    fn prop_apply_is_idempotent(
        rows in prop::collection::vec((0i64..5, prop::sample::select(vec!["d1", "d2"]), 0.0f64..10.0, 0.0f64..10.0), 0..20),
        records in prop::collection::vec(record_strategy(), 0..6),
        dropped in prop::option::of(0i64..5),
    ) {
        let mut data = Dataset::new(["Fe", "Cu"]);
        for (id, session, fe, cu) in rows {
            data.push(id, session, vec![fe, cu]).unwrap();
        }

        let mut store = OutlierStore::new();
        store.merge(records).unwrap();
        if let Some(id) = dropped {
            store.merge(vec![OutlierRecord::sample(id)]).unwrap();
        }

        let once = apply(&store, &data);
        let twice = apply(&store, &once);
        prop_assert!(once.len() <= data.len());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_filter_parsing_never_panics(expr in "[a-z_=,;A-Z0-9 -]{0,40}") {
        let _ = RowFilter::from_expr(&expr);
    }
}

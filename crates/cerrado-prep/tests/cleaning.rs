//! Behavioural tests for the cleaning sequence.
//!
//! These exercise the public operations together the way the training
//! pipeline chains them: subset, drop missing rows, trim outliers, smooth.

use cerrado_prep::{
    Axis, Column, FailurePolicy, How, PrepError, PrepPlan, PrepStage, Table, drop_missing,
    remove_outliers, select_subset, smooth,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const NUTRIENTS: [&str; 7] = [
    "N(g kg-1)",
    "P(g kg-1)",
    "K(g kg-1)",
    "Ca(g kg-1)",
    "Mg(g kg-1)",
    "Fe(mg kg-1)",
    "Mn(mg kg-1)",
];

/// Ten rows, one column, one extreme value in the last row.
fn single_spike() -> Table {
    Table::new(vec![(
        "N(g kg-1)".into(),
        Column::from_values([10.0, 11.0, 9.0, 10.0, 12.0, 10.0, 11.0, 9.0, 10.0, 100.0]),
    )])
    .expect("valid test table")
}

/// A survey-shaped table: seven nutrients, a label, and an unused column.
fn survey(n_rows: usize) -> Table {
    let mut columns: Vec<(String, Column)> = NUTRIENTS
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let values = (0..n_rows).map(|i| 1.0 + j as f64 + ((i * 7 + j * 3) % 11) as f64 * 0.1);
            (name.to_string(), Column::from_values(values))
        })
        .collect();
    columns.push((
        "Vegetation".into(),
        Column::from_labels((0..n_rows).map(|i| if i % 3 == 0 { "Cerradão" } else { "Cerrado" })),
    ));
    columns.push((
        "Site".into(),
        Column::from_labels((0..n_rows).map(|i| format!("S{i}"))),
    ));
    Table::new(columns).expect("valid test table")
}

// ---------------------------------------------------------------------------
// a) end-to-end sequence
// ---------------------------------------------------------------------------

/// The ten-row table loses only its outlier row, keeps no missing cell, and
/// produces identical output on a repeated run.
#[test]
fn ten_row_sequence_drops_the_outlier() {
    let run = |t: &Table| -> Table {
        let t = select_subset(t, &["N(g kg-1)"]).unwrap();
        let t = drop_missing(&t, Axis::Rows, How::Any).unwrap();
        let t = remove_outliers(&t, &["N(g kg-1)"], 2.0).unwrap();
        smooth(&t, &["N(g kg-1)"], 0.5, true).unwrap()
    };

    let src = single_spike();
    let first = run(&src);
    let second = run(&src);

    assert_eq!(first.n_rows(), 9);
    assert!((0..first.n_rows()).all(|r| !first.row_has_missing(r)));
    assert!(first.numeric("N(g kg-1)").unwrap().iter().all(|v| v.unwrap() < 13.0));
    assert_eq!(first, second);
    // the caller's table is never modified
    assert_eq!(src, single_spike());
}

/// The same sequence expressed as a plan gives the same answer.
#[test]
fn plan_matches_manual_sequence() {
    let plan = PrepPlan::new()
        .select(["N(g kg-1)"])
        .drop_missing(Axis::Rows, How::Any)
        .remove_outliers(["N(g kg-1)"], 2.0)
        .smooth(["N(g kg-1)"], 0.5, true);

    let via_plan = plan.apply(&single_spike()).unwrap();

    let t = remove_outliers(&single_spike(), &["N(g kg-1)"], 2.0).unwrap();
    let manual = smooth(&t, &["N(g kg-1)"], 0.5, true).unwrap();
    assert_eq!(via_plan, manual);
}

// ---------------------------------------------------------------------------
// b) survey-shaped input
// ---------------------------------------------------------------------------

#[test]
fn survey_subset_keeps_label_and_drops_extra_columns() {
    let mut wanted: Vec<&str> = NUTRIENTS.to_vec();
    wanted.push("Vegetation");

    let out = PrepPlan::new()
        .select(wanted.iter().copied())
        .drop_missing(Axis::Rows, How::Any)
        .remove_outliers(NUTRIENTS, 3.0)
        .smooth(NUTRIENTS, 0.5, true)
        .apply(&survey(40))
        .unwrap();

    assert_eq!(out.n_columns(), 8);
    assert!(out.position("Site").is_none());
    // bounded synthetic data: nothing crosses mean + 3 std
    assert_eq!(out.n_rows(), 40);
}

#[test]
fn missing_nutrient_rows_are_removed_before_trimming() {
    let src = survey(12);
    let mut columns: Vec<(String, Column)> = src
        .iter()
        .map(|(n, c)| (n.to_string(), c.clone()))
        .collect();
    if let Column::Numeric(values) = &mut columns[0].1 {
        values[3] = None;
        values[7] = None;
    }
    let gappy = Table::new(columns).unwrap();

    let out = PrepPlan::new()
        .drop_missing(Axis::Rows, How::Any)
        .remove_outliers(NUTRIENTS, 3.0)
        .apply(&gappy)
        .unwrap();
    assert_eq!(out.n_rows(), 10);
}

// ---------------------------------------------------------------------------
// c) failure reporting
// ---------------------------------------------------------------------------

#[test]
fn unknown_subset_column_is_a_schema_failure() {
    let err = PrepPlan::new()
        .select(["Zn(mg kg-1)"])
        .apply(&survey(5))
        .unwrap_err();
    assert_eq!(err.stage, PrepStage::SelectSubset);
    assert!(matches!(err.source, PrepError::UnknownColumn { .. }));
    assert!(!err.source.is_recoverable());
}

#[test]
fn skip_policy_continues_past_an_undefined_std() {
    let tiny = survey(1);
    let plan = PrepPlan::new()
        .remove_outliers(NUTRIENTS, 3.0)
        .smooth(NUTRIENTS, 0.5, true);

    assert!(plan.apply(&tiny).is_err());

    let out = plan
        .with_failure_policy(FailurePolicy::SkipStage)
        .apply(&tiny)
        .unwrap();
    assert_eq!(out.n_rows(), 1);
}

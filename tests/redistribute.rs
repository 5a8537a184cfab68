mod common;

use polars::prelude::*;
use reapportion::{
    Aggregation, Error, MappingStore, OnConservationError, Precision, RedistributeOptions, Redistributor, Weighting,
};

use common::*;

fn redistributor() -> (tempfile::TempDir, Redistributor) {
    let dir = tempfile::tempdir().unwrap();
    let redistributor = Redistributor::new(MappingStore::open(dir.path()));
    (dir, redistributor)
}

fn build() -> RedistributeOptions {
    RedistributeOptions::default().with_precision(Precision::Simplified)
}

#[test]
fn square_splits_evenly_into_quadrants() {
    let (_dir, r) = redistributor();
    let out = r.redistribute(&square_data(100.0), square().as_ref(), quadrants().as_ref(), &build()).unwrap();
    assert_eq!(out.get_column_names_str(), vec!["quadrant", "data"]);
    assert_values(
        &values_by_key(&out, "quadrant", "data"),
        &[(Some("M"), 25.0), (Some("N"), 25.0), (Some("O"), 25.0), (Some("P"), 25.0)],
    );
}

#[test]
fn square_into_triangles() {
    let (_dir, r) = redistributor();
    let out = r.redistribute(&square_data(100.0), square().as_ref(), triangles().as_ref(), &build()).unwrap();
    assert_values(
        &values_by_key(&out, "triangle", "data"),
        &[(Some("A"), 50.0), (Some("B"), 25.0), (Some("C"), 25.0)],
    );
}

#[test]
fn uncovered_area_goes_to_the_null_unit() {
    let (_dir, r) = redistributor();
    let out = r.redistribute(&square_data(100.0), square().as_ref(), far_right().as_ref(), &build()).unwrap();
    assert_values(&values_by_key(&out, "strip", "data"), &[(None, 75.0), (Some("FR"), 25.0)]);
}

#[test]
fn chaining_through_triangles() {
    let (_dir, r) = redistributor();
    let options = build().with_via(triangles());

    let chained = r.redistribute(&square_data(100.0), square().as_ref(), halves().as_ref(), &options).unwrap();
    assert_values(
        &values_by_key(&chained, "half", "data"),
        &[(None, 25.0), (Some("L"), 37.5), (Some("R"), 37.5)],
    );

    let direct = r.redistribute(&square_data(100.0), square().as_ref(), halves().as_ref(), &build()).unwrap();
    assert_values(&values_by_key(&direct, "half", "data"), &[(Some("L"), 50.0), (Some("R"), 50.0)]);
}

#[test]
fn chaining_into_quadrants_differs_from_direct() {
    let (_dir, r) = redistributor();
    let options = build().with_via(triangles());
    let chained = r.redistribute(&square_data(64.0), square().as_ref(), quadrants().as_ref(), &options).unwrap();
    assert_values(
        &values_by_key(&chained, "quadrant", "data"),
        &[(None, 16.0), (Some("M"), 10.0), (Some("N"), 10.0), (Some("O"), 14.0), (Some("P"), 14.0)],
    );
}

#[test]
fn literal_mapping_table() {
    let (_dir, r) = redistributor();
    let mapping = df! {
        "square" => ["main", "main", "main", "main", "main"],
        "quadrant" => [Some("M"), Some("N"), Some("O"), Some("P"), None],
        "mapping" => [1.0, 2.0, 3.0, 3.0, 1.0],
    }.unwrap();
    let options = RedistributeOptions::default().with_mapping(mapping);
    let out = r.redistribute(&square_data(100.0), square().as_ref(), quadrants().as_ref(), &options).unwrap();
    assert_values(
        &values_by_key(&out, "quadrant", "data"),
        &[(None, 10.0), (Some("M"), 10.0), (Some("N"), 20.0), (Some("O"), 30.0), (Some("P"), 30.0)],
    );
}

#[test]
fn literal_mapping_needs_all_columns() {
    let (_dir, r) = redistributor();
    let mapping = df! { "square" => ["main"], "quadrant" => ["M"], "weight" => [1.0] }.unwrap();
    let options = RedistributeOptions::default().with_mapping(mapping);
    let result = r.redistribute(&square_data(100.0), square().as_ref(), quadrants().as_ref(), &options);
    assert!(matches!(result, Err(Error::Schema(_))));
}

#[test]
fn index_columns_are_kept_and_grouped() {
    let (_dir, r) = redistributor();
    let data = df! {
        "square" => ["main", "main"],
        "year" => [2019i64, 2022],
        "votes" => [100i64, 200],
        "turnout" => [10.0, 20.0],
    }.unwrap();
    let options = build().with_index_columns(["year"]);
    let out = r.redistribute(&data, square().as_ref(), halves().as_ref(), &options).unwrap();

    assert_eq!(out.height(), 4);
    assert_eq!(out.get_column_names_str(), vec!["half", "year", "votes", "turnout"]);
    let votes: f64 = out.column("votes").unwrap().f64().unwrap().sum().unwrap();
    assert!((votes - 300.0).abs() < 1e-6);

    let by_year = out.lazy()
        .filter(col("year").eq(lit(2022i64)).and(col("half").eq(lit("L"))))
        .collect()
        .unwrap();
    let turnout = by_year.column("turnout").unwrap().f64().unwrap().get(0).unwrap();
    assert!((turnout - 10.0).abs() < 1e-6);
}

#[test]
fn unknown_ids_violate_conservation() {
    let (_dir, r) = redistributor();
    let data = df! { "square" => ["O"], "data" => [100.0] }.unwrap();
    match r.redistribute(&data, square().as_ref(), quadrants().as_ref(), &build()) {
        Err(Error::ConservationViolation(mismatches)) => {
            assert_eq!(mismatches.len(), 1);
            assert_eq!(mismatches[0].column, "data");
            assert_eq!(mismatches[0].before, 100.0);
            assert_eq!(mismatches[0].after, 0.0);
        }
        other => panic!("expected conservation violation, got {other:?}"),
    }
}

#[test]
fn warn_mode_returns_the_result() {
    let (_dir, r) = redistributor();
    let data = df! { "square" => ["O"], "data" => [100.0] }.unwrap();
    let options = build().with_on_conservation_error(OnConservationError::Warn);
    let out = r.redistribute(&data, square().as_ref(), quadrants().as_ref(), &options).unwrap();
    assert_eq!(out.height(), 0);
}

#[test]
fn from_column_must_be_present() {
    let (_dir, r) = redistributor();
    let data = df! { "quadrant" => ["M"], "data" => [1.0] }.unwrap();
    let result = r.redistribute(&data, square().as_ref(), quadrants().as_ref(), &build());
    assert!(matches!(result, Err(Error::Schema(_))));
}

#[test]
fn same_region_is_rejected() {
    let (_dir, r) = redistributor();
    let result = r.redistribute(&square_data(1.0), square().as_ref(), square().as_ref(), &build());
    assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
}

#[test]
fn data_columns_are_required() {
    let (_dir, r) = redistributor();
    let data = df! { "square" => ["main"], "quadrant" => ["M"], "year" => [2020] }.unwrap();
    let options = build().with_index_columns(["year"]);
    let result = r.redistribute(&data, square().as_ref(), quadrants().as_ref(), &options);
    assert!(matches!(result, Err(Error::NoDataColumns(_))));
}

#[test]
fn non_sum_aggregation_fails_before_any_mapping_work() {
    let (dir, r) = redistributor();
    // cache-only with an empty cache would be NotFound if the mapping were fetched first
    let options = RedistributeOptions::default().with_aggregation(Aggregation::Mean);
    let result = r.redistribute(&square_data(1.0), square().as_ref(), quadrants().as_ref(), &options);
    assert!(matches!(result, Err(Error::NotImplemented(_))));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn population_weights_are_not_implemented() {
    let (_dir, r) = redistributor();
    let options = build().with_weights(Weighting::Population);
    let result = r.redistribute(&square_data(1.0), square().as_ref(), quadrants().as_ref(), &options);
    assert!(matches!(result, Err(Error::NotImplemented(_))));
}

#[test]
fn cache_only_without_cache_is_not_found() {
    let (_dir, r) = redistributor();
    let result = r.redistribute(&square_data(1.0), square().as_ref(), quadrants().as_ref(), &RedistributeOptions::default());
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn saving_simplified_mappings_is_rejected() {
    let (_dir, r) = redistributor();
    let options = build().with_save(true);
    let result = r.redistribute(&square_data(1.0), square().as_ref(), quadrants().as_ref(), &options);
    assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
}

#[test]
fn saved_full_mapping_serves_cache_only_requests() {
    let (_dir, r) = redistributor();
    let full = RedistributeOptions::default().with_precision(Precision::Full).with_save(true);
    r.redistribute(&square_data(100.0), square().as_ref(), quadrants().as_ref(), &full).unwrap();

    // the reverse direction reads the same file
    let data = df! { "quadrant" => ["M", "N"], "data" => [5.0, 7.0] }.unwrap();
    let out = r.redistribute(&data, quadrants().as_ref(), square().as_ref(), &RedistributeOptions::default()).unwrap();
    assert_values(&values_by_key(&out, "square", "data"), &[(Some("main"), 12.0)]);
}

#[test]
fn text_columns_are_rejected() {
    let (dir, r) = redistributor();
    let data = df! { "square" => ["main"], "square_name" => ["Main St"], "votes" => [100.0] }.unwrap();
    let result = r.redistribute(&data, square().as_ref(), quadrants().as_ref(), &build());
    assert!(matches!(&result, Err(Error::Schema(msg)) if msg.contains("square_name")), "{result:?}");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    let out = r.redistribute(&data, square().as_ref(), quadrants().as_ref(), &build().with_index_columns(["square_name"]))
        .unwrap();
    let total: f64 = values_by_key(&out, "quadrant", "votes").iter().map(|(_, v)| v).sum();
    assert!((total - 100.0).abs() < 1e-6);
}

#[test]
fn via_region_with_gaps_loses_the_uncovered_share() {
    let (_dir, r) = redistributor();
    let options = build().with_via(far_right());

    let result = r.redistribute(&square_data(100.0), square().as_ref(), halves().as_ref(), &options);
    let mismatches = match result {
        Err(Error::ConservationViolation(mismatches)) => mismatches,
        other => panic!("expected a violation, got {other:?}"),
    };
    assert_eq!(mismatches.len(), 1);
    assert!((mismatches[0].before - 100.0).abs() < 1e-6);
    assert!((mismatches[0].after - 25.0).abs() < 1e-6);

    let warned = r.redistribute(
        &square_data(100.0),
        square().as_ref(),
        halves().as_ref(),
        &options.with_on_conservation_error(OnConservationError::Warn),
    ).unwrap();
    assert_values(&values_by_key(&warned, "half", "data"), &[(None, 18.75), (Some("R"), 6.25)]);
}

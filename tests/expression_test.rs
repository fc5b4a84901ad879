//! Expression chains, host-side and over the Arrow backend.

mod utils;

use anyhow::Result;
use arrow::array::AsArray;
use arrow::datatypes::Int64Type;
use polyframe::backends::arrow::{ArrowExpr, compile, evaluate};
use polyframe::{CONTRACT_VERSION, Expr, ExpressionAdapter, NativeObject, col, lit};
use utils::{init_logging, sample_batch};

#[test]
fn test_chains_compose_in_application_order() {
    let adapter = ExpressionAdapter::new(col("a"), "a")
        .with_callable(|e| e + lit(1))
        .with_callable(|e| e * lit(2));

    assert_eq!(adapter.len(), 2);
    assert_eq!(adapter.resolve(), (col("a") + lit(1)) * lit(2));
}

#[test]
fn test_extending_a_chain_leaves_the_original_untouched() {
    let base = ExpressionAdapter::new(col("a"), "a").with_callable(|e| e + lit(1));
    let extended = base.with_named_callable("double", |e| e * lit(2));

    assert_eq!(base.len(), 1);
    assert_eq!(extended.labels().last(), Some(&"double"));
    assert_eq!(base.resolve(), col("a") + lit(1));
}

#[test]
fn test_grouping_of_steps_does_not_matter() {
    let f = |e: Expr| e + lit(1);
    let g = |e: Expr| e * lit(3);
    let h = |e: Expr| e.gt(lit(10));

    let left = ExpressionAdapter::new(col("x"), "x")
        .with_callable(move |e| g(f(e)))
        .with_callable(h);
    let right = ExpressionAdapter::new(col("x"), "x")
        .with_callable(f)
        .with_callable(move |e| h(g(e)));

    assert_eq!(left.resolve(), right.resolve());
}

#[test]
fn test_compiled_chain_can_be_extended_natively() -> Result<()> {
    init_logging();
    let batch = sample_batch();
    let compiled = compile(&col("sales").gt(lit(5)));
    let negated = compiled.with_named_callable("not", |e| ArrowExpr::Not(Box::new(e)));

    assert_eq!(negated.labels(), vec![">", "not"]);
    let mask = evaluate(&negated.resolve(), &batch)?;
    let values: Vec<Option<bool>> = mask.array().as_boolean().iter().collect();
    assert_eq!(values, vec![Some(false), Some(true), None, Some(false), Some(true)]);
    Ok(())
}

#[test]
fn test_json_expressions_drive_a_frame() -> Result<()> {
    init_logging();
    let predicate: Expr = serde_json::from_str(
        r#"{"binary": {"op": "eq", "left": {"column": "city"}, "right": {"literal": {"string": "odense"}}}}"#,
    )?;
    assert_eq!(predicate, col("city").eq(lit("odense")));

    let frame = polyframe::from_native(&NativeObject::new(sample_batch()), CONTRACT_VERSION)?
        .expect("arrow adapter claims batches");
    let batch = frame
        .filter(predicate)?
        .aggregate([col("sales").sum().alias("total")])?
        .collect()?;

    let total = batch.column(0).as_primitive::<Int64Type>();
    assert_eq!(total.value(0), 5);
    Ok(())
}

#[test]
fn test_expressions_round_trip_through_json() -> Result<()> {
    let expr = col("sales").fill_null(0).mean().alias("avg_sales");
    let json = serde_json::to_string(&expr)?;
    let back: Expr = serde_json::from_str(&json)?;

    assert_eq!(back, expr);
    assert_eq!(back.output_name(), "avg_sales");
    Ok(())
}

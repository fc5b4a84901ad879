//! Lazy frame over a shared `RecordBatch`.

use std::sync::Arc;
use std::time::Instant;

use arrow::array::ArrayRef;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use rayon::prelude::*;

use super::BACKEND;
use super::compile::compile;
use super::engine::{
    ArrowExpr, Value, evaluate, filter_by, replace_columns, select_batch, single_row_batch,
    sort_batch,
};
use crate::contract::{CompliantFrame, FrameRef, SortOptions, Version};
use crate::error::util::{column_not_found, expression_err};
use crate::error::Result;
use crate::expr::{Expr, ExpressionAdapter};
use crate::native::NativeObject;
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// First contract revision whose `SortOptions` carry `nulls_last`
const NULLS_LAST_SINCE: Version = Version::new(1, 1);

/// One deferred operation of an [`ArrowLazyFrame`]
#[derive(Debug, Clone)]
pub enum PlanStep {
    /// Keep the named columns
    Select(Vec<String>),
    /// Keep rows matching the predicate
    Filter(ExpressionAdapter<ArrowExpr>),
    /// Add or replace columns
    WithColumns(Vec<ExpressionAdapter<ArrowExpr>>),
    /// Reduce to one row
    Aggregate(Vec<ExpressionAdapter<ArrowExpr>>),
    /// Stable lexicographic sort
    Sort {
        /// Sort keys
        by: Vec<String>,
        /// Sort direction and null placement
        options: SortOptions,
    },
    /// Keep the first `n` rows
    Head(usize),
}

/// Lazy frame: the source batch plus an immutable plan
#[derive(Debug, Clone)]
pub struct ArrowLazyFrame {
    source: Arc<RecordBatch>,
    plan: Vec<PlanStep>,
    columns: Vec<String>,
    version: Version,
}

impl ArrowLazyFrame {
    /// Wrap `source` without copying or evaluating it
    #[must_use]
    pub fn new(source: Arc<RecordBatch>, version: Version) -> Self {
        let columns = source
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect();
        Self {
            source,
            plan: Vec::new(),
            columns,
            version,
        }
    }

    /// The wrapped batch
    #[must_use]
    pub fn source(&self) -> &Arc<RecordBatch> {
        &self.source
    }

    /// Deferred operations, in execution order
    #[must_use]
    pub fn plan(&self) -> &[PlanStep] {
        &self.plan
    }

    /// Contract version the frame was built for
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    fn derive(&self, step: PlanStep, columns: Vec<String>) -> FrameRef {
        let mut plan = self.plan.clone();
        plan.push(step);
        Arc::new(Self {
            source: Arc::clone(&self.source),
            plan,
            columns,
            version: self.version,
        })
    }

    fn check_columns<'a>(&self, names: impl IntoIterator<Item = &'a String>) -> Result<()> {
        match names.into_iter().find(|name| !self.columns.contains(name)) {
            Some(missing) => column_not_found(missing),
            None => Ok(()),
        }
    }

    fn compile_all(&self, exprs: &[Expr]) -> Result<Vec<ExpressionAdapter<ArrowExpr>>> {
        exprs
            .iter()
            .map(|expr| -> Result<ExpressionAdapter<ArrowExpr>> {
                self.check_columns(expr.required_columns().iter().sorted())?;
                Ok(compile(expr))
            })
            .collect()
    }
}

impl CompliantFrame for ArrowLazyFrame {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn columns(&self) -> Result<Vec<String>> {
        Ok(self.columns.clone())
    }

    fn select(&self, columns: &[String]) -> Result<FrameRef> {
        self.check_columns(columns)?;
        Ok(self.derive(PlanStep::Select(columns.to_vec()), columns.to_vec()))
    }

    fn filter(&self, predicate: &Expr) -> Result<FrameRef> {
        self.check_columns(predicate.required_columns().iter().sorted())?;
        Ok(self.derive(PlanStep::Filter(compile(predicate)), self.columns.clone()))
    }

    fn with_columns(&self, exprs: &[Expr]) -> Result<FrameRef> {
        let compiled = self.compile_all(exprs)?;
        let mut columns = self.columns.clone();
        for adapter in &compiled {
            let name = adapter.output_name();
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
        Ok(self.derive(PlanStep::WithColumns(compiled), columns))
    }

    fn aggregate(&self, exprs: &[Expr]) -> Result<FrameRef> {
        if let Some(expr) = exprs.iter().find(|expr| !expr.is_scalar()) {
            return expression_err(format!(
                "aggregate expects expressions reducing to one value, got `{expr}`"
            ));
        }
        let compiled = self.compile_all(exprs)?;
        let columns = compiled
            .iter()
            .map(|adapter| adapter.output_name().to_string())
            .collect();
        Ok(self.derive(PlanStep::Aggregate(compiled), columns))
    }

    fn sort(&self, by: &[String], options: SortOptions) -> Result<FrameRef> {
        self.check_columns(by)?;
        let options = if NULLS_LAST_SINCE.is_compatible_with(self.version) {
            options
        } else {
            options.nulls_last(false)
        };
        Ok(self.derive(
            PlanStep::Sort {
                by: by.to_vec(),
                options,
            },
            self.columns.clone(),
        ))
    }

    fn head(&self, n: usize) -> Result<FrameRef> {
        Ok(self.derive(PlanStep::Head(n), self.columns.clone()))
    }

    fn collect(&self) -> Result<RecordBatch> {
        let start = Instant::now();
        log_operation_start(
            "Collecting",
            &format!("{BACKEND} frame with {} plan step(s)", self.plan.len()),
        );

        let batch = self
            .plan
            .iter()
            .try_fold(RecordBatch::clone(&self.source), |batch, step| {
                execute(step, &batch)
            })?;

        log_operation_complete("collected", "rows", batch.num_rows(), Some(start.elapsed()));
        Ok(batch)
    }

    fn to_native(&self) -> NativeObject {
        NativeObject::from_arc(Arc::clone(&self.source))
    }
}

/// Evaluate named expressions against `batch` in parallel
fn evaluate_all(
    exprs: &[ExpressionAdapter<ArrowExpr>],
    batch: &RecordBatch,
) -> Result<Vec<(String, Value)>> {
    exprs
        .par_iter()
        .map(|adapter| -> Result<(String, Value)> {
            let value = evaluate(&adapter.resolve(), batch)?;
            Ok((adapter.output_name().to_string(), value))
        })
        .collect()
}

fn execute(step: &PlanStep, batch: &RecordBatch) -> Result<RecordBatch> {
    match step {
        PlanStep::Select(names) => select_batch(batch, names),
        PlanStep::Filter(predicate) => filter_by(batch, evaluate(&predicate.resolve(), batch)?),
        PlanStep::WithColumns(exprs) => {
            let columns = evaluate_all(exprs, batch)?
                .into_iter()
                .map(|(name, value)| -> Result<(String, ArrayRef)> {
                    Ok((name, value.into_array(batch.num_rows())?))
                })
                .collect::<Result<Vec<_>>>()?;
            replace_columns(batch, columns)
        }
        PlanStep::Aggregate(exprs) => {
            let columns = evaluate_all(exprs, batch)?
                .into_iter()
                .map(|(name, value)| match value {
                    Value::Scalar(array) => Ok((name, array)),
                    Value::Column(_) => {
                        expression_err(format!("`{name}` did not reduce to a single value"))
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            single_row_batch(columns)
        }
        PlanStep::Sort { by, options } => sort_batch(batch, by, *options),
        PlanStep::Head(n) => Ok(batch.slice(0, (*n).min(batch.num_rows()))),
    }
}

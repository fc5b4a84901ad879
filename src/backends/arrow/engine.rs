//! Native Arrow expressions and their evaluation over compute kernels.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Date32Array, Datum, Float64Array, Int64Array, Scalar,
    StringArray, TimestampMillisecondArray, UInt32Array, new_null_array,
};
use arrow::compute::kernels::{cmp, numeric, zip::zip};
use arrow::compute::{self, CastOptions, SortColumn};
use arrow::datatypes::{Date32Type, Float64Type, Int64Type, TimestampMillisecondType};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow_schema::{
    ArrowError, DataType, Field, FieldRef, Schema, SortOptions as ArrowSortOptions, TimeUnit,
};

use crate::contract::SortOptions;
use crate::error::util::{ErrorContext, column_not_found, expression_err};
use crate::error::{PolyframeError, Result};
use crate::expr::{AggFunc, BinaryOp, LiteralValue};

/// Native expression of the Arrow backend
#[derive(Debug, Clone, PartialEq)]
pub enum ArrowExpr {
    /// Column of the batch being evaluated
    Column(String),
    /// Literal, evaluated to a length-1 array
    Literal(LiteralValue),
    /// Binary kernel application
    Binary {
        /// The operator
        op: BinaryOp,
        /// Left operand
        left: Box<ArrowExpr>,
        /// Right operand
        right: Box<ArrowExpr>,
    },
    /// Kleene NOT
    Not(Box<ArrowExpr>),
    /// Null mask
    IsNull(Box<ArrowExpr>),
    /// Null replacement
    FillNull {
        /// Expression whose nulls are replaced
        expr: Box<ArrowExpr>,
        /// Replacement value
        value: LiteralValue,
    },
    /// Reduction to a single value
    Aggregate {
        /// The aggregate function
        func: AggFunc,
        /// Expression being reduced
        expr: Box<ArrowExpr>,
    },
}

/// Result of evaluating an [`ArrowExpr`]
#[derive(Debug, Clone)]
pub enum Value {
    /// One value per row
    Column(ArrayRef),
    /// A single value stored as a length-1 array
    Scalar(ArrayRef),
}

impl Value {
    /// The underlying array
    #[must_use]
    pub fn array(&self) -> &ArrayRef {
        match self {
            Value::Column(array) | Value::Scalar(array) => array,
        }
    }

    fn data_type(&self) -> &DataType {
        self.array().data_type()
    }

    fn map(self, f: impl FnOnce(ArrayRef) -> Result<ArrayRef>) -> Result<Value> {
        Ok(match self {
            Value::Column(array) => Value::Column(f(array)?),
            Value::Scalar(array) => Value::Scalar(f(array)?),
        })
    }

    /// Expand to one value per row, broadcasting scalars to `num_rows`
    pub fn into_array(self, num_rows: usize) -> Result<ArrayRef> {
        match self {
            Value::Column(array) => Ok(array),
            Value::Scalar(array) => broadcast(&array, num_rows),
        }
    }
}

/// Evaluate `expr` against `batch`
pub fn evaluate(expr: &ArrowExpr, batch: &RecordBatch) -> Result<Value> {
    match expr {
        ArrowExpr::Column(name) => batch
            .column_by_name(name)
            .cloned()
            .map(Value::Column)
            .ok_or_else(|| PolyframeError::ColumnNotFound(name.clone())),
        ArrowExpr::Literal(value) => Ok(Value::Scalar(literal_array(value))),
        ArrowExpr::Binary { op, left, right } => {
            let left = evaluate(left, batch)?;
            let right = evaluate(right, batch)?;
            binary(*op, left, right, batch.num_rows())
        }
        ArrowExpr::Not(inner) => evaluate(inner, batch)?.map(|array| {
            let values = to_boolean(&array)?;
            Ok(Arc::new(compute::not(&values)?) as ArrayRef)
        }),
        ArrowExpr::IsNull(inner) => evaluate(inner, batch)?
            .map(|array| Ok(Arc::new(compute::is_null(array.as_ref())?) as ArrayRef)),
        ArrowExpr::FillNull { expr, value } => fill_null(evaluate(expr, batch)?, value),
        ArrowExpr::Aggregate { func, expr } => {
            aggregate(*func, evaluate(expr, batch)?.array()).map(Value::Scalar)
        }
    }
}

/// Length-1 array holding `value`
#[must_use]
pub fn literal_array(value: &LiteralValue) -> ArrayRef {
    match value {
        LiteralValue::Boolean(b) => Arc::new(BooleanArray::from(vec![*b])),
        LiteralValue::Int(n) => Arc::new(Int64Array::from(vec![*n])),
        LiteralValue::Float(x) => Arc::new(Float64Array::from(vec![*x])),
        LiteralValue::String(s) => Arc::new(StringArray::from(vec![s.as_str()])),
        LiteralValue::Date(d) => Arc::new(Date32Array::from(vec![*d])),
        LiteralValue::Timestamp(ts) => Arc::new(TimestampMillisecondArray::from(vec![*ts])),
        LiteralValue::Null => new_null_array(&DataType::Null, 1),
    }
}

fn broadcast(scalar: &ArrayRef, len: usize) -> Result<ArrayRef> {
    let indices = UInt32Array::from(vec![0_u32; len]);
    Ok(compute::take(scalar.as_ref(), &indices, None)?)
}

fn cast_to(array: &ArrayRef, target: &DataType) -> Result<ArrayRef> {
    if array.data_type() == target {
        return Ok(Arc::clone(array));
    }
    // Unsafe casts error on overflow and truncation instead of nulling values
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    compute::cast_with_options(array.as_ref(), target, &options)
        .with_expr_context(format!("Cannot cast {} to {target}", array.data_type()))
}

fn to_boolean(array: &ArrayRef) -> Result<BooleanArray> {
    match array.data_type() {
        DataType::Boolean => Ok(array.as_boolean().clone()),
        DataType::Null => Ok(cast_to(array, &DataType::Boolean)?.as_boolean().clone()),
        other => expression_err(format!("Expected a boolean expression, found {other}")),
    }
}

fn is_string(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    )
}

fn is_decimal(data_type: &DataType) -> bool {
    data_type.is_numeric() && !data_type.is_integer() && !data_type.is_floating()
}

/// `Float64` if either side has a fraction, `Int64` otherwise
fn promote_numeric(left: &DataType, right: &DataType) -> DataType {
    if [left, right].iter().any(|t| t.is_floating() || is_decimal(t)) {
        DataType::Float64
    } else {
        DataType::Int64
    }
}

/// Common type both operands of `op` are cast to
fn coerce(op: BinaryOp, left: &DataType, right: &DataType) -> Result<DataType> {
    let (left, right) = match (left, right) {
        (DataType::Null, DataType::Null) => {
            return Ok(match op {
                BinaryOp::Div => DataType::Float64,
                op if op.is_arithmetic() => DataType::Int64,
                _ => DataType::Boolean,
            });
        }
        (DataType::Null, other) | (other, DataType::Null) => (other, other),
        pair => pair,
    };

    if op.is_arithmetic() {
        if !(left.is_numeric() && right.is_numeric()) {
            return expression_err(format!(
                "Cannot apply `{}` to {left} and {right}",
                op.as_str()
            ));
        }
        if op == BinaryOp::Div {
            return Ok(DataType::Float64);
        }
        return Ok(promote_numeric(left, right));
    }

    if left == right {
        Ok(left.clone())
    } else if left.is_numeric() && right.is_numeric() {
        Ok(promote_numeric(left, right))
    } else if is_string(left) && is_string(right) {
        Ok(DataType::Utf8)
    } else {
        expression_err(format!("Cannot compare {left} with {right}"))
    }
}

/// Apply a two-operand kernel, keeping scalars as `Scalar` datums
fn kernel<F>(left: &Value, right: &Value, f: F) -> Result<Value>
where
    F: Fn(&dyn Datum, &dyn Datum) -> std::result::Result<ArrayRef, ArrowError>,
{
    Ok(match (left, right) {
        (Value::Column(l), Value::Column(r)) => {
            let (l, r): (&dyn Datum, &dyn Datum) = (l, r);
            Value::Column(f(l, r)?)
        }
        (Value::Column(l), Value::Scalar(r)) => {
            let r = Scalar::new(Arc::clone(r));
            let (l, r): (&dyn Datum, &dyn Datum) = (l, &r);
            Value::Column(f(l, r)?)
        }
        (Value::Scalar(l), Value::Column(r)) => {
            let l = Scalar::new(Arc::clone(l));
            let (l, r): (&dyn Datum, &dyn Datum) = (&l, r);
            Value::Column(f(l, r)?)
        }
        (Value::Scalar(l), Value::Scalar(r)) => {
            let (l, r): (&dyn Datum, &dyn Datum) = (l, r);
            Value::Scalar(f(l, r)?)
        }
    })
}

fn binary(op: BinaryOp, left: Value, right: Value, num_rows: usize) -> Result<Value> {
    if matches!(op, BinaryOp::And | BinaryOp::Or) {
        let scalar = matches!((&left, &right), (Value::Scalar(_), Value::Scalar(_)));
        let len = if scalar { 1 } else { num_rows };
        let l = to_boolean(&left.into_array(len)?)?;
        let r = to_boolean(&right.into_array(len)?)?;
        let out: ArrayRef = if op == BinaryOp::And {
            Arc::new(compute::and_kleene(&l, &r)?)
        } else {
            Arc::new(compute::or_kleene(&l, &r)?)
        };
        return Ok(if scalar { Value::Scalar(out) } else { Value::Column(out) });
    }

    let target = coerce(op, left.data_type(), right.data_type())?;
    let left = left.map(|array| cast_to(&array, &target))?;
    let right = right.map(|array| cast_to(&array, &target))?;

    match op {
        BinaryOp::Add => kernel(&left, &right, numeric::add),
        BinaryOp::Sub => kernel(&left, &right, numeric::sub),
        BinaryOp::Mul => kernel(&left, &right, numeric::mul),
        BinaryOp::Div => kernel(&left, &right, numeric::div),
        BinaryOp::Eq => kernel(&left, &right, |l, r| Ok(Arc::new(cmp::eq(l, r)?) as ArrayRef)),
        BinaryOp::NotEq => kernel(&left, &right, |l, r| Ok(Arc::new(cmp::neq(l, r)?) as ArrayRef)),
        BinaryOp::Gt => kernel(&left, &right, |l, r| Ok(Arc::new(cmp::gt(l, r)?) as ArrayRef)),
        BinaryOp::GtEq => kernel(&left, &right, |l, r| Ok(Arc::new(cmp::gt_eq(l, r)?) as ArrayRef)),
        BinaryOp::Lt => kernel(&left, &right, |l, r| Ok(Arc::new(cmp::lt(l, r)?) as ArrayRef)),
        BinaryOp::LtEq => kernel(&left, &right, |l, r| Ok(Arc::new(cmp::lt_eq(l, r)?) as ArrayRef)),
        BinaryOp::And | BinaryOp::Or => unreachable!("logical operators are handled above"),
    }
}

fn fill_null(value: Value, fill: &LiteralValue) -> Result<Value> {
    if matches!(fill, LiteralValue::Null) {
        return Ok(value);
    }

    let fill = literal_array(fill);
    let target = match (value.data_type(), fill.data_type()) {
        (DataType::Null, fill_type) => fill_type.clone(),
        (own, fill_type) if own.is_integer() && fill_type.is_floating() => DataType::Float64,
        (own, _) => own.clone(),
    };
    let fill = cast_to(&fill, &target)?;

    match value {
        Value::Scalar(array) => {
            let array = cast_to(&array, &target)?;
            let missing = compute::is_null(array.as_ref())?.value(0);
            Ok(Value::Scalar(if missing { fill } else { array }))
        }
        Value::Column(array) => {
            let array = cast_to(&array, &target)?;
            let present = compute::is_not_null(array.as_ref())?;
            let fill = Scalar::new(fill);
            let (truthy, falsy): (&dyn Datum, &dyn Datum) = (&array, &fill);
            Ok(Value::Column(zip(&present, truthy, falsy)?))
        }
    }
}

fn aggregate(func: AggFunc, array: &ArrayRef) -> Result<ArrayRef> {
    let data_type = array.data_type();
    match func {
        AggFunc::RowCount => Ok(Arc::new(Int64Array::from(vec![count_as_i64(array.len())]))),
        AggFunc::Count => {
            let nulls = array.logical_nulls().map_or(0, |nulls| nulls.null_count());
            Ok(Arc::new(Int64Array::from(vec![count_as_i64(array.len() - nulls)])))
        }
        AggFunc::Sum if data_type.is_floating() || is_decimal(data_type) => {
            let values = cast_to(array, &DataType::Float64)?;
            let total = compute::sum(values.as_primitive::<Float64Type>()).unwrap_or(0.0);
            Ok(Arc::new(Float64Array::from(vec![total])))
        }
        AggFunc::Sum if data_type.is_integer() || matches!(data_type, DataType::Null | DataType::Boolean) => {
            let values = cast_to(array, &DataType::Int64)?;
            let total = compute::sum_checked(values.as_primitive::<Int64Type>())?.unwrap_or(0);
            Ok(Arc::new(Int64Array::from(vec![total])))
        }
        AggFunc::Sum => expression_err(format!("Cannot sum a {data_type} column")),
        AggFunc::Mean if data_type.is_numeric() || data_type == &DataType::Null => {
            let values = cast_to(array, &DataType::Float64)?;
            let values = values.as_primitive::<Float64Type>();
            let present = values.len() - values.null_count();
            #[allow(clippy::cast_precision_loss)]
            let mean = compute::sum(values)
                .filter(|_| present > 0)
                .map(|total| total / present as f64);
            Ok(Arc::new(Float64Array::from(vec![mean])))
        }
        AggFunc::Mean => expression_err(format!("Cannot average a {data_type} column")),
        AggFunc::Min => extremum(array, true),
        AggFunc::Max => extremum(array, false),
    }
}

fn count_as_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Minimum (`min == true`) or maximum of the non-null values
fn extremum(array: &ArrayRef, min: bool) -> Result<ArrayRef> {
    let data_type = array.data_type();
    let out: ArrayRef = match data_type {
        DataType::Null => new_null_array(&DataType::Null, 1),
        DataType::Boolean => {
            let values = array.as_boolean();
            let v = if min { compute::min_boolean(values) } else { compute::max_boolean(values) };
            Arc::new(BooleanArray::from(vec![v]))
        }
        t if is_string(t) => {
            let values = cast_to(array, &DataType::Utf8)?;
            let values = values.as_string::<i32>();
            let v = if min { compute::min_string(values) } else { compute::max_string(values) };
            Arc::new(StringArray::from(vec![v]))
        }
        DataType::Date32 => {
            let values = array.as_primitive::<Date32Type>();
            let v = if min { compute::min(values) } else { compute::max(values) };
            Arc::new(Date32Array::from(vec![v]))
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            let values = array.as_primitive::<TimestampMillisecondType>();
            let v = if min { compute::min(values) } else { compute::max(values) };
            Arc::new(TimestampMillisecondArray::from(vec![v]).with_data_type(data_type.clone()))
        }
        t if t.is_floating() || is_decimal(t) => {
            let values = cast_to(array, &DataType::Float64)?;
            let values = values.as_primitive::<Float64Type>();
            let v = if min { compute::min(values) } else { compute::max(values) };
            Arc::new(Float64Array::from(vec![v]))
        }
        t if t.is_integer() => {
            let values = cast_to(array, &DataType::Int64)?;
            let values = values.as_primitive::<Int64Type>();
            let v = if min { compute::min(values) } else { compute::max(values) };
            Arc::new(Int64Array::from(vec![v]))
        }
        other => {
            return expression_err(format!(
                "Cannot take the {} of a {other} column",
                if min { "minimum" } else { "maximum" }
            ));
        }
    };
    Ok(out)
}

/// Filter a record batch based on a boolean mask
///
/// Null mask entries drop the row.
pub fn filter_batch(batch: &RecordBatch, mask: &BooleanArray) -> Result<RecordBatch> {
    if batch.num_rows() != mask.len() {
        return expression_err(format!(
            "Mask length ({}) doesn't match batch row count ({})",
            mask.len(),
            batch.num_rows()
        ));
    }

    let filtered_columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|column| compute::filter(column.as_ref(), mask))
        .collect::<std::result::Result<_, ArrowError>>()?;

    let options = RecordBatchOptions::new().with_row_count(Some(mask.true_count()));
    Ok(RecordBatch::try_new_with_options(batch.schema(), filtered_columns, &options)?)
}

/// Filter `batch` by a predicate value, broadcasting a scalar predicate
pub fn filter_by(batch: &RecordBatch, predicate: Value) -> Result<RecordBatch> {
    let mask = to_boolean(&predicate.into_array(batch.num_rows())?)?;
    filter_batch(batch, &mask)
}

/// Gather the rows at `indices`
pub fn take_batch(batch: &RecordBatch, indices: &UInt32Array) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|column| compute::take(column.as_ref(), indices, None))
        .collect::<std::result::Result<_, ArrowError>>()?;

    let options = RecordBatchOptions::new().with_row_count(Some(indices.len()));
    Ok(RecordBatch::try_new_with_options(batch.schema(), columns, &options)?)
}

/// Stable lexicographic sort of `batch` by the named columns
pub fn sort_batch(batch: &RecordBatch, by: &[String], options: SortOptions) -> Result<RecordBatch> {
    let arrow_options = ArrowSortOptions {
        descending: options.descending,
        nulls_first: !options.nulls_last,
    };

    let mut keys = Vec::with_capacity(by.len() + 1);
    for name in by {
        let Some(values) = batch.column_by_name(name) else {
            return column_not_found(name);
        };
        keys.push(SortColumn {
            values: Arc::clone(values),
            options: Some(arrow_options),
        });
    }

    // Row position as the final key keeps equal rows in input order
    let rows = u32::try_from(batch.num_rows())
        .map_err(|_| PolyframeError::expression("Batch too large to sort"))?;
    keys.push(SortColumn {
        values: Arc::new(UInt32Array::from_iter_values(0..rows)),
        options: None,
    });

    let indices = compute::lexsort_to_indices(&keys, None)?;
    take_batch(batch, &indices)
}

/// Keep the named columns, in order
pub fn select_batch(batch: &RecordBatch, names: &[String]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let indices = names
        .iter()
        .map(|name| {
            schema
                .index_of(name)
                .map_err(|_| PolyframeError::ColumnNotFound(name.clone()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(batch.project(&indices)?)
}

/// Add or replace columns, keeping the position of replaced ones
pub fn replace_columns(batch: &RecordBatch, columns: Vec<(String, ArrayRef)>) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
    let mut arrays: Vec<ArrayRef> = batch.columns().to_vec();

    for (name, array) in columns {
        let field = Arc::new(Field::new(&name, array.data_type().clone(), true));
        match fields.iter().position(|f| f.name() == &name) {
            Some(i) => {
                fields[i] = field;
                arrays[i] = array;
            }
            None => {
                fields.push(field);
                arrays.push(array);
            }
        }
    }

    let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    Ok(RecordBatch::try_new_with_options(schema, arrays, &options)?)
}

/// One-row batch from named length-1 arrays
pub fn single_row_batch(columns: Vec<(String, ArrayRef)>) -> Result<RecordBatch> {
    let (fields, arrays): (Vec<FieldRef>, Vec<ArrayRef>) = columns
        .into_iter()
        .map(|(name, array)| (Arc::new(Field::new(name, array.data_type().clone(), true)), array))
        .unzip();

    let options = RecordBatchOptions::new().with_row_count(Some(1));
    Ok(RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        arrays,
        &options,
    )?)
}

//! Backend-agnostic expression language
//!
//! [`Expr`] is a plain, serializable tree. Frames never evaluate it
//! directly: each adapter compiles it into an [`ExpressionAdapter`] over its
//! own native expression type, one chain step per operator, and evaluates
//! the chain only when the frame is collected.
//!
//! Numeric results follow the same defaults on every backend:
//!
//! | Operation | Empty or all-null input |
//! |-----------|-------------------------|
//! | `sum` | `0` (coalesce-to-zero) |
//! | `count` | `0` (counts non-null values) |
//! | `row_count` | `0` (counts rows) |
//! | `mean`, `min`, `max` | null |
//!
//! `div` is true division and always yields a float. Mixed integer/float
//! arithmetic promotes to float; integer/integer stays integer.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod chain;

pub use chain::{ExpressionAdapter, Step};

/// Represents a column expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Reference to a column by name
    Column(String),

    /// A literal value, broadcast to the frame's length where needed
    Literal(LiteralValue),

    /// Binary operation on two expressions
    Binary {
        /// The operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },

    /// Logical NOT of a boolean expression
    Not(Box<Expr>),

    /// Whether each value is null
    IsNull(Box<Expr>),

    /// Replace nulls with a literal
    FillNull {
        /// Expression whose nulls are replaced
        expr: Box<Expr>,
        /// Replacement value
        value: LiteralValue,
    },

    /// Reduce an expression to a single value
    Aggregate {
        /// The aggregate function
        func: AggFunc,
        /// Expression being reduced
        expr: Box<Expr>,
    },

    /// Rename the output of an expression
    Alias {
        /// Expression being renamed
        expr: Box<Expr>,
        /// Output name
        name: String,
    },
}

/// Represents a literal value that can be used in expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralValue {
    /// Boolean value
    Boolean(bool),

    /// Integer value
    Int(i64),

    /// Floating point value
    Float(f64),

    /// String value
    String(String),

    /// Date value (days since epoch)
    Date(i32),

    /// Timestamp value (milliseconds since epoch)
    Timestamp(i64),

    /// Null value
    Null,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// True division
    Div,
    /// Equality
    Eq,
    /// Inequality
    NotEq,
    /// Greater than
    Gt,
    /// Greater than or equal
    GtEq,
    /// Less than
    Lt,
    /// Less than or equal
    LtEq,
    /// Logical AND (Kleene)
    And,
    /// Logical OR (Kleene)
    Or,
}

impl BinaryOp {
    /// Operator symbol
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
        }
    }

    /// Whether the operator is arithmetic
    #[must_use]
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div)
    }

    /// Whether the operator is a comparison
    #[must_use]
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Gt | BinaryOp::GtEq | BinaryOp::Lt | BinaryOp::LtEq
        )
    }
}

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggFunc {
    /// Sum of non-null values, `0` when there are none
    Sum,
    /// Mean of non-null values, null when there are none
    Mean,
    /// Minimum non-null value
    Min,
    /// Maximum non-null value
    Max,
    /// Number of non-null values
    Count,
    /// Number of rows, nulls included
    RowCount,
}

impl AggFunc {
    /// Function name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AggFunc::Sum => "sum",
            AggFunc::Mean => "mean",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Count => "count",
            AggFunc::RowCount => "row_count",
        }
    }
}

/// Reference a column
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// A literal expression
pub fn lit(value: impl Into<LiteralValue>) -> Expr {
    Expr::Literal(value.into())
}

impl Expr {
    fn binary(self, op: BinaryOp, other: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    fn aggregate(self, func: AggFunc) -> Expr {
        Expr::Aggregate {
            func,
            expr: Box::new(self),
        }
    }

    /// `self + other`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Add, other)
    }

    /// `self - other`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Sub, other)
    }

    /// `self * other`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Mul, other)
    }

    /// `self / other`, always as floats
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn div(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Div, other)
    }

    /// `self == other`
    #[must_use]
    pub fn eq(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Eq, other)
    }

    /// `self != other`
    #[must_use]
    pub fn neq(self, other: Expr) -> Expr {
        self.binary(BinaryOp::NotEq, other)
    }

    /// `self > other`
    #[must_use]
    pub fn gt(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Gt, other)
    }

    /// `self >= other`
    #[must_use]
    pub fn gt_eq(self, other: Expr) -> Expr {
        self.binary(BinaryOp::GtEq, other)
    }

    /// `self < other`
    #[must_use]
    pub fn lt(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Lt, other)
    }

    /// `self <= other`
    #[must_use]
    pub fn lt_eq(self, other: Expr) -> Expr {
        self.binary(BinaryOp::LtEq, other)
    }

    /// Logical AND
    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        self.binary(BinaryOp::And, other)
    }

    /// Logical OR
    #[must_use]
    pub fn or(self, other: Expr) -> Expr {
        self.binary(BinaryOp::Or, other)
    }

    /// Logical NOT
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }

    /// Whether each value is null
    #[must_use]
    pub fn is_null(self) -> Expr {
        Expr::IsNull(Box::new(self))
    }

    /// Whether each value is not null
    #[must_use]
    pub fn is_not_null(self) -> Expr {
        self.is_null().not()
    }

    /// Replace nulls with `value`
    #[must_use]
    pub fn fill_null(self, value: impl Into<LiteralValue>) -> Expr {
        Expr::FillNull {
            expr: Box::new(self),
            value: value.into(),
        }
    }

    /// Sum, `0` for empty or all-null input
    #[must_use]
    pub fn sum(self) -> Expr {
        self.aggregate(AggFunc::Sum)
    }

    /// Mean as a float
    #[must_use]
    pub fn mean(self) -> Expr {
        self.aggregate(AggFunc::Mean)
    }

    /// Minimum
    #[must_use]
    pub fn min(self) -> Expr {
        self.aggregate(AggFunc::Min)
    }

    /// Maximum
    #[must_use]
    pub fn max(self) -> Expr {
        self.aggregate(AggFunc::Max)
    }

    /// Number of non-null values
    #[must_use]
    pub fn count(self) -> Expr {
        self.aggregate(AggFunc::Count)
    }

    /// Number of rows
    #[must_use]
    pub fn row_count(self) -> Expr {
        self.aggregate(AggFunc::RowCount)
    }

    /// Rename the output
    #[must_use]
    pub fn alias(self, name: impl Into<String>) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            name: name.into(),
        }
    }

    /// Name of the column this expression produces.
    ///
    /// The alias if there is one, else the leftmost column referenced, else
    /// `"literal"`.
    #[must_use]
    pub fn output_name(&self) -> String {
        match self {
            Expr::Column(name) | Expr::Alias { name, .. } => name.clone(),
            Expr::Literal(_) => "literal".to_string(),
            Expr::Binary { left, .. } => left.output_name(),
            Expr::Not(expr)
            | Expr::IsNull(expr)
            | Expr::FillNull { expr, .. }
            | Expr::Aggregate { expr, .. } => expr.output_name(),
        }
    }

    /// Returns a set of all column names required by this expression
    #[must_use]
    pub fn required_columns(&self) -> HashSet<String> {
        let mut columns = HashSet::new();
        self.collect_required_columns(&mut columns);
        columns
    }

    /// Helper method to collect column names
    fn collect_required_columns(&self, columns: &mut HashSet<String>) {
        match self {
            Expr::Column(name) => {
                columns.insert(name.clone());
            }
            Expr::Literal(_) => {}
            Expr::Binary { left, right, .. } => {
                left.collect_required_columns(columns);
                right.collect_required_columns(columns);
            }
            Expr::Not(expr)
            | Expr::IsNull(expr)
            | Expr::FillNull { expr, .. }
            | Expr::Aggregate { expr, .. }
            | Expr::Alias { expr, .. } => expr.collect_required_columns(columns),
        }
    }

    /// Whether the expression reduces to a single value
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        match self {
            Expr::Column(_) => false,
            Expr::Literal(_) | Expr::Aggregate { .. } => true,
            Expr::Binary { left, right, .. } => left.is_scalar() && right.is_scalar(),
            Expr::Not(expr) | Expr::IsNull(expr) | Expr::FillNull { expr, .. } | Expr::Alias { expr, .. } => {
                expr.is_scalar()
            }
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Add, rhs)
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Sub, rhs)
    }
}

impl std::ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Mul, rhs)
    }
}

impl std::ops::Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Div, rhs)
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;
    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "col({name})"),
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::Binary { op, left, right } => write!(f, "({left} {} {right})", op.as_str()),
            Expr::Not(expr) => write!(f, "!{expr}"),
            Expr::IsNull(expr) => write!(f, "{expr}.is_null()"),
            Expr::FillNull { expr, value } => write!(f, "{expr}.fill_null({value})"),
            Expr::Aggregate { func, expr } => write!(f, "{expr}.{}()", func.as_str()),
            Expr::Alias { expr, name } => write!(f, "{expr}.alias({name})"),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Boolean(b) => write!(f, "{b}"),
            LiteralValue::Int(n) => write!(f, "{n}"),
            LiteralValue::Float(x) => write!(f, "{x:?}"),
            LiteralValue::String(s) => write!(f, "{s:?}"),
            LiteralValue::Date(d) => write!(f, "date({d})"),
            LiteralValue::Timestamp(ts) => write!(f, "timestamp({ts})"),
            LiteralValue::Null => f.write_str("null"),
        }
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        LiteralValue::Boolean(value)
    }
}

impl From<i32> for LiteralValue {
    fn from(value: i32) -> Self {
        LiteralValue::Int(i64::from(value))
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        LiteralValue::Int(value)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        LiteralValue::Float(value)
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        LiteralValue::String(value.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self {
        LiteralValue::String(value)
    }
}

impl<T: Into<LiteralValue>> From<Option<T>> for LiteralValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(LiteralValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_name_follows_left_operand_and_alias() {
        assert_eq!((col("a") + col("b")).output_name(), "a");
        assert_eq!(lit(1).add(col("b")).output_name(), "literal");
        assert_eq!(col("a").sum().alias("total").output_name(), "total");
        assert_eq!(col("a").fill_null(0).output_name(), "a");
    }

    #[test]
    fn test_required_columns() {
        let expr = col("a").gt(lit(1)).and(col("b").is_not_null()).alias("keep");
        let columns = expr.required_columns();
        assert_eq!(columns.len(), 2);
        assert!(columns.contains("a") && columns.contains("b"));
        assert!(lit(3).required_columns().is_empty());
    }

    #[test]
    fn test_is_scalar() {
        assert!(col("a").sum().is_scalar());
        assert!((col("a").sum() / col("a").count()).is_scalar());
        assert!(!(col("a").sum() + col("b")).is_scalar());
        assert!(!col("a").is_null().is_scalar());
        assert!(lit("x").alias("y").is_scalar());
    }

    #[test]
    fn test_display_is_readable() {
        let expr = (col("price") * lit(2.5)).sum().alias("revenue");
        assert_eq!(expr.to_string(), "(col(price) * 2.5).sum().alias(revenue)");
        assert_eq!((!col("flag")).to_string(), "!col(flag)");
    }

    #[test]
    fn test_expr_serializes_as_tagged_tree() {
        let expr = col("a").fill_null(Option::<i64>::None);
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"fill_null": {"expr": {"column": "a"}, "value": "null"}})
        );
    }
}

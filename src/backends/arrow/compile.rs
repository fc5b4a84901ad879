//! Compilation of host expressions into chains over [`ArrowExpr`].
//!
//! The leftmost column or literal becomes the chain's root and every
//! operator becomes one step, so an expression such as
//! `(col("a") + col("b")).sum()` compiles to root `a` with the steps
//! `["+", "sum"]`. Right-hand operands are compiled on their own and
//! captured by the step that consumes them.

use super::engine::ArrowExpr;
use crate::expr::{Expr, ExpressionAdapter};

/// Compile `expr` into an expression chain for the Arrow backend
#[must_use]
pub fn compile(expr: &Expr) -> ExpressionAdapter<ArrowExpr> {
    match expr {
        Expr::Column(name) => ExpressionAdapter::new(ArrowExpr::Column(name.clone()), name.clone()),
        Expr::Literal(value) => ExpressionAdapter::new(ArrowExpr::Literal(value.clone()), "literal"),
        Expr::Binary { op, left, right } => {
            let op = *op;
            let rhs = compile(right).resolve();
            compile(left).with_named_callable(op.as_str(), move |lhs| ArrowExpr::Binary {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs.clone()),
            })
        }
        Expr::Not(inner) => compile(inner).with_named_callable("not", |e| ArrowExpr::Not(Box::new(e))),
        Expr::IsNull(inner) => {
            compile(inner).with_named_callable("is_null", |e| ArrowExpr::IsNull(Box::new(e)))
        }
        Expr::FillNull { expr, value } => {
            let value = value.clone();
            compile(expr).with_named_callable("fill_null", move |e| ArrowExpr::FillNull {
                expr: Box::new(e),
                value: value.clone(),
            })
        }
        Expr::Aggregate { func, expr } => {
            let func = *func;
            compile(expr).with_named_callable(func.as_str(), move |e| ArrowExpr::Aggregate {
                func,
                expr: Box::new(e),
            })
        }
        Expr::Alias { expr, name } => compile(expr).alias(name.clone()),
    }
}

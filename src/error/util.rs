//! Utility functions for error handling
//!
//! Helpers that attach context to foreign errors and build the common
//! expression errors with consistent wording.

use crate::error::{PolyframeError, Result};

/// Create an expression error result
///
/// # Arguments
/// * `message` - Description of the failed build or evaluation step
///
/// # Returns
/// Always `Err(PolyframeError::Expression(..))`, typed to fit the caller's
/// `Result<T>`
pub fn expression_err<T>(message: impl AsRef<str>) -> Result<T> {
    Err(PolyframeError::expression(message.as_ref()))
}

/// Create a column not found error result
pub fn column_not_found<T>(column_name: &str) -> Result<T> {
    Err(PolyframeError::ColumnNotFound(column_name.to_string()))
}

/// Extension trait for foreign results to add polyframe context
pub trait ErrorContext<T> {
    /// Convert the error into an expression error with a context message
    ///
    /// The foreign error is appended after `message` and a colon.
    fn with_expr_context(self, message: impl AsRef<str>) -> Result<T>;
}

impl<T, E: std::error::Error> ErrorContext<T> for std::result::Result<T, E> {
    fn with_expr_context(self, message: impl AsRef<str>) -> Result<T> {
        self.map_err(|e| PolyframeError::expression(format!("{}: {e}", message.as_ref())))
    }
}

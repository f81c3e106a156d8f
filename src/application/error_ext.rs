//! Error conversion helpers for common I/O operations
//!
//! Provides an extension trait for cleaner error handling with context.

use std::io;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Name the action that failed.
    ///
    /// # Example
    /// ```ignore
    /// source.rewind().with_context("rewind input")?;
    /// ```
    fn with_context(self, action: &str) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_context(self, action: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: action.to_string(),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_context_keeps_source() {
        let result: io::Result<()> = Err(io::Error::new(io::ErrorKind::Other, "boom"));
        let err = result.with_context("write output").unwrap_err();
        assert_eq!(err.to_string(), "operation failed: write output");
        assert_eq!(
            std::error::Error::source(&err).map(|s| s.to_string()),
            Some("boom".to_string())
        );
    }
}

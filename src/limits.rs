//! Limits and constraints for schema processing
//!
//! This module defines limits to prevent resource exhaustion while parsing
//! schema sets with deep include chains or very large documents.

use crate::error::{Error, Result};

/// Limits configuration for a repository
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum schema document size in bytes
    pub max_document_size: usize,

    /// Maximum import/include chain depth
    pub max_schema_depth: usize,

    /// Maximum number of top-level schema components across all schemas
    pub max_schema_components: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_document_size: 100 * 1024 * 1024, // 100 MB
            max_schema_depth: 100,
            max_schema_components: 100000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_document_size: 10 * 1024 * 1024, // 10 MB
            max_schema_depth: 20,
            max_schema_components: 10000,
        }
    }

    /// Check if a document size is within limits
    pub fn check_document_size(&self, size: usize) -> Result<()> {
        if size > self.max_document_size {
            Err(Error::Other(format!(
                "document size {} bytes exceeds maximum {} bytes",
                size, self.max_document_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if an import/include chain depth is within limits
    pub fn check_schema_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_schema_depth {
            Err(Error::Other(format!(
                "schema depth {} exceeds maximum {}",
                depth, self.max_schema_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the component count is within limits
    pub fn check_schema_components(&self, count: usize) -> Result<()> {
        if count > self.max_schema_components {
            Err(Error::Other(format!(
                "schema component count {} exceeds maximum {}",
                count, self.max_schema_components
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert!(limits.check_schema_depth(50).is_ok());
        assert!(limits.check_schema_depth(150).is_err());
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.max_schema_depth < Limits::default().max_schema_depth);
        assert!(limits.check_document_size(11 * 1024 * 1024).is_err());
    }

    #[test]
    fn test_check_components() {
        let limits = Limits::default();
        assert!(limits.check_schema_components(100).is_ok());
        assert!(limits.check_schema_components(200000).is_err());
    }
}

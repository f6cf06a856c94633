use std::sync::Arc;

use thiserror::Error;

use crate::model::{DocId, NodeId};

/// Recoverable failures raised while an iterator tree is evaluated.
///
/// Running out of postings is never an error; cursors report it through their
/// boolean return value and sentinel positions.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("document {0} is not available")]
    DocumentUnavailable(DocId),
    #[error("node {node} not found in document {doc}")]
    NodeNotFound { doc: DocId, node: NodeId },
    #[error("invalid wildcard pattern `{pattern}`: {message}")]
    InvalidPattern {
        pattern: String,
        message: String,
        #[source]
        source: Option<Arc<fancy_regex::Error>>,
    },
    #[error("pattern `{pattern}` could not be matched against `{token}`")]
    PatternMatch {
        pattern: String,
        token: String,
        #[source]
        source: Arc<fancy_regex::Error>,
    },
}

impl Error {
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern { pattern: pattern.into(), message: message.into(), source: None }
    }

    /// True for failures caused by the document collaborator.
    pub fn is_data_access(&self) -> bool {
        matches!(self, Error::DocumentUnavailable(_) | Error::NodeNotFound { .. })
    }
}

pub type Result<T> = core::result::Result<T, Error>;

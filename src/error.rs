use serde::Serialize;

/// A query rejected before any record was processed.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid query at {path}: {message}")]
    InvalidQuery { path: String, message: String },

    #[error("Invalid pattern {pattern:?} at {path}: {source}")]
    InvalidPattern {
        path: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Coarse classification of a [`QueryError`], stable for transports.
/// `InvalidPattern` is the pattern-specific refinement of `InvalidQuery`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryErrorKind {
    InvalidQuery,
    InvalidPattern,
}

/// Serializable form of a [`QueryError`]: `{"kind": ..., "message": ...}`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: QueryErrorKind,
    pub message: String,
}

impl QueryError {
    pub fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        QueryError::InvalidQuery {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for every variant: a bad pattern is one way a query is invalid
    pub fn is_invalid_query(&self) -> bool {
        matches!(
            self,
            QueryError::InvalidQuery { .. } | QueryError::InvalidPattern { .. }
        )
    }

    pub fn kind(&self) -> QueryErrorKind {
        match self {
            QueryError::InvalidQuery { .. } => QueryErrorKind::InvalidQuery,
            QueryError::InvalidPattern { .. } => QueryErrorKind::InvalidPattern,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            QueryError::InvalidQuery { path, .. } | QueryError::InvalidPattern { path, .. } => path,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Errors of the stream transport around the interpreter
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Parse error on line {line} ({format}): {message}")]
    ParseError {
        line: usize,
        format: String,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Line too long: {length} > {max_length}")]
    LineTooLong { length: usize, max_length: usize },

    #[error("Output error: {0}")]
    OutputError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_carries_kind_and_message() {
        let err = QueryError::invalid("operations[0].set.target", "target must not be empty");
        let report = err.report();
        assert_eq!(report.kind, QueryErrorKind::InvalidQuery);
        assert!(err.is_invalid_query());
        assert_eq!(
            report.message,
            "Invalid query at operations[0].set.target: target must not be empty"
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "invalidQuery");
    }

    #[test]
    fn test_pattern_error_names_pattern() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = QueryError::InvalidPattern {
            path: "operations[0].if.condition.match.pattern".to_string(),
            pattern: "(".to_string(),
            source,
        };
        assert_eq!(err.kind(), QueryErrorKind::InvalidPattern);
        assert!(err.is_invalid_query());
        assert!(err.to_string().contains("\"(\""));
    }
}

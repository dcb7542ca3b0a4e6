use crate::types::{Operator, Value, ValueType};

/// Error types for parsing and compiling segment queries
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentError {
    UnknownField(String),
    IllegalOperator {
        field: String,
        operator: Operator,
    },
    TypeCoercion {
        field: String,
        expected: ValueType,
        value: Value,
    },
    MalformedSegment(String),
    TooComplex(String),
}

impl std::fmt::Display for SegmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentError::UnknownField(field) => write!(f, "Unknown field: {}", field),
            SegmentError::IllegalOperator { field, operator } => {
                write!(f, "Operator {} is not allowed for field {}", operator, field)
            }
            SegmentError::TypeCoercion {
                field,
                expected,
                value,
            } => write!(
                f,
                "Type mismatch: {} cannot be used as {} for field {}",
                value, expected, field
            ),
            SegmentError::MalformedSegment(msg) => write!(f, "Malformed segment query: {}", msg),
            SegmentError::TooComplex(msg) => write!(f, "Segment query too complex: {}", msg),
        }
    }
}

impl std::error::Error for SegmentError {}

impl From<serde_json::Error> for SegmentError {
    fn from(err: serde_json::Error) -> Self {
        SegmentError::MalformedSegment(err.to_string())
    }
}

/// Failure of a full evaluation: either the stored query or the executor
#[derive(Debug)]
pub enum EvaluateError<E> {
    Segment(SegmentError),
    Execution(E),
}

impl<E> From<SegmentError> for EvaluateError<E> {
    fn from(err: SegmentError) -> Self {
        EvaluateError::Segment(err)
    }
}

impl<E: std::fmt::Display> std::fmt::Display for EvaluateError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluateError::Segment(err) => write!(f, "{}", err),
            EvaluateError::Execution(err) => write!(f, "Query execution failed: {}", err),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for EvaluateError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EvaluateError::Segment(err) => Some(err),
            EvaluateError::Execution(err) => Some(err),
        }
    }
}

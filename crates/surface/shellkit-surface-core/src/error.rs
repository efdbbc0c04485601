//! Error types for descriptor parsing and shell loading.

use std::path::PathBuf;

use thiserror::Error;

/// A rejected descriptor line. Parsing never stops on these; each one is
/// logged and collected, and the offending line is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: invalid number for {field}: {value:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: missing {field}")]
    MissingField { line: usize, field: &'static str },
    #[error("line {line}: unknown method {method:?}")]
    UnknownMethod { line: usize, method: String },
    #[error("line {line}: method {method:?} not allowed here")]
    MethodNotAllowed { line: usize, method: String },
    #[error("line {line}: unknown interval {interval:?}")]
    UnknownInterval { line: usize, interval: String },
    #[error("line {line}: unknown collision shape {kind:?}")]
    UnknownCollisionKind { line: usize, kind: String },
    #[error("line {line}: animation {id} declared twice")]
    DuplicateAnimation { line: usize, id: i32 },
    #[error("line {line}: pattern for undeclared animation {id}")]
    UndeclaredAnimation { line: usize, id: i32 },
    #[error("line {line}: pattern index {index} leaves a gap (animation {animation} has {len})")]
    PatternIndexGap {
        line: usize,
        animation: i32,
        index: usize,
        len: usize,
    },
    #[error("line {line}: expected a parenthesized id list")]
    MalformedTargetList { line: usize },
    #[error("line {line}: empty id list")]
    EmptyTargetList { line: usize },
    #[error("line {line}: {kind} collision needs {expected} points, got {count}")]
    BadPointCount {
        line: usize,
        kind: &'static str,
        expected: &'static str,
        count: usize,
    },
    #[error("line {line}: collision {id} declared twice")]
    DuplicateCollision { line: usize, id: i32 },
    #[error("line {line}: unexpected '{{'")]
    UnexpectedBrace { line: usize },
    #[error("line {line}: unexpected {text:?}")]
    UnexpectedLine { line: usize, text: String },
    #[error("unterminated block at end of input")]
    UnterminatedBlock,
}

impl ParseError {
    /// Source line of the error, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::InvalidNumber { line, .. }
            | ParseError::MissingField { line, .. }
            | ParseError::UnknownMethod { line, .. }
            | ParseError::MethodNotAllowed { line, .. }
            | ParseError::UnknownInterval { line, .. }
            | ParseError::UnknownCollisionKind { line, .. }
            | ParseError::DuplicateAnimation { line, .. }
            | ParseError::UndeclaredAnimation { line, .. }
            | ParseError::PatternIndexGap { line, .. }
            | ParseError::MalformedTargetList { line }
            | ParseError::EmptyTargetList { line }
            | ParseError::BadPointCount { line, .. }
            | ParseError::DuplicateCollision { line, .. }
            | ParseError::UnexpectedBrace { line }
            | ParseError::UnexpectedLine { line, .. } => Some(*line),
            ParseError::UnterminatedBlock => None,
        }
    }
}

/// Failure to read a shell directory.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("not a shell directory: {0}")]
    NotADirectory(PathBuf),
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

use smol_str::SmolStr;
use thiserror::Error;

/// Raised while turning raw SQL text into lexemes. The position is a
/// byte offset into the input.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("{message} at byte {position}")]
pub struct SQLLexError {
    pub message: String,
    pub position: usize,
}

impl SQLLexError {
    pub fn new(message: impl Into<String>, position: usize) -> SQLLexError {
        SQLLexError {
            message: message.into(),
            position,
        }
    }
}

/// Raised by the recursive-descent parsers on malformed or unexpected
/// syntax. The position is the byte offset of the offending lexeme.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("{description} at byte {position}")]
pub struct SQLParseError {
    pub description: String,
    pub position: usize,
}

impl SQLParseError {
    pub fn new(description: impl Into<String>, position: usize) -> SQLParseError {
        SQLParseError {
            description: description.into(),
            position,
        }
    }
}

impl From<SQLLexError> for SQLParseError {
    fn from(value: SQLLexError) -> Self {
        SQLParseError {
            description: value.message,
            position: value.position,
        }
    }
}

/// Failures raised by tree mutations and transformers. A failed
/// mutation never leaves a partially edited tree behind; callers see
/// either the finished edit or the tree exactly as it was.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum TransformError {
    #[error("invalid CTE name {name:?}: {detail}")]
    InvalidCteName { name: SmolStr, detail: &'static str },

    #[error("duplicate CTE {0:?} with a conflicting body")]
    DuplicateCte(SmolStr),

    #[error("no CTE named {0:?}")]
    CteNotFound(SmolStr),

    #[error("query has no FROM clause to join against")]
    MissingFromClause,

    #[error("columns {columns:?} are not selectable in the query scope")]
    UnresolvedJoinColumns { columns: Vec<SmolStr> },

    #[error("an alias is required but none was given")]
    MissingAlias,

    #[error("expected exactly one select item named {0:?}")]
    AmbiguousColumn(SmolStr),

    #[error("no parameter named {0:?} in the query")]
    ParameterNotFound(SmolStr),

    #[error("parameter {0:?} bound with conflicting values")]
    DuplicateParameter(SmolStr),

    #[error(transparent)]
    Parse(#[from] SQLParseError),
}

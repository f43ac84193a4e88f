use thiserror::Error;

/// Raised when a TMDB payload lacks a field the conversion reads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("movie {id}: missing field `{field}`")]
    MissingField { id: i32, field: &'static str },
}

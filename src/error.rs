//! Error type shared by the annotation core

use crate::pdf::{HighlightId, PageNumber};

/// Errors raised by the annotation core
#[derive(Debug, thiserror::Error)]
pub enum AnnotatorError {
    /// An operation that needs at least one rectangle got none
    #[error("expected at least one rectangle")]
    EmptyInput,

    /// A jump instruction is missing a field it needs
    #[error("malformed jump instruction: {detail}")]
    MalformedJump { detail: String },

    /// The page has no viewport yet
    #[error("page {0} is not rendered")]
    PageNotRendered(PageNumber),

    /// The page has no container to draw the overlay into
    #[error("page {0} has no overlay container")]
    MissingLayer(PageNumber),

    #[error("unknown highlight {0}")]
    UnknownHighlight(HighlightId),

    #[error("screenshot: {0}")]
    Screenshot(#[from] image::ImageError),

    /// The find adapter failed for a single term
    #[error("search for {term:?} failed: {detail}")]
    Search { term: String, detail: String },

    #[error("highlight record: {0}")]
    Record(#[from] serde_json::Error),
}

impl AnnotatorError {
    pub fn malformed_jump(detail: impl Into<String>) -> Self {
        Self::MalformedJump {
            detail: detail.into(),
        }
    }

    pub fn search(term: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Search {
            term: term.into(),
            detail: detail.to_string(),
        }
    }
}

pub type Result<T, E = AnnotatorError> = std::result::Result<T, E>;

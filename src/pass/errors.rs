use thiserror::Error;

use super::ArtifactKind;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PassError {
    #[error("pass {pass:?} expected a {expected} artifact, found {found}")]
    UnexpectedArtifact {
        pass: String,
        expected: ArtifactKind,
        found: ArtifactKind,
    },
    #[error("failed to parse SPIR-V: {0}")]
    Parse(String),
    #[error("module validation failed: {0}")]
    Validation(String),
    #[error("backend error: {0}")]
    Backend(String),
}

use thiserror::Error;

use crate::codegen::EmitError;
use crate::pass::ArtifactKind;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("the pipeline has no final backend")]
    MissingBackend,
    #[error("entry type {} could not be resolved", .0.as_deref().unwrap_or("<none>"))]
    UnresolvedEntryType(Option<String>),
    #[error("pass {pass:?} consumes {expected} artifacts but would be given {found}")]
    IncompatiblePass {
        pass: String,
        expected: ArtifactKind,
        found: ArtifactKind,
    },
    #[error(transparent)]
    Emit(#[from] EmitError),
}

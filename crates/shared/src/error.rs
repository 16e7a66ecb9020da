use thiserror::Error;

use crate::domain::ViewId;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("view id '{0}' is already registered")]
    DuplicateId(ViewId),
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("destination view '{0}' not found")]
    NotFound(ViewId),
    #[error("transition source view '{0}' is not registered")]
    UnknownSource(ViewId),
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error("cannot pop the last remaining scene (stack depth {depth})")]
    StackBottom { depth: usize },
    #[error("scene '{0}' is not on the stack")]
    UnknownScene(String),
}

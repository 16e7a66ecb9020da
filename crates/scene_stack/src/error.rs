use shared::{
    domain::SceneName,
    error::{RegistryError, StageError, TransitionError},
};
use thiserror::Error;

/// Failures while materializing scene or remote-view resources. The
/// transport detail rides along as the error source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("template fetch failed for scene '{scene}': {source}")]
    Template {
        scene: SceneName,
        #[source]
        source: anyhow::Error,
    },
    #[error("assistant resolution failed for scene '{scene}': {source}")]
    Assistant {
        scene: SceneName,
        #[source]
        source: anyhow::Error,
    },
    #[error("assistant setup failed for scene '{scene}': {source}")]
    Setup {
        scene: SceneName,
        #[source]
        source: anyhow::Error,
    },
    #[error("remote view fetch failed for '{url}': {source}")]
    RemoteView {
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("no content handler claims '{url}' ({mime})")]
    UnsupportedContent { url: String, mime: String },
}

/// Anything a stack operation can fail with.
#[derive(Debug, Error)]
pub enum StageOpError {
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

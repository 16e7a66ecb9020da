pub mod assistant;
pub mod controller;
pub mod error;
pub mod loader;
pub mod naming;
pub mod stage;

pub use assistant::{
    AssistantFactory, AssistantResolver, MissingAssistantResolver, SceneAssistant,
    StaticAssistantResolver,
};
pub use controller::{SceneController, SceneResources};
pub use error::{LoadError, StageOpError};
pub use loader::{
    AssistantCache, HttpTemplateSource, StaticTemplateSource, TemplateCache, TemplateSource,
};
pub use naming::SceneNaming;
pub use stage::{StageConfig, StageController, StageOutcome};

#[cfg(test)]
mod tests;

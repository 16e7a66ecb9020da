pub mod animation;
pub mod engine;
pub mod registry;
pub mod view;

pub use animation::{
    decoration_tokens, AnimationDriver, InstantDriver, TransitionAnimator, TransitionStyle,
};
pub use engine::{ShowOptions, TransitionOutcome, ViewEngine, ViewSnapshot};
pub use registry::ViewRegistry;
pub use view::{ViewHooks, ViewSpec};

#[cfg(test)]
mod tests;

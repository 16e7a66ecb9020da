use std::sync::Arc;

use async_trait::async_trait;
use shared::domain::{EffectName, ViewId};

/// Token appended after the settle delay to start interpolation.
pub const ACTIVE_TOKEN: &str = "active";

/// Paired exit/enter decoration tokens for an effect, with the reversed
/// variant selected for backward transitions.
pub fn decoration_tokens(effect: &EffectName, reverse: bool) -> (Vec<String>, Vec<String>) {
    let mut exit = vec![effect.as_str().to_string(), "out".to_string()];
    let mut enter = vec![effect.as_str().to_string(), "in".to_string()];
    if reverse {
        exit.push("reverse".to_string());
        enter.push("reverse".to_string());
    }
    (exit, enter)
}

/// Platform surface behind the declarative strategy. The driver mirrors
/// decoration state onto whatever is actually rendering the views and
/// supplies the timing signals the protocol suspends on.
#[async_trait]
pub trait AnimationDriver: Send + Sync {
    /// Mirror a view's current decoration set onto the platform surface.
    fn sync_decorations(&self, view: &ViewId, decorations: &[String]);

    /// One-shot resize pass for a freshly staged view that has never been
    /// laid out.
    fn request_resize(&self, view: &ViewId);

    /// Short delay between staging decorations and activating them, so
    /// the platform can lay the staged view out first.
    async fn settle(&self);

    /// Resolves when the platform reports the exit animation finished on
    /// `view`. If the platform never signals (for example a misconfigured
    /// effect name), the transition stays in flight forever; the engine
    /// adds no timeout.
    async fn wait_completion(&self, view: &ViewId, effect: &EffectName);
}

/// Driver that completes everything immediately. Useful for embeddings
/// without a real animation surface, and as the default for tests.
pub struct InstantDriver;

#[async_trait]
impl AnimationDriver for InstantDriver {
    fn sync_decorations(&self, _view: &ViewId, _decorations: &[String]) {}

    fn request_resize(&self, _view: &ViewId) {}

    async fn settle(&self) {
        tokio::task::yield_now().await;
    }

    async fn wait_completion(&self, _view: &ViewId, _effect: &EffectName) {
        tokio::task::yield_now().await;
    }
}

/// Externally supplied animation backend: the whole animate step is
/// delegated and the returned future is the completion signal.
#[async_trait]
pub trait TransitionAnimator: Send + Sync {
    async fn run(&self, source: &ViewId, destination: &ViewId, effect: &EffectName, reverse: bool);
}

/// Animation backend selection, fixed when the engine is constructed.
#[derive(Clone)]
pub enum TransitionStyle {
    /// Hide the source synchronously; no animation at all.
    None,
    /// Declarative paired enter/exit decorations driven through the
    /// [`AnimationDriver`].
    Declarative,
    /// Delegate to an injected [`TransitionAnimator`].
    External(Arc<dyn TransitionAnimator>),
}

impl TransitionStyle {
    pub(crate) fn is_none(&self) -> bool {
        matches!(self, TransitionStyle::None)
    }
}

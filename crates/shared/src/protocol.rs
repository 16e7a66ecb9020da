use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ContainerId, Direction, EffectName, ViewId};

/// Application object that receives named callback dispatch once a
/// transition settles.
pub trait CallbackContext: Send + Sync {
    fn invoke(&self, method: &str, args: &[Value]);
}

/// Completion callback carried on a transition request: either a plain
/// function, or a method name resolved against a context object.
pub enum TransitionCallback {
    Direct(Box<dyn FnOnce(&[Value]) + Send + Sync>),
    Named {
        context: Arc<dyn CallbackContext>,
        method: String,
    },
}

impl TransitionCallback {
    pub fn direct(f: impl FnOnce(&[Value]) + Send + Sync + 'static) -> Self {
        Self::Direct(Box::new(f))
    }

    pub fn named(context: Arc<dyn CallbackContext>, method: impl Into<String>) -> Self {
        Self::Named {
            context,
            method: method.into(),
        }
    }

    pub fn invoke(self, args: &[Value]) {
        match self {
            Self::Direct(f) => f(args),
            Self::Named { context, method } => context.invoke(&method, args),
        }
    }
}

impl fmt::Debug for TransitionCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(_) => f.write_str("TransitionCallback::Direct"),
            Self::Named { method, .. } => write!(f, "TransitionCallback::Named({method})"),
        }
    }
}

/// A fully resolved request routed to the view engine.
///
/// `target: None` asks for a transition to the engine's reusable blank
/// view, created lazily on first use.
#[derive(Debug)]
pub struct TransitionRequest {
    pub target: Option<ViewId>,
    pub direction: Direction,
    pub effect: EffectName,
    pub callback: Option<TransitionCallback>,
    pub extra_args: Vec<Value>,
}

impl TransitionRequest {
    pub fn to(target: impl Into<ViewId>, direction: Direction, effect: EffectName) -> Self {
        Self {
            target: Some(target.into()),
            direction,
            effect,
            callback: None,
            extra_args: Vec::new(),
        }
    }

    pub fn to_blank(direction: Direction, effect: EffectName) -> Self {
        Self {
            target: None,
            direction,
            effect,
            callback: None,
            extra_args: Vec::new(),
        }
    }

    pub fn with_callback(mut self, callback: TransitionCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.extra_args = args;
        self
    }
}

/// The raw, pre-classification transition message, as it bubbles out of
/// the widget tree. The `target` string is classified by the dispatcher:
/// a `scene:` prefix pushes onto the stage, an http(s) URL is resolved as
/// remote view content or external navigation, anything else names an
/// in-page view (empty string means the blank view).
#[derive(Debug)]
pub struct TransitionDirective {
    /// Container the request bubbled from; used to resolve the enclosing
    /// source view.
    pub origin: Option<ContainerId>,
    pub target: String,
    pub direction: Direction,
    pub effect: EffectName,
    pub callback: Option<TransitionCallback>,
    pub extra_args: Vec<Value>,
}

impl TransitionDirective {
    pub fn new(target: impl Into<String>, direction: Direction, effect: EffectName) -> Self {
        Self {
            origin: None,
            target: target.into(),
            direction,
            effect,
            callback: None,
            extra_args: Vec::new(),
        }
    }

    pub fn from_container(mut self, origin: ContainerId) -> Self {
        self.origin = Some(origin);
        self
    }
}

/// Summary of the request a view is currently animating, kept on the view
/// record while `in_progress` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTransition {
    pub target: ViewId,
    pub direction: Direction,
    pub effect: EffectName,
}

/// Lifecycle notifications published on the shared bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    BeforeTransitionOut {
        view: ViewId,
        to: Option<ViewId>,
        direction: Direction,
        effect: EffectName,
    },
    AfterTransitionOut {
        view: ViewId,
        to: Option<ViewId>,
    },
    BeforeTransitionIn {
        view: ViewId,
        from: Option<ViewId>,
        direction: Direction,
        effect: EffectName,
    },
    AfterTransitionIn {
        view: ViewId,
        from: Option<ViewId>,
    },
    StartView {
        view: ViewId,
    },
}

impl ViewEvent {
    pub fn view(&self) -> &ViewId {
        match self {
            ViewEvent::BeforeTransitionOut { view, .. }
            | ViewEvent::AfterTransitionOut { view, .. }
            | ViewEvent::BeforeTransitionIn { view, .. }
            | ViewEvent::AfterTransitionIn { view, .. }
            | ViewEvent::StartView { view } => view,
        }
    }
}

/// Content fetched for a remote view target, before materialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteContent {
    pub url: String,
    pub mime: String,
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

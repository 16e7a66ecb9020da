use std::{collections::BTreeSet, sync::Arc};

use shared::{
    domain::{ContainerId, ScrollOffset, ViewId, Visibility},
    protocol::PendingTransition,
};

/// Per-view lifecycle delegate, invoked synchronously around each
/// transition. All methods default to no-ops; implementors override the
/// ones they care about.
pub trait ViewHooks: Send + Sync {
    fn before_transition_out(&self, to: Option<&ViewId>) {
        let _ = to;
    }

    fn after_transition_out(&self) {}

    fn before_transition_in(&self, from: Option<&ViewId>) {
        let _ = from;
    }

    fn after_transition_in(&self) {}
}

/// Progress of the transition protocol on a single view. `Idle` is the
/// rest state; everything else means the view owns an in-flight
/// transition and further requests on it are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPhase {
    #[default]
    Idle,
    Preparing,
    Animating,
    Finalizing,
}

/// Definition of a view handed to the engine.
pub struct ViewSpec {
    pub id: ViewId,
    pub container: ContainerId,
    pub z_index: u32,
    pub keep_scroll: bool,
    pub content: Option<Arc<str>>,
    pub hooks: Option<Arc<dyn ViewHooks>>,
}

impl ViewSpec {
    pub fn new(id: impl Into<ViewId>, container: impl Into<ContainerId>) -> Self {
        Self {
            id: id.into(),
            container: container.into(),
            z_index: 0,
            keep_scroll: false,
            content: None,
            hooks: None,
        }
    }

    pub fn z_index(mut self, z_index: u32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn keep_scroll(mut self) -> Self {
        self.keep_scroll = true;
        self
    }

    pub fn content(mut self, content: impl Into<Arc<str>>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn ViewHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }
}

/// Engine-owned state of one view.
pub struct ViewRecord {
    pub id: ViewId,
    pub container: ContainerId,
    /// Document order within the container.
    pub order: u32,
    pub z_index: u32,
    pub visibility: Visibility,
    /// Live scroll offset; dropped when the view is hidden.
    pub scroll: ScrollOffset,
    pub keep_scroll: bool,
    pub sized: bool,
    /// Transition decoration tokens currently applied to the view.
    /// Possibly dirty after an interrupted transition; every protocol run
    /// resets siblings to an empty baseline before staging.
    pub decorations: BTreeSet<String>,
    pub phase: TransitionPhase,
    pub pending: Option<PendingTransition>,
    pub content: Option<Arc<str>>,
    pub hooks: Option<Arc<dyn ViewHooks>>,
}

impl ViewRecord {
    pub(crate) fn from_spec(spec: ViewSpec, order: u32) -> Self {
        Self {
            id: spec.id,
            container: spec.container,
            order,
            z_index: spec.z_index,
            visibility: Visibility::Hidden,
            scroll: ScrollOffset::ZERO,
            keep_scroll: spec.keep_scroll,
            sized: false,
            decorations: BTreeSet::new(),
            phase: TransitionPhase::Idle,
            pending: None,
            content: spec.content,
            hooks: spec.hooks,
        }
    }

    pub fn in_progress(&self) -> bool {
        self.phase != TransitionPhase::Idle
    }

    pub(crate) fn decoration_list(&self) -> Vec<String> {
        self.decorations.iter().cloned().collect()
    }

    /// Hide the view, dropping its live scroll offset the way a surface
    /// removed from layout loses its scroll position.
    pub(crate) fn hide(&mut self) {
        self.visibility = Visibility::Hidden;
        self.scroll = ScrollOffset::ZERO;
    }
}

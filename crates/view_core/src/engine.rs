use std::{collections::HashMap, sync::Arc};

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use shared::{
    domain::{ContainerId, Direction, EffectName, ScrollOffset, ViewId, Visibility},
    error::{RegistryError, TransitionError},
    protocol::{PendingTransition, TransitionRequest, ViewEvent},
};

use crate::{
    animation::{decoration_tokens, AnimationDriver, TransitionStyle, ACTIVE_TOKEN},
    registry::ViewRegistry,
    view::{TransitionPhase, ViewHooks, ViewSpec},
};

const EVENT_CHANNEL_CAPACITY: usize = 64;
const BLANK_VIEW_PREFIX: &str = "blank";

/// How a `perform_transition` call ended. A request arriving while the
/// source view already owns an in-flight transition is dropped, not
/// queued; callers that ignore the outcome observe the historical
/// silent-no-op behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Completed,
    Dropped,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShowOptions {
    pub suppress_events: bool,
    pub keep_others_visible: bool,
}

impl ShowOptions {
    pub fn suppress_events(mut self) -> Self {
        self.suppress_events = true;
        self
    }

    pub fn keep_others_visible(mut self) -> Self {
        self.keep_others_visible = true;
        self
    }
}

/// Read-only copy of a view's engine state.
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    pub id: ViewId,
    pub container: ContainerId,
    pub z_index: u32,
    pub visibility: Visibility,
    pub scroll: ScrollOffset,
    pub decorations: Vec<String>,
    pub in_progress: bool,
    pub pending: Option<PendingTransition>,
    pub content: Option<Arc<str>>,
}

struct EngineState {
    registry: ViewRegistry,
    /// Last known scroll offset per view id, surviving while the view is
    /// hidden so a return transition can restore it.
    scroll_cache: HashMap<ViewId, ScrollOffset>,
    /// The reusable blank destination, created lazily on the first
    /// request without a target.
    blank_view: Option<ViewId>,
}

impl EngineState {
    fn ensure_blank_view(&mut self, container: &ContainerId) -> ViewId {
        if let Some(id) = &self.blank_view {
            return id.clone();
        }
        let id = ViewId::minted(BLANK_VIEW_PREFIX);
        self.registry
            .add(ViewSpec::new(id.clone(), container.clone()))
            .expect("freshly minted blank view id cannot collide");
        self.blank_view = Some(id.clone());
        id
    }
}

struct Prepared {
    destination: ViewId,
    source_hooks: Option<Arc<dyn ViewHooks>>,
    dest_hooks: Option<Arc<dyn ViewHooks>>,
    needs_resize: bool,
}

enum PrepareResult {
    Run(Prepared),
    /// Source already in flight; request dropped, not queued.
    Dropped,
    /// Degenerate self-transition; nothing to animate.
    Noop,
}

/// Owns all per-view transition state and runs the transition protocol.
///
/// The animation backend is fixed at construction; platform integration
/// happens through the injected [`AnimationDriver`]. All state lives
/// behind one mutex taken only for short synchronous sections, so the
/// protocol suspends exclusively at the driver's settle and completion
/// signals.
pub struct ViewEngine {
    driver: Arc<dyn AnimationDriver>,
    style: TransitionStyle,
    inner: Mutex<EngineState>,
    events: broadcast::Sender<ViewEvent>,
}

impl ViewEngine {
    pub fn new(driver: Arc<dyn AnimationDriver>, style: TransitionStyle) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            driver,
            style,
            inner: Mutex::new(EngineState {
                registry: ViewRegistry::new(),
                scroll_cache: HashMap::new(),
                blank_view: None,
            }),
            events,
        })
    }

    /// Engine with no animation surface at all: instant completion,
    /// synchronous hides.
    pub fn unanimated() -> Arc<Self> {
        Self::new(Arc::new(crate::animation::InstantDriver), TransitionStyle::None)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ViewEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: ViewEvent) {
        let _ = self.events.send(event);
    }

    pub async fn register_container(
        &self,
        container: ContainerId,
        owner: Option<ViewId>,
        parent: Option<ContainerId>,
    ) {
        self.inner
            .lock()
            .await
            .registry
            .register_container(container, owner, parent);
    }

    pub async fn define_view(&self, spec: ViewSpec) -> Result<(), RegistryError> {
        self.inner.lock().await.registry.add(spec)
    }

    /// Remove a view and every cache entry keyed by its id.
    pub async fn teardown_view(&self, id: &ViewId) -> bool {
        let mut state = self.inner.lock().await;
        state.scroll_cache.remove(id);
        if state.blank_view.as_ref() == Some(id) {
            state.blank_view = None;
        }
        state.registry.remove(id).is_some()
    }

    pub async fn contains_view(&self, id: &ViewId) -> bool {
        self.inner.lock().await.registry.contains(id)
    }

    pub async fn view_count(&self) -> usize {
        self.inner.lock().await.registry.len()
    }

    pub async fn snapshot(&self, id: &ViewId) -> Option<ViewSnapshot> {
        let state = self.inner.lock().await;
        state.registry.get(id).map(|rec| ViewSnapshot {
            id: rec.id.clone(),
            container: rec.container.clone(),
            z_index: rec.z_index,
            visibility: rec.visibility,
            scroll: rec.scroll,
            decorations: rec.decoration_list(),
            in_progress: rec.in_progress(),
            pending: rec.pending.clone(),
            content: rec.content.clone(),
        })
    }

    pub async fn sibling_views(&self, id: &ViewId) -> Vec<ViewId> {
        self.inner.lock().await.registry.sibling_views(id)
    }

    pub async fn parent_view(&self, id: &ViewId) -> Option<ViewId> {
        self.inner.lock().await.registry.parent_view(id)
    }

    pub async fn enclosing_view(&self, container: &ContainerId) -> Option<ViewId> {
        self.inner.lock().await.registry.enclosing_view(container)
    }

    pub async fn ancestor_views(&self, id: &ViewId) -> Vec<ViewId> {
        self.inner.lock().await.registry.ancestor_views(id)
    }

    pub async fn is_visible(&self, id: &ViewId, check_ancestors: bool) -> bool {
        self.inner.lock().await.registry.is_visible(id, check_ancestors)
    }

    /// Attach (or replace) a view's content payload, e.g. a loaded
    /// template or materialized remote markup.
    pub async fn set_content(&self, id: &ViewId, content: Arc<str>) {
        let mut state = self.inner.lock().await;
        if let Some(rec) = state.registry.get_mut(id) {
            rec.content = Some(content);
        }
    }

    /// Record the live scroll offset reported by the platform.
    pub async fn set_scroll(&self, id: &ViewId, offset: ScrollOffset) {
        let mut state = self.inner.lock().await;
        if let Some(rec) = state.registry.get_mut(id) {
            rec.scroll = offset;
        }
    }

    pub async fn scroll_of(&self, id: &ViewId) -> Option<ScrollOffset> {
        let state = self.inner.lock().await;
        state.registry.get(id).map(|rec| rec.scroll)
    }

    /// Animate `source` out and the request's destination in.
    ///
    /// Protocol order is fixed: guard, resolve, prepare, scroll
    /// preservation, before-hooks, animate, finalize. The destination's
    /// after-hook always precedes the request callback. A missing
    /// destination aborts cleanly with the guard released; a completion
    /// signal that never resolves leaves the source in flight forever.
    pub async fn perform_transition(
        &self,
        source: &ViewId,
        mut request: TransitionRequest,
    ) -> Result<TransitionOutcome, TransitionError> {
        let prepared = match self.prepare(source, &request).await? {
            PrepareResult::Run(prepared) => prepared,
            PrepareResult::Dropped => return Ok(TransitionOutcome::Dropped),
            PrepareResult::Noop => return Ok(TransitionOutcome::Completed),
        };
        let destination = prepared.destination.clone();

        if prepared.needs_resize {
            self.driver.request_resize(&destination);
        }

        if let Some(hooks) = &prepared.source_hooks {
            hooks.before_transition_out(Some(&destination));
        }
        self.publish(ViewEvent::BeforeTransitionOut {
            view: source.clone(),
            to: Some(destination.clone()),
            direction: request.direction,
            effect: request.effect.clone(),
        });
        if let Some(hooks) = &prepared.dest_hooks {
            hooks.before_transition_in(Some(source));
        }
        self.publish(ViewEvent::BeforeTransitionIn {
            view: destination.clone(),
            from: Some(source.clone()),
            direction: request.direction,
            effect: request.effect.clone(),
        });

        let animated = !self.style.is_none() && !request.effect.is_none();
        if animated {
            self.set_phase(source, TransitionPhase::Animating).await;
            match &self.style {
                TransitionStyle::Declarative => {
                    self.run_declarative(source, &destination, request.direction, &request.effect)
                        .await;
                }
                TransitionStyle::External(animator) => {
                    animator
                        .run(
                            source,
                            &destination,
                            &request.effect,
                            request.direction == Direction::Backward,
                        )
                        .await;
                }
                TransitionStyle::None => {}
            }
        }

        self.finalize(source, &destination).await;

        if let Some(hooks) = &prepared.source_hooks {
            hooks.after_transition_out();
        }
        self.publish(ViewEvent::AfterTransitionOut {
            view: source.clone(),
            to: Some(destination.clone()),
        });
        if let Some(hooks) = &prepared.dest_hooks {
            hooks.after_transition_in();
        }
        self.publish(ViewEvent::AfterTransitionIn {
            view: destination.clone(),
            from: Some(source.clone()),
        });

        if let Some(callback) = request.callback.take() {
            callback.invoke(&request.extra_args);
        }

        Ok(TransitionOutcome::Completed)
    }

    /// Guard, resolve and prepare under one lock.
    async fn prepare(
        &self,
        source: &ViewId,
        request: &TransitionRequest,
    ) -> Result<PrepareResult, TransitionError> {
        let mut state = self.inner.lock().await;

        let (source_hooks, source_container, source_keep_scroll, source_scroll) = {
            let Some(src) = state.registry.get(source) else {
                return Err(TransitionError::UnknownSource(source.clone()));
            };
            if src.in_progress() {
                warn!(view = %source, requested = ?request.target, "transition already in flight; request dropped");
                return Ok(PrepareResult::Dropped);
            }
            (
                src.hooks.clone(),
                src.container.clone(),
                src.keep_scroll,
                src.scroll,
            )
        };
        let source_top_level = state.registry.is_top_level(source);

        if let Some(rec) = state.registry.get_mut(source) {
            rec.phase = TransitionPhase::Preparing;
        }

        let destination = match &request.target {
            Some(id) => id.clone(),
            None => state.ensure_blank_view(&source_container),
        };

        if !state.registry.contains(&destination) {
            if let Some(rec) = state.registry.get_mut(source) {
                rec.phase = TransitionPhase::Idle;
            }
            return Err(TransitionError::NotFound(destination));
        }

        if destination == *source {
            debug!(view = %source, "transition to self; nothing to do");
            if let Some(rec) = state.registry.get_mut(source) {
                rec.phase = TransitionPhase::Idle;
            }
            return Ok(PrepareResult::Noop);
        }

        // Reset every sibling of both endpoints to a clean decoration
        // baseline; an interrupted earlier transition may have left any
        // of them dirty.
        let mut affected = state.registry.sibling_views(source);
        for id in state.registry.sibling_views(&destination) {
            if !affected.contains(&id) {
                affected.push(id);
            }
        }
        for id in &affected {
            if let Some(rec) = state.registry.get_mut(id) {
                if !rec.decorations.is_empty() {
                    warn!(view = %id, "stripping stale transition decorations");
                    rec.decorations.clear();
                    self.driver.sync_decorations(id, &[]);
                }
            }
        }

        let dest_top_level = state.registry.is_top_level(&destination);
        let mut needs_resize = false;
        let dest_hooks = {
            let EngineState {
                registry,
                scroll_cache,
                ..
            } = &mut *state;
            let Some(dst) = registry.get_mut(&destination) else {
                if let Some(rec) = registry.get_mut(source) {
                    rec.phase = TransitionPhase::Idle;
                }
                return Err(TransitionError::NotFound(destination));
            };
            // Hidden-but-laid-out: measurable without flashing.
            if !dst.visibility.is_visible() {
                dst.visibility = Visibility::Staged;
            }
            if !dst.sized {
                dst.sized = true;
                needs_resize = true;
            }
            if dest_top_level && dst.keep_scroll {
                if let Some(cached) = scroll_cache.get(&destination) {
                    dst.scroll = *cached;
                }
            }
            dst.hooks.clone()
        };

        if source_top_level && source_keep_scroll {
            state.scroll_cache.insert(source.clone(), source_scroll);
        }

        if let Some(rec) = state.registry.get_mut(source) {
            rec.pending = Some(PendingTransition {
                target: destination.clone(),
                direction: request.direction,
                effect: request.effect.clone(),
            });
        }

        Ok(PrepareResult::Run(Prepared {
            destination,
            source_hooks,
            dest_hooks,
            needs_resize,
        }))
    }

    async fn set_phase(&self, view: &ViewId, phase: TransitionPhase) {
        let mut state = self.inner.lock().await;
        if let Some(rec) = state.registry.get_mut(view) {
            rec.phase = phase;
        }
    }

    /// The declarative backend: paired enter/exit tokens, a settle delay,
    /// then activation, then the platform's completion signal on the
    /// source view.
    async fn run_declarative(
        &self,
        source: &ViewId,
        destination: &ViewId,
        direction: Direction,
        effect: &EffectName,
    ) {
        let reverse = direction == Direction::Backward;
        let (exit_tokens, enter_tokens) = decoration_tokens(effect, reverse);

        let (source_list, dest_list) = {
            let mut state = self.inner.lock().await;
            let source_list = state.registry.get_mut(source).map(|rec| {
                rec.decorations.extend(exit_tokens.iter().cloned());
                rec.decoration_list()
            });
            let dest_list = state.registry.get_mut(destination).map(|rec| {
                rec.decorations.extend(enter_tokens.iter().cloned());
                rec.decoration_list()
            });
            (source_list, dest_list)
        };
        if let Some(list) = &source_list {
            self.driver.sync_decorations(source, list);
        }
        if let Some(list) = &dest_list {
            self.driver.sync_decorations(destination, list);
        }

        self.driver.settle().await;

        let (source_list, dest_list) = {
            let mut state = self.inner.lock().await;
            let source_list = state.registry.get_mut(source).map(|rec| {
                rec.decorations.insert(ACTIVE_TOKEN.to_string());
                rec.decoration_list()
            });
            let dest_list = state.registry.get_mut(destination).map(|rec| {
                rec.decorations.insert(ACTIVE_TOKEN.to_string());
                rec.decoration_list()
            });
            (source_list, dest_list)
        };
        if let Some(list) = &source_list {
            self.driver.sync_decorations(source, list);
        }
        if let Some(list) = &dest_list {
            self.driver.sync_decorations(destination, list);
        }

        self.driver.wait_completion(source, effect).await;
    }

    async fn finalize(&self, source: &ViewId, destination: &ViewId) {
        let mut state = self.inner.lock().await;
        if let Some(rec) = state.registry.get_mut(source) {
            rec.phase = TransitionPhase::Finalizing;
            rec.hide();
            rec.decorations.clear();
            self.driver.sync_decorations(source, &[]);
        }
        if let Some(rec) = state.registry.get_mut(destination) {
            rec.visibility = Visibility::Visible;
            rec.decorations.clear();
            self.driver.sync_decorations(destination, &[]);
        }
        if let Some(rec) = state.registry.get_mut(source) {
            rec.phase = TransitionPhase::Idle;
            rec.pending = None;
        }
    }

    /// Synchronous, unanimated visibility flip. Hides the view's siblings
    /// unless told otherwise and still fires the hook pairs unless
    /// suppressed.
    pub async fn show(&self, view: &ViewId, opts: ShowOptions) -> Result<(), TransitionError> {
        let hooks = {
            let state = self.inner.lock().await;
            let Some(rec) = state.registry.get(view) else {
                return Err(TransitionError::NotFound(view.clone()));
            };
            rec.hooks.clone()
        };

        if !opts.suppress_events {
            if let Some(hooks) = &hooks {
                hooks.before_transition_in(None);
            }
            self.publish(ViewEvent::BeforeTransitionIn {
                view: view.clone(),
                from: None,
                direction: Direction::Forward,
                effect: EffectName::none(),
            });
        }

        {
            let mut state = self.inner.lock().await;
            if !opts.keep_others_visible {
                for sibling in state.registry.sibling_views(view) {
                    if sibling != *view {
                        if let Some(rec) = state.registry.get_mut(&sibling) {
                            rec.hide();
                        }
                    }
                }
            }
            if let Some(rec) = state.registry.get_mut(view) {
                rec.visibility = Visibility::Visible;
            }
        }

        if !opts.suppress_events {
            if let Some(hooks) = &hooks {
                hooks.after_transition_in();
            }
            self.publish(ViewEvent::AfterTransitionIn {
                view: view.clone(),
                from: None,
            });
        }
        Ok(())
    }

    /// `show` plus the `StartView` notification; used for the very first
    /// view of a navigation context.
    pub async fn start_view(&self, view: &ViewId) -> Result<(), TransitionError> {
        self.show(view, ShowOptions::default()).await?;
        self.publish(ViewEvent::StartView { view: view.clone() });
        Ok(())
    }

    /// Set the view invisible synchronously. No hooks, no events.
    pub async fn hide(&self, view: &ViewId) {
        let mut state = self.inner.lock().await;
        if let Some(rec) = state.registry.get_mut(view) {
            rec.hide();
        }
    }
}

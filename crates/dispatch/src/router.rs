use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info, warn};
use url::Url;

use scene_stack::StageController;
use shared::{
    domain::{SceneName, ViewId},
    protocol::{TransitionDirective, TransitionRequest},
};
use view_core::{ShowOptions, ViewEngine};

use crate::remote::RemoteViewLoader;

pub const SCENE_TARGET_PREFIX: &str = "scene:";

/// What the dispatcher decided to do with a directive's target string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteKind {
    /// In-page view transition; `None` means the blank view.
    InPage(Option<ViewId>),
    /// Fetch, materialize and transition to remote view content.
    RemoteView(Url),
    /// Hand the URL to the embedding platform.
    ExternalNavigation(Url),
    /// Push a scene onto the attached stage.
    ScenePush(SceneName),
}

/// Where plain external navigation goes. The embedding platform supplies
/// the real implementation.
pub trait ExternalNavigator: Send + Sync {
    fn navigate(&self, url: &Url) -> Result<()>;
}

pub struct MissingExternalNavigator;

impl ExternalNavigator for MissingExternalNavigator {
    fn navigate(&self, url: &Url) -> Result<()> {
        Err(anyhow!("no external navigator configured (wanted '{url}')"))
    }
}

/// Submission side of the dispatcher's intake channel. Directives are
/// claimed by the single dispatcher consuming the channel.
#[derive(Clone)]
pub struct DispatcherHandle {
    tx: mpsc::UnboundedSender<TransitionDirective>,
}

impl DispatcherHandle {
    pub fn submit(&self, directive: TransitionDirective) -> bool {
        self.tx.send(directive).is_ok()
    }
}

/// Routes bubbling transition requests: classifies the target, resolves
/// the source and the effective transition root, and delegates to the
/// engine, the stage, the remote pipeline or the external navigator.
pub struct Dispatcher {
    engine: Arc<ViewEngine>,
    stage: Option<Arc<StageController>>,
    remote: RemoteViewLoader,
    navigator: Arc<dyn ExternalNavigator>,
    rx: Option<mpsc::UnboundedReceiver<TransitionDirective>>,
}

impl Dispatcher {
    pub fn new(
        engine: Arc<ViewEngine>,
        stage: Option<Arc<StageController>>,
        remote: RemoteViewLoader,
        navigator: Arc<dyn ExternalNavigator>,
    ) -> (Self, DispatcherHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                engine,
                stage,
                remote,
                navigator,
                rx: Some(rx),
            },
            DispatcherHandle { tx },
        )
    }

    pub fn classify(&self, target: &str) -> RouteKind {
        let trimmed = target.trim();
        if trimmed.is_empty() {
            return RouteKind::InPage(None);
        }
        if let Some(name) = trimmed.strip_prefix(SCENE_TARGET_PREFIX) {
            return RouteKind::ScenePush(SceneName::from(name));
        }
        if let Ok(url) = Url::parse(trimmed) {
            if self.remote.handles_url(&url) {
                return RouteKind::RemoteView(url);
            }
            return RouteKind::ExternalNavigation(url);
        }
        let id = trimmed.strip_prefix('#').unwrap_or(trimmed);
        RouteKind::InPage(Some(ViewId::from(id)))
    }

    /// Claim and process directives until every handle is dropped.
    pub async fn run(mut self) {
        let Some(rx) = self.rx.take() else {
            return;
        };
        let mut stream = UnboundedReceiverStream::new(rx);
        while let Some(directive) = stream.next().await {
            self.route(directive).await;
        }
        info!("dispatcher intake closed");
    }

    pub(crate) async fn route(&self, directive: TransitionDirective) {
        match self.classify(&directive.target) {
            RouteKind::ScenePush(scene_name) => self.route_scene_push(scene_name, directive).await,
            RouteKind::InPage(target) => self.route_in_page(target, directive).await,
            RouteKind::RemoteView(url) => self.route_remote_view(url, directive).await,
            RouteKind::ExternalNavigation(url) => {
                if let Err(err) = self.navigator.navigate(&url) {
                    error!(%url, %err, "external navigation failed");
                }
            }
        }
    }

    async fn route_scene_push(&self, scene_name: SceneName, directive: TransitionDirective) {
        let Some(stage) = &self.stage else {
            warn!(scene = %scene_name, "no stage attached; scene push ignored");
            return;
        };
        let params = directive.extra_args.into_iter().next();
        match stage.push_scene(scene_name.clone(), params).await {
            Ok(outcome) => info!(scene = %scene_name, ?outcome, "scene push routed"),
            Err(err) => error!(scene = %scene_name, %err, "scene push failed"),
        }
    }

    async fn route_in_page(&self, target: Option<ViewId>, directive: TransitionDirective) {
        let Some(source) = self.resolve_source(&directive).await else {
            warn!(requested = %directive.target, "no enclosing source view; request ignored");
            return;
        };

        let resolved_target = match target {
            None => None,
            Some(id) => {
                if !self.engine.contains_view(&id).await {
                    error!(view = %id, "transition destination does not exist");
                    return;
                }
                let (root, inner_chain) = self.resolve_transition_root(&id).await;
                for view in inner_chain.iter().rev() {
                    if let Err(err) = self
                        .engine
                        .show(view, ShowOptions::default().suppress_events())
                        .await
                    {
                        error!(view = %view, %err, "failed to stage inner view chain");
                        return;
                    }
                }
                Some(root)
            }
        };

        let request = TransitionRequest {
            target: resolved_target,
            direction: directive.direction,
            effect: directive.effect,
            callback: directive.callback,
            extra_args: directive.extra_args,
        };
        match self.engine.perform_transition(&source, request).await {
            Ok(outcome) => info!(source = %source, ?outcome, "in-page transition routed"),
            Err(err) => error!(source = %source, %err, "in-page transition failed"),
        }
    }

    async fn route_remote_view(&self, url: Url, directive: TransitionDirective) {
        let Some(source) = self.resolve_source(&directive).await else {
            warn!(%url, "no enclosing source view; remote request ignored");
            return;
        };
        let view = match self.remote.resolve(&url, &self.engine).await {
            Ok(view) => view,
            Err(err) => {
                error!(%url, %err, "remote view load failed");
                return;
            }
        };
        let request = TransitionRequest {
            target: Some(view),
            direction: directive.direction,
            effect: directive.effect,
            callback: directive.callback,
            extra_args: directive.extra_args,
        };
        match self.engine.perform_transition(&source, request).await {
            Ok(outcome) => info!(source = %source, %url, ?outcome, "remote transition routed"),
            Err(err) => error!(source = %source, %url, %err, "remote transition failed"),
        }
    }

    async fn resolve_source(&self, directive: &TransitionDirective) -> Option<ViewId> {
        let origin = directive.origin.as_ref()?;
        self.engine.enclosing_view(origin).await
    }

    /// Climb from the target through currently-invisible ancestors: the
    /// animated transition runs at the outermost hidden ancestor, and the
    /// chain below it is shown without animation.
    async fn resolve_transition_root(&self, target: &ViewId) -> (ViewId, Vec<ViewId>) {
        let mut root = target.clone();
        let mut inner_chain = Vec::new();
        loop {
            match self.engine.parent_view(&root).await {
                Some(parent) if !self.engine.is_visible(&parent, false).await => {
                    inner_chain.push(root.clone());
                    root = parent;
                }
                _ => break,
            }
        }
        (root, inner_chain)
    }
}

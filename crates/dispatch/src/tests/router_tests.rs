use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use url::Url;

use scene_stack::{
    AssistantFactory, SceneAssistant, SceneNaming, SceneResources, StageConfig, StageController,
    StaticAssistantResolver, StaticTemplateSource,
};
use shared::{
    domain::{ContainerId, Direction, EffectName, SceneName, ViewId},
    protocol::{TransitionDirective, ViewEvent},
};
use view_core::{InstantDriver, ShowOptions, TransitionStyle, ViewEngine, ViewSpec};

use crate::{
    remote::{RemoteViewLoader, StaticViewDataSource},
    router::{Dispatcher, ExternalNavigator, MissingExternalNavigator, RouteKind},
};

struct RecordingNavigator {
    urls: Mutex<Vec<Url>>,
}

impl RecordingNavigator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            urls: Mutex::new(Vec::new()),
        })
    }
}

impl ExternalNavigator for RecordingNavigator {
    fn navigate(&self, url: &Url) -> Result<()> {
        self.urls.lock().expect("urls").push(url.clone());
        Ok(())
    }
}

struct NullAssistant;

#[async_trait]
impl SceneAssistant for NullAssistant {
    async fn setup(&self) -> Result<()> {
        Ok(())
    }

    async fn activate(&self, _params: Option<serde_json::Value>) {}

    async fn deactivate(&self) {}

    async fn destroy(&self) {}
}

fn effect() -> EffectName {
    EffectName::from("slide")
}

fn plain_loader() -> RemoteViewLoader {
    RemoteViewLoader::new(Arc::new(StaticViewDataSource::new()), "remote")
}

fn directive(target: &str) -> TransitionDirective {
    TransitionDirective::new(target, Direction::Forward, effect())
        .from_container(ContainerId::from("home-pane"))
}

/// Engine with two top-level views; "home" is visible and owns the
/// "home-pane" container the test directives bubble from.
async fn engine_with_home() -> Arc<ViewEngine> {
    let engine = ViewEngine::new(Arc::new(InstantDriver), TransitionStyle::Declarative);
    engine
        .register_container(ContainerId::from("root"), None, None)
        .await;
    for name in ["home", "overlay"] {
        engine
            .define_view(ViewSpec::new(name, "root"))
            .await
            .expect("define view");
    }
    engine
        .register_container(
            ContainerId::from("home-pane"),
            Some(ViewId::from("home")),
            Some(ContainerId::from("root")),
        )
        .await;
    engine
        .show(
            &ViewId::from("home"),
            ShowOptions::default().suppress_events(),
        )
        .await
        .expect("show home");
    engine
}

#[tokio::test]
async fn targets_classify_into_the_four_routes() {
    let engine = engine_with_home().await;
    let (dispatcher, _handle) = Dispatcher::new(
        engine,
        None,
        plain_loader(),
        Arc::new(MissingExternalNavigator),
    );

    assert_eq!(
        dispatcher.classify("overlay"),
        RouteKind::InPage(Some(ViewId::from("overlay")))
    );
    assert_eq!(
        dispatcher.classify("#overlay"),
        RouteKind::InPage(Some(ViewId::from("overlay")))
    );
    assert_eq!(dispatcher.classify(""), RouteKind::InPage(None));
    assert_eq!(
        dispatcher.classify("scene:detail"),
        RouteKind::ScenePush(SceneName::from("detail"))
    );
    assert_eq!(
        dispatcher.classify("http://content.test/page.html"),
        RouteKind::RemoteView(Url::parse("http://content.test/page.html").expect("url"))
    );
    assert_eq!(
        dispatcher.classify("https://content.test/report.pdf"),
        RouteKind::ExternalNavigation(
            Url::parse("https://content.test/report.pdf").expect("url")
        )
    );
}

#[tokio::test]
async fn in_page_requests_transition_from_the_enclosing_view() {
    let engine = engine_with_home().await;
    let (dispatcher, _handle) = Dispatcher::new(
        engine.clone(),
        None,
        plain_loader(),
        Arc::new(MissingExternalNavigator),
    );

    dispatcher.route(directive("overlay")).await;

    assert!(engine.is_visible(&ViewId::from("overlay"), false).await);
    assert!(!engine.is_visible(&ViewId::from("home"), false).await);
}

#[tokio::test]
async fn hidden_ancestors_become_the_transition_root() {
    let engine = engine_with_home().await;
    // A view nested inside the hidden "overlay".
    engine
        .register_container(
            ContainerId::from("overlay-pane"),
            Some(ViewId::from("overlay")),
            Some(ContainerId::from("root")),
        )
        .await;
    engine
        .define_view(ViewSpec::new("nested", "overlay-pane"))
        .await
        .expect("define nested");

    let (dispatcher, _handle) = Dispatcher::new(
        engine.clone(),
        None,
        plain_loader(),
        Arc::new(MissingExternalNavigator),
    );
    let mut events = engine.subscribe_events();

    dispatcher.route(directive("nested")).await;

    // The animated pair ran between the top-level siblings; the nested
    // view was staged silently.
    let mut before_out = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ViewEvent::BeforeTransitionOut { view, to, .. } = event {
            before_out.push((view, to));
        }
    }
    assert_eq!(
        before_out,
        vec![(ViewId::from("home"), Some(ViewId::from("overlay")))]
    );
    assert!(engine.is_visible(&ViewId::from("overlay"), false).await);
    assert!(engine.is_visible(&ViewId::from("nested"), true).await);
    assert!(!engine.is_visible(&ViewId::from("home"), false).await);
}

#[tokio::test]
async fn remote_targets_fetch_materialize_and_transition() {
    let engine = engine_with_home().await;
    let loader = RemoteViewLoader::new(
        Arc::new(StaticViewDataSource::new().register(
            "http://content.test/page.html",
            "text/html",
            "<p>remote</p>",
        )),
        "remote",
    );
    let (dispatcher, _handle) = Dispatcher::new(
        engine.clone(),
        None,
        loader,
        Arc::new(MissingExternalNavigator),
    );

    dispatcher.route(directive("http://content.test/page.html")).await;

    assert!(!engine.is_visible(&ViewId::from("home"), false).await);
    // Exactly one extra view exists and it is the visible one.
    assert_eq!(engine.view_count().await, 3);
}

#[tokio::test]
async fn unclaimed_urls_go_to_the_external_navigator() {
    let engine = engine_with_home().await;
    let navigator = RecordingNavigator::new();
    let (dispatcher, _handle) =
        Dispatcher::new(engine.clone(), None, plain_loader(), navigator.clone());

    dispatcher
        .route(directive("https://content.test/report.pdf"))
        .await;

    let urls = navigator.urls.lock().expect("urls").clone();
    assert_eq!(urls.len(), 1);
    assert_eq!(urls[0].as_str(), "https://content.test/report.pdf");
    // Nothing in the page changed.
    assert!(engine.is_visible(&ViewId::from("home"), false).await);
    assert_eq!(engine.view_count().await, 2);
}

#[tokio::test]
async fn scene_targets_push_onto_the_attached_stage() {
    let engine = ViewEngine::new(Arc::new(InstantDriver), TransitionStyle::Declarative);
    let factory: Arc<dyn AssistantFactory> =
        Arc::new(|| Arc::new(NullAssistant) as Arc<dyn SceneAssistant>);
    let resources = SceneResources::new(
        Arc::new(StaticTemplateSource::new().register("main", "<view name='main'/>")),
        Arc::new(StaticAssistantResolver::new().register("main", factory)),
    )
    .with_naming(SceneNaming::flat());
    let stage = StageController::new(
        engine.clone(),
        resources,
        StageConfig::new("stage", effect()),
    )
    .await;

    let (dispatcher, _handle) = Dispatcher::new(
        engine,
        Some(stage.clone()),
        plain_loader(),
        Arc::new(MissingExternalNavigator),
    );

    let mut push = TransitionDirective::new("scene:main", Direction::Forward, effect());
    push.extra_args = vec![json!({ "tab": "inbox" })];
    dispatcher.route(push).await;

    assert_eq!(stage.depth().await, 1);
    assert_eq!(
        stage.active_scene().await.expect("top").scene_name(),
        &SceneName::from("main")
    );
}

#[tokio::test]
async fn requests_without_a_resolvable_source_are_ignored() {
    let engine = engine_with_home().await;
    let (dispatcher, _handle) = Dispatcher::new(
        engine.clone(),
        None,
        plain_loader(),
        Arc::new(MissingExternalNavigator),
    );

    // No origin container at all.
    dispatcher
        .route(TransitionDirective::new("overlay", Direction::Forward, effect()))
        .await;
    assert!(engine.is_visible(&ViewId::from("home"), false).await);

    // Origin that no view encloses.
    dispatcher
        .route(
            TransitionDirective::new("overlay", Direction::Forward, effect())
                .from_container(ContainerId::from("root")),
        )
        .await;
    assert!(engine.is_visible(&ViewId::from("home"), false).await);
}

#[tokio::test]
async fn handle_feeds_the_intake_loop() {
    let engine = engine_with_home().await;
    let (dispatcher, handle) = Dispatcher::new(
        engine.clone(),
        None,
        plain_loader(),
        Arc::new(MissingExternalNavigator),
    );
    let running = tokio::spawn(dispatcher.run());

    assert!(handle.submit(directive("overlay")));
    for _ in 0..1000 {
        if engine.is_visible(&ViewId::from("overlay"), false).await {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(engine.is_visible(&ViewId::from("overlay"), false).await);

    // Dropping the last handle shuts the intake down.
    drop(handle);
    running.await.expect("dispatcher stopped");
}

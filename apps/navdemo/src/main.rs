use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use serde_json::{json, Value};
use tracing::info;

use dispatch::{
    load_settings, Dispatcher, ExternalNavigator, RemoteViewLoader, StaticViewDataSource,
};
use scene_stack::{
    AssistantFactory, SceneAssistant, SceneNaming, SceneResources, StageConfig, StageController,
    StaticAssistantResolver, StaticTemplateSource,
};
use shared::{
    domain::{ContainerId, Direction, EffectName, SceneName},
    protocol::TransitionDirective,
};
use view_core::{InstantDriver, ViewEngine};

#[derive(Parser, Debug)]
struct Args {
    /// Transition effect used for stack navigation.
    #[arg(long, default_value = "slide")]
    effect: String,
}

struct DemoAssistant {
    name: &'static str,
}

#[async_trait]
impl SceneAssistant for DemoAssistant {
    async fn setup(&self) -> Result<()> {
        info!(scene = self.name, "assistant setup");
        Ok(())
    }

    async fn activate(&self, params: Option<Value>) {
        info!(scene = self.name, ?params, "assistant activated");
    }

    async fn deactivate(&self) {
        info!(scene = self.name, "assistant deactivated");
    }

    async fn destroy(&self) {
        info!(scene = self.name, "assistant destroyed");
    }
}

struct LoggingNavigator;

impl ExternalNavigator for LoggingNavigator {
    fn navigate(&self, url: &url::Url) -> Result<()> {
        info!(%url, "handing navigation to the platform");
        Ok(())
    }
}

fn demo_resources() -> SceneResources {
    let mut templates = StaticTemplateSource::new();
    let mut resolver = StaticAssistantResolver::new();
    for name in ["home", "detail", "about"] {
        templates = templates.register(name, format!("<view name='{name}'/>"));
        let factory: Arc<dyn AssistantFactory> =
            Arc::new(move || Arc::new(DemoAssistant { name }) as Arc<dyn SceneAssistant>);
        resolver = resolver.register(name, factory);
    }
    SceneResources::new(Arc::new(templates), Arc::new(resolver))
        .with_naming(SceneNaming::flat())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();
    let settings = load_settings();

    let engine = ViewEngine::new(Arc::new(InstantDriver), settings.transition_style());
    let mut events = engine.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            info!(?event, "bus");
        }
    });

    let stage = StageController::new(
        engine.clone(),
        demo_resources(),
        StageConfig::new("stage", EffectName::from(args.effect.as_str())).preserve_scroll(),
    )
    .await;

    stage.push_scene(SceneName::from("home"), None).await?;
    stage
        .push_scene(SceneName::from("detail"), Some(json!({ "id": 7 })))
        .await?;
    stage.push_scene(SceneName::from("about"), None).await?;
    stage
        .pop_scenes_to(&SceneName::from("home"), Some(json!("back home")))
        .await?;
    info!(depth = stage.depth().await, "stack settled");

    // Route a couple of raw directives through the dispatcher: one remote
    // view and one URL the platform has to take over.
    let home_view = stage
        .active_scene()
        .await
        .expect("home on top")
        .view()
        .clone();
    engine
        .register_container(ContainerId::from("demo-pane"), Some(home_view), None)
        .await;

    let loader = RemoteViewLoader::new(
        Arc::new(StaticViewDataSource::new().register(
            "http://demo.local/promo.html",
            "text/html",
            "<p>seasonal promo</p>",
        )),
        "remote",
    );
    let (dispatcher, handle) = Dispatcher::new(
        engine.clone(),
        Some(stage.clone()),
        loader,
        Arc::new(LoggingNavigator),
    );
    let running = tokio::spawn(dispatcher.run());

    handle.submit(
        TransitionDirective::new(
            "http://demo.local/promo.html",
            Direction::Forward,
            settings.effect(),
        )
        .from_container(ContainerId::from("demo-pane")),
    );
    handle.submit(
        TransitionDirective::new(
            "https://example.com/manual.pdf",
            Direction::Forward,
            settings.effect(),
        )
        .from_container(ContainerId::from("demo-pane")),
    );

    drop(handle);
    running.await?;

    println!(
        "final stack: {:?}, views in registry: {}",
        stage
            .scene_names()
            .await
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>(),
        engine.view_count().await
    );
    Ok(())
}

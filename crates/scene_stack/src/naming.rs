use shared::domain::SceneName;

/// Derives resource paths from a scene name. `{name}` in a pattern is
/// replaced by the scene name; applications override the patterns to
/// match their asset layout.
#[derive(Debug, Clone)]
pub struct SceneNaming {
    pub template_pattern: String,
    pub assistant_pattern: String,
}

impl Default for SceneNaming {
    fn default() -> Self {
        Self {
            template_pattern: "views/{name}.html".to_string(),
            assistant_pattern: "assistants/{name}".to_string(),
        }
    }
}

impl SceneNaming {
    pub fn new(
        template_pattern: impl Into<String>,
        assistant_pattern: impl Into<String>,
    ) -> Self {
        Self {
            template_pattern: template_pattern.into(),
            assistant_pattern: assistant_pattern.into(),
        }
    }

    /// Identity mapping, handy when resources are registered directly
    /// under their scene names.
    pub fn flat() -> Self {
        Self::new("{name}", "{name}")
    }

    pub fn template_path(&self, scene: &SceneName) -> String {
        self.template_pattern.replace("{name}", scene.as_str())
    }

    pub fn assistant_path(&self, scene: &SceneName) -> String {
        self.assistant_pattern.replace("{name}", scene.as_str())
    }
}

use std::{collections::HashMap, fs};

use serde::Deserialize;

use scene_stack::SceneNaming;
use shared::domain::EffectName;
use view_core::TransitionStyle;

use crate::remote::HttpViewDataSource;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub default_effect: String,
    pub transition_style: String,
    pub template_pattern: String,
    pub assistant_pattern: String,
    pub remote_body_limit_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_effect: "slide".into(),
            transition_style: "declarative".into(),
            template_pattern: "views/{name}.html".into(),
            assistant_pattern: "assistants/{name}".into(),
            remote_body_limit_bytes: 512 * 1024,
        }
    }
}

impl Settings {
    pub(crate) fn merge_toml(&mut self, raw: &str) {
        let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
            return;
        };
        if let Some(v) = file_cfg.get("default_effect").and_then(|v| v.as_str()) {
            self.default_effect = v.to_string();
        }
        if let Some(v) = file_cfg.get("transition_style").and_then(|v| v.as_str()) {
            self.transition_style = v.to_string();
        }
        if let Some(v) = file_cfg.get("template_pattern").and_then(|v| v.as_str()) {
            self.template_pattern = v.to_string();
        }
        if let Some(v) = file_cfg.get("assistant_pattern").and_then(|v| v.as_str()) {
            self.assistant_pattern = v.to_string();
        }
        if let Some(v) = file_cfg
            .get("remote_body_limit_bytes")
            .and_then(|v| v.as_integer())
        {
            if v > 0 {
                self.remote_body_limit_bytes = v as usize;
            }
        }
    }

    fn merge_env(&mut self) {
        if let Ok(v) = std::env::var("APP__DEFAULT_EFFECT") {
            self.default_effect = v;
        }
        if let Ok(v) = std::env::var("APP__TRANSITION_STYLE") {
            self.transition_style = v;
        }
        if let Ok(v) = std::env::var("APP__TEMPLATE_PATTERN") {
            self.template_pattern = v;
        }
        if let Ok(v) = std::env::var("APP__ASSISTANT_PATTERN") {
            self.assistant_pattern = v;
        }
        if let Ok(v) = std::env::var("APP__REMOTE_BODY_LIMIT_BYTES") {
            if let Ok(parsed) = v.parse::<usize>() {
                self.remote_body_limit_bytes = parsed;
            }
        }
    }

    pub fn effect(&self) -> EffectName {
        EffectName::from(self.default_effect.as_str())
    }

    pub fn naming(&self) -> SceneNaming {
        SceneNaming::new(&self.template_pattern, &self.assistant_pattern)
    }

    /// Unrecognized style names fall back to the declarative default; a
    /// custom animator can only be injected in code.
    pub fn transition_style(&self) -> TransitionStyle {
        match self.transition_style.as_str() {
            "none" => TransitionStyle::None,
            _ => TransitionStyle::Declarative,
        }
    }

    pub fn view_data_source(&self) -> HttpViewDataSource {
        HttpViewDataSource::with_body_limit(self.remote_body_limit_bytes)
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string("engine.toml") {
        settings.merge_toml(&raw);
    }
    settings.merge_env();
    settings
}

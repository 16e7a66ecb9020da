use crate::config::Settings;
use view_core::TransitionStyle;

#[test]
fn defaults_cover_every_knob() {
    let settings = Settings::default();
    assert_eq!(settings.default_effect, "slide");
    assert_eq!(settings.transition_style, "declarative");
    assert_eq!(settings.template_pattern, "views/{name}.html");
    assert_eq!(settings.assistant_pattern, "assistants/{name}");
    assert_eq!(settings.remote_body_limit_bytes, 512 * 1024);
}

#[test]
fn toml_overrides_replace_only_named_keys() {
    let mut settings = Settings::default();
    settings.merge_toml(
        r#"
        default_effect = "fade"
        template_pattern = "tpl/{name}.tmpl"
        remote_body_limit_bytes = 1024
        "#,
    );
    assert_eq!(settings.default_effect, "fade");
    assert_eq!(settings.template_pattern, "tpl/{name}.tmpl");
    assert_eq!(settings.remote_body_limit_bytes, 1024);
    // Untouched keys keep their defaults.
    assert_eq!(settings.transition_style, "declarative");
    assert_eq!(settings.assistant_pattern, "assistants/{name}");
}

#[test]
fn malformed_toml_is_ignored() {
    let mut settings = Settings::default();
    settings.merge_toml("default_effect = [not toml");
    assert_eq!(settings.default_effect, "slide");
}

#[test]
fn non_positive_body_limit_is_rejected() {
    let mut settings = Settings::default();
    settings.merge_toml("remote_body_limit_bytes = -5");
    assert_eq!(settings.remote_body_limit_bytes, 512 * 1024);
}

#[test]
fn style_and_naming_map_to_engine_types() {
    let mut settings = Settings::default();
    assert!(matches!(
        settings.transition_style(),
        TransitionStyle::Declarative
    ));

    settings.transition_style = "none".into();
    assert!(matches!(settings.transition_style(), TransitionStyle::None));

    settings.transition_style = "bogus".into();
    assert!(matches!(
        settings.transition_style(),
        TransitionStyle::Declarative
    ));

    settings.template_pattern = "tpl/{name}.tmpl".into();
    let naming = settings.naming();
    assert_eq!(
        naming.template_path(&shared::domain::SceneName::from("main")),
        "tpl/main.tmpl"
    );
    assert_eq!(settings.effect().as_str(), "slide");
}

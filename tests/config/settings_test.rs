use std::time::Duration;

use palaver::config::{ChatSettings, Environment};

#[test]
fn given_environment_strings_when_parsing_then_known_names_resolve() {
    assert_eq!(
        Environment::try_from("local".to_string()),
        Ok(Environment::Local)
    );
    assert_eq!(
        Environment::try_from("PROD".to_string()),
        Ok(Environment::Prod)
    );
    assert_eq!(
        Environment::try_from("production".to_string()),
        Ok(Environment::Prod)
    );
    assert!(Environment::try_from("staging".to_string()).is_err());
}

#[test]
fn given_timeout_seconds_when_converting_then_duration_matches() {
    let with_timeout = ChatSettings {
        completion_timeout_seconds: Some(30),
        ..ChatSettings::default()
    };
    assert_eq!(
        with_timeout.completion_timeout(),
        Some(Duration::from_secs(30))
    );

    let without = ChatSettings::default();
    assert_eq!(without.completion_timeout(), None);
}

#[test]
fn given_default_chat_settings_when_inspected_then_nothing_is_forced() {
    let settings = ChatSettings::default();
    assert!(settings.system_prompt.is_none());
    assert!(settings.temperature.is_none());
    assert!(settings.max_tokens.is_none());
}

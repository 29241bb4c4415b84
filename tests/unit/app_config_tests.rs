/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use subvoice::app_config::{Config, LogLevel, NamedVoice};
use subvoice::errors::ConfigError;

use crate::common;

#[test]
fn test_from_reader_withValidJson_shouldApplyDefaults() -> Result<()> {
    let config = Config::from_reader(common::test_config_json().as_bytes())?;

    assert_eq!(config.provider.api_key, "test-key");
    assert_eq!(config.provider.endpoint, "https://api.elevenlabs.io");
    assert_eq!(config.provider.model_id, "eleven_multilingual_v2");
    assert_eq!(config.provider.timeout_secs, 30);
    assert_eq!(config.default.speed, 1.0);
    assert_eq!(config.voices.len(), 2);
    assert_eq!(config.voices[1].speed, 1.1);
    assert_eq!(config.log_level, LogLevel::Info);
    Ok(())
}

#[test]
fn test_from_reader_withUnknownField_shouldRejectConfig() {
    let json = r#"{
  "provider": { "api_key": "k" },
  "default": { "model": "m", "name": "Narrator" },
  "colour": "blue"
}"#;
    let result = Config::from_reader(json.as_bytes());
    assert!(matches!(result, Err(ConfigError::Malformed { .. })));
}

#[test]
fn test_validate_withVariousConfigs_shouldValidateCorrectly() {
    let config = common::test_config();
    assert!(config.validate().is_ok());

    let mut missing_key = common::test_config();
    missing_key.provider.api_key = " ".to_string();
    assert!(matches!(missing_key.validate(), Err(ConfigError::Invalid(_))));

    let mut missing_model = common::test_config();
    missing_model.default.model.clear();
    assert!(missing_model.validate().is_err());

    let mut duplicate = common::test_config();
    duplicate.voices.push(NamedVoice::new("Alice", "other", "Alice2", 1.0));
    assert!(duplicate.validate().is_err());

    let mut shadowing = common::test_config();
    shadowing.voices.push(NamedVoice::new("Carol", "carol-model", "Narrator", 1.0));
    assert!(shadowing.validate().is_err());

    let mut bad_speed = common::test_config();
    bad_speed.voices[0].speed = 0.0;
    assert!(bad_speed.validate().is_err());
}

#[test]
fn test_merge_threshold_ms_withOverride_shouldPreferPositiveCliValue() {
    let mut config = common::test_config();
    config.merge_lines_threshold_ms = 300;

    assert_eq!(config.merge_threshold_ms(None), 300);
    assert_eq!(config.merge_threshold_ms(Some(800)), 800);
    assert_eq!(config.merge_threshold_ms(Some(0)), 300);
    assert_eq!(config.merge_threshold_ms(Some(-5)), 300);
}

#[test]
fn test_load_withMissingFile_shouldReportUnreadable() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let result = Config::load(temp_dir.path().join("missing.json"));
    assert!(matches!(result, Err(ConfigError::Unreadable { .. })));
    Ok(())
}

#[test]
fn test_load_withMalformedFile_shouldCarryPath() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "config.json", "{ not json")?;

    match Config::load(&path) {
        Err(ConfigError::Malformed { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected malformed config error, got {:?}", other),
    }
    Ok(())
}

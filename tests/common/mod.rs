/*!
 * Common test utilities for the subvoice test suite
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use subvoice::app_config::{Config, NamedVoice, ProviderConfig, VoiceEntry};
use subvoice::clip_cache::ClipIdentity;
use subvoice::fetcher::PendingClip;
use subvoice::merger::{MergedCue, SourceCue};
use subvoice::speaker::VoiceConfig;

/// Route pipeline logs to the test harness; set RUST_LOG to see them
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Configuration with a default narrator and two named voices
pub fn test_config() -> Config {
    Config {
        provider: ProviderConfig {
            api_key: "test-key".to_string(),
            ..ProviderConfig::default()
        },
        default: VoiceEntry {
            model: "narrator-model".to_string(),
            name: "Narrator".to_string(),
            speed: 1.0,
        },
        voices: vec![
            NamedVoice::new("Alice", "alice-model", "Alice", 1.0),
            NamedVoice::new("Bob", "bob-model", "Bob", 1.1),
        ],
        merge_lines_threshold_ms: 0,
        log_level: Default::default(),
    }
}

/// The same configuration as JSON
pub fn test_config_json() -> &'static str {
    r#"{
  "provider": { "api_key": "test-key" },
  "default": { "model": "narrator-model", "name": "Narrator" },
  "voices": [
    { "key": "Alice", "model": "alice-model", "name": "Alice" },
    { "key": "Bob", "model": "bob-model", "name": "Bob", "speed": 1.1 }
  ],
  "merge_lines_threshold_ms": 0
}"#
}

/// Default voice at 0-1000ms, Alice at 500-1500ms
pub fn two_voice_srt() -> &'static str {
    "1
00:00:00,000 --> 00:00:01,000
Welcome to the show.

2
00:00:00,500 --> 00:00:01,500
[Alice] Thanks for having me.
"
}

/// Two default-voice lines where the first runs into the second
pub fn overlapping_srt() -> &'static str {
    "1
00:00:00,000 --> 00:00:00,500
First line.

2
00:00:00,600 --> 00:00:01,200
Second line.
"
}

/// A voice on a given channel
pub fn voice(model: &str, name: &str, channel: usize) -> VoiceConfig {
    VoiceConfig {
        model: model.to_string(),
        name: name.to_string(),
        speed: 1.0,
        channel,
    }
}

/// A single-source merged cue
pub fn merged_cue(index: usize, start_ms: u64, end_ms: u64, text: &str) -> MergedCue {
    MergedCue {
        index,
        start_ms,
        end_ms,
        text: text.to_string(),
        speaker: None,
        sources: vec![SourceCue {
            index,
            start_ms,
            end_ms,
            text: text.to_string(),
        }],
    }
}

/// A pending clip, rendered under `request_id` when given
pub fn pending_clip(index: usize, text: &str, request_id: Option<&str>) -> PendingClip {
    let voice = voice("narrator-model", "Narrator", 0);
    let mut identity = ClipIdentity::derive(&voice, text, "wav");
    if let Some(id) = request_id {
        identity.path = Some(PathBuf::from(identity.file_name(id)));
        identity.request_id = Some(id.to_string());
    }
    PendingClip {
        cue: merged_cue(index, index as u64 * 1000, index as u64 * 1000 + 900, text),
        voice,
        identity,
    }
}

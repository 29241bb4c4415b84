/*!
 * Speaker resolution and voice/channel assignment.
 *
 * A cue names its speaker with, in priority order, a voice tag, a leading
 * comment, or a `[Name] text` prefix. The resolved identity is looked up in
 * the voice table, which also fixes each voice's output channel.
 */

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::{Config, NamedVoice, VoiceEntry};
use crate::subtitle_processor::Cue;

// @const: `[Name] remaining text`
static BRACKET_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*\[([^\]]+)\]\s*(.+)$").unwrap()
});

/// Speaker identity and the text left once any inline prefix is removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerTag {
    /// Resolved identity; `None` means the default voice
    pub identity: Option<String>,

    /// Text to synthesize
    pub text: String,
}

/// Resolve a cue's speaker: voice tag, then leading comment, then bracketed prefix
pub fn resolve_speaker(cue: &Cue) -> SpeakerTag {
    let text = cue.text.trim();

    if let Some(voice) = cue.voice.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        return SpeakerTag {
            identity: Some(voice.to_string()),
            text: text.to_string(),
        };
    }

    if let Some(comment) = cue.comments.first().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        return SpeakerTag {
            identity: Some(comment.to_string()),
            text: text.to_string(),
        };
    }

    if let Some(caps) = BRACKET_PREFIX_REGEX.captures(text) {
        let name = caps[1].trim();
        if !name.is_empty() {
            return SpeakerTag {
                identity: Some(name.to_string()),
                text: caps[2].trim().to_string(),
            };
        }
    }

    SpeakerTag {
        identity: None,
        text: text.to_string(),
    }
}

/// A voice as used for one clip, including its output channel
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceConfig {
    /// Voice model id at the synthesis service; empty when unconfigured
    pub model: String,

    /// Display name
    pub name: String,

    /// Speech rate
    pub speed: f32,

    /// Output channel
    pub channel: usize,
}

impl VoiceConfig {
    /// Whether the synthesis service can render this voice
    pub fn is_configured(&self) -> bool {
        !self.model.trim().is_empty()
    }
}

/// Lookup table from speaker identity to voice configuration
#[derive(Debug, Clone)]
pub struct VoiceTable {
    default: VoiceEntry,
    voices: Vec<NamedVoice>,
    channels: HashMap<String, usize>,
}

impl VoiceTable {
    /// Build the table; channels follow table order, default voice on channel 0
    pub fn new(default: VoiceEntry, voices: Vec<NamedVoice>) -> Self {
        let mut channels = HashMap::new();
        channels.insert(default.name.clone(), 0);

        let mut next_channel = 1;
        for voice in &voices {
            if !channels.contains_key(&voice.name) {
                channels.insert(voice.name.clone(), next_channel);
                next_channel += 1;
            }
        }

        Self {
            default,
            voices,
            channels,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.default.clone(), config.voices.clone())
    }

    /// Number of channels the table can address
    pub fn channel_count(&self) -> usize {
        self.channels.values().max().map_or(1, |max| max + 1)
    }

    /// Channel assigned to a display name
    pub fn channel_of(&self, name: &str) -> Option<usize> {
        self.channels.get(name).copied()
    }

    /// The default voice on channel 0
    pub fn default_voice(&self) -> VoiceConfig {
        VoiceConfig {
            model: self.default.model.clone(),
            name: self.default.name.clone(),
            speed: self.default.speed,
            channel: 0,
        }
    }

    /// Map a resolved identity to its voice.
    ///
    /// Identities missing from the table yield an empty configuration unless
    /// they name the default voice; the empty model is reported when the clip
    /// is rendered.
    pub fn resolve(&self, identity: Option<&str>) -> VoiceConfig {
        let Some(identity) = identity else {
            return self.default_voice();
        };

        if let Some(named) = self.voices.iter().find(|v| v.key == identity) {
            return VoiceConfig {
                model: named.model.clone(),
                name: named.name.clone(),
                speed: named.speed,
                channel: self.channel_of(&named.name).unwrap_or(0),
            };
        }

        if identity == self.default.name {
            return self.default_voice();
        }

        VoiceConfig {
            model: String::new(),
            name: String::new(),
            speed: self.default.speed,
            channel: 0,
        }
    }
}

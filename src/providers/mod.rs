/*!
 * Speech synthesis providers.
 *
 * This module contains the client implementations the pipeline can render with:
 * - ElevenLabs: hosted text-to-speech API
 * - Mock: deterministic tone generator for tests
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One synthesis request
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    /// Text to speak
    pub text: String,

    /// Voice model id at the service
    pub voice_model: String,

    /// Speech rate
    pub speed: f32,

    /// Ask the service to boost speaker similarity
    pub speaker_boost: bool,

    /// Request ids of already rendered clips before this one, nearest first
    pub previous_request_ids: Vec<String>,

    /// Request ids of already rendered clips after this one, nearest first
    pub next_request_ids: Vec<String>,

    /// Text of the next clip that has not been rendered yet
    pub next_text: Option<String>,
}

impl SpeechRequest {
    /// Request without continuity hints
    pub fn new(text: impl Into<String>, voice_model: impl Into<String>, speed: f32) -> Self {
        Self {
            text: text.into(),
            voice_model: voice_model.into(),
            speed,
            speaker_boost: true,
            previous_request_ids: Vec::new(),
            next_request_ids: Vec::new(),
            next_text: None,
        }
    }
}

/// Encoded audio plus the id the service assigned to the request
#[derive(Debug, Clone)]
pub struct SpeechResponse {
    pub audio: Bytes,
    pub request_id: String,
}

/// Common trait for all synthesis providers
///
/// The pipeline issues requests one at a time and in script order, so
/// implementations don't need to handle concurrent calls.
#[async_trait]
pub trait SpeechProvider: Send + Sync + Debug {
    /// Render one line of speech
    ///
    /// # Arguments
    /// * `request` - Text, voice and continuity hints
    ///
    /// # Returns
    /// * `Result<SpeechResponse, ProviderError>` - Encoded clip and request id, or an error
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse, ProviderError>;

    /// Container extension of the clips this provider returns
    fn clip_extension(&self) -> &str;
}

pub mod elevenlabs;
pub mod mock;

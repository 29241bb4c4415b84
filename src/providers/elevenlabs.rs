use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::errors::ProviderError;
use crate::providers::{SpeechProvider, SpeechRequest, SpeechResponse};

/// Output format requested from the API; matches the mixer's 44.1 kHz
const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// Response header carrying the request id
const REQUEST_ID_HEADER: &str = "request-id";

/// ElevenLabs client for the text-to-speech endpoint
#[derive(Debug)]
pub struct ElevenLabs {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to public API)
    endpoint: String,
    /// Engine model, e.g. `eleven_multilingual_v2`
    model_id: String,
}

/// Voice settings sent with each request
#[derive(Debug, Serialize)]
pub struct VoiceSettings {
    pub use_speaker_boost: bool,
    pub speed: f32,
}

/// Text-to-speech request body
#[derive(Debug, Serialize)]
pub struct TextToSpeechRequest {
    /// The text to speak
    pub text: String,

    /// The engine model
    pub model_id: String,

    pub voice_settings: VoiceSettings,

    /// Request ids of preceding clips
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub previous_request_ids: Vec<String>,

    /// Request ids of following clips
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub next_request_ids: Vec<String>,

    /// Text of the next line when it has no request id yet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_text: Option<String>,
}

impl ElevenLabs {
    /// Create a new ElevenLabs client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model_id: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model_id: model_id.into(),
        }
    }

    /// Build the JSON body for a request
    pub fn build_body(&self, request: SpeechRequest) -> TextToSpeechRequest {
        TextToSpeechRequest {
            text: request.text,
            model_id: self.model_id.clone(),
            voice_settings: VoiceSettings {
                use_speaker_boost: request.speaker_boost,
                speed: request.speed,
            },
            previous_request_ids: request.previous_request_ids,
            next_request_ids: request.next_request_ids,
            next_text: request.next_text.filter(|t| !t.is_empty()),
        }
    }

    fn api_url(&self, voice_model: &str) -> String {
        let base = if self.endpoint.is_empty() {
            "https://api.elevenlabs.io"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/v1/text-to-speech/{}?output_format={}", base, voice_model, OUTPUT_FORMAT)
    }
}

#[async_trait]
impl SpeechProvider for ElevenLabs {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse, ProviderError> {
        let api_url = self.api_url(&request.voice_model);
        let body = self.build_body(request);
        debug!(
            "POST {} (previous: {:?}, next: {:?})",
            api_url, body.previous_request_ids, body.next_request_ids
        );

        let response = self.client.post(&api_url)
            .header("Content-Type", "application/json")
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("ElevenLabs API error ({}): {}", status, error_text);
            return Err(match status {
                StatusCode::UNAUTHORIZED => ProviderError::AuthenticationError(error_text),
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(error_text),
                _ => ProviderError::ApiError {
                    status_code: status.as_u16(),
                    message: error_text,
                },
            });
        }

        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ProviderError::ParseError(format!("missing {} header", REQUEST_ID_HEADER)))?;

        let audio = response.bytes().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to read audio body: {}", e)))?;
        if audio.is_empty() {
            return Err(ProviderError::ParseError("empty audio body".to_string()));
        }

        Ok(SpeechResponse { audio, request_id })
    }

    fn clip_extension(&self) -> &str {
        "mp3"
    }
}

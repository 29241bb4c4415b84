/*!
 * Mock provider implementation for testing.
 *
 * This module provides a mock provider that renders deterministic WAV tones:
 * - `MockProvider::working(ms)` - Always succeeds with a clip of `ms` milliseconds
 * - `MockProvider::fail_after(n, ms)` - Succeeds `n` times, then fails
 * - `MockProvider::failing()` - Always fails with an error
 */

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::errors::ProviderError;
use crate::mixer::SAMPLE_RATE;
use crate::providers::{SpeechProvider, SpeechRequest, SpeechResponse};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Succeeds for the first `successes` requests, then fails
    FailAfter { successes: usize },
    /// Always fails with an error
    Failing,
}

/// Mock provider for testing the pipeline without network access
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Length of every rendered clip
    clip_ms: u64,
    /// Peak value of the generated tone
    amplitude: i16,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every request received, in order
    requests: Arc<Mutex<Vec<SpeechRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior, clip_ms: u64) -> Self {
        Self {
            behavior,
            clip_ms,
            amplitude: 1000,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working(clip_ms: u64) -> Self {
        Self::new(MockBehavior::Working, clip_ms)
    }

    /// Create a mock that fails once `successes` requests have been served
    pub fn fail_after(successes: usize, clip_ms: u64) -> Self {
        Self::new(MockBehavior::FailAfter { successes }, clip_ms)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing, 0)
    }

    /// Set the tone amplitude
    pub fn with_amplitude(mut self, amplitude: i16) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copy of every request received so far
    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.requests.lock().clone()
    }

    /// 44.1 kHz mono 16-bit WAV of `duration_ms` whose samples alternate
    /// between `amplitude` and `-amplitude`
    pub fn tone_wav(duration_ms: u64, amplitude: i16) -> Result<Vec<u8>, hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let frames = duration_ms * SAMPLE_RATE as u64 / 1000;

        let mut buffer = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut buffer), spec)?;
            for i in 0..frames {
                let sample = if i % 2 == 0 { amplitude } else { -amplitude };
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }
        Ok(buffer)
    }
}

#[async_trait]
impl SpeechProvider for MockProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request);

        let fail = match self.behavior {
            MockBehavior::Working => false,
            MockBehavior::FailAfter { successes } => count >= successes,
            MockBehavior::Failing => true,
        };
        if fail {
            return Err(ProviderError::ApiError {
                message: format!("Simulated provider failure (request #{})", count + 1),
                status_code: 500,
            });
        }

        let audio = Self::tone_wav(self.clip_ms, self.amplitude)
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(SpeechResponse {
            audio: Bytes::from(audio),
            request_id: format!("mock-{}", count + 1),
        })
    }

    fn clip_extension(&self) -> &str {
        "wav"
    }
}

/*!
 * Tests for speech provider implementations
 */

use subvoice::errors::ProviderError;
use subvoice::providers::elevenlabs::ElevenLabs;
use subvoice::providers::mock::{MockBehavior, MockProvider};
use subvoice::providers::{SpeechProvider, SpeechRequest};

#[test]
fn test_speech_request_new_shouldEnableSpeakerBoostWithoutHints() {
    let request = SpeechRequest::new("Hello", "voice-1", 1.25);

    assert_eq!(request.text, "Hello");
    assert_eq!(request.voice_model, "voice-1");
    assert_eq!(request.speed, 1.25);
    assert!(request.speaker_boost);
    assert!(request.previous_request_ids.is_empty());
    assert!(request.next_request_ids.is_empty());
    assert_eq!(request.next_text, None);
}

#[test]
fn test_build_body_withHints_shouldSerializeAllFields() {
    let client = ElevenLabs::new("key", "https://api.elevenlabs.io", "eleven_multilingual_v2", 30);
    let mut request = SpeechRequest::new("Line two", "voice-1", 0.9);
    request.previous_request_ids = vec!["p1".to_string(), "p2".to_string()];
    request.next_request_ids = vec!["n1".to_string()];
    request.next_text = Some("Line three".to_string());

    let json = serde_json::to_value(client.build_body(request)).unwrap();

    assert_eq!(json["text"], "Line two");
    assert_eq!(json["previous_request_ids"], serde_json::json!(["p1", "p2"]));
    assert_eq!(json["next_request_ids"], serde_json::json!(["n1"]));
    assert_eq!(json["next_text"], "Line three");
    assert!((json["voice_settings"]["speed"].as_f64().unwrap() - 0.9).abs() < 1e-6);
}

#[test]
fn test_build_body_withEmptyNextText_shouldOmitIt() {
    let client = ElevenLabs::new("key", "", "m", 30);
    let mut request = SpeechRequest::new("x", "v", 1.0);
    request.next_text = Some(String::new());

    let json = serde_json::to_value(client.build_body(request)).unwrap();
    assert!(json.get("next_text").is_none());
}

#[test]
fn test_clip_extension_shouldMatchContainer() {
    let client = ElevenLabs::new("key", "", "m", 30);
    assert_eq!(client.clip_extension(), "mp3");
    assert_eq!(MockProvider::working(10).clip_extension(), "wav");
}

#[tokio::test]
async fn test_synthesize_withUnreachableEndpoint_shouldReturnConnectionError() {
    let client = ElevenLabs::new("key", "http://127.0.0.1:1", "m", 2);
    let result = client.synthesize(SpeechRequest::new("x", "v", 1.0)).await;

    assert!(matches!(
        result,
        Err(ProviderError::ConnectionError(_)) | Err(ProviderError::RequestFailed(_))
    ));
}

#[tokio::test]
async fn test_mock_failing_shouldAlwaysError() {
    let provider = MockProvider::failing();
    for _ in 0..2 {
        let result = provider.synthesize(SpeechRequest::new("x", "v", 1.0)).await;
        assert!(matches!(result, Err(ProviderError::ApiError { status_code: 500, .. })));
    }
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn test_mock_clone_shouldShareCounters() {
    let provider = MockProvider::new(MockBehavior::Working, 10).with_amplitude(10);
    let clone = provider.clone();

    clone.synthesize(SpeechRequest::new("x", "v", 1.0)).await.unwrap();

    assert_eq!(provider.request_count(), 1);
    assert_eq!(provider.requests()[0].text, "x");
}

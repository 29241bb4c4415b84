/*!
 * Tests for continuity hints and clip fetching
 */

use anyhow::Result;
use subvoice::clip_cache::{ClipStore, MemoryClipStore};
use subvoice::errors::{AppError, ConfigError};
use subvoice::fetcher::{ClipFetcher, ContinuityHints, plan_clips};
use subvoice::merger::merge_cues;
use subvoice::providers::mock::MockProvider;
use subvoice::speaker::VoiceTable;
use subvoice::subtitle_processor::Cue;

use crate::common::{self, pending_clip};

#[test]
fn test_around_withAllNeighboursRendered_shouldTakeThreeEachSide() {
    let clips: Vec<_> = (0..8)
        .map(|i| {
            let id = format!("r{}", i);
            pending_clip(i, &format!("line {}", i), if i == 4 { None } else { Some(id.as_str()) })
        })
        .collect();

    let hints = ContinuityHints::around(&clips, 4);

    assert_eq!(hints.previous_request_ids, vec!["r3", "r2", "r1"]);
    assert_eq!(hints.next_request_ids, vec!["r5", "r6", "r7"]);
    assert_eq!(hints.next_text, None);
}

#[test]
fn test_around_withGapBehind_shouldStopAtFirstMissing() {
    let clips = vec![
        pending_clip(0, "zero", Some("r0")),
        pending_clip(1, "one", None),
        pending_clip(2, "two", Some("r2")),
        pending_clip(3, "three", None),
    ];

    let hints = ContinuityHints::around(&clips, 3);

    assert_eq!(hints.previous_request_ids, vec!["r2"]);
    assert!(hints.next_request_ids.is_empty());
}

#[test]
fn test_around_withUnrenderedFollower_shouldUseItsTextAsLookahead() {
    let clips = vec![
        pending_clip(0, "zero", None),
        pending_clip(1, "one", Some("r1")),
        pending_clip(2, "two", None),
        pending_clip(3, "three", Some("r3")),
    ];

    let hints = ContinuityHints::around(&clips, 0);

    assert!(hints.previous_request_ids.is_empty());
    assert_eq!(hints.next_request_ids, vec!["r1"]);
    assert_eq!(hints.next_text.as_deref(), Some("two"));
}

#[test]
fn test_around_atEdges_shouldStayInBounds() {
    let clips = vec![pending_clip(0, "only", None)];
    assert_eq!(ContinuityHints::around(&clips, 0), ContinuityHints::default());
}

#[tokio::test]
async fn test_fetch_missing_withFreshClips_shouldChainRequestIds() -> Result<()> {
    let provider = MockProvider::working(100);
    let store = MemoryClipStore::new();
    let table = VoiceTable::from_config(&common::test_config());
    let cues = vec![
        Cue::new(0, 0, 1000, "first"),
        Cue::new(1, 2000, 3000, "second"),
        Cue::new(2, 4000, 5000, "third"),
    ];

    let mut clips = plan_clips(merge_cues(&cues, 0), &table, &store, "wav")?;
    let stats = ClipFetcher::new(&provider, &store).fetch_missing(&mut clips).await?;

    assert_eq!(stats.synthesized, 3);
    assert_eq!(stats.cached, 0);
    assert_eq!(store.len(), 3);
    assert!(clips.iter().all(|c| c.identity.is_rendered()));

    let requests = provider.requests();
    assert!(requests[0].previous_request_ids.is_empty());
    assert_eq!(requests[0].next_text.as_deref(), Some("second"));
    assert_eq!(requests[1].previous_request_ids, vec!["mock-1"]);
    assert_eq!(requests[2].previous_request_ids, vec!["mock-2", "mock-1"]);
    assert_eq!(requests[2].next_text, None);
    assert_eq!(requests[0].voice_model, "narrator-model");
    Ok(())
}

#[tokio::test]
async fn test_fetch_missing_withCachedFollower_shouldSendItsRequestId() -> Result<()> {
    let provider = MockProvider::working(100);
    let store = MemoryClipStore::new();
    let table = VoiceTable::from_config(&common::test_config());
    let cues = vec![Cue::new(0, 0, 1000, "new line"), Cue::new(1, 2000, 3000, "old line")];

    // Render the second line in an earlier run
    let earlier = plan_clips(merge_cues(&cues[1..], 0), &table, &store, "wav")?;
    store.store(&earlier[0].identity, "cached-7", &MockProvider::tone_wav(100, 1000)?)?;

    let mut clips = plan_clips(merge_cues(&cues, 0), &table, &store, "wav")?;
    let stats = ClipFetcher::new(&provider, &store).fetch_missing(&mut clips).await?;

    assert_eq!(stats, subvoice::fetcher::FetchStats { cached: 1, synthesized: 1 });
    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].next_request_ids, vec!["cached-7"]);
    assert_eq!(requests[0].next_text, None);
    Ok(())
}

#[tokio::test]
async fn test_fetch_missing_withUnknownSpeaker_shouldFailBeforeAnyRequest() -> Result<()> {
    let provider = MockProvider::working(100);
    let store = MemoryClipStore::new();
    let table = VoiceTable::from_config(&common::test_config());
    let cues = vec![Cue::new(0, 0, 1000, "hello"), Cue::new(1, 2000, 3000, "[Zed] who am I")];

    let mut clips = plan_clips(merge_cues(&cues, 0), &table, &store, "wav")?;
    let result = ClipFetcher::new(&provider, &store).fetch_missing(&mut clips).await;

    match result {
        Err(AppError::Config(ConfigError::MissingModel { identity })) => assert_eq!(identity, "Zed"),
        other => panic!("expected missing model error, got {:?}", other),
    }
    assert_eq!(provider.request_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_fetch_missing_withProviderFailure_shouldKeepEarlierClips() -> Result<()> {
    let provider = MockProvider::fail_after(1, 100);
    let store = MemoryClipStore::new();
    let table = VoiceTable::from_config(&common::test_config());
    let cues = vec![Cue::new(0, 0, 1000, "one"), Cue::new(1, 2000, 3000, "two")];

    let mut clips = plan_clips(merge_cues(&cues, 0), &table, &store, "wav")?;
    let result = ClipFetcher::new(&provider, &store).fetch_missing(&mut clips).await;

    assert!(matches!(result, Err(AppError::Provider(_))));
    assert_eq!(store.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_fetch_missing_withRepeatedLine_shouldSynthesizeOnce() -> Result<()> {
    let provider = MockProvider::working(100);
    let store = MemoryClipStore::new();
    let table = VoiceTable::from_config(&common::test_config());
    let cues = vec![
        Cue::new(0, 0, 1000, "Ready?"),
        Cue::new(1, 2000, 3000, "Go."),
        Cue::new(2, 4000, 5000, "Ready?"),
    ];

    let mut clips = plan_clips(merge_cues(&cues, 0), &table, &store, "wav")?;
    let stats = ClipFetcher::new(&provider, &store).fetch_missing(&mut clips).await?;

    assert_eq!(stats, subvoice::fetcher::FetchStats { cached: 1, synthesized: 2 });
    assert_eq!(provider.request_count(), 2);
    assert_eq!(store.len(), 2);
    assert_eq!(clips[0].identity.path, clips[2].identity.path);
    assert_eq!(clips[0].identity.request_id, clips[2].identity.request_id);
    Ok(())
}

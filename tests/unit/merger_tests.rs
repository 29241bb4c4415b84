/*!
 * Tests for same-speaker cue merging
 */

use subvoice::merger::merge_cues;
use subvoice::subtitle_processor::Cue;

fn cues_for(speaker: &str) -> Vec<Cue> {
    vec![
        Cue::new(0, 0, 1000, "x").with_voice(speaker),
        Cue::new(1, 1050, 2000, "y").with_voice(speaker),
    ]
}

#[test]
fn test_merge_cues_withGapWithinThreshold_shouldMerge() {
    let merged = merge_cues(&cues_for("S"), 100);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].start_ms, 0);
    assert_eq!(merged[0].end_ms, 2000);
    assert_eq!(merged[0].text, "x y");
    assert_eq!(merged[0].speaker.as_deref(), Some("S"));
    assert!(merged[0].is_merged());
    assert_eq!(merged[0].sources.len(), 2);
}

#[test]
fn test_merge_cues_withGapAboveThreshold_shouldKeepSeparate() {
    let merged = merge_cues(&cues_for("S"), 40);

    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].text, "x");
    assert_eq!(merged[1].text, "y");
    assert_eq!(merged[1].index, 1);
}

#[test]
fn test_merge_cues_withThresholdDisabled_shouldReturnOnePerCue() {
    let cues = vec![
        Cue::new(0, 0, 1000, "a"),
        Cue::new(1, 1000, 2000, "b"),
        Cue::new(2, 2000, 3000, "c"),
    ];

    for threshold in [0, -10] {
        let merged = merge_cues(&cues, threshold);
        assert_eq!(merged.len(), 3);
        assert!(merged.iter().all(|m| !m.is_merged()));
        assert_eq!(merged[2].text, "c");
    }
}

#[test]
fn test_merge_cues_withDifferentSpeakers_shouldNotMerge() {
    let cues = vec![
        Cue::new(0, 0, 1000, "[Alice] one"),
        Cue::new(1, 1010, 2000, "[Bob] two"),
        Cue::new(2, 2010, 3000, "three"),
    ];
    let merged = merge_cues(&cues, 500);

    assert_eq!(merged.len(), 3);
    assert_eq!(merged[0].speaker.as_deref(), Some("Alice"));
    assert_eq!(merged[0].text, "one");
    assert_eq!(merged[2].speaker, None);
}

#[test]
fn test_merge_cues_withUnresolvedSpeakers_shouldMergeTogether() {
    let cues = vec![Cue::new(0, 0, 1000, "first"), Cue::new(1, 1100, 2000, "second")];
    let merged = merge_cues(&cues, 200);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].speaker, None);
    assert_eq!(merged[0].text, "first second");
}

#[test]
fn test_merge_cues_withPrefixedLines_shouldJoinStrippedTexts() {
    let cues = vec![
        Cue::new(0, 0, 1000, "[Bob] hi"),
        Cue::new(1, 1100, 2000, "[Bob] there"),
    ];
    let merged = merge_cues(&cues, 200);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].text, "hi there");
    assert_eq!(merged[0].sources[1].text, "there");
}

#[test]
fn test_merge_cues_withNegativeGap_shouldNotMerge() {
    let cues = vec![Cue::new(0, 0, 3000, "a"), Cue::new(1, 1000, 1500, "b")];
    let merged = merge_cues(&cues, 200);

    assert_eq!(merged.len(), 2);
    assert_eq!(merged[1].text, "b");
    assert_eq!(merged[1].start_ms, 1000);
}

#[test]
fn test_merge_cues_withCumulativeWindow_shouldUseMergedEnd() {
    let cues = vec![
        Cue::new(0, 0, 1000, "a"),
        Cue::new(1, 1100, 2000, "b"),
        Cue::new(2, 2100, 3000, "c"),
    ];
    let merged = merge_cues(&cues, 150);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].text, "a b c");
    assert_eq!(merged[0].end_ms, 3000);
}

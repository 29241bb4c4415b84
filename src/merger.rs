/*!
 * Merging of consecutive same-speaker cues into synthesis units.
 */

use log::debug;

use crate::speaker::resolve_speaker;
use crate::subtitle_processor::Cue;

/// A source cue absorbed into a merged unit, kept for reporting
#[derive(Debug, Clone, PartialEq)]
pub struct SourceCue {
    /// Index in the parsed script
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Text after speaker prefix removal
    pub text: String,
}

/// One synthesis unit made of one or more contiguous cues
#[derive(Debug, Clone, PartialEq)]
pub struct MergedCue {
    /// Position in the merged sequence
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Source texts joined with spaces
    pub text: String,
    /// Shared speaker identity; `None` for the default voice
    pub speaker: Option<String>,
    /// Source cues in original order
    pub sources: Vec<SourceCue>,
}

impl MergedCue {
    fn open(index: usize, cue: &Cue, speaker: Option<String>, text: String) -> Self {
        Self {
            index,
            start_ms: cue.start_ms,
            end_ms: cue.end_ms,
            text: text.clone(),
            speaker,
            sources: vec![SourceCue {
                index: cue.index,
                start_ms: cue.start_ms,
                end_ms: cue.end_ms,
                text,
            }],
        }
    }

    fn absorb(&mut self, cue: &Cue, text: String) {
        self.end_ms = cue.end_ms;
        self.text = format!("{} {}", self.text.trim(), text.trim()).trim().to_string();
        self.sources.push(SourceCue {
            index: cue.index,
            start_ms: cue.start_ms,
            end_ms: cue.end_ms,
            text,
        });
    }

    /// Whether more than one cue went into this unit
    pub fn is_merged(&self) -> bool {
        self.sources.len() > 1
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Merge consecutive cues of the same speaker whose gap does not exceed
/// `threshold_ms`. Gaps are measured from the end of the growing window.
/// A threshold of 0 or less disables merging.
pub fn merge_cues(cues: &[Cue], threshold_ms: i64) -> Vec<MergedCue> {
    let mut merged: Vec<MergedCue> = Vec::with_capacity(cues.len());
    let mut window: Option<MergedCue> = None;

    for cue in cues {
        let tag = resolve_speaker(cue);

        if let Some(current) = window.as_mut() {
            let gap_ms = cue.start_ms as i64 - current.end_ms as i64;
            let same_speaker = current.speaker == tag.identity;
            if threshold_ms > 0 && same_speaker && gap_ms >= 0 && gap_ms <= threshold_ms {
                debug!(
                    "Merging cue {} into unit {} (gap {}ms)",
                    cue.index, current.index, gap_ms
                );
                current.absorb(cue, tag.text);
                continue;
            }
        }

        if let Some(done) = window.take() {
            merged.push(done);
        }
        window = Some(MergedCue::open(merged.len(), cue, tag.identity, tag.text));
    }

    if let Some(done) = window {
        merged.push(done);
    }

    merged
}

/*!
 * Timeline assembly and the overlap gate.
 *
 * Every rendered clip is placed at its cue's start on its voice's channel.
 * Adjacent clips that share a synthesis model must not overlap; if any do,
 * the run stops before mixing and the operator gets a report.
 */

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use log::debug;

use crate::clip_cache::{ClipIdentity, ClipStore};
use crate::codec::decode_clip;
use crate::errors::{AppError, CodecError};
use crate::fetcher::PendingClip;
use crate::merger::MergedCue;
use crate::mixer::{frames_to_duration, ms_to_frames};
use crate::speaker::VoiceConfig;
use crate::subtitle_processor::Cue;

/// A clip present in the store, with its probed length
#[derive(Debug, Clone)]
pub struct RenderedClip {
    pub cue: MergedCue,
    pub voice: VoiceConfig,
    pub identity: ClipIdentity,
    /// Concrete location in the store
    pub path: PathBuf,
    /// Decoded length in frames
    pub frames: u64,
    pub duration: Duration,
}

impl RenderedClip {
    /// Decode a rendered clip to learn its length
    pub fn probe<S: ClipStore + ?Sized>(clip: PendingClip, store: &S) -> Result<Self, AppError> {
        let PendingClip { cue, voice, identity } = clip;
        let path = identity.path.clone().ok_or_else(|| {
            AppError::File(format!("clip for line #{} has not been rendered", cue.index + 1))
        })?;

        let bytes = store.load(&path).map_err(|e| CodecError::Open {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let decoded = decode_clip(&bytes, identity.extension(), &path)?;
        let frames = decoded.frames();

        Ok(Self {
            cue,
            voice,
            identity,
            path,
            frames,
            duration: frames_to_duration(frames),
        })
    }
}

/// A clip placed on the timeline
#[derive(Debug, Clone)]
pub struct TimelineEntry {
    pub clip: RenderedClip,
    pub channel: usize,
    /// Cue start
    pub start: Duration,
    pub start_frame: u64,
    pub duration: Duration,
    /// `end - next.start`; positive when this clip runs into the next one
    pub overlap_with_next: Option<TimeDelta>,
}

impl TimelineEntry {
    pub fn end(&self) -> Duration {
        self.start + self.duration
    }

    pub fn end_frame(&self) -> u64 {
        self.start_frame + self.clip.frames
    }

    /// Whether this entry runs into `next` on the same synthesis model
    fn collides_with(&self, next: &TimelineEntry) -> bool {
        self.end_frame() > next.start_frame && self.clip.voice.model == next.clip.voice.model
    }
}

/// One same-voice overlap
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapEntry {
    /// Merged cue index
    pub index: usize,
    pub text: String,
    pub start: Duration,
    pub end: Duration,
    pub next_start: Duration,
    pub overlap: Duration,
}

/// Every same-voice overlap found on a timeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlapReport {
    pub overlaps: Vec<OverlapEntry>,
}

impl OverlapReport {
    pub fn is_empty(&self) -> bool {
        self.overlaps.is_empty()
    }
}

impl fmt::Display for OverlapReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Overlaps detected:")?;
        for overlap in &self.overlaps {
            writeln!(f, "#{:03} {}", overlap.index + 1, format_duration(overlap.overlap))?;
            writeln!(
                f,
                "{} --> {} (next line starts at {})",
                format_duration(overlap.start),
                format_duration(overlap.end),
                format_duration(overlap.next_start)
            )?;
            writeln!(f, "{}", overlap.text)?;
            writeln!(f)?;
        }
        write!(
            f,
            "Fix and rerun the script to generate the final audio file \
             (adjust the subtitle timings or the merge threshold)."
        )
    }
}

/// Clips in script order with their placement
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
}

impl Timeline {
    /// Place clips and compute overlaps between neighbours
    pub fn assemble(clips: Vec<RenderedClip>) -> Self {
        let mut entries: Vec<TimelineEntry> = clips
            .into_iter()
            .map(|clip| {
                let start = Duration::from_millis(clip.cue.start_ms);
                TimelineEntry {
                    channel: clip.voice.channel,
                    start,
                    start_frame: ms_to_frames(clip.cue.start_ms),
                    duration: clip.duration,
                    overlap_with_next: None,
                    clip,
                }
            })
            .collect();

        for i in 1..entries.len() {
            let next_start = entries[i].start_frame;
            let current = &mut entries[i - 1];
            let delta = current.end_frame() as i64 - next_start as i64;
            current.overlap_with_next = Some(frames_to_delta(delta));
        }

        debug!("Assembled timeline of {} entries", entries.len());
        Self { entries }
    }

    /// `max(channel) + 1`
    pub fn channel_count(&self) -> usize {
        self.entries.iter().map(|e| e.channel + 1).max().unwrap_or(1)
    }

    /// Frame at which the latest clip ends
    pub fn total_frames(&self) -> u64 {
        self.entries.iter().map(TimelineEntry::end_frame).max().unwrap_or(0)
    }

    pub fn total_duration(&self) -> Duration {
        frames_to_duration(self.total_frames())
    }

    /// Every adjacent same-model pair that overlaps
    pub fn overlaps(&self) -> OverlapReport {
        let overlaps = self
            .entries
            .windows(2)
            .filter(|pair| pair[0].collides_with(&pair[1]))
            .map(|pair| {
                let (entry, next) = (&pair[0], &pair[1]);
                OverlapEntry {
                    index: entry.clip.cue.index,
                    text: entry.clip.cue.text.clone(),
                    start: entry.start,
                    end: entry.end(),
                    next_start: next.start,
                    overlap: frames_to_duration(entry.end_frame() - next.start_frame),
                }
            })
            .collect();
        OverlapReport { overlaps }
    }

    /// The gate in front of mixing
    pub fn check(&self) -> Result<(), OverlapReport> {
        let report = self.overlaps();
        if report.is_empty() {
            Ok(())
        } else {
            Err(report)
        }
    }

    /// Per-clip diagnostics: text, speaker, subtitle and audio timing, path and merge sources
    pub fn write_report<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            let clip = &entry.clip;
            let overlap_text = match self.entries.get(i + 1) {
                Some(next) if entry.collides_with(next) => format!(
                    " (OVERLAP {})",
                    format_duration(frames_to_duration(entry.end_frame() - next.start_frame))
                ),
                _ => String::new(),
            };

            writeln!(out, "#{:03}", clip.cue.index + 1)?;
            writeln!(out, "{}", clip.cue.text)?;
            writeln!(out, "Speaker:  {}, speed: {:.2}", clip.voice.name, clip.voice.speed)?;
            writeln!(
                out,
                "Subtitle: {} --> {} (duration {})",
                Cue::format_timestamp(clip.cue.start_ms),
                Cue::format_timestamp(clip.cue.end_ms),
                format_duration(Duration::from_millis(clip.cue.duration_ms()))
            )?;
            writeln!(
                out,
                "Audio:    {} --> {} (duration {}){}",
                format_duration(entry.start),
                format_duration(entry.end()),
                format_duration(entry.duration),
                overlap_text
            )?;
            writeln!(out, "Path:     {}", clip.path.display())?;

            if clip.cue.is_merged() {
                writeln!(out, "Merged from:")?;
                for source in &clip.cue.sources {
                    writeln!(out, "    {}", source.text)?;
                    writeln!(
                        out,
                        "    {} --> {} (duration {}ms)",
                        Cue::format_timestamp(source.start_ms),
                        Cue::format_timestamp(source.end_ms),
                        source.end_ms.saturating_sub(source.start_ms)
                    )?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

/// Seconds with millisecond precision, e.g. `1.250s`
pub fn format_duration(duration: Duration) -> String {
    format!("{}.{:03}s", duration.as_secs(), duration.subsec_millis())
}

fn frames_to_delta(frames: i64) -> TimeDelta {
    let magnitude = frames_to_duration(frames.unsigned_abs());
    let delta = TimeDelta::from_std(magnitude).unwrap_or(TimeDelta::MAX);
    if frames < 0 { -delta } else { delta }
}

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;

// @module: Subtitle script parsing (SRT and WebVTT)

// @const: SRT timing line
static SRT_TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})").unwrap()
});

// @const: WebVTT timestamp, hours optional
static VTT_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d{2}):(\d{2})\.(\d{3})$").unwrap()
});

// @const: Leading WebVTT voice span, e.g. `<v.loud Alice>`
static VOICE_SPAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<v(?:\.[^\s>]*)?\s+([^>]+)>").unwrap()
});

// @const: Any inline markup tag
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

// @struct: Single timed subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    // @field: Position in the script, 0-based
    pub index: usize,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Spoken text, markup removed
    pub text: String,

    // @field: Voice tag from a `<v Name>` span
    pub voice: Option<String>,

    // @field: NOTE blocks preceding the cue
    pub comments: Vec<String>,
}

impl Cue {
    /// Creates a plain cue without voice tag or comments
    pub fn new(index: usize, start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Cue {
            index,
            start_ms,
            end_ms,
            text: text.into(),
            voice: None,
            comments: Vec::new(),
        }
    }

    /// Attach a voice tag
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// Attach a leading comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    /// Duration of the cue in ms
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

/// Supported script formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    WebVtt,
}

impl SubtitleFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, SubtitleError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" | "webvtt" => Ok(Self::WebVtt),
            other => Err(SubtitleError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                other.to_string()
            })),
        }
    }
}

/// A parsed subtitle script
#[derive(Debug)]
pub struct SubtitleScript {
    /// Source filename
    pub source_file: PathBuf,

    /// Cues in playback order
    pub cues: Vec<Cue>,
}

impl SubtitleScript {
    /// Read and parse a script, choosing the parser from the extension
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let format = SubtitleFormat::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|e| SubtitleError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let cues = match format {
            SubtitleFormat::Srt => Self::parse_srt_string(&content)?,
            SubtitleFormat::WebVtt => Self::parse_vtt_string(&content)?,
        };
        debug!("Parsed {} cues from {}", cues.len(), path.display());

        Ok(SubtitleScript {
            source_file: path.to_path_buf(),
            cues,
        })
    }

    /// Directory holding the script, used as the clip cache root
    pub fn root_dir(&self) -> PathBuf {
        let parent = self
            .source_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::path::absolute(parent).unwrap_or_else(|_| parent.to_path_buf())
    }

    /// Parse SRT format string into cues
    pub fn parse_srt_string(content: &str) -> Result<Vec<Cue>, SubtitleError> {
        let mut cues = Vec::new();

        // State variables for parsing
        let mut current_seq_num: Option<usize> = None;
        let mut current_timing: Option<(u64, u64)> = None;
        let mut current_text: Vec<String> = Vec::new();
        let mut block_line = 0;

        let finish_block = |timing: Option<(u64, u64)>, text: &mut Vec<String>, line: usize, cues: &mut Vec<Cue>| -> Result<(), SubtitleError> {
            if let Some((start_ms, end_ms)) = timing {
                push_cue(cues, start_ms, end_ms, &text.join(" "), None, Vec::new(), line)?;
            }
            text.clear();
            Ok(())
        };

        for (line_idx, line) in content.lines().enumerate() {
            let line_number = line_idx + 1;
            let trimmed = line.trim().trim_start_matches('\u{feff}');

            // Blank line closes the current block
            if trimmed.is_empty() {
                if current_timing.is_some() {
                    finish_block(current_timing, &mut current_text, block_line, &mut cues)?;
                }
                current_seq_num = None;
                current_timing = None;
                continue;
            }

            // Sequence number (only when starting a new block)
            if current_seq_num.is_none() && current_timing.is_none() {
                if let Ok(num) = trimmed.parse::<usize>() {
                    current_seq_num = Some(num);
                    block_line = line_number;
                    continue;
                }
            }

            // Timing line
            if current_timing.is_none() {
                if let Some(caps) = SRT_TIMING_REGEX.captures(trimmed) {
                    current_timing = Some((captures_to_ms(&caps, 1), captures_to_ms(&caps, 5)));
                    if current_seq_num.is_none() {
                        block_line = line_number;
                    }
                    continue;
                }
            }

            if current_timing.is_some() {
                current_text.push(trimmed.to_string());
            } else {
                warn!("Unexpected text at line {} before timing line: {}", line_number, trimmed);
            }
        }

        // Add the last block if there is one
        if current_timing.is_some() {
            finish_block(current_timing, &mut current_text, block_line, &mut cues)?;
        }

        finalize(cues)
    }

    /// Parse WebVTT format string into cues
    pub fn parse_vtt_string(content: &str) -> Result<Vec<Cue>, SubtitleError> {
        let lines: Vec<&str> = content.lines().collect();
        let header = lines
            .first()
            .map(|l| l.trim_start_matches('\u{feff}').trim())
            .unwrap_or("");
        if !header.starts_with("WEBVTT") {
            return Err(SubtitleError::Invalid {
                line: 1,
                message: "missing WEBVTT header".to_string(),
            });
        }

        let mut cues = Vec::new();
        let mut pending_comments: Vec<String> = Vec::new();

        // Split into blank-line separated blocks, remembering their first line number
        let mut blocks: Vec<(usize, Vec<&str>)> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_start = 0;
        for (idx, line) in lines.iter().enumerate().skip(1) {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    blocks.push((current_start, std::mem::take(&mut current)));
                }
                continue;
            }
            if current.is_empty() {
                current_start = idx + 1;
            }
            current.push(line.trim_end());
        }
        if !current.is_empty() {
            blocks.push((current_start, current));
        }

        for (line_number, block) in blocks {
            let first = block[0].trim();
            if first == "NOTE" || first.starts_with("NOTE ") || first.starts_with("NOTE\t") {
                let mut parts = vec![first.trim_start_matches("NOTE").trim().to_string()];
                parts.extend(block[1..].iter().map(|l| l.trim().to_string()));
                let comment = parts
                    .into_iter()
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if !comment.is_empty() {
                    pending_comments.push(comment);
                }
                continue;
            }
            if first.starts_with("STYLE") || first.starts_with("REGION") {
                continue;
            }

            // Timing is on the first line, or the second when the cue has an identifier
            let Some(timing_pos) = block.iter().take(2).position(|l| l.contains("-->")) else {
                warn!("Skipping WebVTT block without timing at line {}", line_number);
                continue;
            };
            let (start_ms, end_ms) = parse_vtt_timing(block[timing_pos], line_number + timing_pos)?;

            let raw_text = block[timing_pos + 1..]
                .iter()
                .map(|l| l.trim())
                .collect::<Vec<_>>()
                .join(" ");
            let voice = VOICE_SPAN_REGEX
                .captures(&raw_text)
                .map(|caps| caps[1].trim().to_string())
                .filter(|v| !v.is_empty());

            push_cue(
                &mut cues,
                start_ms,
                end_ms,
                &raw_text,
                voice,
                std::mem::take(&mut pending_comments),
                line_number,
            )?;
        }

        finalize(cues)
    }
}

/// Validate and append one cue; markup is stripped from the text
fn push_cue(
    cues: &mut Vec<Cue>,
    start_ms: u64,
    end_ms: u64,
    raw_text: &str,
    voice: Option<String>,
    comments: Vec<String>,
    line: usize,
) -> Result<(), SubtitleError> {
    if end_ms < start_ms {
        return Err(SubtitleError::Invalid {
            line,
            message: format!("end time {} is before start time {}", end_ms, start_ms),
        });
    }

    let text = TAG_REGEX.replace_all(raw_text, "");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        warn!("Skipping empty subtitle cue at line {}", line);
        return Ok(());
    }

    cues.push(Cue {
        index: cues.len(),
        start_ms,
        end_ms,
        text,
        voice,
        comments,
    });
    Ok(())
}

/// Order cues by start time and renumber them
fn finalize(mut cues: Vec<Cue>) -> Result<Vec<Cue>, SubtitleError> {
    if cues.is_empty() {
        return Err(SubtitleError::Empty);
    }

    // Stable sort keeps file order for cues starting together
    cues.sort_by_key(|cue| cue.start_ms);
    for (i, cue) in cues.iter_mut().enumerate() {
        cue.index = i;
    }
    Ok(cues)
}

fn parse_vtt_timing(line: &str, line_number: usize) -> Result<(u64, u64), SubtitleError> {
    let invalid = |message: String| SubtitleError::Invalid {
        line: line_number,
        message,
    };

    let (start, rest) = line
        .split_once("-->")
        .ok_or_else(|| invalid(format!("malformed timing line: {}", line)))?;
    // Cue settings may follow the end timestamp
    let end = rest.split_whitespace().next().unwrap_or("");

    let start_ms = parse_vtt_timestamp(start.trim())
        .ok_or_else(|| invalid(format!("invalid start timestamp: {}", start.trim())))?;
    let end_ms = parse_vtt_timestamp(end)
        .ok_or_else(|| invalid(format!("invalid end timestamp: {}", end)))?;
    Ok((start_ms, end_ms))
}

fn parse_vtt_timestamp(value: &str) -> Option<u64> {
    let caps = VTT_TIMESTAMP_REGEX.captures(value)?;
    let hours: u64 = caps.get(1).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let minutes: u64 = caps[2].parse().ok()?;
    let seconds: u64 = caps[3].parse().ok()?;
    let millis: u64 = caps[4].parse().ok()?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some((hours * 3600 + minutes * 60 + seconds) * 1000 + millis)
}

fn captures_to_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
    let part = |i: usize| -> u64 {
        caps.get(start_idx + i)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0))
    };
    (part(0) * 3600 + part(1) * 60 + part(2)) * 1000 + part(3)
}

/*!
 * Multi-channel PCM mixing.
 *
 * Every timeline entry is decoded and summed into one interleaved 16-bit
 * buffer at its channel and start frame. Sums saturate at the i16 range
 * instead of wrapping around.
 */

use std::time::Duration;

use log::debug;

use crate::clip_cache::ClipStore;
use crate::codec::decode_clip;
use crate::errors::{AppError, CodecError};
use crate::timeline::Timeline;

/// Output sample rate, the synthesis service's native rate
pub const SAMPLE_RATE: u32 = 44_100;

/// Output bit depth
pub const BITS_PER_SAMPLE: u16 = 16;

/// Frame index of a millisecond offset
pub fn ms_to_frames(ms: u64) -> u64 {
    ms * SAMPLE_RATE as u64 / 1000
}

/// Duration of a frame count at [`SAMPLE_RATE`]
pub fn frames_to_duration(frames: u64) -> Duration {
    let nanos = frames as u128 * 1_000_000_000 / SAMPLE_RATE as u128;
    Duration::from_nanos(nanos as u64)
}

/// Interleaved 16-bit multi-channel sample buffer
#[derive(Debug, Clone, PartialEq)]
pub struct MixBuffer {
    channels: usize,
    frames: usize,
    data: Vec<i16>,
}

impl MixBuffer {
    /// Zeroed buffer of `frames` frames
    pub fn new(channels: usize, frames: usize) -> Self {
        let channels = channels.max(1);
        Self {
            channels,
            frames,
            data: vec![0; frames * channels],
        }
    }

    /// Buffer sized for a timeline: `max(channel)+1` channels, up to the latest clip end
    pub fn for_timeline(timeline: &Timeline) -> Self {
        Self::new(timeline.channel_count(), timeline.total_frames() as usize)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn duration(&self) -> Duration {
        frames_to_duration(self.frames as u64)
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[i16] {
        &self.data
    }

    /// Sample at a frame and channel
    pub fn sample(&self, frame: usize, channel: usize) -> Option<i16> {
        if channel >= self.channels {
            return None;
        }
        self.data.get(frame * self.channels + channel).copied()
    }

    /// Add a mono clip starting at `start_frame` on `channel`.
    ///
    /// Writes past the end of the buffer are dropped. Returns the number of
    /// samples written.
    pub fn add_clip(&mut self, channel: usize, start_frame: u64, samples: &[i16]) -> usize {
        if channel >= self.channels {
            return 0;
        }

        let mut written = 0;
        for (k, &sample) in samples.iter().enumerate() {
            let frame = start_frame as usize + k;
            if frame >= self.frames {
                break;
            }
            let pos = frame * self.channels + channel;
            self.data[pos] = self.data[pos].saturating_add(sample);
            written += 1;
        }
        written
    }
}

/// Decode every clip of the timeline and sum it into a new buffer
pub fn mix_timeline<S: ClipStore + ?Sized>(timeline: &Timeline, store: &S) -> Result<MixBuffer, AppError> {
    let mut mix = MixBuffer::for_timeline(timeline);
    debug!(
        "Mixing {} clips into {} channel(s), {} frames",
        timeline.entries.len(),
        mix.channels(),
        mix.frames()
    );

    for entry in &timeline.entries {
        let path = &entry.clip.path;
        let bytes = store.load(path).map_err(|e| CodecError::Open {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let decoded = decode_clip(&bytes, entry.clip.identity.extension(), path)?;
        mix.add_clip(entry.channel, entry.start_frame, &decoded.samples);
    }

    Ok(mix)
}

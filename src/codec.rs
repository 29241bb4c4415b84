/*!
 * Audio decoding of rendered clips and WAV encoding of the final mix.
 */

use std::io::{BufWriter, Cursor};
use std::path::Path;
use std::time::Duration;

use log::debug;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::errors::CodecError;
use crate::file_utils::FileManager;
use crate::mixer::{BITS_PER_SAMPLE, MixBuffer, SAMPLE_RATE, frames_to_duration};

/// A clip decoded to 16-bit PCM, reduced to its first channel
#[derive(Debug, Clone)]
pub struct DecodedClip {
    /// Sample rate of the source stream
    pub sample_rate: u32,
    /// Channel count of the source stream
    pub channels: usize,
    /// One sample per frame
    pub samples: Vec<i16>,
}

impl DecodedClip {
    pub fn frames(&self) -> u64 {
        self.samples.len() as u64
    }

    pub fn duration(&self) -> Duration {
        frames_to_duration(self.frames())
    }
}

/// Decode an encoded clip. `extension` hints the container, `origin` is only
/// used in error messages.
pub fn decode_clip(bytes: &[u8], extension: &str, origin: &Path) -> Result<DecodedClip, CodecError> {
    let decode_err = |message: String| CodecError::Decode {
        path: origin.to_path_buf(),
        message,
    };

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let mut hint = Hint::new();
    hint.with_extension(extension);

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_err(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_err("no supported audio track".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track.codec_params.channels.map_or(0, |c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(format!("unsupported codec: {}", e)))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_err(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        // A dropped packet would shift every later sample, so corrupt audio is fatal
        let decoded = decoder.decode(&packet).map_err(|e| decode_err(e.to_string()))?;

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count();
        if channels == 0 {
            continue;
        }

        let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend(buffer.samples().chunks(channels).map(|frame| frame[0]));
    }

    if samples.is_empty() {
        return Err(CodecError::Empty {
            path: origin.to_path_buf(),
        });
    }

    if sample_rate != SAMPLE_RATE {
        return Err(CodecError::SampleRate {
            path: origin.to_path_buf(),
            found: sample_rate,
            expected: SAMPLE_RATE,
        });
    }

    debug!(
        "Decoded {} ({} frames, {} channel(s))",
        origin.display(),
        samples.len(),
        channels
    );

    Ok(DecodedClip {
        sample_rate,
        channels,
        samples,
    })
}

/// Write the mix as 16-bit PCM WAV. The file appears at `path` only once fully written.
pub fn write_wav(path: &Path, mix: &MixBuffer) -> Result<(), CodecError> {
    let encode_err = |message: String| CodecError::Encode {
        path: path.to_path_buf(),
        message,
    };

    let spec = hound::WavSpec {
        channels: u16::try_from(mix.channels()).map_err(|_| encode_err(format!("too many channels: {}", mix.channels())))?,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    };

    let tmp = FileManager::temp_file_beside(path).map_err(|e| encode_err(e.to_string()))?;
    {
        let mut writer = hound::WavWriter::new(BufWriter::new(tmp.as_file()), spec)
            .map_err(|e| encode_err(e.to_string()))?;
        for &sample in mix.samples() {
            writer.write_sample(sample).map_err(|e| encode_err(e.to_string()))?;
        }
        writer.finalize().map_err(|e| encode_err(e.to_string()))?;
    }
    tmp.persist(path).map_err(|e| encode_err(e.error.to_string()))?;

    Ok(())
}

//! Transcoder
//!
//! Converts the recorded PCM reply into a gain-adjusted MP3 using LAME.
//!
//! The assistant's output is noticeably quieter than what the skill runtime
//! plays at, so every sample is multiplied by a fixed gain before encoding.
//! The gain is a constant, not derived from measured levels.

use bytes::Bytes;
use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, MonoPcm, Quality};
use thiserror::Error;
use tracing::debug;

/// Fixed loudness compensation applied before encoding.
pub const DEFAULT_GAIN: f32 = 1.75;

/// Bytes LAME may emit on flush.
const FLUSH_RESERVE: usize = 7200;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Invalid encoder options: {0}")]
    InvalidOptions(String),

    #[error("Failed to initialize MP3 encoder: {0}")]
    Init(String),

    #[error("MP3 encoding failed: {0}")]
    Encode(String),
}

/// Encoder options. Container and bitrate are fixed, not negotiated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranscodeOptions {
    pub channels: u16,
    pub bit_depth: u16,
    pub sample_rate_in: u32,
    pub sample_rate_out: u32,
    /// Output bitrate in kbps
    pub bit_rate_out: u16,
    pub gain: f32,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            channels: 1,
            bit_depth: 16,
            sample_rate_in: 16_000,
            sample_rate_out: 16_000,
            bit_rate_out: 48,
            gain: DEFAULT_GAIN,
        }
    }
}

impl TranscodeOptions {
    pub fn validate(&self) -> Result<(), TranscodeError> {
        if self.channels != 1 {
            return Err(TranscodeError::InvalidOptions(format!(
                "only mono input is supported, got {} channels",
                self.channels
            )));
        }
        if self.bit_depth != 16 {
            return Err(TranscodeError::InvalidOptions(format!(
                "only 16-bit input is supported, got {}",
                self.bit_depth
            )));
        }
        if self.sample_rate_in != self.sample_rate_out {
            return Err(TranscodeError::InvalidOptions(format!(
                "resampling from {} Hz to {} Hz is not supported",
                self.sample_rate_in, self.sample_rate_out
            )));
        }
        if !self.gain.is_finite() || self.gain < 0.0 {
            return Err(TranscodeError::InvalidOptions(format!(
                "gain must be a non-negative number, got {}",
                self.gain
            )));
        }
        bitrate_from_kbps(self.bit_rate_out)?;
        Ok(())
    }
}

fn bitrate_from_kbps(kbps: u16) -> Result<Bitrate, TranscodeError> {
    let bitrate = match kbps {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        other => {
            return Err(TranscodeError::InvalidOptions(format!(
                "unsupported MP3 bitrate {other} kbps"
            )));
        }
    };
    Ok(bitrate)
}

/// Decodes little-endian 16-bit PCM and multiplies every sample by `gain`,
/// saturating at the i16 range. A trailing odd byte is ignored.
pub fn apply_gain(pcm: &[u8], gain: f32) -> Vec<i16> {
    pcm.chunks_exact(2)
        .map(|pair| {
            let sample = i16::from_le_bytes([pair[0], pair[1]]) as f32;
            (sample * gain)
                .round()
                .clamp(i16::MIN as f32, i16::MAX as f32) as i16
        })
        .collect()
}

/// Encodes a recorded PCM reply into a playable container. CPU bound;
/// callers run it on a blocking thread.
pub trait AudioEncoder: Send + Sync {
    fn encode(&self, pcm: &[u8]) -> Result<Bytes, TranscodeError>;
}

/// Stateless MP3 transcoder; every call builds its own encoder instance.
#[derive(Debug, Clone, Default)]
pub struct Mp3Transcoder {
    options: TranscodeOptions,
}

impl Mp3Transcoder {
    pub fn new(options: TranscodeOptions) -> Result<Self, TranscodeError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &TranscodeOptions {
        &self.options
    }

    /// Samples handed to LAME: `pcm` decoded with the configured gain.
    pub fn prepare(&self, pcm: &[u8]) -> Vec<i16> {
        apply_gain(pcm, self.options.gain)
    }
}

impl AudioEncoder for Mp3Transcoder {
    fn encode(&self, pcm: &[u8]) -> Result<Bytes, TranscodeError> {
        let samples = self.prepare(pcm);

        let mut builder = Builder::new()
            .ok_or_else(|| TranscodeError::Init("LAME could not allocate an encoder".into()))?;
        builder
            .set_num_channels(self.options.channels as u8)
            .map_err(|e| TranscodeError::Init(format!("channels: {e:?}")))?;
        builder
            .set_sample_rate(self.options.sample_rate_in)
            .map_err(|e| TranscodeError::Init(format!("sample rate: {e:?}")))?;
        builder
            .set_brate(bitrate_from_kbps(self.options.bit_rate_out)?)
            .map_err(|e| TranscodeError::Init(format!("bitrate: {e:?}")))?;
        builder
            .set_quality(Quality::Good)
            .map_err(|e| TranscodeError::Init(format!("quality: {e:?}")))?;
        let mut encoder = builder
            .build()
            .map_err(|e| TranscodeError::Init(format!("{e:?}")))?;

        let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(samples.len()));
        encoder
            .encode_to_vec(MonoPcm(&samples), &mut out)
            .map_err(|e| TranscodeError::Encode(format!("{e:?}")))?;

        out.reserve(FLUSH_RESERVE);
        encoder
            .flush_to_vec::<FlushNoGap>(&mut out)
            .map_err(|e| TranscodeError::Encode(format!("flush: {e:?}")))?;

        debug!(
            pcm_bytes = pcm.len(),
            mp3_bytes = out.len(),
            gain = self.options.gain,
            "Encoded response audio to MP3"
        );

        Ok(Bytes::from(out))
    }
}

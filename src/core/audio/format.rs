//! Raw PCM format description shared by the audio pipeline.

use std::time::Duration;

/// Longest response the recorder keeps, in seconds.
pub const MAX_RESPONSE_SECONDS: u32 = 90;

/// Linear PCM layout: signed little-endian samples, interleaved channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub bit_depth: u16,
    pub channels: u16,
}

impl Default for PcmFormat {
    /// 16 kHz, 16-bit, mono. Both Polly PCM output and the assistant
    /// audio-in/audio-out configuration use this layout.
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            bit_depth: 16,
            channels: 1,
        }
    }
}

impl PcmFormat {
    /// Bytes in one sample frame (all channels).
    #[inline]
    pub fn frame_size(&self) -> usize {
        (self.bit_depth as usize / 8) * self.channels as usize
    }

    /// Bytes of audio per second of playback.
    #[inline]
    pub fn bytes_per_second(&self) -> u64 {
        self.sample_rate as u64 * self.bit_depth as u64 * self.channels as u64 / 8
    }

    /// Byte budget for `seconds` of audio: sample_rate * bit_depth * channels * seconds / 8.
    #[inline]
    pub fn bytes_for_seconds(&self, seconds: u32) -> usize {
        (self.bytes_per_second() * seconds as u64) as usize
    }

    /// Byte cap for a recorded response.
    #[inline]
    pub fn response_cap_bytes(&self) -> usize {
        self.bytes_for_seconds(MAX_RESPONSE_SECONDS)
    }

    /// Playback duration of `len` bytes.
    pub fn duration_of(&self, len: usize) -> Duration {
        let bps = self.bytes_per_second();
        if bps == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos((len as u128 * 1_000_000_000 / bps as u128) as u64)
    }

    /// A zeroed buffer of `duration` worth of audio, frame aligned.
    pub fn silence(&self, duration: Duration) -> Vec<u8> {
        let frames = (self.sample_rate as u128 * duration.as_millis() / 1000) as usize;
        vec![0u8; frames * self.frame_size()]
    }
}

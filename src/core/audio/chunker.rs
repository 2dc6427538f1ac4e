//! Audio Chunker
//!
//! Slices synthesized PCM into fixed-size parts and assigns each part a send
//! offset so the dialog backend receives audio at roughly real-time cadence.
//! End-of-utterance detection on the backend depends on that cadence.
//!
//! The schedule is a plain value; [`paced`] turns it into a timed stream.
//!
//! ```text
//! offset(part) = batch_start + part_index * (chunk_size / bytes_per_second) * speed
//! batch_start  = sum of the paced durations of all earlier batches
//! ```

use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use tokio::time::Instant;

use super::format::PcmFormat;

/// Default chunk size in bytes (64 ms of 16 kHz mono 16-bit audio).
pub const DEFAULT_CHUNK_SIZE: usize = 2048;

/// A slice of audio and the offset (from turn start) at which to send it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledChunk {
    pub offset: Duration,
    pub data: Bytes,
}

/// Stateful chunker; successive batches are laid out back to back.
#[derive(Debug, Clone)]
pub struct AudioChunker {
    chunk_size: usize,
    speed: f64,
    format: PcmFormat,
    next_batch_start: Duration,
    batches: usize,
}

impl AudioChunker {
    /// `chunk_size` of 0 is bumped to one frame. Non-positive or NaN speed
    /// multipliers fall back to real time.
    pub fn new(format: PcmFormat, chunk_size: usize, speed: f64) -> Self {
        let chunk_size = chunk_size.max(format.frame_size().max(1));
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            1.0
        };
        Self {
            chunk_size,
            speed,
            format,
            next_batch_start: Duration::ZERO,
            batches: 0,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of non-empty batches scheduled so far.
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Paced time between two consecutive full chunks.
    pub fn chunk_interval(&self) -> Duration {
        self.scale(self.format.duration_of(self.chunk_size))
    }

    fn scale(&self, duration: Duration) -> Duration {
        Duration::from_nanos((duration.as_nanos() as f64 * self.speed).round() as u64)
    }

    /// Offset at which the next batch would start.
    pub fn next_batch_start(&self) -> Duration {
        self.next_batch_start
    }

    /// Schedules one batch. An empty batch yields nothing and does not
    /// advance the batch clock.
    pub fn push_batch(&mut self, batch: Bytes) -> Vec<ScheduledChunk> {
        if batch.is_empty() {
            return Vec::new();
        }

        let start = self.next_batch_start;
        let interval = self.chunk_interval();
        let parts = batch.len().div_ceil(self.chunk_size);
        let mut scheduled = Vec::with_capacity(parts);

        for index in 0..parts {
            let begin = index * self.chunk_size;
            let end = (begin + self.chunk_size).min(batch.len());
            scheduled.push(ScheduledChunk {
                offset: start + interval * index as u32,
                data: batch.slice(begin..end),
            });
        }

        self.next_batch_start = start + self.scale(self.format.duration_of(batch.len()));
        self.batches += 1;
        scheduled
    }
}

/// Convenience: schedule a single buffer from a fresh clock.
pub fn chunk(format: PcmFormat, buffer: Bytes, chunk_size: usize, speed: f64) -> Vec<ScheduledChunk> {
    AudioChunker::new(format, chunk_size, speed).push_batch(buffer)
}

/// Yields each chunk's data once its offset from `start` has elapsed.
///
/// Uses tokio's timer, so a paused runtime drives it deterministically.
pub fn paced(start: Instant, schedule: Vec<ScheduledChunk>) -> impl Stream<Item = Bytes> {
    futures::stream::unfold(schedule.into_iter(), move |mut iter| async move {
        let next = iter.next()?;
        tokio::time::sleep_until(start + next.offset).await;
        Some((next.data, iter))
    })
}

//! Response Recorder
//!
//! Accumulates the assistant's streamed PCM reply. The buffer is capped (90
//! seconds of audio by default); bytes arriving after the cap is reached are
//! dropped and only logged.

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use super::format::PcmFormat;

#[derive(Debug)]
pub struct ResponseRecorder {
    buffer: BytesMut,
    cap_bytes: usize,
    dropped_bytes: usize,
}

impl ResponseRecorder {
    pub fn new(cap_bytes: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            cap_bytes,
            dropped_bytes: 0,
        }
    }

    /// Recorder capped at the 90 second budget for `format`.
    pub fn for_format(format: &PcmFormat) -> Self {
        Self::new(format.response_cap_bytes())
    }

    /// Appends as much of `bytes` as fits under the cap; the remainder is
    /// discarded.
    pub fn accept(&mut self, bytes: &[u8]) {
        let room = self.cap_bytes.saturating_sub(self.buffer.len());
        let take = room.min(bytes.len());

        if take > 0 {
            self.buffer.extend_from_slice(&bytes[..take]);
        }

        let dropped = bytes.len() - take;
        if dropped > 0 {
            if self.dropped_bytes == 0 {
                warn!(
                    cap_bytes = self.cap_bytes,
                    "Response audio reached the length cap, discarding further audio"
                );
            }
            self.dropped_bytes += dropped;
            debug!(dropped, total_dropped = self.dropped_bytes, "Dropped response audio");
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn cap_bytes(&self) -> usize {
        self.cap_bytes
    }

    pub fn dropped_bytes(&self) -> usize {
        self.dropped_bytes
    }

    /// Throws away everything recorded so far.
    pub fn discard(&mut self) {
        self.buffer.clear();
    }

    /// Consumes the recorder and returns the audio.
    pub fn finalize(self) -> Bytes {
        self.buffer.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_under_cap() {
        let mut rec = ResponseRecorder::new(100);
        rec.accept(&[1; 40]);
        rec.accept(&[2; 40]);
        assert_eq!(rec.len(), 80);
        assert_eq!(rec.dropped_bytes(), 0);
        let out = rec.finalize();
        assert_eq!(&out[..40], &[1; 40]);
        assert_eq!(&out[40..], &[2; 40]);
    }

    #[test]
    fn test_never_exceeds_cap() {
        for cap in [0usize, 1, 99, 1000] {
            for chunk in [1usize, 3, 64, 999, 5000] {
                let mut rec = ResponseRecorder::new(cap);
                for _ in 0..50 {
                    rec.accept(&vec![7u8; chunk]);
                    assert!(rec.len() <= cap);
                }
                assert_eq!(rec.len(), cap.min(chunk * 50));
                assert_eq!(rec.len() + rec.dropped_bytes(), chunk * 50);
            }
        }
    }

    #[test]
    fn test_default_cap_is_ninety_seconds() {
        let rec = ResponseRecorder::for_format(&PcmFormat::default());
        assert_eq!(rec.cap_bytes(), 2_880_000);
    }

    #[test]
    fn test_empty_and_discard() {
        let mut rec = ResponseRecorder::new(10);
        assert!(rec.is_empty());
        rec.accept(&[1, 2, 3]);
        rec.discard();
        assert!(rec.is_empty());
        assert!(rec.finalize().is_empty());
    }
}

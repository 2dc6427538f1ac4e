use serde::Serialize;
use tokio::time::Instant;

/// Milliseconds spent in each phase of a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TurnTimings {
    pub setup_ms: u64,
    pub synthesis_ms: u64,
    pub send_ms: u64,
    pub wait_ms: u64,
    pub encode_ms: u64,
    pub upload_ms: u64,
}

impl TurnTimings {
    pub fn total_ms(&self) -> u64 {
        self.setup_ms
            + self.synthesis_ms
            + self.send_ms
            + self.wait_ms
            + self.encode_ms
            + self.upload_ms
    }

    /// One line per phase, as shown on the debug card.
    pub fn card_text(&self) -> String {
        format!(
            "Setup: {} ms\nSynthesis: {} ms\nSend: {} ms\nWait: {} ms\nEncode: {} ms\nUpload: {} ms\nTotal: {} ms",
            self.setup_ms,
            self.synthesis_ms,
            self.send_ms,
            self.wait_ms,
            self.encode_ms,
            self.upload_ms,
            self.total_ms()
        )
    }
}

/// Measures consecutive phases on tokio's clock.
#[derive(Debug)]
pub(crate) struct Stopwatch {
    last: Instant,
}

impl Stopwatch {
    pub(crate) fn start() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Milliseconds since the previous lap (or start).
    pub(crate) fn lap(&mut self) -> u64 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last).as_millis() as u64;
        self.last = now;
        elapsed
    }
}

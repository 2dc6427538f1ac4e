//! PCM audio handling for a conversation turn: pacing outbound speech,
//! recording the streamed reply and encoding it for playback.

pub mod chunker;
pub mod format;
pub mod recorder;
pub mod transcoder;

pub use chunker::{AudioChunker, DEFAULT_CHUNK_SIZE, ScheduledChunk, chunk, paced};
pub use format::{MAX_RESPONSE_SECONDS, PcmFormat};
pub use recorder::ResponseRecorder;
pub use transcoder::{
    AudioEncoder, DEFAULT_GAIN, Mp3Transcoder, TranscodeError, TranscodeOptions,
    apply_gain,
};

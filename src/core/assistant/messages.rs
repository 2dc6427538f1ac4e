//! Google Assistant embedded API wire messages.
//!
//! Hand-written `prost` equivalents of the `v1alpha1` protos; only the fields
//! the bridge reads or writes are declared.
//!
//! ```protobuf
//! service EmbeddedAssistant {
//!     rpc Converse(stream ConverseRequest) returns (stream ConverseResponse);
//! }
//! ```

use bytes::Bytes;

/// Fully-qualified gRPC method path for `Converse`.
pub const CONVERSE_PATH: &str = "/google.assistant.embedded.v1alpha1.EmbeddedAssistant/Converse";

#[derive(Clone, PartialEq, prost::Message)]
pub struct ConverseRequest {
    #[prost(oneof = "converse_request::Payload", tags = "1, 2")]
    pub payload: Option<converse_request::Payload>,
}

pub mod converse_request {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Payload {
        /// Must be the first and only config message of the stream
        #[prost(message, tag = "1")]
        Config(super::ConverseConfig),
        #[prost(bytes = "bytes", tag = "2")]
        AudioIn(::bytes::Bytes),
    }
}

impl ConverseRequest {
    pub fn config(config: ConverseConfig) -> Self {
        Self {
            payload: Some(converse_request::Payload::Config(config)),
        }
    }

    pub fn audio(data: Bytes) -> Self {
        Self {
            payload: Some(converse_request::Payload::AudioIn(data)),
        }
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ConverseConfig {
    #[prost(message, optional, tag = "1")]
    pub audio_in_config: Option<AudioInConfig>,
    #[prost(message, optional, tag = "2")]
    pub audio_out_config: Option<AudioOutConfig>,
    #[prost(message, optional, tag = "3")]
    pub converse_state: Option<ConverseState>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AudioInConfig {
    #[prost(enumeration = "AudioInEncoding", tag = "1")]
    pub encoding: i32,
    #[prost(int32, tag = "2")]
    pub sample_rate_hertz: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum AudioInEncoding {
    Unspecified = 0,
    Linear16 = 1,
    Flac = 2,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AudioOutConfig {
    #[prost(enumeration = "AudioOutEncoding", tag = "1")]
    pub encoding: i32,
    #[prost(int32, tag = "2")]
    pub sample_rate_hertz: i32,
    #[prost(int32, tag = "3")]
    pub volume_percentage: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum AudioOutEncoding {
    Unspecified = 0,
    Linear16 = 1,
    Mp3 = 2,
    OpusInOgg = 3,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ConverseState {
    #[prost(bytes = "bytes", tag = "1")]
    pub conversation_state: Bytes,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ConverseResponse {
    #[prost(oneof = "converse_response::Payload", tags = "1, 2, 3, 5")]
    pub payload: Option<converse_response::Payload>,
}

pub mod converse_response {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "1")]
        Error(super::RpcStatus),
        #[prost(enumeration = "super::EventType", tag = "2")]
        EventType(i32),
        #[prost(message, tag = "3")]
        AudioOut(super::AudioOut),
        #[prost(message, tag = "5")]
        Result(super::ConverseResult),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum EventType {
    Unspecified = 0,
    EndOfUtterance = 1,
}

/// `google.rpc.Status`, without details.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RpcStatus {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AudioOut {
    #[prost(bytes = "bytes", tag = "1")]
    pub audio_data: Bytes,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ConverseResult {
    #[prost(string, tag = "1")]
    pub spoken_request_text: String,
    #[prost(string, tag = "2")]
    pub spoken_response_text: String,
    #[prost(bytes = "bytes", tag = "3")]
    pub conversation_state: Bytes,
    #[prost(enumeration = "WireMicrophoneMode", tag = "4")]
    pub microphone_mode: i32,
    #[prost(int32, tag = "5")]
    pub volume_percentage: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum WireMicrophoneMode {
    Unspecified = 0,
    CloseMicrophone = 1,
    DialogFollowOn = 2,
}

/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public AscendEX BBO adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod config;
pub mod error;
pub mod types;
pub mod ws;

pub use config::StreamConfig;
pub use error::{BboError, Result};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    AscendexBboClient,
    BboStream,
    SessionReader,
    SessionWriter,
    SkippedFrame,
    SubscribeRequest,
    WireMessage,
    decode_frame,
};

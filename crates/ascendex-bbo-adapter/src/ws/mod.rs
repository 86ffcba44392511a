/*
[INPUT]:  Stream configuration and the symbol to subscribe
[OUTPUT]: Validated top-of-book updates via channels
[POS]:    WebSocket layer - real-time data stream
[UPDATE]: When adding new channels or changing connection logic
*/

pub mod client;
pub mod connector;
pub mod keepalive;
pub mod message;
pub mod reader;
pub mod session;
pub mod subscriber;

pub use client::{AscendexBboClient, BboStream};
pub use message::{BboData, SubscribeRequest, WireMessage};
pub use reader::{SkippedFrame, decode_frame};
pub use session::{Session, SessionReader, SessionWriter};

/*
[INPUT]:  Public API exports for ascendex-bbo-stream crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod consumer;
pub mod startup;

// Re-export main types for convenience
pub use config::StreamerConfig;
pub use consumer::{ConsumerExit, DrainSummary, drain_updates};
pub use startup::setup_failure;

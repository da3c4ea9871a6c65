#![doc = include_str!("../README.md")]

pub mod blocklist;
pub mod classify;
pub mod config;
pub mod error;
pub mod offset;
pub mod relay;
pub mod sink;
pub mod tailer;

// --- 주요 타입 re-export ---

pub use blocklist::BlocklistReader;
pub use classify::{extract_ipv4_token, extract_percent, parse_line};
pub use config::{RelayConfig, RelayConfigBuilder};
pub use error::RelayError;
pub use offset::OffsetStore;
pub use relay::{CycleOutcome, RelayLoop, RelayService, RelayState};
pub use sink::SinkClient;
pub use tailer::{LogTailer, TailChunk, TailOutcome};

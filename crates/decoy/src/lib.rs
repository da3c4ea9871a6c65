#![doc = include_str!("../README.md")]

pub mod config;
pub mod decoy;
pub mod error;
pub mod listener;
pub mod log;

// --- 주요 타입 re-export ---

pub use config::{DecoyConfig, ListenerConfig};
pub use decoy::DecoySet;
pub use error::DecoyError;
pub use listener::DecoyListener;
pub use log::EventLogWriter;

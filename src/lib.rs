//! Client for the Clevo EC fan-control service.
//!
//! The service listens on local named channels. Each operation announces a
//! command token on the shared control channel, then exchanges a small
//! little-endian payload on a channel named after that token.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod link;
mod misc;

pub use client::{
    EcLinkClient,
    defs::{Command, CommandKind, EcSample, FanId, Reply, Telemetry, rpm_from_divisor},
};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use misc::buf::DecodeError;

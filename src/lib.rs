//! Treasure Dig - Server-Authoritative Core
//!
//! The dig-up-treasure game loop, decided on the server:
//! - Luck roll timer (oscillating skill check)
//! - Weighted loot selection biased by combined luck
//! - Target registry (one active target per player)
//! - Dig session state machine with progress decay
//! - Detector proximity scan and waypoint throttling
//! - Session orchestrator (cooldowns, modifiers, multi-dig, dig anywhere)
//! - Bevy plugin for the fixed-rate tick schedule

pub mod collab;
pub mod config;
pub mod constants;
pub mod dig;
pub mod logging;
pub mod loot;
pub mod luck;
pub mod notify;
pub mod player;
pub mod plugin;
pub mod proximity;
pub mod service;
pub mod simulation;
pub mod spawn;

pub use config::{ConfigError, DigConfig};
pub use plugin::{DigPlugin, DigRequest, DigResponse, DigServer};
pub use service::{DigOutcome, DigService, RejectReason};

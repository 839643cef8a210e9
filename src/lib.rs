//! HomeWatch firmware library.
//!
//! Motion-triggered photo alerts and weather threshold alerts, relayed to a
//! Telegram chat and mirrored on an Adafruit IO dashboard.  The core
//! (`app`, `motion`, `weather`, `relay`, `scheduler`) depends only on the
//! port traits in [`app::ports`]; everything ESP-IDF-specific is guarded by
//! `#[cfg(target_os = "espidf")]` inside the adapter and driver modules,
//! so the whole crate builds and tests on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod drivers;
pub mod error;
pub mod motion;
pub mod pins;
pub mod relay;
pub mod scheduler;
pub mod sensors;
pub mod weather;

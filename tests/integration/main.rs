//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that drives the alert and sampling
//! loops against scripted ports.  All tests run on the host (x86_64) with
//! no real hardware or network required.

#![cfg(not(target_os = "espidf"))]

mod adapter_wiring;
mod mock_ports;
mod motion_scenarios;
mod weather_scenarios;

//! Application core: alert logic, zero direct I/O.
//!
//! This module contains the motion alert sequencing for the HomeWatch
//! device.  All interaction with the network, camera and sensors happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod events;
pub mod orchestrator;
pub mod ports;

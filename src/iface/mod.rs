//! Network interface abstraction layer
//!
//! This module provides the interface that owns the protocol state and drives
//! frames through it:
//! - Device abstraction (TAP and in-memory backends)
//! - Ethernet framing and dispatch
//! - ARP resolution and the pending-packet slot
//! - IPv4 input validation and output fragmentation
//! - ICMP echo replies and unreachable errors
//! - UDP checksum verification and handler dispatch

pub mod device;
pub mod interface;

mod arp;
mod ethernet;
mod icmp;
mod ipv4;
mod udp;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used items
pub use device::{Device, MemoryDevice, TapDevice};
pub use interface::NetworkInterface;

//! A minimal single-interface network stack in Rust
//!
//! This library implements a polling, single-threaded host stack:
//! - ARP resolution with a fixed-size, lazily expiring cache
//! - IPv4 input validation and outbound fragmentation
//! - ICMP echo replies and destination unreachable errors
//! - UDP checksum verification and per-port handler dispatch
//!
//! Inbound fragments are not reassembled, IP options are ignored and there
//! is no TCP or IPv6 support.

pub mod buffer;
pub mod config;
pub mod error;
pub mod iface;
pub mod network;
pub mod transport;

// Re-export commonly used types
pub use buffer::PacketBuffer;
pub use config::Config;
pub use error::{Error, Result};
pub use iface::{Device, MemoryDevice, NetworkInterface, TapDevice};
pub use network::{checksum, ArpCache, ArpState, MacAddr};
pub use transport::UdpHeader;

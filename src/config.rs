//! Interface configuration

use crate::network::MacAddr;
use std::net::Ipv4Addr;
use std::time::Duration;

pub const DEFAULT_MAC: MacAddr = MacAddr([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
pub const DEFAULT_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 163, 103);
pub const DEFAULT_ARP_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_ARP_CAPACITY: usize = 8;
pub const DEFAULT_UDP_CAPACITY: usize = 16;

/// Addresses and table sizes of the single interface the stack owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
    /// Age after which a cache entry is invalidated by the next update
    pub arp_timeout: Duration,
    pub arp_capacity: usize,
    pub udp_capacity: usize,
}

impl Config {
    pub fn new(mac: MacAddr, ip: Ipv4Addr) -> Self {
        Config {
            mac,
            ip,
            ..Default::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mac: DEFAULT_MAC,
            ip: DEFAULT_IP,
            arp_timeout: DEFAULT_ARP_TIMEOUT,
            arp_capacity: DEFAULT_ARP_CAPACITY,
            udp_capacity: DEFAULT_UDP_CAPACITY,
        }
    }
}

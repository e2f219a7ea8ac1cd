//! ARP (Address Resolution Protocol) implementation
//!
//! This module provides the 28-byte Ethernet/IPv4 ARP message format and the
//! resolution cache that maps IPv4 addresses to hardware addresses.
//!
//! The cache has a fixed number of slots. Entries expire lazily: ages are
//! only checked when a new mapping is inserted, never on lookup.

use crate::buffer::PacketBuffer;
use crate::network::ethernet::{ethertype, MacAddr};
use byteorder::{BigEndian, ByteOrder};
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};
use tracing::debug;

/// ARP message length for the Ethernet/IPv4 profile
pub const ARP_PACKET_LEN: usize = 28;

pub const ARP_HW_ETHERNET: u16 = 1;
pub const ARP_OP_REQUEST: u16 = 1;
pub const ARP_OP_REPLY: u16 = 2;

const HW_ADDR_LEN: u8 = 6;
const PROTO_ADDR_LEN: u8 = 4;

/// ARP message for Ethernet hardware and IPv4 protocol addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpPacket {
    pub hw_type: u16,
    pub proto_type: u16,
    pub hw_len: u8,
    pub proto_len: u8,
    pub opcode: u16,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

impl ArpPacket {
    /// Build a request asking who owns `target_ip`
    pub fn request(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        Self::new(ARP_OP_REQUEST, sender_mac, sender_ip, MacAddr::ZERO, target_ip)
    }

    /// Build a reply announcing `sender_mac` to the requester
    pub fn reply(
        sender_mac: MacAddr,
        sender_ip: Ipv4Addr,
        target_mac: MacAddr,
        target_ip: Ipv4Addr,
    ) -> Self {
        Self::new(ARP_OP_REPLY, sender_mac, sender_ip, target_mac, target_ip)
    }

    fn new(
        opcode: u16,
        sender_mac: MacAddr,
        sender_ip: Ipv4Addr,
        target_mac: MacAddr,
        target_ip: Ipv4Addr,
    ) -> Self {
        ArpPacket {
            hw_type: ARP_HW_ETHERNET,
            proto_type: ethertype::IPV4,
            hw_len: HW_ADDR_LEN,
            proto_len: PROTO_ADDR_LEN,
            opcode,
            sender_mac,
            sender_ip,
            target_mac,
            target_ip,
        }
    }

    /// Parse an ARP message from byte slice
    ///
    /// Returns None if the data is shorter than 28 bytes. Trailing bytes
    /// (frame padding) are ignored.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < ARP_PACKET_LEN {
            return None;
        }

        Some(ArpPacket {
            hw_type: BigEndian::read_u16(&data[0..2]),
            proto_type: BigEndian::read_u16(&data[2..4]),
            hw_len: data[4],
            proto_len: data[5],
            opcode: BigEndian::read_u16(&data[6..8]),
            sender_mac: MacAddr::from_bytes(&data[8..14])?,
            sender_ip: ipv4_from(&data[14..18]),
            target_mac: MacAddr::from_bytes(&data[18..24])?,
            target_ip: ipv4_from(&data[24..28]),
        })
    }

    pub fn to_bytes(&self) -> [u8; ARP_PACKET_LEN] {
        let mut bytes = [0u8; ARP_PACKET_LEN];
        BigEndian::write_u16(&mut bytes[0..2], self.hw_type);
        BigEndian::write_u16(&mut bytes[2..4], self.proto_type);
        bytes[4] = self.hw_len;
        bytes[5] = self.proto_len;
        BigEndian::write_u16(&mut bytes[6..8], self.opcode);
        bytes[8..14].copy_from_slice(&self.sender_mac.0);
        bytes[14..18].copy_from_slice(&self.sender_ip.octets());
        bytes[18..24].copy_from_slice(&self.target_mac.0);
        bytes[24..28].copy_from_slice(&self.target_ip.octets());
        bytes
    }

    /// Check the fixed Ethernet/IPv4 profile fields
    pub fn is_ethernet_ipv4(&self) -> bool {
        self.hw_type == ARP_HW_ETHERNET
            && self.proto_type == ethertype::IPV4
            && self.hw_len == HW_ADDR_LEN
            && self.proto_len == PROTO_ADDR_LEN
    }
}

fn ipv4_from(data: &[u8]) -> Ipv4Addr {
    Ipv4Addr::new(data[0], data[1], data[2], data[3])
}

/// State of a resolution cache slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArpState {
    #[default]
    Invalid,
    /// Reserved for tracking requests in flight; the update path never
    /// assigns it and lookups ignore it.
    Pending,
    Valid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpEntry {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    pub state: ArpState,
    pub updated_at: Option<Instant>,
}

impl Default for ArpEntry {
    fn default() -> Self {
        ArpEntry {
            ip: Ipv4Addr::UNSPECIFIED,
            mac: MacAddr::ZERO,
            state: ArpState::Invalid,
            updated_at: None,
        }
    }
}

/// Fixed-capacity IPv4 to hardware address table
#[derive(Debug, Clone)]
pub struct ArpCache {
    entries: Vec<ArpEntry>,
    timeout: Duration,
}

impl ArpCache {
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        ArpCache {
            entries: vec![ArpEntry::default(); capacity.max(1)],
            timeout,
        }
    }

    /// Mark every slot invalid
    pub fn clear(&mut self) {
        self.entries.fill(ArpEntry::default());
    }

    /// Record a mapping learned at `now`
    ///
    /// Expired entries are invalidated first. An entry already held for `ip`
    /// is refreshed in place; otherwise the first invalid slot is used, and
    /// when none is left the slot with the oldest update time is evicted.
    pub fn update(&mut self, ip: Ipv4Addr, mac: MacAddr, state: ArpState, now: Instant) {
        for entry in self.entries.iter_mut() {
            if let Some(at) = entry.updated_at {
                if now.saturating_duration_since(at) > self.timeout {
                    entry.state = ArpState::Invalid;
                }
            }
        }

        let slot = self
            .entries
            .iter()
            .position(|e| e.state != ArpState::Invalid && e.ip == ip)
            .or_else(|| self.entries.iter().position(|e| e.state == ArpState::Invalid))
            .unwrap_or_else(|| self.oldest_slot());

        debug!("arp cache slot {} <- {} is {}", slot, ip, mac);
        self.entries[slot] = ArpEntry {
            ip,
            mac,
            state,
            updated_at: Some(now),
        };
    }

    fn oldest_slot(&self) -> usize {
        self.entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.updated_at)
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Find the hardware address of a valid entry for `ip`
    pub fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.entries
            .iter()
            .find(|e| e.state == ArpState::Valid && e.ip == ip)
            .map(|e| e.mac)
    }

    pub fn entries(&self) -> &[ArpEntry] {
        &self.entries
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }
}

/// Outbound packet held while its next hop is being resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPacket {
    pub ip: Ipv4Addr,
    pub ethertype: u16,
    pub buf: PacketBuffer,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, last)
    }

    fn mac(last: u8) -> MacAddr {
        MacAddr([0x02, 0, 0, 0, 0, last])
    }

    #[test]
    fn test_arp_packet_layout() {
        let pkt = ArpPacket::request(mac(1), ip(1), ip(2));
        let bytes = pkt.to_bytes();
        assert_eq!(&bytes[0..8], &[0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01]);
        assert_eq!(&bytes[8..14], &mac(1).0);
        assert_eq!(&bytes[14..18], &[10, 0, 0, 1]);
        assert_eq!(&bytes[18..24], &[0; 6]);
        assert_eq!(&bytes[24..28], &[10, 0, 0, 2]);

        let parsed = ArpPacket::from_bytes(&bytes).unwrap();
        assert!(parsed.is_ethernet_ipv4());
        assert_eq!(parsed, pkt);
    }

    #[test]
    fn test_arp_packet_rejects_short_and_foreign_profiles() {
        assert!(ArpPacket::from_bytes(&[0u8; 27]).is_none());

        let mut pkt = ArpPacket::reply(mac(1), ip(1), mac(2), ip(2));
        pkt.hw_len = 8;
        assert!(!pkt.is_ethernet_ipv4());
    }

    #[test]
    fn test_lookup_after_update() {
        let now = Instant::now();
        let mut cache = ArpCache::new(8, Duration::from_secs(60));
        assert_eq!(cache.lookup(ip(5)), None);

        cache.update(ip(5), mac(5), ArpState::Valid, now);
        assert_eq!(cache.lookup(ip(5)), Some(mac(5)));
        assert_eq!(cache.lookup(ip(6)), None);
    }

    #[test]
    fn test_capacity_never_grows_and_oldest_is_evicted() {
        let start = Instant::now();
        let mut cache = ArpCache::new(4, Duration::from_secs(600));

        for i in 0..10u8 {
            cache.update(ip(i), mac(i), ArpState::Valid, start + Duration::from_secs(i as u64));
            assert_eq!(cache.capacity(), 4);
        }

        // The four most recent mappings survive
        for i in 0..6u8 {
            assert_eq!(cache.lookup(ip(i)), None);
        }
        for i in 6..10u8 {
            assert_eq!(cache.lookup(ip(i)), Some(mac(i)));
        }
    }

    #[test]
    fn test_refresh_does_not_duplicate_entry() {
        let start = Instant::now();
        let mut cache = ArpCache::new(4, Duration::from_secs(60));
        cache.update(ip(1), mac(1), ArpState::Valid, start);
        cache.update(ip(1), mac(9), ArpState::Valid, start + Duration::from_secs(1));

        let valid: Vec<_> = cache
            .entries()
            .iter()
            .filter(|e| e.state == ArpState::Valid)
            .collect();
        assert_eq!(valid.len(), 1);
        assert_eq!(cache.lookup(ip(1)), Some(mac(9)));
    }

    #[test]
    fn test_expired_entries_invalidated_on_next_update() {
        let start = Instant::now();
        let timeout = Duration::from_secs(60);
        let mut cache = ArpCache::new(8, timeout);
        cache.update(ip(1), mac(1), ArpState::Valid, start);

        // Lookups never expire anything by themselves
        assert_eq!(cache.lookup(ip(1)), Some(mac(1)));

        cache.update(ip(2), mac(2), ArpState::Valid, start + timeout + Duration::from_secs(1));
        assert_eq!(cache.lookup(ip(1)), None);
        assert_eq!(cache.lookup(ip(2)), Some(mac(2)));
    }

    #[test]
    fn test_expired_slot_reused_before_eviction() {
        let start = Instant::now();
        let timeout = Duration::from_secs(10);
        let mut cache = ArpCache::new(2, timeout);
        cache.update(ip(1), mac(1), ArpState::Valid, start);
        cache.update(ip(2), mac(2), ArpState::Valid, start + Duration::from_secs(8));

        // ip(1) is expired at t=12, ip(2) is not
        cache.update(ip(3), mac(3), ArpState::Valid, start + Duration::from_secs(12));
        assert_eq!(cache.lookup(ip(1)), None);
        assert_eq!(cache.lookup(ip(2)), Some(mac(2)));
        assert_eq!(cache.lookup(ip(3)), Some(mac(3)));
    }

    #[test]
    fn test_clear_invalidates_all() {
        let mut cache = ArpCache::new(2, Duration::from_secs(60));
        cache.update(ip(1), mac(1), ArpState::Valid, Instant::now());
        cache.clear();
        assert!(cache.entries().iter().all(|e| e.state == ArpState::Invalid));
        assert_eq!(cache.lookup(ip(1)), None);
    }
}

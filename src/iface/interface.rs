//! Network interface and packet processing entry point
//!
//! `NetworkInterface` owns every piece of mutable protocol state: the ARP
//! resolution cache, the pending-resolution slot, the UDP handler table and
//! the IPv4 identification counter, along with the device frames travel
//! through. The per-protocol processing lives in sibling modules as further
//! `impl` blocks on this type.
//!
//! Processing is synchronous and single-threaded. `poll` reads at most one
//! frame and drives it through the whole receive path; any replies it
//! triggers are transmitted before `poll` returns.

use crate::buffer::PacketBuffer;
use crate::config::Config;
use crate::error::Result;
use crate::iface::device::Device;
use crate::network::arp::{ArpCache, PendingPacket};
use crate::network::ethernet::{ETHERNET_HEADER_LEN, ETHERNET_MTU};
use crate::transport::udp::UdpTable;

const RX_FRAME_LEN: usize = ETHERNET_HEADER_LEN + ETHERNET_MTU;

/// Network interface for packet processing
pub struct NetworkInterface<D: Device> {
    pub(crate) config: Config,
    pub(crate) device: D,
    pub(crate) arp_cache: ArpCache,
    /// Single packet waiting for its next hop to be resolved
    pub(crate) arp_pending: Option<PendingPacket>,
    pub(crate) udp_table: UdpTable,
    /// Identification of the next outbound datagram
    pub(crate) ip_id: u16,
}

impl<D: Device> NetworkInterface<D> {
    /// Create an interface with an empty cache and handler table
    ///
    /// Nothing is transmitted until `init` is called.
    pub fn new(config: Config, device: D) -> Self {
        NetworkInterface {
            arp_cache: ArpCache::new(config.arp_capacity, config.arp_timeout),
            arp_pending: None,
            udp_table: UdpTable::new(config.udp_capacity),
            ip_id: 0,
            config,
            device,
        }
    }

    /// Reset the resolution state and announce the local address
    pub fn init(&mut self) -> Result<()> {
        self.arp_init()
    }

    /// Run one receive cycle
    ///
    /// Returns `Ok(false)` when the device had no frame to deliver.
    pub fn poll(&mut self) -> Result<bool> {
        let mut frame = [0u8; RX_FRAME_LEN];
        let n = self.device.receive(&mut frame)?;
        if n == 0 {
            return Ok(false);
        }

        self.ethernet_in(PacketBuffer::from_slice(&frame[..n]))?;
        Ok(true)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn arp_cache(&self) -> &ArpCache {
        &self.arp_cache
    }

    pub fn arp_pending(&self) -> Option<&PendingPacket> {
        self.arp_pending.as_ref()
    }

    pub fn udp_table(&self) -> &UdpTable {
        &self.udp_table
    }
}

use crate::buffer::PacketBuffer;
use crate::error::Result;
use crate::iface::device::Device;
use crate::iface::interface::NetworkInterface;
use crate::network::arp::{ArpPacket, ArpState, PendingPacket, ARP_OP_REPLY, ARP_OP_REQUEST};
use crate::network::ethernet::{ethertype, MacAddr};
use crate::network::ipv4::IPV4_HEADER_LEN;
use std::net::Ipv4Addr;
use std::time::Instant;
use tracing::{debug, trace};

impl<D: Device> NetworkInterface<D> {
    /// Clear the cache and pending slot, then broadcast a request for our
    /// own address so peers learn it
    pub fn arp_init(&mut self) -> Result<()> {
        self.arp_cache.clear();
        self.arp_pending = None;
        self.arp_request(self.config.ip)
    }

    /// Record a mapping in the resolution cache, stamped with the current time
    pub fn arp_update(&mut self, ip: Ipv4Addr, mac: MacAddr, state: ArpState) {
        self.arp_cache.update(ip, mac, state, Instant::now());
    }

    /// Broadcast a request for `target_ip`
    pub fn arp_request(&mut self, target_ip: Ipv4Addr) -> Result<()> {
        debug!("arp who-has {} tell {}", target_ip, self.config.ip);
        let request = ArpPacket::request(self.config.mac, self.config.ip, target_ip);
        self.ethernet_out(
            PacketBuffer::from_slice(&request.to_bytes()),
            MacAddr::BROADCAST,
            ethertype::ARP,
        )
    }

    /// Process an inbound ARP message
    ///
    /// A reply releases the pending packet whatever address it answers; the
    /// released packet goes back through `arp_out` and is only transmitted
    /// if its own next hop is now known.
    pub fn arp_in(&mut self, buf: PacketBuffer) -> Result<()> {
        let packet = match ArpPacket::from_bytes(buf.data()) {
            Some(packet) if packet.is_ethernet_ipv4() => packet,
            _ => {
                trace!("dropping malformed arp message of {} bytes", buf.len());
                return Ok(());
            }
        };

        self.arp_update(packet.sender_ip, packet.sender_mac, ArpState::Valid);

        match packet.opcode {
            ARP_OP_REPLY => {
                if let Some(pending) = self.arp_pending.take() {
                    debug!(
                        "arp reply from {} releases packet for {}",
                        packet.sender_ip, pending.ip
                    );
                    self.arp_out(pending.buf, pending.ip, pending.ethertype)?;
                }
                Ok(())
            }
            ARP_OP_REQUEST if packet.target_ip == self.config.ip => {
                debug!("arp {} is-at {} for {}", self.config.ip, self.config.mac, packet.sender_ip);
                let reply = ArpPacket::reply(
                    self.config.mac,
                    self.config.ip,
                    packet.sender_mac,
                    packet.sender_ip,
                );
                self.ethernet_out(
                    PacketBuffer::from_slice(&reply.to_bytes()),
                    packet.sender_mac,
                    ethertype::ARP,
                )
            }
            _ => Ok(()),
        }
    }

    /// Send `buf` to `ip`, resolving its hardware address first
    ///
    /// On a cache miss the packet replaces whatever was held in the pending
    /// slot and a request is broadcast.
    pub fn arp_out(&mut self, buf: PacketBuffer, ip: Ipv4Addr, ethertype: u16) -> Result<()> {
        if let Some(mac) = self.arp_cache.lookup(ip) {
            return self.ethernet_out(buf, mac, ethertype);
        }

        let pending = PendingPacket { ip, ethertype, buf };
        if let Some(dropped) = self.arp_pending.replace(pending) {
            debug!("pending packet for {} overwritten by packet for {}", dropped.ip, ip);
        }
        self.arp_request(ip)
    }

    /// Learn the sender of an inbound IPv4 datagram if it is not cached yet
    pub(crate) fn arp_learn(&mut self, src_mac: MacAddr, datagram: &[u8]) {
        if datagram.len() < IPV4_HEADER_LEN {
            return;
        }
        let src_ip = Ipv4Addr::new(datagram[12], datagram[13], datagram[14], datagram[15]);
        if self.arp_cache.lookup(src_ip).is_none() {
            self.arp_update(src_ip, src_mac, ArpState::Valid);
        }
    }
}

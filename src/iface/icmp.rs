use crate::buffer::PacketBuffer;
use crate::error::Result;
use crate::iface::device::Device;
use crate::iface::interface::NetworkInterface;
use crate::network::icmp::{self, IcmpHeader};
use crate::network::ipv4::protocol;
use std::net::Ipv4Addr;
use tracing::{debug, trace};

impl<D: Device> NetworkInterface<D> {
    /// Process an inbound ICMP message, answering echo requests
    pub fn icmp_in(&mut self, buf: PacketBuffer, src_ip: Ipv4Addr) -> Result<()> {
        let header = match IcmpHeader::from_bytes(buf.data()) {
            Some(header) => header,
            None => {
                trace!("dropping short icmp message from {}", src_ip);
                return Ok(());
            }
        };

        if !header.is_echo_request() {
            trace!(
                "ignoring icmp type {} code {} from {}",
                header.msg_type,
                header.msg_code,
                src_ip
            );
            return Ok(());
        }

        let reply = match icmp::echo_reply(buf.data()) {
            Some(reply) => reply,
            None => return Ok(()),
        };
        debug!(
            "echo reply to {} id={} seq={}",
            src_ip,
            header.identifier(),
            header.sequence()
        );
        self.ip_out(PacketBuffer::from_slice(&reply), src_ip, protocol::ICMP)
    }

    /// Report an undeliverable datagram back to its sender
    ///
    /// `datagram` starts at the offending IPv4 header.
    pub fn icmp_unreachable(&mut self, datagram: &[u8], src_ip: Ipv4Addr, code: u8) -> Result<()> {
        let msg = icmp::dest_unreachable(datagram, code);
        self.ip_out(PacketBuffer::from_slice(&msg), src_ip, protocol::ICMP)
    }
}

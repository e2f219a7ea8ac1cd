use crate::buffer::PacketBuffer;
use crate::error::{Error, Result};
use crate::iface::device::Device;
use crate::iface::interface::NetworkInterface;
use crate::network::icmp::code;
use crate::network::ipv4::{protocol, IPV4_HEADER_LEN};
use crate::transport::udp::{pseudo_checksum, UdpHeader, UDP_HEADER_LEN};
use byteorder::{BigEndian, ByteOrder};
use std::net::Ipv4Addr;
use tracing::{debug, trace};

/// Datagrams declaring less than this are trimmed to their declared length,
/// discarding link-layer padding
const UDP_PADDED_LEN: usize = 18;

impl<D: Device> NetworkInterface<D> {
    /// Register `handler` for datagrams addressed to `port`
    ///
    /// Replaces any handler already registered for the port. Fails with
    /// `Error::TableFull` if the port is new and the table has no free slot.
    pub fn udp_open<F>(&mut self, port: u16, handler: F) -> Result<()>
    where
        F: FnMut(Ipv4Addr, u16, &[u8]) + 'static,
    {
        self.udp_table.open(port, Box::new(handler))
    }

    pub fn udp_close(&mut self, port: u16) {
        self.udp_table.close(port);
    }

    /// Verify an inbound datagram and hand its payload to the port's handler
    ///
    /// Datagrams for ports without a handler are answered with an ICMP
    /// port unreachable quoting the offending IPv4 header.
    pub fn udp_in(&mut self, mut buf: PacketBuffer, src_ip: Ipv4Addr) -> Result<()> {
        let header = match UdpHeader::from_bytes(buf.data()) {
            Some(header) => header,
            None => {
                trace!("dropping truncated udp datagram from {}", src_ip);
                return Ok(());
            }
        };

        let length = header.length as usize;
        if length < UDP_HEADER_LEN {
            trace!("dropping udp datagram from {} with length {}", src_ip, length);
            return Ok(());
        }
        if length < UDP_PADDED_LEN {
            buf.truncate(length);
        }

        buf.data_mut()[6..8].copy_from_slice(&[0, 0]);
        let sum = pseudo_checksum(&mut buf, src_ip, self.config.ip)?;
        if sum != header.checksum {
            trace!(
                "dropping udp datagram from {}: checksum {:#06x} != {:#06x}",
                src_ip,
                header.checksum,
                sum
            );
            return Ok(());
        }
        BigEndian::write_u16(&mut buf.data_mut()[6..8], header.checksum);

        if let Some(handler) = self.udp_table.handler_mut(header.dst_port) {
            buf.remove_header(UDP_HEADER_LEN)?;
            handler(src_ip, header.src_port, buf.data());
            return Ok(());
        }

        debug!("udp port {} unreachable, notifying {}", header.dst_port, src_ip);
        buf.add_header(IPV4_HEADER_LEN)?;
        self.icmp_unreachable(buf.data(), src_ip, code::PORT_UNREACHABLE)
    }

    /// Prepend a UDP header to `buf`, checksum it and send it to `dst_ip`
    pub fn udp_out(
        &mut self,
        mut buf: PacketBuffer,
        src_port: u16,
        dst_ip: Ipv4Addr,
        dst_port: u16,
    ) -> Result<()> {
        if buf.len() > u16::MAX as usize - UDP_HEADER_LEN {
            return Err(Error::PayloadTooLarge(buf.len()));
        }
        buf.add_header(UDP_HEADER_LEN)?;
        let header = UdpHeader {
            src_port,
            dst_port,
            length: buf.len() as u16,
            checksum: 0,
        };
        buf.data_mut()[..UDP_HEADER_LEN].copy_from_slice(&header.to_bytes());

        let sum = pseudo_checksum(&mut buf, self.config.ip, dst_ip)?;
        BigEndian::write_u16(&mut buf.data_mut()[6..8], sum);

        self.ip_out(buf, dst_ip, protocol::UDP)
    }

    /// Send `data` as one UDP datagram
    pub fn udp_send(&mut self, data: &[u8], src_port: u16, dst_ip: Ipv4Addr, dst_port: u16) -> Result<()> {
        self.udp_out(PacketBuffer::from_slice(data), src_port, dst_ip, dst_port)
    }
}

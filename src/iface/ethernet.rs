use crate::buffer::PacketBuffer;
use crate::error::Result;
use crate::iface::device::Device;
use crate::iface::interface::NetworkInterface;
use crate::network::ethernet::{ethertype, EthernetHeader, MacAddr, ETHERNET_HEADER_LEN};
use tracing::{trace, warn};

impl<D: Device> NetworkInterface<D> {
    /// Strip the link header and hand the payload to ARP or IPv4
    ///
    /// IPv4 frames also feed the ARP cache with the sender's addresses.
    pub fn ethernet_in(&mut self, mut buf: PacketBuffer) -> Result<()> {
        let header = match EthernetHeader::from_bytes(buf.data()) {
            Some(header) => header,
            None => {
                trace!("dropping runt frame of {} bytes", buf.len());
                return Ok(());
            }
        };
        buf.remove_header(ETHERNET_HEADER_LEN)?;

        match header.ethertype {
            ethertype::ARP => self.arp_in(buf),
            ethertype::IPV4 => {
                self.arp_learn(header.src, buf.data());
                self.ip_in(buf)
            }
            other => {
                trace!("dropping frame with ethertype {:#06x}", other);
                Ok(())
            }
        }
    }

    /// Prepend the link header and transmit the frame
    pub fn ethernet_out(&mut self, mut buf: PacketBuffer, dst: MacAddr, ethertype: u16) -> Result<()> {
        buf.add_header(ETHERNET_HEADER_LEN)?;
        let header = EthernetHeader {
            dst,
            src: self.config.mac,
            ethertype,
        };
        buf.data_mut()[..ETHERNET_HEADER_LEN].copy_from_slice(&header.to_bytes());

        if let Err(e) = self.device.transmit(buf.data()) {
            warn!("failed to transmit {} byte frame to {}: {}", buf.len(), dst, e);
            return Err(e.into());
        }
        Ok(())
    }
}

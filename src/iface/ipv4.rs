use crate::buffer::PacketBuffer;
use crate::error::{Error, Result};
use crate::iface::device::Device;
use crate::iface::interface::NetworkInterface;
use crate::network::ethernet::ethertype;
use crate::network::icmp::code;
use crate::network::ipv4::{
    protocol, Ipv4Header, IPV4_HEADER_LEN, IPV4_MAX_FRAGMENT_PAYLOAD, IPV4_MAX_PAYLOAD,
};
use std::net::Ipv4Addr;
use tracing::{debug, trace};

impl<D: Device> NetworkInterface<D> {
    /// Validate an inbound datagram and dispatch it by protocol
    ///
    /// Datagrams failing validation or addressed elsewhere are dropped.
    /// Fragments are not reassembled; each is processed as if complete.
    pub fn ip_in(&mut self, mut buf: PacketBuffer) -> Result<()> {
        let header = match Ipv4Header::from_bytes(buf.data()) {
            Some(header) => header,
            None => {
                trace!("dropping truncated ipv4 datagram of {} bytes", buf.len());
                return Ok(());
            }
        };

        if let Err(reason) = header.validate(buf.data()) {
            trace!("dropping ipv4 datagram from {}: {:?}", header.src_addr, reason);
            return Ok(());
        }

        if header.dst_addr != self.config.ip {
            trace!("dropping ipv4 datagram for {}", header.dst_addr);
            return Ok(());
        }

        // Dispatch based on protocol
        match header.protocol {
            protocol::ICMP => {
                // Link padding would otherwise be echoed back
                buf.truncate((header.total_len as usize).max(header.header_len()));
                buf.remove_header(header.header_len())?;
                self.icmp_in(buf, header.src_addr)
            }
            protocol::UDP => {
                buf.remove_header(header.header_len())?;
                self.udp_in(buf, header.src_addr)
            }
            other => {
                debug!("protocol {} unreachable, notifying {}", other, header.src_addr);
                self.icmp_unreachable(buf.data(), header.src_addr, code::PROTOCOL_UNREACHABLE)
            }
        }
    }

    /// Prepend an IPv4 header to one fragment and pass it to ARP
    ///
    /// `offset` is in 8-byte units; the total length is the buffer length
    /// once the header is in place.
    pub fn ip_fragment_out(
        &mut self,
        mut buf: PacketBuffer,
        ip: Ipv4Addr,
        proto: u8,
        id: u16,
        offset: u16,
        more_fragments: bool,
    ) -> Result<()> {
        buf.add_header(IPV4_HEADER_LEN)?;
        let mut header = Ipv4Header::fragment(
            buf.len() as u16,
            id,
            offset,
            more_fragments,
            proto,
            self.config.ip,
            ip,
        );
        header.update_checksum();
        buf.data_mut()[..IPV4_HEADER_LEN].copy_from_slice(&header.to_bytes());

        self.arp_out(buf, ip, ethertype::IPV4)
    }

    /// Send a payload to `ip`, fragmenting it if it exceeds one datagram
    ///
    /// Every fragment of the payload carries the same identification.
    /// Payloads longer than `IPV4_MAX_PAYLOAD` are rejected before anything
    /// is sent.
    pub fn ip_out(&mut self, mut buf: PacketBuffer, ip: Ipv4Addr, proto: u8) -> Result<()> {
        if buf.len() > IPV4_MAX_PAYLOAD {
            return Err(Error::PayloadTooLarge(buf.len()));
        }

        let id = self.ip_id;
        self.ip_id = self.ip_id.wrapping_add(1);

        let mut offset = 0u16;
        while buf.len() > IPV4_MAX_FRAGMENT_PAYLOAD {
            let fragment = PacketBuffer::from_slice(&buf.data()[..IPV4_MAX_FRAGMENT_PAYLOAD]);
            self.ip_fragment_out(fragment, ip, proto, id, offset, true)?;
            buf.remove_header(IPV4_MAX_FRAGMENT_PAYLOAD)?;
            offset += (IPV4_MAX_FRAGMENT_PAYLOAD / 8) as u16;
        }

        self.ip_fragment_out(buf, ip, proto, id, offset, false)
    }
}

#[cfg(test)]
mod tests {
    use crate::buffer::PacketBuffer;
    use crate::config::Config;
    use crate::error::Error;
    use crate::iface::device::MemoryDevice;
    use crate::iface::interface::NetworkInterface;
    use crate::iface::testutil::*;
    use crate::network::arp::ArpState;
    use crate::network::checksum;
    use crate::network::icmp::{code, ICMP_TYPE_DEST_UNREACHABLE};
    use crate::network::ipv4::{protocol, Ipv4Header, IPV4_MAX_PAYLOAD};

    fn iface() -> NetworkInterface<MemoryDevice> {
        let mut iface = NetworkInterface::new(Config::new(LOCAL_MAC, LOCAL_IP), MemoryDevice::new());
        iface.arp_update(PEER_IP, PEER_MAC, ArpState::Valid);
        iface
    }

    fn ip_of(frame: &[u8]) -> (Ipv4Header, &[u8]) {
        let header = Ipv4Header::from_bytes(&frame[14..]).unwrap();
        (header, &frame[34..])
    }

    #[test]
    fn test_small_payload_single_datagram() {
        let mut iface = iface();
        iface
            .ip_out(PacketBuffer::from_slice(&[7u8; 100]), PEER_IP, protocol::UDP)
            .unwrap();

        let frames = iface.device_mut().drain_tx();
        assert_eq!(frames.len(), 1);
        let (header, payload) = ip_of(&frames[0]);
        assert_eq!(header.total_len, 120);
        assert!(!header.more_fragments());
        assert_eq!(header.fragment_offset(), 0);
        assert_eq!(header.src_addr, LOCAL_IP);
        assert_eq!(header.dst_addr, PEER_IP);
        assert_eq!(header.protocol, protocol::UDP);
        assert_eq!(checksum(&frames[0][14..34]), 0);
        assert_eq!(payload, &[7u8; 100][..]);
    }

    #[test]
    fn test_exactly_one_fragment_budget_is_not_split() {
        let mut iface = iface();
        iface
            .ip_out(PacketBuffer::from_slice(&[1u8; 1480]), PEER_IP, protocol::UDP)
            .unwrap();
        let frames = iface.device_mut().drain_tx();
        assert_eq!(frames.len(), 1);
        assert_eq!(ip_of(&frames[0]).0.total_len, 1500);
    }

    #[test]
    fn test_large_payload_is_fragmented() {
        let mut iface = iface();
        let payload: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();
        iface
            .ip_out(PacketBuffer::from_slice(&payload), PEER_IP, protocol::UDP)
            .unwrap();

        let frames = iface.device_mut().drain_tx();
        assert_eq!(frames.len(), 3);

        let mut reassembled = Vec::new();
        let mut last_offset = None;
        let first_id = ip_of(&frames[0]).0.id;
        for (i, frame) in frames.iter().enumerate() {
            let (header, data) = ip_of(frame);
            assert_eq!(header.id, first_id);
            assert_eq!(header.more_fragments(), i < frames.len() - 1);
            assert_eq!(checksum(&frame[14..34]), 0);
            assert_eq!(header.fragment_offset() as usize * 8, reassembled.len());
            if let Some(prev) = last_offset {
                assert!(header.fragment_offset() > prev);
            }
            last_offset = Some(header.fragment_offset());
            reassembled.extend_from_slice(data);
        }
        assert_eq!(reassembled, payload);
        assert_eq!(ip_of(&frames[1]).0.fragment_offset(), 185);
        assert_eq!(ip_of(&frames[2]).0.total_len, 20 + 40);
    }

    #[test]
    fn test_largest_payload_fits_offset_field() {
        let mut iface = iface();
        iface
            .ip_out(PacketBuffer::from_slice(&[3u8; IPV4_MAX_PAYLOAD]), PEER_IP, protocol::UDP)
            .unwrap();

        let frames = iface.device_mut().drain_tx();
        assert_eq!(frames.len(), 45);
        let (last, data) = ip_of(&frames[44]);
        assert_eq!(last.fragment_offset(), 44 * 185);
        assert!(!last.more_fragments());
        assert_eq!(last.fragment_offset() as usize * 8 + data.len(), IPV4_MAX_PAYLOAD);
    }

    #[test]
    fn test_oversize_payload_rejected_before_sending() {
        let mut iface = iface();
        for size in [IPV4_MAX_PAYLOAD + 1, 70_000, 600_000] {
            let result = iface.ip_out(PacketBuffer::from_slice(&vec![0u8; size]), PEER_IP, protocol::UDP);
            assert!(matches!(result, Err(Error::PayloadTooLarge(n)) if n == size));
        }
        assert!(iface.device().tx.is_empty());
    }

    #[test]
    fn test_identification_advances_per_datagram() {
        let mut iface = iface();
        for _ in 0..2 {
            iface
                .ip_out(PacketBuffer::from_slice(&[0u8; 4]), PEER_IP, protocol::UDP)
                .unwrap();
        }
        let frames = iface.device_mut().drain_tx();
        let first = ip_of(&frames[0]).0.id;
        let second = ip_of(&frames[1]).0.id;
        assert_eq!(second, first.wrapping_add(1));
    }

    #[test]
    fn test_not_for_us_is_dropped() {
        let mut iface = iface();
        let datagram = ipv4_datagram(PEER_IP, OTHER_IP, protocol::ICMP, &[8, 0, 0xf7, 0xff, 0, 0, 0, 0]);
        iface.device_mut().push_rx(ipv4_frame(PEER_MAC, &datagram));
        iface.poll().unwrap();
        assert!(iface.device().tx.is_empty());
    }

    #[test]
    fn test_bad_checksum_is_dropped() {
        let mut iface = iface();
        let mut datagram = ipv4_datagram(PEER_IP, LOCAL_IP, 253, &[0u8; 8]);
        datagram[10] ^= 0x01;
        iface.device_mut().push_rx(ipv4_frame(PEER_MAC, &datagram));
        iface.poll().unwrap();
        assert!(iface.device().tx.is_empty());
    }

    #[test]
    fn test_oversized_total_length_is_dropped() {
        let mut iface = iface();
        let mut datagram = ipv4_datagram(PEER_IP, LOCAL_IP, 253, &[0u8; 8]);
        datagram[2..4].copy_from_slice(&1501u16.to_be_bytes());
        datagram[10..12].copy_from_slice(&[0, 0]);
        let sum = checksum(&datagram[..20]);
        datagram[10..12].copy_from_slice(&sum.to_be_bytes());
        iface.device_mut().push_rx(ipv4_frame(PEER_MAC, &datagram));
        iface.poll().unwrap();
        assert!(iface.device().tx.is_empty());
    }

    #[test]
    fn test_unknown_protocol_gets_protocol_unreachable() {
        let mut iface = iface();
        let datagram = ipv4_datagram(PEER_IP, LOCAL_IP, 253, &[0xEE; 12]);
        iface.device_mut().push_rx(ipv4_frame(PEER_MAC, &datagram));
        iface.poll().unwrap();

        let frames = iface.device_mut().drain_tx();
        assert_eq!(frames.len(), 1);
        let (header, icmp) = ip_of(&frames[0]);
        assert_eq!(header.protocol, protocol::ICMP);
        assert_eq!(header.dst_addr, PEER_IP);
        assert_eq!(icmp.len(), 36);
        assert_eq!(icmp[0], ICMP_TYPE_DEST_UNREACHABLE);
        assert_eq!(icmp[1], code::PROTOCOL_UNREACHABLE);
        assert_eq!(&icmp[8..36], &datagram[..28]);
        assert_eq!(checksum(icmp), 0);
    }
}

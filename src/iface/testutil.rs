//! Frame builders shared by the interface tests

use crate::network::arp::ArpPacket;
use crate::network::checksum;
use crate::network::ethernet::{ethertype, EthernetHeader, MacAddr};
use crate::network::ipv4::Ipv4Header;
use crate::transport::udp::UdpHeader;
use std::net::Ipv4Addr;

pub const LOCAL_MAC: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
pub const LOCAL_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
pub const PEER_MAC: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x02]);
pub const PEER_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);
pub const OTHER_MAC: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x03]);
pub const OTHER_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 3);

pub fn frame(dst: MacAddr, src: MacAddr, kind: u16, payload: &[u8]) -> Vec<u8> {
    let header = EthernetHeader {
        dst,
        src,
        ethertype: kind,
    };
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(payload);
    bytes
}

pub fn arp_frame(dst: MacAddr, packet: &ArpPacket) -> Vec<u8> {
    frame(dst, packet.sender_mac, ethertype::ARP, &packet.to_bytes())
}

pub fn ipv4_frame(src_mac: MacAddr, datagram: &[u8]) -> Vec<u8> {
    frame(LOCAL_MAC, src_mac, ethertype::IPV4, datagram)
}

/// A complete, correctly checksummed IPv4 datagram
pub fn ipv4_datagram(src: Ipv4Addr, dst: Ipv4Addr, proto: u8, payload: &[u8]) -> Vec<u8> {
    let mut header = Ipv4Header::fragment((20 + payload.len()) as u16, 0x4242, 0, false, proto, src, dst);
    header.update_checksum();
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(payload);
    bytes
}

/// A UDP header plus payload with a valid pseudo-header checksum
pub fn udp_segment(src: Ipv4Addr, dst: Ipv4Addr, src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let header = UdpHeader {
        src_port,
        dst_port,
        length: (8 + payload.len()) as u16,
        checksum: 0,
    };
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(payload);

    let mut pseudo = Vec::new();
    pseudo.extend_from_slice(&src.octets());
    pseudo.extend_from_slice(&dst.octets());
    pseudo.extend_from_slice(&[0, 17]);
    pseudo.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    pseudo.extend_from_slice(&bytes);
    let sum = checksum(&pseudo);
    bytes[6..8].copy_from_slice(&sum.to_be_bytes());
    bytes
}

//! Raw frame devices
//!
//! A `Device` moves whole Ethernet frames in and out of the stack. The TAP
//! backend talks to the kernel through `tun-tap`; the memory backend keeps
//! frames in queues for tests and offline replay.

use std::collections::VecDeque;
use std::io;
use tun_tap::{Iface, Mode};

pub trait Device {
    /// Copy one inbound frame into `buf`, returning its length (0 if none)
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Transmit one complete frame
    fn transmit(&mut self, frame: &[u8]) -> io::Result<()>;
}

/// Linux TAP interface carrying Ethernet frames
pub struct TapDevice {
    iface: Iface,
}

impl TapDevice {
    /// Open (or create) the TAP interface `name`
    ///
    /// Receives block until a frame arrives.
    pub fn open(name: &str) -> io::Result<Self> {
        let iface = Iface::without_packet_info(name, Mode::Tap)?;
        Ok(TapDevice { iface })
    }

    pub fn name(&self) -> &str {
        self.iface.name()
    }
}

impl Device for TapDevice {
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.iface.recv(buf)
    }

    fn transmit(&mut self, frame: &[u8]) -> io::Result<()> {
        self.iface.send(frame).map(|_| ())
    }
}

/// In-memory device: frames queued in `rx` are received, transmitted
/// frames are appended to `tx`
#[derive(Debug, Default, Clone)]
pub struct MemoryDevice {
    pub rx: VecDeque<Vec<u8>>,
    pub tx: Vec<Vec<u8>>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rx(&mut self, frame: Vec<u8>) {
        self.rx.push_back(frame);
    }

    /// Take every frame transmitted so far
    pub fn drain_tx(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.tx)
    }
}

impl Device for MemoryDevice {
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.rx.pop_front() {
            Some(frame) => {
                let n = frame.len().min(buf.len());
                buf[..n].copy_from_slice(&frame[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }

    fn transmit(&mut self, frame: &[u8]) -> io::Result<()> {
        self.tx.push(frame.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_device_queues() {
        let mut dev = MemoryDevice::new();
        let mut buf = [0u8; 16];
        assert_eq!(dev.receive(&mut buf).unwrap(), 0);

        dev.push_rx(vec![1, 2, 3]);
        assert_eq!(dev.receive(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);

        dev.transmit(&[4, 5]).unwrap();
        assert_eq!(dev.drain_tx(), vec![vec![4, 5]]);
        assert!(dev.tx.is_empty());
    }
}

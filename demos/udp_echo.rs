//! UDP echo server on a TAP interface
//!
//! Usage: udp_echo [tap-name] [ip] [mac]
//!
//! The TAP device must exist and be up, e.g.
//! `ip tuntap add tap0 mode tap && ip addr add 192.168.163.1/24 dev tap0 && ip link set tap0 up`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::rc::Rc;

use tiny_netstack::{Config, NetworkInterface, Result, TapDevice};
use tracing::info;

const ECHO_PORT: u16 = 7;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let tap_name = args.next().unwrap_or_else(|| "tap0".to_string());
    let mut config = Config::default();
    if let Some(ip) = args.next() {
        config.ip = ip
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    }
    if let Some(mac) = args.next() {
        config.mac = mac.parse()?;
    }

    let device = TapDevice::open(&tap_name)?;
    info!("listening on {} as {} ({})", device.name(), config.ip, config.mac);

    let mut iface = NetworkInterface::new(config, device);
    iface.init()?;

    let queue: Rc<RefCell<VecDeque<(Ipv4Addr, u16, Vec<u8>)>>> = Rc::default();
    let inbox = queue.clone();
    iface.udp_open(ECHO_PORT, move |ip, port, data| {
        info!("{} bytes from {}:{}", data.len(), ip, port);
        inbox.borrow_mut().push_back((ip, port, data.to_vec()));
    })?;

    loop {
        iface.poll()?;

        let echoes: Vec<_> = queue.borrow_mut().drain(..).collect();
        for (ip, port, data) in echoes {
            iface.udp_send(&data, ECHO_PORT, ip, port)?;
        }
    }
}

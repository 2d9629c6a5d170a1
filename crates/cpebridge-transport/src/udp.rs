use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use bytes::Bytes;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{RadioTransport, RADIO_FRAME_LEN};

/// Default UDP port the gateway listens on.
pub const DEFAULT_GATEWAY_PORT: u16 = 4242;

/// Default UDP port simulated sensor nodes listen on.
pub const DEFAULT_NODE_PORT: u16 = 4243;

/// Receive buffer size. Anything longer is truncated and then rejected
/// by the length gate.
const MAX_DATAGRAM: usize = 256;

/// Configuration for [`UdpRadio`].
#[derive(Debug, Clone)]
pub struct UdpRadioConfig {
    /// Local address to receive datagrams on.
    pub bind: SocketAddr,
    /// Destination for transmitted frames (unicast or broadcast).
    pub peer: SocketAddr,
}

impl Default for UdpRadioConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::V4(SocketAddrV4::new(
                Ipv4Addr::UNSPECIFIED,
                DEFAULT_GATEWAY_PORT,
            )),
            peer: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_NODE_PORT)),
        }
    }
}

/// A UDP socket standing in for the short-range radio link.
///
/// Delivery semantics match the radio: unacknowledged, unordered, lossy.
/// Receives never block.
pub struct UdpRadio {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpRadio {
    /// Bind the local socket and remember the transmit destination.
    pub fn bind(config: &UdpRadioConfig) -> Result<Self> {
        let socket = UdpSocket::bind(config.bind).map_err(|e| TransportError::Bind {
            addr: config.bind,
            source: e,
        })?;
        socket.set_nonblocking(true)?;

        // Subnet-directed broadcast depends on the netmask, which a bare
        // address does not carry; only the limited broadcast is recognised.
        if is_broadcast(&config.peer) {
            socket.set_broadcast(true)?;
        }

        let local = socket.local_addr()?;
        info!(%local, peer = %config.peer, "radio link up (udp)");

        Ok(Self {
            socket,
            peer: config.peer,
        })
    }

    /// The address this radio is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(Into::into)
    }

    /// The address frames are transmitted to.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "udp"
    }
}

impl RadioTransport for UdpRadio {
    fn send(&mut self, frame: &[u8; RADIO_FRAME_LEN]) -> Result<()> {
        loop {
            match self.socket.send_to(frame, self.peer) {
                Ok(_) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn try_recv(&mut self) -> Result<Option<Bytes>> {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((n, from)) => {
                    debug!(%from, len = n, "datagram received");
                    return Ok(Some(Bytes::copy_from_slice(&buf[..n])));
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(None),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl std::fmt::Debug for UdpRadio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpRadio")
            .field("local", &self.socket.local_addr().ok())
            .field("peer", &self.peer)
            .finish()
    }
}

fn is_broadcast(addr: &SocketAddr) -> bool {
    match addr {
        SocketAddr::V4(v4) => v4.ip().is_broadcast(),
        SocketAddr::V6(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn loopback(port: u16) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
    }

    fn recv_within(radio: &mut UdpRadio, timeout: Duration) -> Option<Bytes> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if let Some(datagram) = radio.try_recv().unwrap() {
                return Some(datagram);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn test_send_and_receive_over_loopback() {
        let mut b = UdpRadio::bind(&UdpRadioConfig {
            bind: loopback(0),
            peer: loopback(9),
        })
        .unwrap();
        let mut a = UdpRadio::bind(&UdpRadioConfig {
            bind: loopback(0),
            peer: b.local_addr().unwrap(),
        })
        .unwrap();

        a.send(&[0x5A; RADIO_FRAME_LEN]).unwrap();
        let datagram = recv_within(&mut b, Duration::from_secs(2)).expect("datagram expected");
        assert_eq!(datagram.as_ref(), &[0x5A; RADIO_FRAME_LEN]);
    }

    #[test]
    fn test_try_recv_does_not_block() {
        let mut radio = UdpRadio::bind(&UdpRadioConfig {
            bind: loopback(0),
            peer: loopback(9),
        })
        .unwrap();

        let start = Instant::now();
        assert!(radio.try_recv().unwrap().is_none());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_receives_datagrams_of_any_length() {
        let mut radio = UdpRadio::bind(&UdpRadioConfig {
            bind: loopback(0),
            peer: loopback(9),
        })
        .unwrap();
        let target = radio.local_addr().unwrap();

        let sender = UdpSocket::bind(loopback(0)).unwrap();
        sender.send_to(&[1, 2, 3], target).unwrap();

        let datagram = recv_within(&mut radio, Duration::from_secs(2)).expect("datagram expected");
        assert_eq!(datagram.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_bind_conflict_reports_address() {
        let holder = UdpSocket::bind(loopback(0)).unwrap();
        let taken = holder.local_addr().unwrap();

        let result = UdpRadio::bind(&UdpRadioConfig {
            bind: taken,
            peer: loopback(9),
        });
        assert!(matches!(result, Err(TransportError::Bind { addr, .. }) if addr == taken));
    }

    #[test]
    fn test_broadcast_detection() {
        assert!(is_broadcast(&"255.255.255.255:4242".parse().unwrap()));
        assert!(!is_broadcast(&"192.168.1.255:4242".parse().unwrap()));
        assert!(!is_broadcast(&"10.0.3.255:4242".parse().unwrap()));
        assert!(!is_broadcast(&"127.0.0.1:4242".parse().unwrap()));
    }
}

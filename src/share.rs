use crate::{conf::Conf, StatErr};
use std::{
    io::ErrorKind,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket},
    time::{Duration, Instant},
};

/// Single point in time by which the whole exchange has to resolve.
///
/// Every blocking socket call is armed with what is left of it, so the response
/// and the timeout can never both resolve a call.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(window: Duration) -> Self {
        Self {
            at: Instant::now() + window,
        }
    }

    /// Time left, or [StatErr::Timeout] once it has passed.
    pub fn remaining(&self, host: &str) -> Result<Duration, StatErr> {
        match self.at.checked_duration_since(Instant::now()) {
            Some(left) if !left.is_zero() => Ok(left),
            _ => Err(StatErr::timeout(host)),
        }
    }
}

/// Timeouts surface as `WouldBlock` on unix and `TimedOut` on windows.
pub fn map_io_err(err: std::io::Error, host: &str) -> StatErr {
    match err.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => StatErr::timeout(host),
        _ => StatErr::IoErr(err),
    }
}

/// First address `conf` resolves to. The lookup blocks on the system resolver and
/// is not bounded by any [Deadline].
pub fn resolve_addr(conf: &Conf) -> Result<SocketAddr, StatErr> {
    match conf.to_socket_addrs()?.next() {
        Some(addr) => Ok(addr),
        None => Err(StatErr::ProtocolErr(format!(
            "{} did not resolve to any socket address",
            conf
        ))),
    }
}

pub fn create_tcp_socket(
    conf: &Conf,
    addr: &SocketAddr,
    deadline: &Deadline,
) -> Result<TcpStream, StatErr> {
    let socket = TcpStream::connect_timeout(addr, deadline.remaining(&conf.host)?)
        .map_err(|err| map_io_err(err, &conf.host))?;

    socket.set_nodelay(true)?;

    Ok(socket)
}

/// Bind a UDP socket in the address family of `addr` and connect it, so that only
/// datagrams from the server are received.
pub fn create_udp_socket(conf: &Conf, addr: &SocketAddr) -> Result<UdpSocket, StatErr> {
    let port = conf.socket_conf.rep_udp_port;
    let socket = match addr {
        SocketAddr::V4(_) => UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))?,
        SocketAddr::V6(_) => UdpSocket::bind((Ipv6Addr::UNSPECIFIED, port))?,
    };

    socket.connect(addr)?;

    Ok(socket)
}

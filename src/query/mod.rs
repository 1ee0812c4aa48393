//! Client for the UDP [Query](https://wiki.vg/Query) protocol.
//!
//! The exchange itself is the sans-I/O [QueryExchange]; [query_full_stat] and
//! [query_basic_stat] drive it over a connected UDP socket.

mod decode;

use crate::{
    conf::Conf,
    share::{create_udp_socket, map_io_err, resolve_addr, Deadline},
    stat::QueryResult,
    StatErr,
};
pub use decode::*;
use std::net::UdpSocket;
use tracing::{debug, trace};

const MAGIC: [u8; 2] = [0xFE, 0xFD];
const HANDSHAKE_TYPE: u8 = 0x09;
const STAT_TYPE: u8 = 0x00;
/// Fixed session id, `0tii`. The basic stat decoder relies on its last three bytes.
pub const SESSION_ID: i32 = 0x00746969;
/// The challenge token starts right after the type byte and the echoed session id.
const TOKEN_STR_OFFSET: usize = 5;
/// Where the token goes in a stat request.
const TOKEN_OFFSET: usize = 7;
const MAX_DATAGRAM_SIZE: usize = 65_535;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Basic,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    HandshakeSent,
    TokenReceived,
    StatSent,
    Completed,
    TimedOut,
    Failed,
}

/// What the socket driver has to do with a received datagram.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    /// Send this stat request to the server.
    Send(Vec<u8>),
    /// The exchange is over, decode this payload.
    Complete(Vec<u8>),
    /// Not a message type of this protocol.
    Ignore,
}

/// One handshake + stat request conversation, without any I/O.
#[derive(Debug)]
pub struct QueryExchange {
    state: QueryState,
    stat_packet: Vec<u8>,
}

impl QueryExchange {
    pub fn new(kind: StatKind) -> Self {
        Self {
            state: QueryState::Idle,
            stat_packet: build_stat_packet(kind),
        }
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    /// The handshake packet that asks the server for a challenge token.
    pub fn start(&mut self) -> Vec<u8> {
        self.state = QueryState::HandshakeSent;

        build_handshake_packet()
    }

    /// Feed a datagram received from the server.
    pub fn handle_datagram(&mut self, msg: &[u8]) -> Result<Action, StatErr> {
        match msg.first() {
            Some(&HANDSHAKE_TYPE) => {
                let token = get_challenge_token(msg)?;

                trace!(token, "received challenge token");
                self.state = QueryState::TokenReceived;
                self.stat_packet[TOKEN_OFFSET..TOKEN_OFFSET + 4]
                    .copy_from_slice(&token.to_be_bytes());

                Ok(Action::Send(self.stat_packet.clone()))
            }
            Some(&STAT_TYPE) => {
                self.state = QueryState::Completed;

                Ok(Action::Complete(msg.to_vec()))
            }
            other => {
                trace!(first_byte = ?other, "ignored unexpected datagram");

                Ok(Action::Ignore)
            }
        }
    }

    /// The stat request returned by [QueryExchange::handle_datagram] is on the wire.
    pub fn stat_sent(&mut self) {
        self.state = QueryState::StatSent;
    }

    pub fn abort(&mut self, err: &StatErr) {
        self.state = if err.is_timeout() {
            QueryState::TimedOut
        } else {
            QueryState::Failed
        };
    }
}

/// Handshake: magic, type 0x09, session id.
fn build_handshake_packet() -> Vec<u8> {
    let mut packet = Vec::with_capacity(7);

    packet.extend_from_slice(&MAGIC);
    packet.push(HANDSHAKE_TYPE);
    packet.extend_from_slice(&SESSION_ID.to_be_bytes());

    packet
}

/// Stat request with an empty token slot.
///
/// The full stat request must be padded to 8 payload bytes, the session id is
/// repeated for that.
fn build_stat_packet(kind: StatKind) -> Vec<u8> {
    let mut packet = Vec::with_capacity(15);

    packet.extend_from_slice(&MAGIC);
    packet.push(STAT_TYPE);
    packet.extend_from_slice(&SESSION_ID.to_be_bytes());
    packet.extend_from_slice(&[0x00; 4]);

    if kind == StatKind::Full {
        packet.extend_from_slice(&SESSION_ID.to_be_bytes());
    }

    packet
}

/// Parse the null-terminated decimal token of a handshake response.
fn get_challenge_token(msg: &[u8]) -> Result<i32, StatErr> {
    let token_bufs = msg.get(TOKEN_STR_OFFSET..).unwrap_or_default();
    let token_bufs = match token_bufs.iter().position(|&b| b == 0x00) {
        Some(end) => &token_bufs[..end],
        None => token_bufs,
    };
    let token_str = std::str::from_utf8(token_bufs)
        .map_err(|err| StatErr::ProtocolErr(format!("Challenge token is not ASCII: {}", err)))?;

    // Tokens are signed 32 bit, some servers print them unsigned
    match token_str.trim().parse::<i64>() {
        Ok(token) if token >= i32::MIN as i64 && token <= u32::MAX as i64 => Ok(token as i32),
        _ => Err(StatErr::ProtocolErr(format!(
            "Can not parse challenge token: {:?}",
            token_str
        ))),
    }
}

fn send_query_request(conf: &Conf, kind: StatKind) -> Result<Vec<u8>, StatErr> {
    let deadline = Deadline::after(conf.query_timeout());
    let addr = resolve_addr(conf)?;
    let socket = create_udp_socket(conf, &addr)?;
    let mut exchange = QueryExchange::new(kind);

    socket.send(&exchange.start())?;
    debug!(%addr, ?kind, "query handshake sent");

    let result = receive_stat(&socket, &mut exchange, conf, &deadline);

    match &result {
        Ok(payload) => debug!(%addr, len = payload.len(), "query stat response received"),
        Err(err) => {
            exchange.abort(err);
            debug!(%addr, state = ?exchange.state(), %err, "query failed");
        }
    }

    // The socket is dropped here, on every path
    result
}

/// Wait for datagrams until the stat response arrives or the deadline passes.
fn receive_stat(
    socket: &UdpSocket,
    exchange: &mut QueryExchange,
    conf: &Conf,
    deadline: &Deadline,
) -> Result<Vec<u8>, StatErr> {
    let mut bufs = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        socket.set_read_timeout(Some(deadline.remaining(&conf.host)?))?;

        let len = socket
            .recv(&mut bufs)
            .map_err(|err| map_io_err(err, &conf.host))?;

        match exchange.handle_datagram(&bufs[..len])? {
            Action::Send(stat_packet) => {
                socket.send(&stat_packet)?;
                exchange.stat_sent();
                trace!("query stat request sent");
            }
            Action::Complete(payload) => return Ok(payload),
            Action::Ignore => {}
        }
    }
}

/// Get basic [status](https://wiki.vg/Query#Basic_stat).
pub fn query_basic_stat(conf: &Conf) -> Result<QueryResult, StatErr> {
    decode_basic_stat(&send_query_request(conf, StatKind::Basic)?)
}

/// Get full [status](https://wiki.vg/Query#Full_stat).
pub fn query_full_stat(conf: &Conf) -> Result<QueryResult, StatErr> {
    decode_full_stat(&send_query_request(conf, StatKind::Full)?)
}

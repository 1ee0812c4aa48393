//! Client for the TCP [Server List Ping](https://wiki.vg/Server_List_Ping) protocol.

mod decode;
mod stream;

use crate::{
    conf::Conf,
    packet::Packet,
    share::{create_tcp_socket, map_io_err, resolve_addr, Deadline},
    stat::QueryResult,
    StatErr,
};
pub use decode::*;
use std::{
    io::{ErrorKind, Read, Write},
    net::TcpStream,
};
pub use stream::*;
use tracing::{debug, trace};

/// `version.name` reported by a TCPShield protected server, whose status is not the real one.
pub const PROXY_FINGERPRINT: &str = "TCPShield.com";

const PACKET_ID: i32 = 0x00;
/// See protocol version [numbers](https://wiki.vg/Protocol_version_numbers), 47 is 1.8.
const PROTOCOL_VERSION: i32 = 47;
const HANDSHAKE_ADDR: &str = "localhost";
const HANDSHAKE_PORT: u16 = 25565;
/// Next state, should be 1 for status, but could also be 2 for login.
const NEXT_STATE_STATUS: i32 = 1;
const READ_CHUNK_SIZE: usize = 4096;

/// Build handshake packet buffer.
pub fn build_handshake_packet() -> Vec<u8> {
    let mut packet = Packet::new();

    packet
        .write_varint(PACKET_ID)
        .write_varint(PROTOCOL_VERSION)
        .write_string(HANDSHAKE_ADDR)
        .write_short(HANDSHAKE_PORT)
        .write_varint(NEXT_STATE_STATUS);
    packet.sign();

    packet.into_bytes()
}

/// Build status request packet buffer.
pub fn build_status_request_packet() -> Vec<u8> {
    let mut packet = Packet::new();

    packet.write_varint(PACKET_ID);
    packet.sign();

    packet.into_bytes()
}

/// Parse the status JSON and reject answers of a masking proxy.
pub fn parse_status(json: &str) -> Result<ServerStatus, StatErr> {
    let status = serde_json::from_str::<ServerStatus>(json).map_err(|err| {
        StatErr::DecodeErr(format!(
            "JSON parse error: Server sent unexpected data. reason: {}",
            err
        ))
    })?;

    if status.version_name() == Some(PROXY_FINGERPRINT) {
        return Err(StatErr::ProxyDetected(PROXY_FINGERPRINT.into()));
    }

    Ok(status)
}

/// Get server info using the [Server List Ping](https://wiki.vg/Server_List_Ping) protocol.
pub fn server_status(conf: &Conf) -> Result<QueryResult, StatErr> {
    let deadline = Deadline::after(conf.status_timeout());
    let addr = resolve_addr(conf)?;
    let mut socket = create_tcp_socket(conf, &addr, &deadline)?;

    debug!(%addr, "status connection established");

    let json = match request_status(&mut socket, conf, &deadline) {
        Ok(json) => json,
        Err(err) => {
            debug!(%addr, %err, "status request failed");

            return Err(err);
        }
    };

    // Release the connection before decoding
    drop(socket);

    Ok(normalize_status(&parse_status(&json)?, conf.port))
}

fn request_status(
    socket: &mut TcpStream,
    conf: &Conf,
    deadline: &Deadline,
) -> Result<String, StatErr> {
    socket.set_write_timeout(Some(deadline.remaining(&conf.host)?))?;
    socket
        .write_all(&build_handshake_packet())
        .map_err(|err| map_io_err(err, &conf.host))?;
    socket
        .write_all(&build_status_request_packet())
        .map_err(|err| map_io_err(err, &conf.host))?;

    let mut stream = StatusStream::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        socket.set_read_timeout(Some(deadline.remaining(&conf.host)?))?;

        let len = match socket.read(&mut chunk) {
            Ok(0) => {
                return Err(StatErr::IoErr(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!(
                        "Connection closed after {} bytes, before the status response was complete",
                        stream.buffered()
                    ),
                )));
            }
            Ok(len) => len,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(map_io_err(err, &conf.host)),
        };

        trace!(len, "status chunk received");

        if let Some(json) = stream.push(&chunk[..len])? {
            return Ok(json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_packet_bytes() {
        assert_eq!(
            build_handshake_packet(),
            vec![
                0x0F, 0x00, 0x2F, 0x09, b'l', b'o', b'c', b'a', b'l', b'h', b'o', b's', b't',
                0x63, 0xDD, 0x01
            ]
        );
    }

    #[test]
    fn test_status_request_packet_bytes() {
        assert_eq!(build_status_request_packet(), vec![0x01, 0x00]);
    }

    #[test]
    fn test_proxy_detected() {
        let err = parse_status(r#"{"version": {"name": "TCPShield.com", "protocol": 47}}"#)
            .unwrap_err();

        assert!(matches!(err, StatErr::ProxyDetected(_)));
        assert!(parse_status(r#"{"version": {"name": "TCPShield.com 1.19"}}"#).is_ok());
    }

    #[test]
    fn test_unexpected_data() {
        let err = parse_status("<html>").unwrap_err();

        assert!(matches!(err, StatErr::DecodeErr(_)));
        assert!(err.to_string().contains("Server sent unexpected data"));
    }

    #[test]
    fn test_odd_shapes_still_parse() {
        for json in [
            r#"{"version": {"name": "Paper 1.19.2"}, "description": [{"text": "Hi"}]}"#,
            r#"{"players": {"max": 1, "online": 1, "sample": [{"name": null, "id": "x"}]}}"#,
            r#"{"description": {"text": "", "extra": [{"text": "a"}, 1, null]}}"#,
            r#"{"version": {"name": "Paper 1.19.2", "protocol": "760"}}"#,
        ] {
            assert!(parse_status(json).is_ok(), "{}", json);
        }
    }
}

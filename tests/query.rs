//! Query protocol against a loopback UDP server.

use mcstat::{Conf, StatErr};
use pretty_assertions::assert_eq;
use std::{
    net::UdpSocket,
    thread,
    time::{Duration, Instant},
};

const SESSION: [u8; 4] = [0x00, 0x74, 0x69, 0x69];

const FULL_STAT: &[u8] = b"\x00\x00tiisplitnum\x00\x80\x00\
hostname\x00\xC2\xA7eFancy \xC2\xA7lServer\x00\
gametype\x00SMP\x00game_id\x00MINECRAFT\x00version\x001.20.1\x00\
plugins\x00\x00map\x00world\x00\
numplayers\x001\x00maxplayers\x0010\x00hostport\x0025565\x00hostip\x00127.0.0.1\x00\
\x00\x01player_\x00\x00Alex\x00\x00";

const BASIC_STAT: &[u8] = b"\x00\x00tiiFancy Server\x00SMP\x00world\x001\x0010\x00\xDDc127.0.0.1\x00";

/// Serve one handshake + stat exchange, sending some noise first.
fn spawn_server(payload: &'static [u8], expected_len: usize) -> (u16, thread::JoinHandle<()>) {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = server.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let mut bufs = [0u8; 64];

        let (len, client) = server.recv_from(&mut bufs).unwrap();
        assert_eq!(&bufs[..len], &[0xFE, 0xFD, 0x09, 0x00, 0x74, 0x69, 0x69]);

        server.send_to(&[0x42, 0x00], client).unwrap();

        let mut reply = vec![0x09];
        reply.extend_from_slice(&SESSION);
        reply.extend_from_slice(b"-559038737\x00");
        server.send_to(&reply, client).unwrap();

        let (len, _) = server.recv_from(&mut bufs).unwrap();
        assert_eq!(len, expected_len);
        assert_eq!(&bufs[..3], &[0xFE, 0xFD, 0x00]);
        assert_eq!(&bufs[3..7], &SESSION);
        assert_eq!(&bufs[7..11], &(-559038737i32).to_be_bytes());

        server.send_to(payload, client).unwrap();
    });

    (port, handle)
}

fn conf(port: u16) -> Conf {
    Conf::create_with_port("127.0.0.1", port).with_timeout(Duration::from_secs(3))
}

#[test]
fn test_full_stat_exchange() {
    let (port, handle) = spawn_server(FULL_STAT, 15);

    let result = conf(port).query_full_stat().unwrap();
    handle.join().unwrap();

    assert_eq!(result.motd, "Fancy Server");
    assert_eq!(result.version, "1.20.1");
    assert_eq!(result.plugins, "");
    assert_eq!(result.playercount, "1");
    assert_eq!(result.maxplayers, "10");
    assert_eq!(result.port, "25565");
    assert_eq!(result.players, vec!["Alex".to_string()]);
    assert_eq!(result.icon, None);
}

#[test]
fn test_basic_stat_exchange() {
    let (port, handle) = spawn_server(BASIC_STAT, 11);

    let result = mcstat::query_basic_stat(&conf(port)).unwrap();
    handle.join().unwrap();

    assert_eq!(result.motd, "Fancy Server");
    assert_eq!(result.game_type, "SMP");
    assert_eq!(result.servertype, "world");
    assert_eq!(result.playercount, "1");
    assert_eq!(result.maxplayers, "10");
    assert_eq!(result.version, mcstat::UNDEFINED);
}

#[test]
fn test_silent_server_times_out_and_releases_socket() {
    let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = silent.local_addr().unwrap().port();

    // Pick a free local port so we can check it is released afterwards
    let local_port = UdpSocket::bind("0.0.0.0:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let mut conf = Conf::create_with_port("127.0.0.1", port).with_timeout(Duration::from_millis(300));
    conf.socket_conf.rep_udp_port = local_port;

    let started = Instant::now();
    let err = conf.query_full_stat().unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, StatErr::Timeout { ref host } if host == "127.0.0.1"));
    assert!(elapsed >= Duration::from_millis(250), "{:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "{:?}", elapsed);

    // The silent server saw our handshake
    let mut bufs = [0u8; 16];
    silent.set_read_timeout(Some(Duration::from_secs(1))).unwrap();
    assert_eq!(silent.recv(&mut bufs).unwrap(), 7);

    assert!(UdpSocket::bind(("0.0.0.0", local_port)).is_ok());
}

#[test]
fn test_concurrent_queries_are_independent() {
    let servers = (0..4)
        .map(|_| spawn_server(FULL_STAT, 15))
        .collect::<Vec<_>>();

    let clients = servers
        .iter()
        .map(|&(port, _)| thread::spawn(move || conf(port).query_full_stat()))
        .collect::<Vec<_>>();

    for client in clients {
        assert_eq!(client.join().unwrap().unwrap().motd, "Fancy Server");
    }

    for (_, handle) in servers {
        handle.join().unwrap();
    }
}

//! Minecraft Java Edition server status over two independent protocols:
//!
//! - [Query](https://wiki.vg/Query) (UDP): [query_full_stat] and [query_basic_stat].
//! - [Server List Ping](https://wiki.vg/Server_List_Ping) (TCP): [server_status].
//!
//! All three return the same [QueryResult] shape. Every call owns its socket,
//! blocks until the response or the configured timeout, and never retries.
//!
//! ```no_run
//! use mcstat::{Conf, StatErr};
//! use std::time::Duration;
//!
//! fn main() -> Result<(), StatErr> {
//!     let conf = Conf::create("www.example.com").with_timeout(Duration::from_secs(3));
//!
//!     println!("{}", conf.server_status()?);
//!     println!("{}", conf.query_full_stat()?);
//!
//!     Ok(())
//! }
//! ```

mod conf;
mod error;
mod packet;
mod query;
mod share;
mod stat;
mod status;
mod varint;

pub use conf::{Conf, SocketConf, DEFAULT_PORT, DEFAULT_QUERY_TIMEOUT, DEFAULT_STATUS_TIMEOUT};
pub use error::StatErr;
pub use packet::Packet;
pub use query::{
    decode_basic_stat, decode_full_stat, Action, QueryExchange, QueryState, StatKind, StatLayout,
    BASIC_STAT_FIELDS, FULL_STAT_FIELDS,
};
pub use stat::{QueryResult, UNDEFINED};
pub use status::{
    normalize_status, parse_status, Description, DescriptionExtra, FrameHeader, Player, Players,
    ServerStatus, StatusStream, Version, PROXY_FINGERPRINT,
};
pub use varint::{decode_varint, decode_varint_at, encode_varint, try_decode_varint};

/// Get **full** info using the UDP Query protocol. See [Conf::query_full_stat].
pub fn query_full_stat(conf: &Conf) -> Result<QueryResult, StatErr> {
    query::query_full_stat(conf)
}

/// Get **basic** info using the UDP Query protocol. See [Conf::query_basic_stat].
pub fn query_basic_stat(conf: &Conf) -> Result<QueryResult, StatErr> {
    query::query_basic_stat(conf)
}

/// Get info using the TCP Server List Ping protocol. See [Conf::server_status].
pub fn server_status(conf: &Conf) -> Result<QueryResult, StatErr> {
    status::server_status(conf)
}

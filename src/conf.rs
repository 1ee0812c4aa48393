use crate::{query, stat::QueryResult, status, StatErr};
use std::{
    net::{SocketAddr, ToSocketAddrs},
    time::Duration,
};

/// Default port of a Java Edition server, used by both protocols.
pub const DEFAULT_PORT: u16 = 25565;
/// Default window for a whole Query exchange.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_millis(5000);
/// Default window for a whole Server List Ping exchange.
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_millis(4000);

/// Main struct used for configuring the connection.
#[derive(Debug, Clone)]
pub struct Conf {
    /// Server IP address or a domain name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// See [SocketConf].
    pub socket_conf: SocketConf,
}

/// Additional socket configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SocketConf {
    /// Window for the whole exchange. When `None`, [DEFAULT_QUERY_TIMEOUT] is used
    /// for the Query protocol and [DEFAULT_STATUS_TIMEOUT] for Server List Ping.
    pub timeout: Option<Duration>,
    /// Local port the UDP socket binds to. The default value 0 lets the OS pick one,
    /// so concurrent queries never collide.
    pub rep_udp_port: u16,
}

impl ToSocketAddrs for Conf {
    type Iter = std::vec::IntoIter<SocketAddr>;

    fn to_socket_addrs(&self) -> std::io::Result<Self::Iter> {
        (&*self.host, self.port).to_socket_addrs()
    }
}

impl std::fmt::Display for Conf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl Conf {
    /// Create a connection configuration using the default port.
    ///
    /// # Examples
    ///
    /// ```
    /// # use mcstat::{Conf, SocketConf};
    /// #
    /// let conf = Conf::create("www.example.com");
    /// #
    /// # assert_eq!(conf.host, "www.example.com");
    /// # assert_eq!(conf.port, 25565);
    /// # assert_eq!(conf.socket_conf, SocketConf::default());
    /// ```
    pub fn create(host: &str) -> Self {
        Self::create_with_port(host, DEFAULT_PORT)
    }

    /// Create a connection configuration using the specified port.
    ///
    /// # Example
    ///
    /// ```
    /// # use mcstat::Conf;
    /// #
    /// let conf = Conf::create_with_port("www.example.com", 25566);
    /// #
    /// # assert_eq!(conf.port, 25566);
    /// ```
    pub fn create_with_port(host: &str, port: u16) -> Self {
        Self {
            host: host.trim().into(),
            port,
            socket_conf: SocketConf::default(),
        }
    }

    /// Create a connection configuration by using a `host:port` string.
    ///
    /// If the port cannot be converted to [u16], it will return a [StatErr::DataErr].
    ///
    /// # Example
    ///
    /// ```
    /// # use mcstat::{Conf, StatErr};
    /// #
    /// # fn main() -> Result<(), StatErr> {
    ///     let conf = Conf::create_from_str("www.example.com:25565")?;
    /// #
    /// #   assert_eq!(conf.host, "www.example.com");
    /// #   assert_eq!(conf.port, 25565);
    /// #
    /// #   assert!(Conf::create_from_str("25565").is_err());
    /// #   assert!(Conf::create_from_str("www.example.com:-1").is_err());
    /// #   Ok(())
    /// # }
    /// ```
    pub fn create_from_str(addr: &str) -> Result<Self, StatErr> {
        let addr_split = addr.rsplitn(2, ':').map(|x| x.trim()).collect::<Vec<_>>();

        if addr_split.len() != 2 || addr_split[1].is_empty() {
            return Err(StatErr::DataErr(format!(
                "Invalid socket address syntax: {}",
                addr
            )));
        }

        match addr_split[0].parse::<u16>() {
            Ok(port) => Ok(Self::create_with_port(addr_split[1], port)),
            Err(_) => Err(StatErr::DataErr(format!("Invalid port: {}", addr_split[0]))),
        }
    }

    /// Replace the window of the whole exchange.
    ///
    /// ```
    /// # use mcstat::Conf;
    /// # use std::time::Duration;
    /// let conf = Conf::create("www.example.com").with_timeout(Duration::from_secs(1));
    /// # assert_eq!(conf.socket_conf.timeout, Some(Duration::from_secs(1)));
    /// ```
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.socket_conf.timeout = Some(timeout);
        self
    }

    pub(crate) fn query_timeout(&self) -> Duration {
        self.socket_conf.timeout.unwrap_or(DEFAULT_QUERY_TIMEOUT)
    }

    pub(crate) fn status_timeout(&self) -> Duration {
        self.socket_conf.timeout.unwrap_or(DEFAULT_STATUS_TIMEOUT)
    }

    /// Get **full** info using the [Query](https://wiki.vg/Query) protocol.
    ///
    /// The server needs `enable-query=true` in its `server.properties`.
    ///
    /// Name resolution blocks on the system resolver and is not cut short by the
    /// timeout, so a slow lookup can overrun it. Only the first resolved address
    /// is tried.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mcstat::{Conf, StatErr};
    ///
    /// fn main() -> Result<(), StatErr> {
    ///     let server = Conf::create_with_port("www.example.com", 25565);
    ///     let info = server.query_full_stat()?;
    ///
    ///     println!("{}", info);
    ///     Ok(())
    /// }
    /// ```
    pub fn query_full_stat(&self) -> Result<QueryResult, StatErr> {
        query::query_full_stat(self)
    }

    /// Get **basic** info using the [Query](https://wiki.vg/Query) protocol.
    ///
    /// Only motd, type, servertype and the player counts are filled in.
    ///
    /// Name resolution blocks on the system resolver and is not cut short by the
    /// timeout, so a slow lookup can overrun it. Only the first resolved address
    /// is tried.
    pub fn query_basic_stat(&self) -> Result<QueryResult, StatErr> {
        query::query_basic_stat(self)
    }

    /// Get info using the [Server List Ping](https://wiki.vg/Server_List_Ping) protocol.
    ///
    /// Works whether or not query is enabled on the server, and includes the icon.
    ///
    /// Name resolution blocks on the system resolver and is not cut short by the
    /// timeout, so a slow lookup can overrun it. Only the first resolved address
    /// is tried.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mcstat::{Conf, StatErr};
    ///
    /// fn main() -> Result<(), StatErr> {
    ///     let server = Conf::create("www.example.com");
    ///     let info = server.server_status()?;
    ///
    ///     println!("{}", info);
    ///     Ok(())
    /// }
    /// ```
    pub fn server_status(&self) -> Result<QueryResult, StatErr> {
        status::server_status(self)
    }
}

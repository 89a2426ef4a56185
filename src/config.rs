use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Runtime settings for the web application
///
/// Everything has a sensible default; the `website` binary only lets the
/// port be overridden from the command line.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Interface to bind to
    pub host: IpAddr,

    /// TCP port to listen on
    pub port: u16,

    /// Sessions untouched for longer than this are discarded
    pub session_idle_minutes: i64,

    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,

    /// Width of the label chart in pixels
    pub chart_width: u32,

    /// Height of the label chart in pixels
    pub chart_height: u32,

    /// Row count used by head/tail when the request does not give one
    pub preview_rows: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            session_idle_minutes: 60,
            max_upload_bytes: 10 * 1024 * 1024,
            chart_width: 800,
            chart_height: 600,
            preview_rows: 5,
        }
    }
}

impl AppConfig {
    /// Build a config from command line arguments
    ///
    /// # Arguments
    /// * `args` - Arguments after the program name: `[port] [host]`
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter();

        if let Some(port) = args.next() {
            match port.as_ref().parse() {
                Ok(port) => config.port = port,
                Err(_) => log::warn!("ignoring invalid port {:?}", port.as_ref()),
            }
        }
        if let Some(host) = args.next() {
            match host.as_ref().parse() {
                Ok(host) => config.host = host,
                Err(_) => log::warn!("ignoring invalid host {:?}", host.as_ref()),
            }
        }

        config
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn session_idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_idle_minutes)
    }
}

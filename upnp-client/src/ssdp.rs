//! SSDP (Simple Service Discovery Protocol) probe and response handling.
//!
//! Builds the M-SEARCH request, owns the UDP socket for one discovery
//! probe, and parses the HTTP-over-UDP replies devices send back.

use std::collections::HashMap;
use std::net::{IpAddr, UdpSocket};
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::error::{Result, UpnpError};
use crate::target::SearchTarget;

/// Standard SSDP multicast group.
pub const SSDP_ADDR: &str = "239.255.255.250";
/// Standard SSDP port.
pub const SSDP_PORT: u16 = 1900;

// Max reply delay per the UPnP 2.0 device architecture. NOT a timeout.
const SSDP_MAX_MX: u64 = 5;
const SSDP_BUFFSIZE: usize = 8192;

/// Receive timeouts below one second are meaningless for SSDP.
pub(crate) fn clamp_timeout(secs: u64) -> u64 {
    secs.max(1)
}

/// MX value advertised in the probe: the (already clamped) timeout, capped
/// at the protocol maximum.
pub(crate) fn advertised_mx(timeout_secs: u64) -> u64 {
    timeout_secs.clamp(1, SSDP_MAX_MX)
}

/// Serialize an M-SEARCH request. CRLF line endings are mandatory on the
/// wire; some devices drop bare-LF probes silently.
pub(crate) fn build_search_request(search_target: &str, mx: u64) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}:{}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {}\r\n\
         ST: {}\r\n\
         CPFN.UPNP.ORG: upnp-client Rust library\r\n\
         \r\n",
        SSDP_ADDR, SSDP_PORT, mx, search_target
    )
}

/// One parsed SSDP M-SEARCH reply.
///
/// Keeps the full header mapping (uppercase keys) plus the responding
/// address. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct SsdpResponse {
    headers: HashMap<String, String>,
    addr: IpAddr,
}

impl SsdpResponse {
    pub(crate) fn parse(data: &str, addr: IpAddr) -> Self {
        let headers = parse_headers(data);
        if let Some(host) = headers.get("LOCATION").and_then(|loc| url_host(loc)) {
            if host != addr.to_string() {
                warn!(
                    "Address and Location mismatch: {}, {}",
                    addr, headers["LOCATION"]
                );
            }
        }
        Self { headers, addr }
    }

    /// Raw header value, by uppercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Descriptor URL this device advertises.
    pub fn location(&self) -> Option<&str> {
        self.header("LOCATION")
    }

    /// Search target echoed in the reply.
    pub fn search_target(&self) -> Option<&str> {
        self.header("ST")
    }

    /// Unique service name.
    pub fn usn(&self) -> Option<&str> {
        self.header("USN")
    }

    /// Server identification string.
    pub fn server(&self) -> Option<&str> {
        self.header("SERVER")
    }

    /// Address the reply came from.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Whether this reply announces a root device.
    pub fn is_root(&self) -> bool {
        self.search_target()
            .map_or(false, |st| SearchTarget::RootDevice == st)
    }
}

fn parse_headers(data: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for line in data.lines() {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_uppercase(), value.trim().to_string());
        }
    }
    headers
}

fn url_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// UDP socket configured for one discovery probe.
///
/// Bound to the local outbound interface and the caller's source port, with
/// both unicast and multicast TTL applied. The socket closes when this is
/// dropped, on every exit path.
pub(crate) struct SsdpSocket {
    socket: UdpSocket,
    buffer: Vec<u8>,
}

impl SsdpSocket {
    pub fn open(ttl: u32, source_port: u16, timeout: Duration) -> Result<Self> {
        let bind_addr = local_ip_address::local_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        let socket = UdpSocket::bind((bind_addr.as_str(), source_port))
            .map_err(|e| UpnpError::Transport(format!("failed to bind UDP socket: {}", e)))?;
        socket
            .set_ttl(ttl)
            .map_err(|e| UpnpError::Transport(format!("failed to set TTL: {}", e)))?;
        socket
            .set_multicast_ttl_v4(ttl)
            .map_err(|e| UpnpError::Transport(format!("failed to set multicast TTL: {}", e)))?;
        socket
            .set_read_timeout(Some(timeout))
            .map_err(|e| UpnpError::Transport(format!("failed to set read timeout: {}", e)))?;

        Ok(Self {
            socket,
            buffer: vec![0; SSDP_BUFFSIZE],
        })
    }

    pub fn send(&self, request: &str, dest: (&str, u16)) -> Result<()> {
        self.socket
            .send_to(request.as_bytes(), dest)
            .map_err(|e| UpnpError::Transport(format!("failed to send M-SEARCH: {}", e)))?;
        Ok(())
    }

    /// Receive one datagram; `None` once the read timeout expires.
    pub fn recv(&mut self) -> Result<Option<(String, IpAddr)>> {
        match self.socket.recv_from(&mut self.buffer) {
            Ok((size, addr)) => {
                let data = String::from_utf8_lossy(&self.buffer[..size]).into_owned();
                Ok(Some((data, addr.ip())))
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(e) => Err(UpnpError::Transport(format!("socket error: {}", e))),
        }
    }
}

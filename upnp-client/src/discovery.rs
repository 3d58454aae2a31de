//! SSDP discovery driving descriptor resolution.
//!
//! One call to [`crate::discover`] sends one M-SEARCH probe and returns a
//! pull-based iterator: each `next()` receives datagrams until a reply
//! survives filtering and resolves into a [`Device`]. The sequence is
//! finite (it ends when the receive timeout expires) and not restartable;
//! probing again requires a fresh call.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, error, info, warn};

use crate::device::Device;
use crate::error::{Result, UpnpError};
use crate::ssdp::{
    advertised_mx, build_search_request, clamp_timeout, SsdpResponse, SsdpSocket, SSDP_ADDR,
    SSDP_PORT,
};
use crate::target::SearchTarget;

/// Parameters for one discovery probe.
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// ST header value; any target URI, not just the well-known catalog
    pub search_target: String,
    /// Destination address: filters multicast replies, or the probe
    /// destination itself when `unicast` is set
    pub dest_addr: String,
    /// Receive timeout in seconds, clamped to a minimum of 1. Total
    /// discovery time is this plus resolution time per device, not a hard
    /// deadline.
    pub timeout_secs: u64,
    /// IP and multicast TTL for the probe socket
    pub ttl: u32,
    /// Send the probe to `dest_addr` directly and skip address filtering
    pub unicast: bool,
    /// Local source port; 0 for ephemeral, fixed for firewall rules
    pub source_port: u16,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            search_target: SearchTarget::All.as_str().to_string(),
            dest_addr: SSDP_ADDR.to_string(),
            timeout_secs: 3,
            ttl: 2,
            unicast: false,
            source_port: 4201,
        }
    }
}

impl DiscoverOptions {
    /// Options probing for `target` with everything else defaulted.
    pub fn new(target: SearchTarget) -> Self {
        Self {
            search_target: target.as_str().to_string(),
            ..Self::default()
        }
    }
}

/// Pull-based iterator over discovered devices.
///
/// Owns its UDP socket for its entire life; the socket closes when the
/// iterator is exhausted or dropped, on every exit path. Candidate replies
/// that fail descriptor resolution are logged and skipped, so one broken
/// device never aborts the rest of the sweep.
pub struct Discovery {
    socket: Option<SsdpSocket>,
    http: Client,
    options: DiscoverOptions,
    seen_locations: HashSet<String>,
}

impl Discovery {
    pub(crate) fn start(options: DiscoverOptions) -> Result<Self> {
        if options.unicast && options.dest_addr == SSDP_ADDR {
            warn!("unicast with the default multicast address makes no sense");
        }

        let timeout = clamp_timeout(options.timeout_secs);
        let request = build_search_request(&options.search_target, advertised_mx(timeout));
        let dest_host = if options.unicast {
            options.dest_addr.as_str()
        } else {
            SSDP_ADDR
        };

        let socket = SsdpSocket::open(
            options.ttl,
            options.source_port,
            Duration::from_secs(timeout),
        )?;
        info!(
            "discovering UPnP devices and services: {}",
            options.search_target
        );
        debug!(
            "sending discovery probe to {}:{}:\n{}",
            dest_host, SSDP_PORT, request
        );
        socket.send(&request, (dest_host, SSDP_PORT))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| UpnpError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            socket: Some(socket),
            http,
            options,
            seen_locations: HashSet::new(),
        })
    }
}

impl Iterator for Discovery {
    type Item = (String, Device);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let socket = self.socket.as_mut()?;
            let (data, addr) = match socket.recv() {
                Ok(Some(datagram)) => datagram,
                Ok(None) => break,
                Err(e) => {
                    error!("discovery receive failed: {}", e);
                    break;
                }
            };

            debug!("incoming search response from {}:\n{}", addr, data);
            let response = SsdpResponse::parse(&data, addr);
            let Some(location) =
                accept_response(&self.options, &mut self.seen_locations, &response)
            else {
                continue;
            };

            match Device::from_location(&self.http, &location) {
                Ok(device) => {
                    info!("found device: {}", device);
                    return Some((location, device));
                }
                Err(e) if e.is_data_format() => {
                    warn!("error adding device at {}: {}", location, e)
                }
                Err(e) => error!("error adding device at {}: {}", location, e),
            }
        }

        // Timed out or failed: release the socket now rather than at drop
        self.socket = None;
        None
    }
}

/// Apply the per-response filtering policy; returns the LOCATION of a
/// reply that should be resolved.
fn accept_response(
    options: &DiscoverOptions,
    seen_locations: &mut HashSet<String>,
    response: &SsdpResponse,
) -> Option<String> {
    let Some(location) = response.location() else {
        debug!("ignoring response without LOCATION from {}", response.addr());
        return None;
    };

    if !seen_locations.insert(location.to_string()) {
        debug!("ignoring duplicated device: {}", location);
        return None;
    }

    // Some unrelated devices reply to discovery even when the M-SEARCH
    // sets a specific ST
    if SearchTarget::All != options.search_target.as_str()
        && response.search_target() != Some(options.search_target.as_str())
    {
        warn!(
            "ignoring non-target device: {} ({})",
            location,
            response.search_target().unwrap_or("<no ST>")
        );
        return None;
    }

    // On multicast, keep only replies from the requested address scope
    if !(options.unicast
        || options.dest_addr == SSDP_ADDR
        || options.dest_addr == response.addr().to_string())
    {
        return None;
    }

    Some(location.to_string())
}

//! Discover and control UPnP devices on the local network.
//!
//! This crate covers the whole pipeline: an SSDP M-SEARCH probe collects
//! device announcements, each announced descriptor is resolved into a
//! [`Device`] graph of [`Service`]s and [`Action`]s, and actions are
//! invoked over SOAP with typed results.
//!
//! # Quick Start
//!
//! ```no_run
//! use upnp_client::{discover, SearchTarget, SoapClient};
//!
//! # fn main() -> upnp_client::Result<()> {
//! let soap = SoapClient::new();
//! for (location, device) in discover(SearchTarget::WanIpConnection)? {
//!     println!("found {} at {}", device.friendly_name(), location);
//!     if let Some(action) = device.action("GetExternalIPAddress") {
//!         let result = action.invoke(&soap, &[], &[])?;
//!         println!("external IP: {}", &result["NewExternalIPAddress"]);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Lookup forms
//!
//! Services resolve by full type URI, by [`SearchTarget`] constant, or by
//! the short serviceId name; all forms return the same instance. Actions
//! resolve by name from their service or directly from the device. See
//! [`Device::service`] and [`Device::action`].
//!
//! Discovery results arrive lazily: the iterator returned by [`discover`]
//! performs the UDP receives and descriptor fetches as it is pulled, ends
//! when the receive timeout expires, and cannot be restarted.

mod description;
mod device;
mod discovery;
mod error;
mod result;
mod ssdp;
mod target;

pub use device::{Action, Device, Service, ServiceKey};
pub use discovery::{DiscoverOptions, Discovery};
pub use error::{Result, UpnpError};
pub use result::InvocationResult;
pub use ssdp::{SsdpResponse, SSDP_ADDR, SSDP_PORT};
pub use target::SearchTarget;

// Re-exported so callers don't need a direct upnp-soap dependency to
// invoke actions.
pub use upnp_soap::{SoapClient, SoapError};

/// Probe the network for `target` with default options.
///
/// Returns the lazy [`Discovery`] sequence; drain it and check for
/// emptiness to detect "nothing found".
pub fn discover(target: SearchTarget) -> Result<Discovery> {
    discover_with(DiscoverOptions::new(target))
}

/// Probe the network with explicit [`DiscoverOptions`].
pub fn discover_with(options: DiscoverOptions) -> Result<Discovery> {
    Discovery::start(options)
}

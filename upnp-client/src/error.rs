//! Error types for the discovery/control pipeline.

use thiserror::Error;
use upnp_soap::SoapError;

/// Errors produced while discovering devices, resolving descriptors, or
/// invoking actions.
#[derive(Debug, Error)]
pub enum UpnpError {
    /// Malformed XML, or a descriptor missing a mandatory field
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// HTTP or network failure while probing, fetching a descriptor, or
    /// posting an invocation
    #[error("Transport error: {0}")]
    Transport(String),

    /// More positional arguments than the action declares inputs;
    /// raised before any network activity
    #[error("{action}() takes {declared} arguments but {supplied} were given")]
    ArgumentCount {
        action: String,
        declared: usize,
        supplied: usize,
    },

    /// UPnP fault reported by the device for an action invocation
    #[error("SOAP fault: error code {0}")]
    Fault(u16),
}

impl UpnpError {
    /// Discovery logs data-format failures at a lower severity than
    /// transport failures when skipping a candidate device.
    pub(crate) fn is_data_format(&self) -> bool {
        matches!(self, UpnpError::DataFormat(_))
    }
}

impl From<SoapError> for UpnpError {
    fn from(error: SoapError) -> Self {
        match error {
            SoapError::Network(msg) => UpnpError::Transport(msg),
            SoapError::Parse(msg) => UpnpError::DataFormat(msg),
            SoapError::Fault(code) => UpnpError::Fault(code),
        }
    }
}

impl From<reqwest::Error> for UpnpError {
    fn from(error: reqwest::Error) -> Self {
        UpnpError::Transport(error.to_string())
    }
}

/// Convenience Result type alias for this crate.
pub type Result<T> = std::result::Result<T, UpnpError>;

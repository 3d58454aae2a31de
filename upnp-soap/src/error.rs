//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur while invoking a UPnP action
#[derive(Debug, Error)]
pub enum SoapError {
    /// Network or HTTP communication error, including non-2xx responses
    /// that do not carry a SOAP fault body
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The response was not XML, or the expected response element was
    /// nowhere in it
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// UPnP fault returned by the device, carrying the UPnP error code
    #[error("SOAP fault: error code {0}")]
    Fault(u16),
}

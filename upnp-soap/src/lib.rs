//! Blocking SOAP 1.1 client for UPnP action invocation
//!
//! This crate provides the transport half of UPnP control: it serializes an
//! action call into a SOAP envelope, POSTs it to a service's control URL,
//! and returns the `<ActionName>Response` element from the reply body.
//! Argument values are XML-escaped on serialization, so callers can pass
//! arbitrary text.

mod error;

pub use error::SoapError;

use std::time::Duration;

use quick_xml::escape::escape;
use xmltree::{Element, XMLNode};

/// A minimal SOAP client for UPnP device communication
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
}

impl SoapClient {
    /// Create a new SOAP client with default timeouts
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(5))
                .timeout_read(Duration::from_secs(10))
                .build(),
        }
    }

    /// Invoke `action` on the service at `control_url`.
    ///
    /// `args` become one child element per pair inside the action wrapper,
    /// in the order given. Returns the parsed `<{action}Response` element,
    /// matched by local name so any namespace prefix is tolerated.
    pub fn call(
        &self,
        control_url: &str,
        service_type: &str,
        action: &str,
        args: &[(String, String)],
    ) -> Result<Element, SoapError> {
        let body = build_envelope(service_type, action, args);
        let soap_action = format!("\"{}#{}\"", service_type, action);

        let response = self
            .agent
            .post(control_url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body);

        let xml_text = match response {
            Ok(response) => response
                .into_string()
                .map_err(|e| SoapError::Network(e.to_string()))?,
            // Devices report action-level faults as HTTP 500 with a SOAP
            // Fault body; keep the body so the UPnP error code survives.
            Err(ureq::Error::Status(code, response)) => {
                let text = response
                    .into_string()
                    .map_err(|e| SoapError::Network(e.to_string()))?;
                if let Some(fault) = Element::parse(text.as_bytes())
                    .ok()
                    .as_ref()
                    .and_then(find_fault)
                {
                    return Err(fault);
                }
                return Err(SoapError::Network(format!(
                    "HTTP {} from {}",
                    code, control_url
                )));
            }
            Err(e) => return Err(SoapError::Network(e.to_string())),
        };

        let xml = Element::parse(xml_text.as_bytes())
            .map_err(|e| SoapError::Parse(e.to_string()))?;

        extract_response(&xml, service_type, action)
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize the request envelope. Argument values are escaped; names come
/// from service descriptors and are emitted as-is.
fn build_envelope(service_type: &str, action: &str, args: &[(String, String)]) -> String {
    let mut payload = String::new();
    for (name, value) in args {
        payload.push_str(&format!("<{0}>{1}</{0}>", name, escape(value)));
    }
    format!(
        r#"<?xml version="1.0"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{action} xmlns:u="{service_type}">{payload}</u:{action}></s:Body></s:Envelope>"#
    )
}

fn find_fault(xml: &Element) -> Option<SoapError> {
    fault_in_body(xml.get_child("Body")?)
}

fn fault_in_body(body: &Element) -> Option<SoapError> {
    let fault = body.get_child("Fault")?;
    let error_code = fault
        .get_child("detail")
        .and_then(|d| d.get_child("UPnPError"))
        .and_then(|e| e.get_child("errorCode"))
        .and_then(|c| c.get_text())
        .and_then(|t| t.trim().parse::<u16>().ok())
        .unwrap_or(500);
    Some(SoapError::Fault(error_code))
}

fn extract_response(xml: &Element, service_type: &str, action: &str) -> Result<Element, SoapError> {
    let body = xml
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

    if let Some(fault) = fault_in_body(body) {
        return Err(fault);
    }

    let response_name = format!("{}Response", action);
    body.children
        .iter()
        .filter_map(XMLNode::as_element)
        .find(|e| {
            e.name == response_name
                && e.namespace
                    .as_deref()
                    .map_or(true, |ns| ns == service_type)
        })
        .cloned()
        .ok_or_else(|| SoapError::Parse(format!("Missing {} element", response_name)))
}

//! Test helpers for fixture-based integration tests

use std::fs;
use std::path::PathBuf;

use mockito::{Mock, Server};

/// Load a descriptor fixture from the fixtures directory
pub fn load_fixture(filename: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(filename);

    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", filename, e))
}

/// Serve the Acme gateway fixture set (device descriptor plus both SCPDs)
/// from `server`, returning the descriptor location URL and the mounted
/// mocks in mount order.
pub fn mount_gateway(server: &mut Server) -> (String, Vec<Mock>) {
    let mocks = vec![
        server
            .mock("GET", "/rootDesc.xml")
            .with_status(200)
            .with_header("content-type", "text/xml")
            .with_body(load_fixture("gateway_device.xml"))
            .create(),
        server
            .mock("GET", "/scpd/l3frwd.xml")
            .with_status(200)
            .with_header("content-type", "text/xml")
            .with_body(load_fixture("l3frwd_scpd.xml"))
            .create(),
        server
            .mock("GET", "/scpd/wanipcn.xml")
            .with_status(200)
            .with_header("content-type", "text/xml")
            .with_body(load_fixture("wanipcn_scpd.xml"))
            .create(),
    ];

    (format!("{}/rootDesc.xml", server.url()), mocks)
}

/// SOAP response envelope wrapping `inner` in an `<{action}Response>`
/// element namespaced with `service_type`.
pub fn soap_response(service_type: &str, action: &str, inner: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <s:Body>
    <u:{action}Response xmlns:u="{service_type}">{inner}</u:{action}Response>
  </s:Body>
</s:Envelope>"#
    )
}

/// SOAP fault envelope carrying a UPnP error code, as gateways return with
/// HTTP 500
pub fn soap_fault(error_code: u16) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <s:Fault>
      <faultcode>s:Client</faultcode>
      <faultstring>UPnPError</faultstring>
      <detail>
        <UPnPError xmlns="urn:schemas-upnp-org:control-1-0">
          <errorCode>{error_code}</errorCode>
          <errorDescription>ConflictInMappingEntry</errorDescription>
        </UPnPError>
      </detail>
    </s:Fault>
  </s:Body>
</s:Envelope>"#
    )
}

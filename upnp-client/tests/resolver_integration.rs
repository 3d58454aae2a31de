//! Integration tests for descriptor resolution against a mock HTTP server.
//!
//! These drive the full fetch-and-resolve path: device descriptor, nested
//! sub-devices, SCPD documents, URL resolution, and the failure modes.

mod helpers;

use helpers::{load_fixture, mount_gateway};
use mockito::Server;
use reqwest::blocking::Client;
use upnp_client::{Device, SearchTarget, UpnpError};

const WANIP: &str = "urn:schemas-upnp-org:service:WANIPConnection:1";
const L3FWD: &str = "urn:schemas-upnp-org:service:Layer3Forwarding:1";

#[test]
fn test_resolves_device_attributes() {
    let mut server = Server::new();
    let (location, mocks) = mount_gateway(&mut server);

    let device = Device::from_location(&Client::new(), &location).unwrap();

    assert_eq!(
        device.device_type(),
        "urn:schemas-upnp-org:device:InternetGatewayDevice:1"
    );
    assert_eq!(device.friendly_name(), "Acme Home Gateway");
    assert_eq!(device.manufacturer(), "Acme Networks");
    assert_eq!(device.model_name(), "AG-1500");
    assert_eq!(device.model_description(), "Acme NAT Gateway");
    assert_eq!(device.udn(), "uuid:11111111-2222-3333-4444-555555555555");
    // Tags the descriptor does not carry degrade to empty strings
    assert_eq!(device.upc(), "");

    for mock in mocks {
        mock.assert();
    }
}

#[test]
fn test_derives_base_url_from_location_and_resolves_urls() {
    let mut server = Server::new();
    let (location, _mocks) = mount_gateway(&mut server);

    let device = Device::from_location(&Client::new(), &location).unwrap();

    // No URLBase in the fixture: base is the location minus its last segment
    assert_eq!(device.url_base(), format!("{}/", server.url()));
    // URL-valued attributes come out absolute
    assert_eq!(device.model_url(), format!("{}/about.html", server.url()));
    assert_eq!(device.manufacturer_url(), "http://www.example.com/");

    let service = device.service(SearchTarget::WanIpConnection).unwrap();
    assert_eq!(service.control_url(), format!("{}/ctl/IPConn", server.url()));
    assert_eq!(
        service.event_sub_url(),
        format!("{}/evt/IPConn", server.url())
    );
    assert_eq!(
        service.scpd_url(),
        format!("{}/scpd/wanipcn.xml", server.url())
    );
}

#[test]
fn test_finds_services_nested_under_sub_devices() {
    let mut server = Server::new();
    let (location, _mocks) = mount_gateway(&mut server);

    let device = Device::from_location(&Client::new(), &location).unwrap();

    // Root-level service first, then the one two sub-devices deep,
    // in document order
    let types: Vec<&str> = device
        .services()
        .iter()
        .map(|s| s.service_type())
        .collect();
    assert_eq!(types, [L3FWD, WANIP]);
}

#[test]
fn test_actions_parsed_from_scpd_in_document_order() {
    let mut server = Server::new();
    let (location, _mocks) = mount_gateway(&mut server);

    let device = Device::from_location(&Client::new(), &location).unwrap();
    let wanip = device.service(SearchTarget::WanIpConnection).unwrap();

    let names: Vec<&str> = wanip.actions().iter().map(|a| a.name()).collect();
    assert_eq!(
        names,
        ["GetExternalIPAddress", "GetStatusInfo", "AddPortMapping"]
    );

    let get_ip = wanip.action("GetExternalIPAddress").unwrap();
    assert!(get_ip.inputs().is_empty());
    assert_eq!(get_ip.outputs(), ["NewExternalIPAddress"]);

    let add_mapping = wanip.action("AddPortMapping").unwrap();
    assert_eq!(add_mapping.inputs().len(), 8);
    assert_eq!(add_mapping.inputs()[0], "NewRemoteHost");
    assert_eq!(add_mapping.inputs()[7], "NewLeaseDuration");
    assert!(add_mapping.outputs().is_empty());

    let status = wanip.action("GetStatusInfo").unwrap();
    assert_eq!(
        status.outputs(),
        ["NewConnectionStatus", "NewLastConnectionError", "NewUptime"]
    );
}

#[test]
fn test_every_lookup_form_returns_the_identical_service() {
    let mut server = Server::new();
    let (location, _mocks) = mount_gateway(&mut server);

    let device = Device::from_location(&Client::new(), &location).unwrap();

    let by_uri = device.service(WANIP).unwrap();
    let by_target = device.service(SearchTarget::WanIpConnection).unwrap();
    let by_short_name = device.service("WANIPConn1").unwrap();

    assert!(std::ptr::eq(by_uri, by_target));
    assert!(std::ptr::eq(by_target, by_short_name));

    let via_service = by_uri.action("GetExternalIPAddress").unwrap();
    let via_device = device.action("GetExternalIPAddress").unwrap();
    assert!(std::ptr::eq(via_service, via_device));
}

#[test]
fn test_urlbase_overrides_location_derived_base() {
    let mut server = Server::new();
    let descriptor = format!(
        r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <URLBase>{base}/base/</URLBase>
  <device>
    <deviceType>urn:schemas-upnp-org:device:Basic:1</deviceType>
    <friendlyName>Rebased</friendlyName>
    <manufacturer>Acme Networks</manufacturer>
    <modelName>RB-1</modelName>
    <UDN>uuid:rebased</UDN>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:Layer3Forwarding:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:L3Forwarding1</serviceId>
        <SCPDURL>scpd.xml</SCPDURL>
        <controlURL>control</controlURL>
        <eventSubURL>event</eventSubURL>
      </service>
    </serviceList>
  </device>
</root>"#,
        base = server.url()
    );

    let _desc = server
        .mock("GET", "/elsewhere/desc.xml")
        .with_status(200)
        .with_body(descriptor)
        .create();
    let scpd = server
        .mock("GET", "/base/scpd.xml")
        .with_status(200)
        .with_body(load_fixture("l3frwd_scpd.xml"))
        .create();

    let location = format!("{}/elsewhere/desc.xml", server.url());
    let device = Device::from_location(&Client::new(), &location).unwrap();

    assert_eq!(device.url_base(), format!("{}/base/", server.url()));
    let service = device.service("L3Forwarding1").unwrap();
    assert_eq!(service.control_url(), format!("{}/base/control", server.url()));
    scpd.assert();
}

#[test]
fn test_malformed_descriptor_is_a_data_format_error() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/rootDesc.xml")
        .with_status(200)
        .with_body("this is not xml at all <<<")
        .create();

    let location = format!("{}/rootDesc.xml", server.url());
    let result = Device::from_location(&Client::new(), &location);

    assert!(matches!(result, Err(UpnpError::DataFormat(_))));
}

#[test]
fn test_malformed_scpd_aborts_device_resolution() {
    let mut server = Server::new();
    let _desc = server
        .mock("GET", "/rootDesc.xml")
        .with_status(200)
        .with_body(load_fixture("gateway_device.xml"))
        .create();
    let _scpd = server
        .mock("GET", "/scpd/l3frwd.xml")
        .with_status(200)
        .with_body("<scpd><actionList>")
        .create();

    let location = format!("{}/rootDesc.xml", server.url());
    let result = Device::from_location(&Client::new(), &location);

    // No partially-built device escapes: the whole resolution fails
    assert!(matches!(result, Err(UpnpError::DataFormat(_))));
}

#[test]
fn test_http_failure_is_a_transport_error() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/rootDesc.xml")
        .with_status(404)
        .create();

    let location = format!("{}/rootDesc.xml", server.url());
    let result = Device::from_location(&Client::new(), &location);

    assert!(matches!(result, Err(UpnpError::Transport(_))));
}

#[test]
fn test_minimal_descriptor_degrades_to_empty_fields() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/min.xml")
        .with_status(200)
        .with_body(
            r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <device>
    <deviceType>urn:schemas-upnp-org:device:Basic:1</deviceType>
    <UDN>uuid:minimal</UDN>
  </device>
</root>"#,
        )
        .create();

    let location = format!("{}/min.xml", server.url());
    let device = Device::from_location(&Client::new(), &location).unwrap();

    assert_eq!(device.friendly_name(), "");
    assert_eq!(device.model_name(), "");
    assert_eq!(device.serial_number(), "");
    assert!(device.services().is_empty());
}

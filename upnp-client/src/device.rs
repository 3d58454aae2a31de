//! The Device/Service/Action graph resolved from UPnP descriptors.
//!
//! A [`Device`] is built from the XML document at an SSDP LOCATION URL; its
//! [`Service`]s come from every `serviceList` in the document, including
//! those nested under embedded sub-devices, and each service's [`Action`]s
//! from its SCPD document. The whole graph is immutable once resolved, and
//! every URL in it is absolute.

use std::fmt;

use reqwest::blocking::Client;
use tracing::info;
use upnp_soap::SoapClient;
use xmltree::Element;

use crate::description::{
    base_of, child_text, children_named, collect_descendants, descendant_text, fetch_document,
    resolve_url,
};
use crate::error::{Result, UpnpError};
use crate::result::InvocationResult;
use crate::target::SearchTarget;

/// A resolved UPnP device.
#[derive(Debug, Clone)]
pub struct Device {
    location: String,
    url_base: String,
    device_type: String,
    friendly_name: String,
    manufacturer: String,
    manufacturer_url: String,
    model_description: String,
    model_name: String,
    model_number: String,
    model_url: String,
    serial_number: String,
    udn: String,
    upc: String,
    services: Vec<Service>,
}

impl Device {
    /// Fetch and resolve the device descriptor at `location`, including
    /// every service's SCPD.
    ///
    /// Optional descriptor fields degrade to empty strings. Malformed XML
    /// anywhere in the chain is a [`UpnpError::DataFormat`]; HTTP failures
    /// are [`UpnpError::Transport`].
    pub fn from_location(http: &Client, location: &str) -> Result<Self> {
        let root = fetch_document(http, location)?;

        let url_base = match child_text(&root, "URLBase") {
            text if text.is_empty() => base_of(location)?,
            text => text,
        };

        let device = root.get_child("device").ok_or_else(|| {
            UpnpError::DataFormat(format!("no device element in {}", location))
        })?;

        let mut services: Vec<Service> = Vec::new();
        let mut lists = Vec::new();
        collect_descendants(device, "serviceList", &mut lists);
        for list in lists {
            for node in children_named(list, "service") {
                let service = Service::from_element(http, &url_base, node)?;
                // serviceType keys stay unique; a redeclaration replaces the
                // earlier entry at its original position
                match services
                    .iter()
                    .position(|s| s.service_type == service.service_type)
                {
                    Some(i) => services[i] = service,
                    None => services.push(service),
                }
            }
        }

        Ok(Self {
            location: location.to_string(),
            device_type: child_text(device, "deviceType"),
            friendly_name: child_text(device, "friendlyName"),
            manufacturer: child_text(device, "manufacturer"),
            manufacturer_url: resolved_child_url(device, "manufacturerURL", &url_base)?,
            model_description: child_text(device, "modelDescription"),
            model_name: child_text(device, "modelName"),
            model_number: child_text(device, "modelNumber"),
            model_url: resolved_child_url(device, "modelURL", &url_base)?,
            serial_number: child_text(device, "serialNumber"),
            udn: child_text(device, "UDN"),
            upc: child_text(device, "UPC"),
            url_base,
            services,
        })
    }

    /// Descriptor URL this device was resolved from.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Base URL the descriptor's relative references were resolved against.
    pub fn url_base(&self) -> &str {
        &self.url_base
    }

    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn manufacturer_url(&self) -> &str {
        &self.manufacturer_url
    }

    pub fn model_description(&self) -> &str {
        &self.model_description
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn model_number(&self) -> &str {
        &self.model_number
    }

    pub fn model_url(&self) -> &str {
        &self.model_url
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// Unique device name.
    pub fn udn(&self) -> &str {
        &self.udn
    }

    pub fn upc(&self) -> &str {
        &self.upc
    }

    /// Host this device answers on, taken from the descriptor URL.
    pub fn address(&self) -> &str {
        let rest = self
            .location
            .split_once("//")
            .map_or(self.location.as_str(), |(_, rest)| rest);
        rest.split(|c| c == ':' || c == '/').next().unwrap_or(rest)
    }

    /// "<friendlyName> @ <address>"
    pub fn name(&self) -> String {
        format!("{} @ {}", self.friendly_name, self.address())
    }

    /// Services in document order.
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Look up a service by any [`ServiceKey`] form.
    ///
    /// All forms return the identical service:
    ///
    /// ```no_run
    /// # use upnp_client::{Device, SearchTarget};
    /// # fn demo(device: &Device) {
    /// let a = device.service("urn:schemas-upnp-org:service:WANIPConnection:1");
    /// let b = device.service(SearchTarget::WanIpConnection);
    /// let c = device.service("WANIPConn1"); // short serviceId name
    /// # }
    /// ```
    pub fn service<'a>(&self, key: impl Into<ServiceKey<'a>>) -> Option<&Service> {
        match key.into() {
            ServiceKey::Target(target) => self
                .services
                .iter()
                .find(|s| s.service_type == target.as_str()),
            ServiceKey::Name(name) => self
                .services
                .iter()
                .find(|s| s.service_type == name)
                .or_else(|| self.services.iter().find(|s| s.name() == name)),
        }
    }

    /// Look up an action by name across all services, first match in
    /// document order.
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.services.iter().find_map(|s| s.action(name))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = if self.model_description.is_empty() {
            self.model_name.clone()
        } else if self.model_description.contains(&self.model_name) {
            self.model_description.clone()
        } else {
            format!("{} {}", self.model_description, self.model_name)
        };
        write!(f, "{} ({}) [{}]", self.name(), description, self.manufacturer)
    }
}

/// Key forms accepted by [`Device::service`].
#[derive(Debug, Clone, Copy)]
pub enum ServiceKey<'a> {
    /// Full service-type URI, or the trailing segment of the serviceId
    /// ("short name"); the full URI is tried first
    Name(&'a str),
    /// Well-known search-target constant
    Target(SearchTarget),
}

impl<'a> From<&'a str> for ServiceKey<'a> {
    fn from(name: &'a str) -> Self {
        ServiceKey::Name(name)
    }
}

impl<'a> From<&'a String> for ServiceKey<'a> {
    fn from(name: &'a String) -> Self {
        ServiceKey::Name(name)
    }
}

impl From<SearchTarget> for ServiceKey<'static> {
    fn from(target: SearchTarget) -> Self {
        ServiceKey::Target(target)
    }
}

/// One service of a resolved [`Device`].
#[derive(Debug, Clone)]
pub struct Service {
    service_type: String,
    service_id: String,
    control_url: String,
    event_sub_url: String,
    scpd_url: String,
    actions: Vec<Action>,
}

impl Service {
    /// Build a service from its `<service>` descriptor element, fetching
    /// the SCPD document to enumerate actions.
    pub(crate) fn from_element(http: &Client, url_base: &str, node: &Element) -> Result<Self> {
        let service_type = child_text(node, "serviceType");
        if service_type.is_empty() {
            return Err(UpnpError::DataFormat(
                "service element without serviceType".to_string(),
            ));
        }
        let service_id = child_text(node, "serviceId");
        let control_url = resolved_child_url(node, "controlURL", url_base)?;
        let event_sub_url = resolved_child_url(node, "eventSubURL", url_base)?;
        let scpd_url = resolved_child_url(node, "SCPDURL", url_base)?;

        let scpd = fetch_document(http, &scpd_url)?;
        let mut actions: Vec<Action> = Vec::new();
        if let Some(action_list) = scpd.get_child("actionList") {
            for action_node in children_named(action_list, "action") {
                let action = Action::from_element(&service_type, &control_url, action_node)?;
                match actions.iter().position(|a| a.name == action.name) {
                    Some(i) => actions[i] = action,
                    None => actions.push(action),
                }
            }
        }

        Ok(Self {
            service_type,
            service_id,
            control_url,
            event_sub_url,
            scpd_url,
            actions,
        })
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Absolute control endpoint for action invocations.
    pub fn control_url(&self) -> &str {
        &self.control_url
    }

    pub fn event_sub_url(&self) -> &str {
        &self.event_sub_url
    }

    pub fn scpd_url(&self) -> &str {
        &self.scpd_url
    }

    /// Short name: the trailing segment of the serviceId.
    pub fn name(&self) -> &str {
        self.service_id
            .rsplit(':')
            .next()
            .unwrap_or(&self.service_id)
    }

    /// Actions in SCPD document order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Look up an action by name.
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.service_type)
    }
}

/// A remotely-callable action declared in a service's SCPD.
///
/// Carries its owning service's type and control URL, so invocation is a
/// pure operation on this value; no call state is held.
#[derive(Debug, Clone)]
pub struct Action {
    name: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    service_type: String,
    control_url: String,
}

impl Action {
    pub(crate) fn from_element(
        service_type: &str,
        control_url: &str,
        node: &Element,
    ) -> Result<Self> {
        let name = child_text(node, "name");
        if name.is_empty() {
            return Err(UpnpError::DataFormat(
                "action element without name".to_string(),
            ));
        }

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        if let Some(argument_list) = node.get_child("argumentList") {
            for argument in children_named(argument_list, "argument") {
                let argument_name = child_text(argument, "name");
                if child_text(argument, "direction") == "in" {
                    inputs.push(argument_name);
                } else {
                    outputs.push(argument_name);
                }
            }
        }

        Ok(Self {
            name,
            inputs,
            outputs,
            service_type: service_type.to_string(),
            control_url: control_url.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input argument names, in declaration order.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Output argument names, in declaration order.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Type URI of the owning service.
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// Invoke this action and collect its declared outputs.
    ///
    /// `positional` values bind to the declared inputs in order; `named`
    /// pairs overlay them, so a named argument wins over a positional one
    /// for the same input. Inputs bound by neither are omitted from the
    /// request and left for the device to default. Supplying more
    /// positional values than declared inputs fails before any network
    /// activity.
    ///
    /// Declared outputs missing from the device's response come back as
    /// empty strings, never as errors.
    pub fn invoke(
        &self,
        soap: &SoapClient,
        positional: &[&str],
        named: &[(&str, &str)],
    ) -> Result<InvocationResult> {
        let args = self.bind_arguments(positional, named)?;
        info!(
            "invoking {}#{} at {}",
            self.service_type, self.name, self.control_url
        );
        let response = soap.call(&self.control_url, &self.service_type, &self.name, &args)?;

        let fields = self
            .outputs
            .iter()
            .map(|output| {
                let value = descendant_text(&response, output).unwrap_or_default();
                (output.clone(), value)
            })
            .collect();
        Ok(InvocationResult::new(fields))
    }

    fn bind_arguments(
        &self,
        positional: &[&str],
        named: &[(&str, &str)],
    ) -> Result<Vec<(String, String)>> {
        if positional.len() > self.inputs.len() {
            return Err(UpnpError::ArgumentCount {
                action: self.name.clone(),
                declared: self.inputs.len(),
                supplied: positional.len(),
            });
        }

        let mut args: Vec<(String, String)> = self
            .inputs
            .iter()
            .zip(positional)
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        for (name, value) in named {
            match args.iter_mut().find(|(bound, _)| *bound == *name) {
                Some(slot) => slot.1 = value.to_string(),
                None => args.push((name.to_string(), value.to_string())),
            }
        }
        Ok(args)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}) -> [{}]",
            self.name,
            self.inputs.join(", "),
            self.outputs.join(", ")
        )
    }
}

fn resolved_child_url(node: &Element, tag: &str, base: &str) -> Result<String> {
    let value = child_text(node, tag);
    if value.is_empty() {
        Ok(value)
    } else {
        resolve_url(base, &value)
    }
}

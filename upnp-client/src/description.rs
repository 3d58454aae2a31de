//! Descriptor fetching and namespace-tolerant XML access.
//!
//! UPnP descriptors arrive with assorted default namespaces and prefixes;
//! all lookups here match on local names only. URL-valued fields are
//! resolved to absolute form against a base URL before they leave this
//! module's callers.

use reqwest::blocking::Client;
use tracing::debug;
use url::Url;
use xmltree::{Element, XMLNode};

use crate::error::{Result, UpnpError};

/// Fetch `location` over HTTP and parse the body as an XML document.
///
/// Non-2xx statuses surface as transport errors; a 2xx body that is not
/// well-formed XML is a data-format error.
pub(crate) fn fetch_document(http: &Client, location: &str) -> Result<Element> {
    debug!("fetching descriptor {}", location);
    let bytes = http
        .get(location)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(|e| UpnpError::Transport(format!("failed to fetch {}: {}", location, e)))?
        .bytes()
        .map_err(|e| UpnpError::Transport(format!("failed to read {}: {}", location, e)))?;

    Element::parse(bytes.as_ref())
        .map_err(|e| UpnpError::DataFormat(format!("invalid XML at {}: {}", location, e)))
}

/// Trimmed text of the first child element with local name `tag`, or an
/// empty string when the tag is absent. Optional descriptor fields degrade
/// to empty values rather than errors.
pub(crate) fn child_text(parent: &Element, tag: &str) -> String {
    parent
        .get_child(tag)
        .and_then(|e| e.get_text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// Depth-first search for the first descendant element with local name
/// `tag`.
pub(crate) fn find_descendant<'a>(root: &'a Element, tag: &str) -> Option<&'a Element> {
    for child in root.children.iter().filter_map(XMLNode::as_element) {
        if child.name == tag {
            return Some(child);
        }
        if let Some(found) = find_descendant(child, tag) {
            return Some(found);
        }
    }
    None
}

/// Trimmed text of the first descendant with local name `tag`.
pub(crate) fn descendant_text(root: &Element, tag: &str) -> Option<String> {
    find_descendant(root, tag)
        .and_then(|e| e.get_text())
        .map(|t| t.trim().to_string())
}

/// Every descendant element with local name `tag`, in document order.
pub(crate) fn collect_descendants<'a>(
    root: &'a Element,
    tag: &str,
    found: &mut Vec<&'a Element>,
) {
    for child in root.children.iter().filter_map(XMLNode::as_element) {
        if child.name == tag {
            found.push(child);
        }
        collect_descendants(child, tag, found);
    }
}

/// Child elements of `parent` with local name `tag`, in document order.
pub(crate) fn children_named<'a>(parent: &'a Element, tag: &'a str) -> impl Iterator<Item = &'a Element> {
    parent
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(move |e| e.name == tag)
}

/// Resolve `reference` against `base` per RFC 3986.
pub(crate) fn resolve_url(base: &str, reference: &str) -> Result<String> {
    let base = Url::parse(base)
        .map_err(|e| UpnpError::DataFormat(format!("invalid base URL {}: {}", base, e)))?;
    let resolved = base
        .join(reference)
        .map_err(|e| UpnpError::DataFormat(format!("invalid URL reference {}: {}", reference, e)))?;
    Ok(resolved.to_string())
}

/// Base URL for a descriptor: the location with its last path segment
/// dropped. Used when the document carries no `URLBase`.
pub(crate) fn base_of(location: &str) -> Result<String> {
    resolve_url(location, ".")
}

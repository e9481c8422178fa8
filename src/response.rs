// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Response parsers for WebDAV/CalDAV operations.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;

use crate::error::CalDavError;
use crate::xml::{is_success, ns, parse_status_code};

/// `WebDAV` multistatus response (RFC 4918 §13).
#[derive(Debug, Clone)]
pub struct MultiStatus {
    /// The response items, in document order.
    pub responses: Vec<DavResponse>,
}

/// Individual response in a multistatus.
#[derive(Debug, Clone)]
pub struct DavResponse {
    /// Raw href text; may be path-only or absolute.
    pub href: String,
    /// Propstat blocks, in document order.
    pub propstats: Vec<PropStat>,
}

/// Property block with its status.
#[derive(Debug, Clone)]
pub struct PropStat {
    /// Numeric HTTP status of the block; 0 when missing or malformed.
    pub status: u16,
    /// Properties carried by the block.
    pub props: Vec<Element>,
}

/// A parsed XML element with namespace-qualified name.
///
/// Property values have two shapes, text or subtree; both are kept.
#[derive(Debug, Clone, Default)]
pub struct Element {
    /// Local name without prefix.
    pub name: String,
    /// Namespace URI; empty when unbound.
    pub namespace: String,
    /// Concatenated unescaped text content.
    pub text: String,
    /// Attributes as (local name, value) pairs.
    pub attributes: Vec<(String, String)>,
    /// Child elements, in document order.
    pub children: Vec<Element>,
}

impl Element {
    /// Whether this element has the given local name and namespace.
    #[must_use]
    pub fn is(&self, name: &str, namespace: &str) -> bool {
        self.name == name && self.namespace == namespace
    }

    /// First child with the given local name and namespace.
    #[must_use]
    pub fn child(&self, name: &str, namespace: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(name, namespace))
    }

    /// Value of the attribute with the given local name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl MultiStatus {
    /// Parses a multistatus document.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::Parse`] on malformed XML or when the root
    /// element is not a `multistatus`.
    pub fn parse(xml: &str) -> Result<Self, CalDavError> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);
        reader.config_mut().check_end_names = true;

        let root = loop {
            let event = match reader.read_resolved_event() {
                Ok(event) => event,
                Err(e) => {
                    let pos = reader.buffer_position();
                    return Err(CalDavError::Parse(format!("malformed XML at byte {pos}: {e}")));
                }
            };
            match event {
                (resolve, Event::Start(e)) => {
                    let namespace = namespace_uri(&resolve);
                    break read_element(&mut reader, &e, namespace)?;
                }
                (resolve, Event::Empty(e)) => {
                    let namespace = namespace_uri(&resolve);
                    break leaf_element(&e, namespace)?;
                }
                (_, Event::Eof) => {
                    return Err(CalDavError::Parse("empty multistatus document".to_string()));
                }
                _ => {}
            }
        };

        if root.name != "multistatus" {
            return Err(CalDavError::Parse(format!(
                "expected multistatus root, found <{}>",
                root.name
            )));
        }

        let responses = root
            .children
            .into_iter()
            .filter(|c| c.is("response", ns::DAV))
            .map(DavResponse::from_element)
            .collect();

        Ok(Self { responses })
    }
}

impl DavResponse {
    fn from_element(el: Element) -> Self {
        let href = el
            .child("href", ns::DAV)
            .map(|h| h.text.clone())
            .unwrap_or_default();

        let propstats = el
            .children
            .into_iter()
            .filter(|c| c.is("propstat", ns::DAV))
            .map(|ps| {
                let status = ps
                    .child("status", ns::DAV)
                    .map_or(0, |s| parse_status_code(&s.text));
                let props = ps
                    .children
                    .into_iter()
                    .find(|c| c.is("prop", ns::DAV))
                    .map(|p| p.children)
                    .unwrap_or_default();
                PropStat { status, props }
            })
            .collect();

        Self { href, propstats }
    }

    /// First text value of the property from any successful propstat.
    #[must_use]
    pub fn get_property(&self, name: &str, namespace: &str) -> Option<&str> {
        self.successful_props()
            .find(|p| p.is(name, namespace))
            .map(|p| p.text.as_str())
    }

    /// Raw subtree of the property from any successful propstat, for
    /// structured properties such as `resourcetype` or privilege sets.
    #[must_use]
    pub fn get_property_element(&self, name: &str, namespace: &str) -> Option<&Element> {
        self.successful_props().find(|p| p.is(name, namespace))
    }

    /// Whether the `resourcetype` property carries the given child type.
    #[must_use]
    pub fn has_resource_type(&self, name: &str, namespace: &str) -> bool {
        self.get_property_element("resourcetype", ns::DAV)
            .is_some_and(|rt| rt.child(name, namespace).is_some())
    }

    /// Whether this resource is a `CalDAV` calendar collection.
    #[must_use]
    pub fn is_calendar(&self) -> bool {
        self.has_resource_type("calendar", ns::CALDAV)
    }

    /// Whether this resource is a `WebDAV` collection.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.has_resource_type("collection", ns::DAV)
    }

    /// Whether the current user lacks write privileges on this resource.
    ///
    /// The `current-user-privilege-set` subtree is scanned for a privilege
    /// granting write, write-content, bind, unbind, or all. An absent set is
    /// treated as writable; the server may not implement ACL.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.get_property_element("current-user-privilege-set", ns::DAV)
            .is_some_and(|set| !privileges_grant_write(set))
    }

    fn successful_props(&self) -> impl Iterator<Item = &Element> {
        self.propstats
            .iter()
            .filter(|ps| is_success(ps.status))
            .flat_map(|ps| ps.props.iter())
    }
}

/// Privileges that make a resource writable for the current user.
const WRITE_PRIVILEGES: [&str; 5] = ["write", "write-content", "bind", "unbind", "all"];

fn privileges_grant_write(set: &Element) -> bool {
    set.children
        .iter()
        .filter(|c| c.is("privilege", ns::DAV))
        .any(|privilege| {
            privilege
                .children
                .iter()
                .any(|p| p.namespace == ns::DAV && WRITE_PRIVILEGES.contains(&p.name.as_str()))
        })
}

fn namespace_uri(resolve: &ResolveResult) -> String {
    match resolve {
        ResolveResult::Bound(namespace) => String::from_utf8_lossy(namespace.as_ref()).into_owned(),
        _ => String::new(),
    }
}

fn leaf_element(start: &BytesStart, namespace: String) -> Result<Element, CalDavError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| CalDavError::Parse(format!("bad attribute: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| CalDavError::Parse(format!("bad attribute value: {e}")))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        namespace,
        text: String::new(),
        attributes,
        children: Vec::new(),
    })
}

fn read_element(
    reader: &mut NsReader<&[u8]>,
    start: &BytesStart,
    namespace: String,
) -> Result<Element, CalDavError> {
    let mut el = leaf_element(start, namespace)?;

    loop {
        let event = match reader.read_resolved_event() {
            Ok(event) => event,
            Err(e) => {
                let pos = reader.buffer_position();
                return Err(CalDavError::Parse(format!("malformed XML at byte {pos}: {e}")));
            }
        };
        match event {
            (child_ns, Event::Start(e)) => {
                let child_namespace = namespace_uri(&child_ns);
                let child = read_element(reader, &e, child_namespace)?;
                el.children.push(child);
            }
            (child_ns, Event::Empty(e)) => {
                let child_namespace = namespace_uri(&child_ns);
                el.children.push(leaf_element(&e, child_namespace)?);
            }
            (_, Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| CalDavError::Parse(format!("bad text content: {e}")))?;
                el.text.push_str(&text);
            }
            (_, Event::CData(t)) => {
                el.text.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            (_, Event::End(_)) => break,
            (_, Event::Eof) => {
                return Err(CalDavError::Parse(format!(
                    "unexpected EOF inside <{}>",
                    el.name
                )));
            }
            _ => {}
        }
    }

    Ok(el)
}

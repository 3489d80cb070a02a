//! `DAV:` multistatus XML, built with `xmltree` the way the teacher
//! depends on it (`xmltree = "0.10"` in its `Cargo.toml`) rather than
//! hand-concatenated strings, except for the single-condition error
//! body, which stays a small format! template exactly like the
//! teacher's own `util::dav_xml_error`.

use std::time::SystemTime;

use time::format_description::well_known::Rfc3339;
use time::macros::offset;
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::node::Stat;

const NS_DAV: &str = "DAV:";

fn systemtime_to_rfc3339(t: SystemTime) -> String {
    let secs = t
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    time::OffsetDateTime::from_unix_timestamp(secs)
        .unwrap_or(time::OffsetDateTime::UNIX_EPOCH)
        .to_offset(offset!(UTC))
        .format(&Rfc3339)
        .unwrap_or_default()
}

fn dav_el(local: &str) -> Element {
    let mut e = Element::new(local);
    e.namespace = Some(NS_DAV.to_string());
    e.prefix = Some("D".to_string());
    e
}

fn text_el(local: &str, text: impl Into<String>) -> Element {
    let mut e = dav_el(local);
    e.children.push(XMLNode::Text(text.into()));
    e
}

/// One `<D:response>` entry: a path plus the stat the engine fabricated
/// or read for it.
pub struct PropfindEntry {
    pub href: String,
    pub displayname: String,
    pub stat: Stat,
}

fn resourcetype_el(stat: &Stat) -> Element {
    let mut rt = dav_el("resourcetype");
    if stat.is_dir() {
        rt.children.push(XMLNode::Element(dav_el("collection")));
    }
    rt
}

fn propstat_el(entry: &PropfindEntry) -> Element {
    let mut prop = dav_el("prop");
    prop.children.push(XMLNode::Element(text_el("displayname", entry.displayname.clone())));
    prop.children.push(XMLNode::Element(resourcetype_el(&entry.stat)));
    prop.children
        .push(XMLNode::Element(text_el("getlastmodified", systemtime_to_rfc3339(entry.stat.mtime))));
    if let Some(size) = entry.stat.size {
        prop.children
            .push(XMLNode::Element(text_el("getcontentlength", size.to_string())));
    }

    let mut propstat = dav_el("propstat");
    propstat.children.push(XMLNode::Element(prop));
    propstat
        .children
        .push(XMLNode::Element(text_el("status", "HTTP/1.1 200 OK")));
    propstat
}

fn response_el(entry: &PropfindEntry) -> Element {
    let mut response = dav_el("response");
    response
        .children
        .push(XMLNode::Element(text_el("href", entry.href.clone())));
    response.children.push(XMLNode::Element(propstat_el(entry)));
    response
}

/// Serialize a `<D:multistatus>` body from a flat list of entries.
/// Used by both PROPFIND and SEARCH (spec.md §4.3.6: "reuses the same
/// response-building code PROPFIND uses").
pub fn build_multistatus(entries: &[PropfindEntry]) -> Vec<u8> {
    let mut root = dav_el("multistatus");
    root.attributes.insert("xmlns:D".to_string(), NS_DAV.to_string());
    for entry in entries {
        root.children.push(XMLNode::Element(response_el(entry)));
    }

    let mut buf = Vec::new();
    let cfg = EmitterConfig::new().perform_indent(false);
    root.write_with_config(&mut buf, cfg).expect("writing to a Vec never fails");
    buf
}

/// A minimal `<D:error>` body carrying a single named condition, the
/// same shape the teacher's `util::dav_xml_error` builds by hand.
pub fn build_error(condition: &str) -> Vec<u8> {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
        <D:error xmlns:D=\"DAV:\">\n\
        <D:{condition}/>\n\
        </D:error>\n"
    )
    .into_bytes()
}

/// Pull the text of a `<D:contains>` node out of a SEARCH request body
/// (spec.md §4.3.6: "only implementing `<D:contains>` substring
/// matching"). Returns `None` if the body doesn't parse or has no such
/// element.
pub fn parse_contains_query(body: &[u8]) -> Option<String> {
    let root = Element::parse(body).ok()?;
    find_contains(&root)
}

fn find_contains(el: &Element) -> Option<String> {
    if el.name == "contains" {
        return el.get_text().map(|t| t.into_owned());
    }
    for child in &el.children {
        if let XMLNode::Element(child_el) = child {
            if let Some(found) = find_contains(child_el) {
                return Some(found);
            }
        }
    }
    None
}

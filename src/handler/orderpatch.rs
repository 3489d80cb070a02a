//! ORDERPATCH (spec.md §9 open question / SPEC_FULL §4.3.7): reorders a
//! directory's child order, honored by PROPFIND's listing step.
//!
//! RFC 3648's `<D:ordering-type>`/`<D:order-member>` grammar is more than
//! this deviation needs; clients that speak ORDERPATCH at all (mostly
//! macOS Finder's "Arrange By" sync) send a flat sequence of
//! `<D:order-member><D:segment>name</D:segment></D:order-member>`
//! elements, which is all this handler reads.

use http::StatusCode;
use xmltree::{Element, XMLNode};

use crate::error::DavResult;
use crate::fs::PersistenceAdapter;

use super::{empty, DavHandler, RequestCtx, RespBody};

pub async fn handle<A: PersistenceAdapter + 'static>(
    handler: &DavHandler<A>,
    ctx: &RequestCtx,
    body: &[u8],
) -> DavResult<http::Response<RespBody>> {
    let Ok(root) = Element::parse(body) else {
        return Ok(empty(StatusCode::BAD_REQUEST));
    };

    let order = collect_segments(&root);
    if order.is_empty() {
        return Ok(empty(StatusCode::BAD_REQUEST));
    }

    // The sidecar is the source of truth PROPFIND actually reads back
    // (`DavState::get`); also forwarding to the adapter lets a backend
    // that natively tracks child order (`MemoryBackend`) keep its own
    // `readdir` consistent, while a backend that doesn't (`DiskBackend`)
    // just no-ops.
    let _ = handler.fs.set_order(&ctx.path, order.clone()).await;
    handler.state.set_order(&ctx.path, order).await;
    Ok(empty(StatusCode::OK))
}

/// Depth-first walk collecting every `<D:segment>`'s text content, in
/// document order.
fn collect_segments(el: &Element) -> Vec<String> {
    let mut names = Vec::new();
    walk(el, &mut names);
    names
}

fn walk(el: &Element, names: &mut Vec<String>) {
    if el.name == "segment" {
        if let Some(text) = el.get_text() {
            names.push(text.into_owned());
        }
    }
    for child in &el.children {
        if let XMLNode::Element(child_el) = child {
            walk(child_el, names);
        }
    }
}

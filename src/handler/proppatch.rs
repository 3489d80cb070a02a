//! PROPPATCH (SPEC_FULL §4.3.7): stores/removes dead properties in the
//! `dav-state` sidecar, gated by the dialect policy's
//! `ensure_lock_ok_for_proppatch` exactly as it is for Microsoft
//! Office's missing `Lock-Token`.

use http::StatusCode;
use xmltree::{Element, XMLNode};

use crate::dialect::DialectCtx;
use crate::error::DavResult;

use super::{bytes_response, empty, DavHandler, RequestCtx, RespBody};
use crate::fs::PersistenceAdapter;

pub async fn handle<A: PersistenceAdapter + 'static>(
    handler: &DavHandler<A>,
    ctx: &RequestCtx,
    body: &[u8],
) -> DavResult<http::Response<RespBody>> {
    let state = handler.state.get(&ctx.path).await;
    if let Some(required) = &state.lock_token {
        let presented_ok = ctx.lock_token_header.as_deref().map(|t| t.contains(required.as_str())).unwrap_or(false);
        let dialect_ctx = DialectCtx { user_agent: ctx.user_agent.as_deref() };
        if !handler.dialect.ensure_lock_ok_for_proppatch(&dialect_ctx, presented_ok) {
            return Ok(empty(StatusCode::PRECONDITION_FAILED));
        }
    }

    let Ok(root) = Element::parse(body) else {
        return Ok(empty(StatusCode::BAD_REQUEST));
    };

    let mut applied = Vec::new();
    for child in &root.children {
        let XMLNode::Element(el) = child else { continue };
        match el.name.as_str() {
            "set" => {
                for (name, value) in prop_entries(el) {
                    handler.state.set_prop(&ctx.path, name.clone(), value).await;
                    applied.push(name);
                }
            }
            "remove" => {
                for (name, _) in prop_entries(el) {
                    handler.state.remove_prop(&ctx.path, &name).await;
                    applied.push(name);
                }
            }
            _ => {}
        }
    }

    let xml = build_proppatch_response(&ctx.path.href(false), &applied);
    Ok(bytes_response(StatusCode::from_u16(207).unwrap(), "application/xml", xml))
}

/// Walk `<D:set>`/`<D:remove>`'s nested `<D:prop>` for direct children,
/// pairing each property's local name with its text content.
fn prop_entries(set_or_remove: &Element) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for child in &set_or_remove.children {
        let XMLNode::Element(prop_el) = child else { continue };
        if prop_el.name != "prop" {
            continue;
        }
        for prop_child in &prop_el.children {
            if let XMLNode::Element(named) = prop_child {
                out.push((named.name.clone(), named.get_text().map(|t| t.into_owned()).unwrap_or_default()));
            }
        }
    }
    out
}

fn build_proppatch_response(href: &str, names: &[String]) -> Vec<u8> {
    let props: String = names.iter().map(|n| format!("<D:{n}/>")).collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
        <D:multistatus xmlns:D=\"DAV:\">\n\
        <D:response><D:href>{href}</D:href>\n\
        <D:propstat><D:prop>{props}</D:prop><D:status>HTTP/1.1 200 OK</D:status></D:propstat>\n\
        </D:response>\n\
        </D:multistatus>\n"
    )
    .into_bytes()
}

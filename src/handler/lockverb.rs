//! LOCK / UNLOCK (SPEC_FULL §4.3.7): just enough to satisfy macOS and
//! Windows clients that refuse to PUT/PROPPATCH without locking first.
//! The token is recorded in `dav-state` and checked back by PROPPATCH;
//! there is no second-writer rejection, so this is advisory rather than
//! exclusive — the `FakeLs`-equivalent limit this engine accepts.

use http::StatusCode;
use uuid::Uuid;

use crate::error::DavResult;
use crate::fs::PersistenceAdapter;

use super::{bytes_response, empty, DavHandler, RequestCtx, RespBody};

pub async fn handle_lock<A: PersistenceAdapter + 'static>(
    handler: &DavHandler<A>,
    ctx: &RequestCtx,
) -> DavResult<http::Response<RespBody>> {
    if !handler.fs.exists(&ctx.path).await {
        handler.fs.write_file(&ctx.path, Vec::new(), None).await?;
    }

    let token = format!("opaquelocktoken:{}", Uuid::new_v4());
    handler.state.set_lock_token(&ctx.path, Some(token.clone())).await;

    let body = build_lockdiscovery(&token);
    let mut resp = bytes_response(StatusCode::OK, "application/xml", body);
    resp.headers_mut().insert("lock-token", format!("<{token}>").parse().unwrap());
    Ok(resp)
}

pub async fn handle_unlock<A: PersistenceAdapter + 'static>(
    handler: &DavHandler<A>,
    ctx: &RequestCtx,
) -> DavResult<http::Response<RespBody>> {
    handler.state.set_lock_token(&ctx.path, None).await;
    Ok(empty(StatusCode::NO_CONTENT))
}

fn build_lockdiscovery(token: &str) -> Vec<u8> {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
        <D:prop xmlns:D=\"DAV:\">\n\
        <D:lockdiscovery><D:activelock>\n\
        <D:locktype><D:write/></D:locktype>\n\
        <D:lockscope><D:exclusive/></D:lockscope>\n\
        <D:depth>0</D:depth>\n\
        <D:timeout>Second-3600</D:timeout>\n\
        <D:locktoken><D:href>{token}</D:href></D:locktoken>\n\
        </D:activelock></D:lockdiscovery>\n\
        </D:prop>\n"
    )
    .into_bytes()
}

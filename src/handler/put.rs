//! PUT (spec.md §4.3.2).

use bytes::Bytes;
use http::StatusCode;

use crate::error::DavResult;
use crate::fs::PersistenceAdapter;

use super::{bytes_response, empty, DavHandler, RequestCtx, RespBody};

pub async fn handle<A: PersistenceAdapter + 'static>(
    handler: &DavHandler<A>,
    fs: &(impl PersistenceAdapter + 'static),
    ctx: &RequestCtx,
    body: Bytes,
) -> DavResult<http::Response<RespBody>> {
    if ctx.path.is_root() {
        return Ok(empty(StatusCode::BAD_REQUEST));
    }

    handler.hooks.before_put(&ctx.path, body.len()).await?;

    let mime = ctx
        .content_type
        .clone()
        .or_else(|| ctx.path.name().map(|n| mime_guess::from_path(n).first_or_octet_stream().to_string()));

    let guard = handler.lock.lock_one(&ctx.path).await;
    fs.write_file(&ctx.path, body.to_vec(), mime).await?;
    drop(guard);

    Ok(bytes_response(StatusCode::CREATED, "text/plain", Vec::new()))
}

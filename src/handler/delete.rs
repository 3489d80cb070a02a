//! DELETE (spec.md §4.3 dispatch table: "if missing → 404; else
//! `remove(recursive=true)` → 204").

use http::StatusCode;

use crate::error::{DavError, DavResult, FsError};
use crate::fs::{PersistenceAdapter, RemoveOptions};

use super::{empty, DavHandler, RequestCtx, RespBody};

pub async fn handle<A: PersistenceAdapter + 'static>(
    handler: &DavHandler<A>,
    fs: &(impl PersistenceAdapter + 'static),
    ctx: &RequestCtx,
) -> DavResult<http::Response<RespBody>> {
    let guard = handler.lock.lock_one(&ctx.path).await;
    let result = fs.remove(&ctx.path, RemoveOptions { recursive: true }).await;
    drop(guard);
    handler.state.forget(&ctx.path).await;

    match result {
        Ok(()) => Ok(empty(StatusCode::NO_CONTENT)),
        Err(FsError::NotFound) => Ok(empty(StatusCode::NOT_FOUND)),
        Err(e) => Err(DavError::Fs(e)),
    }
}

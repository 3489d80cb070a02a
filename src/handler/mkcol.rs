//! MKCOL (spec.md §4.3 dispatch table: "if path has no segments → 403;
//! if parent missing → 409; else ensure dir → 201").

use http::StatusCode;

use crate::error::DavResult;
use crate::fs::PersistenceAdapter;

use super::{empty, DavHandler, RequestCtx, RespBody};

pub async fn handle<A: PersistenceAdapter + 'static>(
    handler: &DavHandler<A>,
    fs: &(impl PersistenceAdapter + 'static),
    ctx: &RequestCtx,
) -> DavResult<http::Response<RespBody>> {
    if ctx.path.is_root() {
        return Ok(empty(StatusCode::FORBIDDEN));
    }

    let parent = ctx.path.parent();
    if !parent.is_root() && !fs.exists(&parent).await {
        return Ok(empty(StatusCode::CONFLICT));
    }

    handler.hooks.before_mkcol(&ctx.path).await?;

    let guard = handler.lock.lock_one(&ctx.path).await;
    fs.ensure_dir(&ctx.path).await?;
    drop(guard);

    handler.hooks.after_mkcol(&ctx.path).await;
    Ok(empty(StatusCode::CREATED))
}

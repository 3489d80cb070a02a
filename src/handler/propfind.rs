//! PROPFIND (spec.md §4.3.4).

use http::StatusCode;

use crate::error::{DavError, DavResult, FsError};
use crate::fs::{CachedAdapter, PersistenceAdapter};
use crate::node::Kind;
use crate::xml::{build_multistatus, PropfindEntry};

use super::{bytes_response, empty, DavHandler, RequestCtx, RespBody};

pub async fn handle<A: PersistenceAdapter + 'static>(
    handler: &DavHandler<A>,
    ctx: &RequestCtx,
) -> DavResult<http::Response<RespBody>> {
    if let Some(name) = ctx.path.name() {
        if handler.ignore.is_ignored(name) {
            return Ok(empty(StatusCode::NOT_FOUND));
        }
    }

    match handler.fs.stat(&ctx.path).await {
        Ok(stat) if stat.kind == Kind::Directory => {
            if handler.fs.readdir(&ctx.path).await.map(|c| c.is_empty()).unwrap_or(false) {
                if let Some(orchestrator) = &handler.orchestrator {
                    orchestrator.fabricate_listing(ctx.path.clone(), ctx.depth.clone()).await;
                }
            }
        }
        Ok(_) => {}
        Err(FsError::NotFound) => {
            if let Some(orchestrator) = &handler.orchestrator {
                orchestrator.fabricate_listing(ctx.path.clone(), ctx.depth.clone()).await;
            }
            if handler.fs.stat(&ctx.path).await.is_err() {
                return Ok(empty(StatusCode::NOT_FOUND));
            }
        }
        Err(e) => return Err(DavError::Fs(e)),
    }

    let cached = CachedAdapter::new(handler.fs.clone());
    let self_stat = match cached.stat(&ctx.path).await {
        Ok(s) => s,
        Err(_) => return Ok(empty(StatusCode::NOT_FOUND)),
    };

    let mut entries = vec![PropfindEntry {
        href: ctx.path.href(self_stat.is_dir()),
        displayname: ctx.path.name().unwrap_or("/").to_string(),
        stat: self_stat.clone(),
    }];

    // Depth "infinity" is capped at 1, the documented deviation
    // (spec.md §9 open question); "0" means self only.
    if ctx.depth.as_deref() != Some("0") && self_stat.is_dir() {
        let mut names = cached.readdir(&ctx.path).await.unwrap_or_default();
        let state = handler.state.get(&ctx.path).await;
        if let Some(order) = state.order {
            apply_order(&mut names, &order);
        }

        for name in names {
            if handler.ignore.is_ignored(&name) {
                continue;
            }
            let child_path = ctx.path.child(name.clone());
            if let Ok(child_stat) = cached.stat(&child_path).await {
                entries.push(PropfindEntry {
                    href: child_path.href(child_stat.is_dir()),
                    displayname: name,
                    stat: child_stat,
                });
            }
        }
    }

    let body = build_multistatus(&entries);
    Ok(bytes_response(StatusCode::from_u16(207).unwrap(), "application/xml", body))
}

fn apply_order(names: &mut Vec<String>, order: &[String]) {
    let mut ordered: Vec<String> = order.iter().filter(|n| names.contains(n)).cloned().collect();
    for n in names.iter() {
        if !ordered.contains(n) {
            ordered.push(n.clone());
        }
    }
    *names = ordered;
}

//! SEARCH (spec.md §9 open question / SPEC_FULL §4.3.6): `<D:contains>`
//! substring matching against filenames within one directory, reusing
//! PROPFIND's response-building code.

use http::StatusCode;

use crate::error::DavResult;
use crate::fs::PersistenceAdapter;
use crate::xml::{build_multistatus, parse_contains_query, PropfindEntry};

use super::{bytes_response, empty, DavHandler, RequestCtx, RespBody};

pub async fn handle<A: PersistenceAdapter + 'static>(
    handler: &DavHandler<A>,
    ctx: &RequestCtx,
    body: &[u8],
) -> DavResult<http::Response<RespBody>> {
    let Some(needle) = parse_contains_query(body) else {
        return Ok(empty(StatusCode::BAD_REQUEST));
    };
    let needle_lower = needle.to_ascii_lowercase();

    let names = match handler.fs.readdir(&ctx.path).await {
        Ok(names) => names,
        Err(_) => return Ok(empty(StatusCode::NOT_FOUND)),
    };

    let mut entries = Vec::new();
    for name in names {
        if handler.ignore.is_ignored(&name) || !name.to_ascii_lowercase().contains(&needle_lower) {
            continue;
        }
        let child_path = ctx.path.child(name.clone());
        if let Ok(stat) = handler.fs.stat(&child_path).await {
            entries.push(PropfindEntry {
                href: child_path.href(stat.is_dir()),
                displayname: name,
                stat,
            });
        }
    }

    let body = build_multistatus(&entries);
    Ok(bytes_response(StatusCode::from_u16(207).unwrap(), "application/xml", body))
}

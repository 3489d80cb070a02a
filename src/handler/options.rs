//! OPTIONS (spec.md §4.3 dispatch table).

use http::StatusCode;

use super::{empty, RespBody};

pub fn handle() -> http::Response<RespBody> {
    let mut resp = empty(StatusCode::OK);
    let headers = resp.headers_mut();
    headers.insert("dav", "1,2".parse().unwrap());
    headers.insert("ms-author-via", "DAV".parse().unwrap());
    headers.insert(
        "allow",
        "OPTIONS, PROPFIND, MKCOL, GET, HEAD, PUT, DELETE, MOVE, COPY, PROPPATCH, LOCK, UNLOCK, SEARCH, ORDERPATCH"
            .parse()
            .unwrap(),
    );
    resp
}

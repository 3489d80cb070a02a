//! GET / HEAD (spec.md §4.3.1).

use http::StatusCode;

use crate::error::{DavError, FsError};
use crate::fs::PersistenceAdapter;
use crate::node::Kind;

use super::{bytes_response, empty, DavHandler, RequestCtx, RespBody};

pub async fn handle<A: PersistenceAdapter + 'static>(
    handler: &DavHandler<A>,
    fs: &(impl PersistenceAdapter + 'static),
    ctx: &RequestCtx,
    head_only: bool,
) -> crate::error::DavResult<http::Response<RespBody>> {
    if let Some(name) = ctx.path.name() {
        if handler.ignore.is_ignored(name) {
            return Ok(empty(StatusCode::NOT_FOUND));
        }
    }

    let stat = fs.stat(&ctx.path).await;
    match stat {
        Ok(stat) if stat.is_file() && stat.size.unwrap_or(0) > 0 => {
            serve_file(handler, fs, ctx, head_only).await
        }
        Ok(stat) if stat.is_file() => {
            // Empty file: give the fabrication orchestrator a chance to
            // fill it in before serving whatever ends up there.
            handler.hooks.before_get(&ctx.path).await?;
            if let Some(orchestrator) = &handler.orchestrator {
                orchestrator.fabricate_file_content(ctx.path.clone(), None).await;
            }
            serve_file(handler, fs, ctx, head_only).await
        }
        Ok(stat) if stat.kind == Kind::Directory => serve_index(fs, ctx, head_only).await,
        Ok(_) => unreachable!(),
        Err(FsError::NotFound) => {
            handler.hooks.before_get(&ctx.path).await?;
            if let Some(orchestrator) = &handler.orchestrator {
                let mime_hint = ctx.path.name().map(mime_hint_for);
                orchestrator.fabricate_file_content(ctx.path.clone(), mime_hint).await;
            }
            match fs.stat(&ctx.path).await {
                Ok(_) => serve_file(handler, fs, ctx, head_only).await,
                Err(_) => Ok(empty(StatusCode::NOT_FOUND)),
            }
        }
        Err(e) => Err(DavError::Fs(e)),
    }
}

async fn serve_file(
    handler: &DavHandler<impl PersistenceAdapter + 'static>,
    fs: &(impl PersistenceAdapter + 'static),
    ctx: &RequestCtx,
    head_only: bool,
) -> crate::error::DavResult<http::Response<RespBody>> {
    let _ = handler;
    let bytes = fs.read_file(&ctx.path).await?;
    let mime = ctx.path.name().map(mime_hint_for).unwrap_or_else(|| "application/octet-stream".to_string());
    if head_only {
        let mut resp = empty(StatusCode::OK);
        resp.headers_mut().insert("content-type", mime.parse().unwrap());
        resp.headers_mut().insert("content-length", bytes.len().to_string().parse().unwrap());
        Ok(resp)
    } else {
        Ok(bytes_response(StatusCode::OK, &mime, bytes))
    }
}

async fn serve_index(
    fs: &(impl PersistenceAdapter + 'static),
    ctx: &RequestCtx,
    head_only: bool,
) -> crate::error::DavResult<http::Response<RespBody>> {
    let mut names = fs.readdir(&ctx.path).await?;
    names.sort();
    let mut html = String::from("<html><body><ul>\n");
    for name in &names {
        let is_dir = fs
            .stat(&ctx.path.child(name.clone()))
            .await
            .map(|s| s.is_dir())
            .unwrap_or(false);
        let suffix = if is_dir { "/" } else { "" };
        let encoded = percent_encoding::utf8_percent_encode(name, percent_encoding::NON_ALPHANUMERIC);
        html.push_str(&format!(
            "<li><a href=\"{encoded}{suffix}\">{}{suffix}</a></li>\n",
            htmlescape::encode_minimal(name)
        ));
    }
    html.push_str("</ul></body></html>\n");
    if head_only {
        let mut resp = empty(StatusCode::OK);
        resp.headers_mut().insert("content-type", "text/html".parse().unwrap());
        resp.headers_mut().insert("content-length", html.len().to_string().parse().unwrap());
        Ok(resp)
    } else {
        Ok(bytes_response(StatusCode::OK, "text/html", html.into_bytes()))
    }
}

fn mime_hint_for(name: &str) -> String {
    mime_guess::from_path(name).first_or_octet_stream().to_string()
}

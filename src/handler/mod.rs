//! WebDAV Protocol Engine (component C, spec.md §4.3): routes an HTTP
//! request by method, consulting the ignore filter, the dialect
//! policy, and (on a miss) the fabrication orchestrator, then writes
//! through the per-path lock to a `PersistenceAdapter`.
//!
//! Generalizes the teacher's `DavHandler`/`DavBuilder` (`src/davhandler/mod.rs`)
//! — same builder shape, same "handle_inner maps DavError to a status
//! response" dispatcher — to a `PersistenceAdapter` instead of the
//! teacher's seekable-stream `DavFileSystem`, since this crate's files
//! are always whole-buffer `Vec<u8>`.

mod delete;
mod get;
mod lockverb;
mod mkcol;
mod movecopy;
mod options;
mod orderpatch;
mod propfind;
mod proppatch;
mod put;
mod search;

use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response};
use http_body::Body as HttpBody;
use http_body_util::{BodyExt, Full};

use crate::davstate::DavState;
use crate::dialect::{CompositeDialect, DialectPolicy};
use crate::error::{DavError, DavResult};
use crate::fs::{DiskBackend, MemoryBackend, PersistenceAdapter};
use crate::hooks::{NoopHooks, WebDavHooks};
use crate::ignore::IgnoreFilter;
use crate::llm::Orchestrator;
use crate::lock::PathLock;
use crate::path::Path;

pub type RespBody = Full<Bytes>;

/// Picks which `PersistenceAdapter` the handler is built over. Mirrors
/// the teacher's `FileSystem` enum (`davhandler::FileSystem`), trimmed
/// to the two backends this crate actually has.
pub enum Backend {
    Memory,
    Disk { persist_root: PathBuf },
}

/// Configuration accumulated by the builder.
pub struct DavBuilder {
    backend: Backend,
    dialect: Option<Arc<dyn DialectPolicy>>,
    hooks: Option<Arc<dyn WebDavHooks>>,
    ignore_patterns: Vec<String>,
}

impl DavBuilder {
    pub fn new(backend: Backend) -> DavBuilder {
        DavBuilder { backend, dialect: None, hooks: None, ignore_patterns: Vec::new() }
    }

    pub fn dialect(mut self, dialect: Arc<dyn DialectPolicy>) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn WebDavHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub async fn build_memory(self) -> DavHandler<MemoryBackend> {
        let fs = Arc::new(MemoryBackend::new());
        self.build_over(fs, DavState::in_memory()).await
    }

    pub async fn build_disk(self) -> DavHandler<DiskBackend> {
        let root = match &self.backend {
            Backend::Disk { persist_root } => persist_root.clone(),
            Backend::Memory => panic!("DavBuilder::build_disk called with Backend::Memory"),
        };
        let fs = Arc::new(DiskBackend::new(root.clone()));
        let state = DavState::load(&root).await;
        self.build_over(fs, state).await
    }

    async fn build_over<A: PersistenceAdapter + 'static>(
        self,
        fs: Arc<A>,
        state: Arc<DavState>,
    ) -> DavHandler<A> {
        DavHandler {
            fs,
            lock: Arc::new(PathLock::new()),
            dialect: self.dialect.unwrap_or_else(|| Arc::new(CompositeDialect::all_known())),
            hooks: self.hooks.unwrap_or_else(|| Arc::new(NoopHooks)),
            ignore: Arc::new(IgnoreFilter::new(&self.ignore_patterns)),
            orchestrator: None,
            state,
        }
    }
}

/// The webdav handler. `handle` is the single entry point; everything
/// else is internal dispatch.
#[derive(Clone)]
pub struct DavHandler<A: PersistenceAdapter + 'static> {
    pub(crate) fs: Arc<A>,
    pub(crate) lock: Arc<PathLock>,
    pub(crate) dialect: Arc<dyn DialectPolicy>,
    pub(crate) hooks: Arc<dyn WebDavHooks>,
    pub(crate) ignore: Arc<IgnoreFilter>,
    pub(crate) orchestrator: Option<Arc<Orchestrator<A>>>,
    pub(crate) state: Arc<DavState>,
}

impl<A: PersistenceAdapter + 'static> DavHandler<A> {
    /// The backing adapter, so an embedding application can build an
    /// `Orchestrator` over the same store before attaching it.
    pub fn fs(&self) -> Arc<A> {
        self.fs.clone()
    }

    pub fn with_orchestrator(mut self, orchestrator: Arc<Orchestrator<A>>) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    /// Run the bootstrap fabrication (spec.md §4.5) if an orchestrator
    /// is attached. No-op otherwise.
    pub async fn bootstrap(&self) {
        if let Some(orchestrator) = &self.orchestrator {
            orchestrator.bootstrap_if_empty().await;
        }
    }

    pub async fn handle<ReqBody>(&self, req: Request<ReqBody>) -> Response<RespBody>
    where
        ReqBody: HttpBody<Data = Bytes> + Send + 'static,
        ReqBody::Error: StdError + Send + Sync + 'static,
    {
        match self.handle_inner(req).await {
            Ok(resp) => resp,
            Err(err) => error_response(err),
        }
    }

    async fn handle_inner<ReqBody>(&self, req: Request<ReqBody>) -> DavResult<Response<RespBody>>
    where
        ReqBody: HttpBody<Data = Bytes> + Send + 'static,
        ReqBody::Error: StdError + Send + Sync + 'static,
    {
        let user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let depth = req
            .headers()
            .get("depth")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let destination = req
            .headers()
            .get("destination")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let lock_token_header = req
            .headers()
            .get("lock-token")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let method = req.method().clone();
        let path = Path::parse(req.uri().path())?;
        let ctx = RequestCtx { path, user_agent, depth, destination, content_type, lock_token_header };

        let body = req.into_body().collect().await.map_err(|e| DavError::BadRequest(e.to_string()))?.to_bytes();

        // Reads that happen once per request go straight to the backing
        // adapter; PROPFIND/SEARCH build their own `CachedAdapter` after
        // any fabrication has already landed, since the memo would
        // otherwise pin a pre-fabrication NotFound for the rest of the
        // request (spec.md §5's cache is request-scoped, not a
        // write-through one).
        match method.as_str() {
            "OPTIONS" => Ok(options::handle()),
            "HEAD" => get::handle(self, self.fs.as_ref(), &ctx, true).await,
            "GET" => get::handle(self, self.fs.as_ref(), &ctx, false).await,
            "PUT" => put::handle(self, self.fs.as_ref(), &ctx, body).await,
            "DELETE" => delete::handle(self, self.fs.as_ref(), &ctx).await,
            "MKCOL" => mkcol::handle(self, self.fs.as_ref(), &ctx).await,
            "MOVE" => movecopy::handle(self, self.fs.as_ref(), &ctx, movecopy::Op::Move).await,
            "COPY" => movecopy::handle(self, self.fs.as_ref(), &ctx, movecopy::Op::Copy).await,
            "PROPFIND" => propfind::handle(self, &ctx).await,
            "PROPPATCH" => proppatch::handle(self, &ctx, &body).await,
            "ORDERPATCH" => orderpatch::handle(self, &ctx, &body).await,
            "SEARCH" => search::handle(self, &ctx, &body).await,
            "LOCK" => lockverb::handle_lock(self, &ctx).await,
            "UNLOCK" => lockverb::handle_unlock(self, &ctx).await,
            // spec.md §7: unknown verbs fall through to the default
            // handler and receive 404, not 405 (which isn't in §6's
            // status-code set at all).
            _ => Err(DavError::Status(http::StatusCode::NOT_FOUND)),
        }
    }
}

/// Everything a verb handler needs out of the request, already parsed.
pub(crate) struct RequestCtx {
    pub path: Path,
    pub user_agent: Option<String>,
    pub depth: Option<String>,
    pub destination: Option<String>,
    pub content_type: Option<String>,
    pub lock_token_header: Option<String>,
}

pub(crate) fn empty(status: http::StatusCode) -> Response<RespBody> {
    Response::builder().status(status).body(Full::new(Bytes::new())).unwrap()
}

pub(crate) fn bytes_response(status: http::StatusCode, content_type: &str, bytes: Vec<u8>) -> Response<RespBody> {
    Response::builder()
        .status(status)
        .header("content-type", content_type)
        .header("content-length", bytes.len().to_string())
        .body(Full::new(Bytes::from(bytes)))
        .unwrap()
}

fn error_response(err: DavError) -> Response<RespBody> {
    Response::builder()
        .status(err.status())
        .header("content-length", "0")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

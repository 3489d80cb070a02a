//! ## A WebDAV server whose filesystem fabricates itself on first access
//!
//! [`Webdav`] (RFC4918) is defined as HTTP (GET/HEAD/PUT/DELETE) plus a
//! bunch of extension methods (PROPFIND, MKCOL, MOVE, COPY, LOCK/UNLOCK,
//! etc). This crate is a `handler` that maps the WebDAV protocol onto a
//! [`PersistenceAdapter`][fs::PersistenceAdapter] the way the teacher
//! crate maps it onto a real or in-memory filesystem — except here, a
//! miss against that adapter (an empty directory, a file that's never
//! been written) is treated not as 404 but as a cue to ask an LLM to
//! fabricate a plausible answer and persist it, so the tree a client
//! sees grows lazily instead of existing up front.
//!
//! ## Backend interfaces
//!
//! - [`PersistenceAdapter`][fs::PersistenceAdapter]: the single source
//!   of truth for filesystem state, with [`MemoryBackend`][fs::MemoryBackend]
//!   and [`DiskBackend`][fs::DiskBackend] implementations, and a
//!   request-scoped [`CachedAdapter`][fs::CachedAdapter] wrapper.
//! - [`LlmTransport`][llm::LlmTransport]: the streaming model backend
//!   the fabrication orchestrator drives.
//! - [`ImageProvider`][llm::image::ImageProvider]: the opaque
//!   image-generation port fabricated `image/*` entries are routed
//!   through.
//! - [`WebDavHooks`][hooks::WebDavHooks]: request-lifecycle hooks a
//!   caller can use to veto or observe GET/PUT/MKCOL.
//!
//! ## Implemented standards
//!
//! The base [RFC4918] WebDAV methods (GET/HEAD/PUT/DELETE, MKCOL, MOVE,
//! COPY, PROPFIND, PROPPATCH, LOCK/UNLOCK) plus the non-standard SEARCH
//! extension some clients use for `<D:contains>` filename search.
//! LOCK/UNLOCK are implemented to the same "just enough for
//! macOS/Windows" degree as the teacher's `FakeLs`: a token is minted
//! and stored, never actually exclusive.

#[macro_use]
extern crate log;

pub mod config;
pub mod davstate;
pub mod dialect;
pub mod error;
pub mod fs;
pub mod handler;
pub mod hooks;
pub mod ignore;
pub mod llm;
pub mod lock;
pub mod node;
pub mod path;
pub mod server;
pub mod tracker;
pub mod xml;

pub use crate::config::ServerConfig;
pub use crate::error::{DavError, DavResult, FsError, FsResult};
pub use crate::fs::{CachedAdapter, DiskBackend, MemoryBackend, PersistenceAdapter};
pub use crate::handler::{DavBuilder, DavHandler};
pub use crate::hooks::{NoopHooks, WebDavHooks};
pub use crate::llm::{LlmRequest, LlmTransport, Orchestrator, ToolChoice};
pub use crate::node::{Kind, Stat};
pub use crate::path::Path;
pub use crate::server::DavServer;

//! Programmatic server configuration (spec.md §6's CLI surface, minus
//! the argument parsing itself, which is out of scope). Mirrors
//! `oxcrypt-webdav::server::ServerConfig`: a plain struct the embedding
//! binary constructs, rather than this crate owning `clap`/flag parsing.

use std::path::PathBuf;

/// Where fabricated content is persisted, and how the fabrication
/// engine should behave.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// `None` selects the in-memory backend; `Some(dir)` the disk
    /// backend rooted at `dir`.
    pub persist_root: Option<PathBuf>,
    /// Extra ignore-glob patterns, appended to the built-in set.
    pub ignore_patterns: Vec<String>,
    /// Model name passed through to every `LlmRequest`.
    pub model: String,
    /// System instruction prefixed to every fabrication prompt, if any.
    pub instruction: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> ServerConfig {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            persist_root: None,
            ignore_patterns: Vec::new(),
            model: "gpt-4o".to_string(),
            instruction: None,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

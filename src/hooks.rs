//! Lifecycle hook surface (spec.md §4.3), mirroring the shape of the
//! teacher's own handler entry points but exposed as an injectable
//! trait rather than inline code, so embedding applications can audit,
//! veto, or rewrite a request without forking the handler.

use async_trait::async_trait;

use crate::error::DavResult;
use crate::path::Path;

/// Every method is a no-op by default; implementors override only what
/// they care about.
#[async_trait]
pub trait WebDavHooks: Send + Sync {
    /// Called before a GET is served, after the adapter has confirmed
    /// (or fabricated) the file. Returning `Err` aborts the request
    /// with that status.
    async fn before_get(&self, _path: &Path) -> DavResult<()> {
        Ok(())
    }

    /// Called before a PUT's body is written.
    async fn before_put(&self, _path: &Path, _len: usize) -> DavResult<()> {
        Ok(())
    }

    /// Called before a MKCOL creates the directory.
    async fn before_mkcol(&self, _path: &Path) -> DavResult<()> {
        Ok(())
    }

    /// Called after MKCOL has created the directory.
    async fn after_mkcol(&self, _path: &Path) {}
}

/// The hook set installed when an application hasn't configured one.
pub struct NoopHooks;

#[async_trait]
impl WebDavHooks for NoopHooks {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_hooks_never_reject() {
        let hooks = NoopHooks;
        let path = Path::parse("/a").unwrap();
        assert!(hooks.before_get(&path).await.is_ok());
        assert!(hooks.before_put(&path, 10).await.is_ok());
        assert!(hooks.before_mkcol(&path).await.is_ok());
        hooks.after_mkcol(&path).await;
    }
}

//! Request-scoped memoizing wrapper over a `PersistenceAdapter`
//! (spec.md §5's "DataLoader"): a single incoming request can probe the
//! same path several times (PROPFIND's own stat, a conditional-header
//! check, a hook), and none of those repeats should re-enter the
//! fabrication path. One `CachedAdapter` is built fresh per request and
//! dropped at the end of it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::FsResult;
use crate::node::Stat;
use crate::path::Path;

use super::{PersistenceAdapter, RemoveOptions};

#[derive(Default)]
struct Memo {
    stat: HashMap<Path, FsResult<Stat>>,
    readdir: HashMap<Path, FsResult<Vec<String>>>,
    exists: HashMap<Path, bool>,
}

pub struct CachedAdapter<A: PersistenceAdapter> {
    inner: Arc<A>,
    memo: Mutex<Memo>,
}

impl<A: PersistenceAdapter> CachedAdapter<A> {
    pub fn new(inner: Arc<A>) -> CachedAdapter<A> {
        CachedAdapter {
            inner,
            memo: Mutex::new(Memo::default()),
        }
    }

    /// Drop every cached entry touching `path`, since a write just
    /// invalidated it. Directory writes also invalidate the parent's
    /// `readdir`/`stat` entries.
    async fn invalidate(&self, path: &Path) {
        let mut memo = self.memo.lock().await;
        memo.stat.remove(path);
        memo.readdir.remove(path);
        memo.exists.remove(path);
        let parent = path.parent();
        memo.stat.remove(&parent);
        memo.readdir.remove(&parent);
        memo.exists.remove(&parent);
    }
}

#[async_trait]
impl<A: PersistenceAdapter> PersistenceAdapter for CachedAdapter<A> {
    async fn ensure_dir(&self, path: &Path) -> FsResult<()> {
        let r = self.inner.ensure_dir(path).await;
        self.invalidate(path).await;
        r
    }

    async fn readdir(&self, path: &Path) -> FsResult<Vec<String>> {
        if let Some(hit) = self.memo.lock().await.readdir.get(path) {
            return hit.clone();
        }
        let r = self.inner.readdir(path).await;
        self.memo.lock().await.readdir.insert(path.clone(), r.clone());
        r
    }

    async fn stat(&self, path: &Path) -> FsResult<Stat> {
        if let Some(hit) = self.memo.lock().await.stat.get(path) {
            return hit.clone();
        }
        let r = self.inner.stat(path).await;
        self.memo.lock().await.stat.insert(path.clone(), r.clone());
        r
    }

    async fn exists(&self, path: &Path) -> bool {
        if let Some(hit) = self.memo.lock().await.exists.get(path) {
            return *hit;
        }
        let r = self.inner.exists(path).await;
        self.memo.lock().await.exists.insert(path.clone(), r);
        r
    }

    async fn read_file(&self, path: &Path) -> FsResult<Vec<u8>> {
        // Not memoized: a single request never re-reads the same body twice,
        // and whole-file buffers are too large to cache for free.
        self.inner.read_file(path).await
    }

    async fn write_file(&self, path: &Path, bytes: Vec<u8>, mime: Option<String>) -> FsResult<()> {
        let r = self.inner.write_file(path, bytes, mime).await;
        self.invalidate(path).await;
        r
    }

    async fn remove(&self, path: &Path, opts: RemoveOptions) -> FsResult<()> {
        let r = self.inner.remove(path, opts).await;
        self.invalidate(path).await;
        r
    }

    async fn mv(&self, from: &Path, to: &Path) -> FsResult<()> {
        let r = self.inner.mv(from, to).await;
        self.invalidate(from).await;
        self.invalidate(to).await;
        r
    }

    async fn copy(&self, from: &Path, to: &Path) -> FsResult<()> {
        let r = self.inner.copy(from, to).await;
        self.invalidate(to).await;
        r
    }

    async fn set_order(&self, path: &Path, order: Vec<String>) -> FsResult<()> {
        let r = self.inner.set_order(path, order).await;
        self.invalidate(path).await;
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBackend {
        inner: MemoryBackend,
        stat_calls: AtomicUsize,
    }

    #[async_trait]
    impl PersistenceAdapter for CountingBackend {
        async fn ensure_dir(&self, path: &Path) -> FsResult<()> {
            self.inner.ensure_dir(path).await
        }
        async fn readdir(&self, path: &Path) -> FsResult<Vec<String>> {
            self.inner.readdir(path).await
        }
        async fn stat(&self, path: &Path) -> FsResult<Stat> {
            self.stat_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.stat(path).await
        }
        async fn exists(&self, path: &Path) -> bool {
            self.inner.exists(path).await
        }
        async fn read_file(&self, path: &Path) -> FsResult<Vec<u8>> {
            self.inner.read_file(path).await
        }
        async fn write_file(&self, path: &Path, bytes: Vec<u8>, mime: Option<String>) -> FsResult<()> {
            self.inner.write_file(path, bytes, mime).await
        }
        async fn remove(&self, path: &Path, opts: RemoveOptions) -> FsResult<()> {
            self.inner.remove(path, opts).await
        }
        async fn mv(&self, from: &Path, to: &Path) -> FsResult<()> {
            self.inner.mv(from, to).await
        }
        async fn copy(&self, from: &Path, to: &Path) -> FsResult<()> {
            self.inner.copy(from, to).await
        }
    }

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[tokio::test]
    async fn stat_is_memoized_within_one_adapter() {
        let backend = Arc::new(CountingBackend {
            inner: MemoryBackend::new(),
            stat_calls: AtomicUsize::new(0),
        });
        backend.inner.write_file(&p("/a"), b"x".to_vec(), None).await.unwrap();
        let cached = CachedAdapter::new(backend.clone());
        cached.stat(&p("/a")).await.unwrap();
        cached.stat(&p("/a")).await.unwrap();
        assert_eq!(backend.stat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn write_invalidates_cached_stat() {
        let backend = Arc::new(MemoryBackend::new());
        let cached = CachedAdapter::new(backend);
        cached.write_file(&p("/a"), b"x".to_vec(), None).await.unwrap();
        assert_eq!(cached.stat(&p("/a")).await.unwrap().size, Some(1));
        cached.write_file(&p("/a"), b"xyz".to_vec(), None).await.unwrap();
        assert_eq!(cached.stat(&p("/a")).await.unwrap().size, Some(3));
    }
}

//! The `dav-state` sidecar (spec.md §9 open question): a per-path
//! property map for ORDERPATCH/PROPPATCH/lock tokens, layered
//! alongside the `PersistenceAdapter` rather than inside it, since
//! neither backend's data model has room for this (spec.md §9: "a
//! per-path property map persisted separately").

use std::collections::HashMap;
use std::path::{Path as StdPath, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;

use crate::path::Path;

/// Everything attached to one URL path outside the file tree itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathState {
    /// Explicit child order applied during PROPFIND (ORDERPATCH).
    pub order: Option<Vec<String>>,
    /// Dead properties set via PROPPATCH.
    pub props: HashMap<String, String>,
    /// The token minted by LOCK, cleared by UNLOCK.
    pub lock_token: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    paths: HashMap<String, PathState>,
}

/// Holds the sidecar in memory, optionally persisting it as JSON next
/// to a disk backend's `persist_root`. Kept entirely in memory when
/// `file` is `None` (the memory-backend case).
pub struct DavState {
    file: Option<PathBuf>,
    inner: RwLock<StateFile>,
}

impl DavState {
    pub fn in_memory() -> Arc<DavState> {
        Arc::new(DavState { file: None, inner: RwLock::new(StateFile::default()) })
    }

    /// Load `persist_root/.dav-state.json` if present, else start empty.
    pub async fn load(persist_root: &StdPath) -> Arc<DavState> {
        let file = persist_root.join(".dav-state.json");
        let inner = match fs::read(&file).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => StateFile::default(),
        };
        Arc::new(DavState { file: Some(file), inner: RwLock::new(inner) })
    }

    async fn persist(&self, guard: &StateFile) {
        if let Some(file) = &self.file {
            if let Ok(bytes) = serde_json::to_vec_pretty(guard) {
                let _ = fs::write(file, bytes).await;
            }
        }
    }

    pub async fn get(&self, path: &Path) -> PathState {
        self.inner.read().await.paths.get(&path.display_path()).cloned().unwrap_or_default()
    }

    pub async fn set_order(&self, path: &Path, order: Vec<String>) {
        let mut guard = self.inner.write().await;
        guard.paths.entry(path.display_path()).or_default().order = Some(order);
        self.persist(&guard).await;
    }

    pub async fn set_prop(&self, path: &Path, name: String, value: String) {
        let mut guard = self.inner.write().await;
        guard.paths.entry(path.display_path()).or_default().props.insert(name, value);
        self.persist(&guard).await;
    }

    pub async fn remove_prop(&self, path: &Path, name: &str) {
        let mut guard = self.inner.write().await;
        if let Some(state) = guard.paths.get_mut(&path.display_path()) {
            state.props.remove(name);
        }
        self.persist(&guard).await;
    }

    pub async fn set_lock_token(&self, path: &Path, token: Option<String>) {
        let mut guard = self.inner.write().await;
        guard.paths.entry(path.display_path()).or_default().lock_token = token;
        self.persist(&guard).await;
    }

    /// Drop all state recorded for `path` (used on DELETE/MOVE source).
    pub async fn forget(&self, path: &Path) {
        let mut guard = self.inner.write().await;
        guard.paths.remove(&path.display_path());
        self.persist(&guard).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn order_round_trips_in_memory() {
        let state = DavState::in_memory();
        let path = Path::root().child("docs");
        state.set_order(&path, vec!["b".into(), "a".into()]).await;
        assert_eq!(state.get(&path).await.order, Some(vec!["b".into(), "a".into()]));
    }

    #[tokio::test]
    async fn props_set_and_removed() {
        let state = DavState::in_memory();
        let path = Path::root().child("f.txt");
        state.set_prop(&path, "author".into(), "me".into()).await;
        assert_eq!(state.get(&path).await.props.get("author"), Some(&"me".to_string()));
        state.remove_prop(&path, "author").await;
        assert!(state.get(&path).await.props.get("author").is_none());
    }

    #[tokio::test]
    async fn lock_token_lifecycle() {
        let state = DavState::in_memory();
        let path = Path::root().child("f.txt");
        state.set_lock_token(&path, Some("opaquelocktoken:abc".into())).await;
        assert!(state.get(&path).await.lock_token.is_some());
        state.set_lock_token(&path, None).await;
        assert!(state.get(&path).await.lock_token.is_none());
    }

    #[tokio::test]
    async fn persists_to_disk_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let state = DavState::load(dir.path()).await;
        let path = Path::root().child("a");
        state.set_order(&path, vec!["x".into()]).await;

        let reloaded = DavState::load(dir.path()).await;
        assert_eq!(reloaded.get(&path).await.order, Some(vec!["x".into()]));
    }
}

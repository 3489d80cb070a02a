//! In-memory backend: the fabricated tree lives entirely in process
//! memory behind a single `RwLock`, per spec.md §5 ("shared mutable
//! state confined to the persistence adapter").

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{FsError, FsResult};
use crate::node::{Node, Stat};
use crate::path::Path;

use super::{PersistenceAdapter, RemoveOptions};

/// Ephemeral in-memory filesystem, analogous in spirit to the
/// teacher's `memfs` feature but holding whole-file buffers rather than
/// a stream-backed file abstraction.
pub struct MemoryBackend {
    root: RwLock<Node>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> MemoryBackend {
        MemoryBackend {
            root: RwLock::new(Node::new_root()),
        }
    }

    /// Walk to the node at `path`, if any.
    fn lookup<'a>(root: &'a Node, path: &Path) -> Option<&'a Node> {
        let mut cur = root;
        for seg in path.segments() {
            cur = cur.children()?.get(seg)?;
        }
        Some(cur)
    }

    fn lookup_mut<'a>(root: &'a mut Node, path: &Path) -> Option<&'a mut Node> {
        let mut cur = root;
        for seg in path.segments() {
            let (children, _) = cur.children_mut()?;
            cur = children.get_mut(seg)?;
        }
        Some(cur)
    }

    /// Walk to the parent, creating missing ancestor directories along
    /// the way (spec.md §4.1: "silently creates the missing
    /// ancestors").
    fn ensure_parent_mut<'a>(root: &'a mut Node, path: &Path) -> FsResult<&'a mut Node> {
        let mut cur = root;
        let segs = path.segments();
        for seg in &segs[..segs.len().saturating_sub(1)] {
            if cur.children().map(|c| !c.contains_key(seg)).unwrap_or(true) {
                if !cur.is_dir() {
                    return Err(FsError::NotADirectory);
                }
                cur.insert_child(Node::new_dir(seg.clone()));
            }
            let (children, _) = cur.children_mut().ok_or(FsError::NotADirectory)?;
            cur = children.get_mut(seg).unwrap();
            if !cur.is_dir() {
                return Err(FsError::NotADirectory);
            }
        }
        Ok(cur)
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryBackend {
    async fn ensure_dir(&self, path: &Path) -> FsResult<()> {
        if path.is_root() {
            return Ok(());
        }
        let mut root = self.root.write().await;
        let parent = Self::ensure_parent_mut(&mut root, path)?;
        let name = path.name().unwrap();
        match parent.children().and_then(|c| c.get(name)) {
            Some(existing) if existing.is_dir() => Ok(()),
            Some(_) => Err(FsError::NotADirectory),
            None => {
                parent.insert_child(Node::new_dir(name));
                Ok(())
            }
        }
    }

    async fn readdir(&self, path: &Path) -> FsResult<Vec<String>> {
        let root = self.root.read().await;
        let node = Self::lookup(&root, path).ok_or(FsError::NotFound)?;
        if !node.is_dir() {
            return Err(FsError::NotADirectory);
        }
        Ok(node.child_names().to_vec())
    }

    async fn stat(&self, path: &Path) -> FsResult<Stat> {
        let root = self.root.read().await;
        let node = Self::lookup(&root, path).ok_or(FsError::NotFound)?;
        Ok(node.stat())
    }

    async fn exists(&self, path: &Path) -> bool {
        let root = self.root.read().await;
        Self::lookup(&root, path).is_some()
    }

    async fn read_file(&self, path: &Path) -> FsResult<Vec<u8>> {
        let root = self.root.read().await;
        match Self::lookup(&root, path) {
            Some(Node::File { bytes, .. }) => Ok(bytes.clone()),
            Some(Node::Directory { .. }) => Err(FsError::IsADirectory),
            None => Err(FsError::NotFound),
        }
    }

    async fn write_file(&self, path: &Path, bytes: Vec<u8>, mime: Option<String>) -> FsResult<()> {
        if path.is_root() {
            return Err(FsError::IsADirectory);
        }
        let mut root = self.root.write().await;
        let parent = Self::ensure_parent_mut(&mut root, path)?;
        let name = path.name().unwrap();
        if let Some(existing) = parent.children().and_then(|c| c.get(name)) {
            if existing.is_dir() {
                return Err(FsError::IsADirectory);
            }
        }
        parent.insert_child(Node::new_file(name, bytes, mime));
        Ok(())
    }

    async fn remove(&self, path: &Path, opts: RemoveOptions) -> FsResult<()> {
        if path.is_root() {
            return Err(FsError::PermissionDenied);
        }
        let mut root = self.root.write().await;
        let parent = Self::lookup_mut(&mut root, &path.parent()).ok_or(FsError::NotFound)?;
        let name = path.name().unwrap();
        let target = parent
            .children()
            .and_then(|c| c.get(name))
            .ok_or(FsError::NotFound)?;
        if target.is_dir() && !target.child_names().is_empty() && !opts.recursive {
            return Err(FsError::NotEmpty);
        }
        parent.remove_child(name);
        Ok(())
    }

    async fn mv(&self, from: &Path, to: &Path) -> FsResult<()> {
        if from.is_root() {
            return Err(FsError::PermissionDenied);
        }
        let mut root = self.root.write().await;
        {
            let src_parent = Self::lookup(&root, &from.parent()).ok_or(FsError::NotFound)?;
            src_parent
                .children()
                .and_then(|c| c.get(from.name().unwrap()))
                .ok_or(FsError::NotFound)?;
        }
        let dst_parent = Self::ensure_parent_mut(&mut root, to)?;
        if dst_parent
            .children()
            .map(|c| c.contains_key(to.name().unwrap()))
            .unwrap_or(false)
        {
            dst_parent.remove_child(to.name().unwrap());
        }
        let src_parent = Self::lookup_mut(&mut root, &from.parent()).ok_or(FsError::NotFound)?;
        let mut moved = src_parent
            .remove_child(from.name().unwrap())
            .ok_or(FsError::NotFound)?;
        moved.set_name(to.name().unwrap());
        let dst_parent = Self::lookup_mut(&mut root, &to.parent()).ok_or(FsError::NotFound)?;
        dst_parent.insert_child(moved);
        Ok(())
    }

    async fn copy(&self, from: &Path, to: &Path) -> FsResult<()> {
        let mut root = self.root.write().await;
        let source = {
            let src_parent = Self::lookup(&root, &from.parent()).ok_or(FsError::NotFound)?;
            src_parent
                .children()
                .and_then(|c| c.get(from.name().unwrap()))
                .cloned()
                .ok_or(FsError::NotFound)?
        };
        let cloned = source.deep_clone_as(to.name().unwrap());
        let dst_parent = Self::ensure_parent_mut(&mut root, to)?;
        dst_parent.insert_child(cloned);
        Ok(())
    }

    async fn set_order(&self, path: &Path, order: Vec<String>) -> FsResult<()> {
        let mut root = self.root.write().await;
        let node = Self::lookup_mut(&mut root, path).ok_or(FsError::NotFound)?;
        if !node.is_dir() {
            return Err(FsError::NotADirectory);
        }
        node.apply_order(&order);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[tokio::test]
    async fn ensure_dir_is_idempotent() {
        let fs = MemoryBackend::new();
        fs.ensure_dir(&p("/a/b")).await.unwrap();
        fs.ensure_dir(&p("/a/b")).await.unwrap();
        assert!(fs.exists(&p("/a/b")).await);
        assert_eq!(fs.stat(&p("/a/b")).await.unwrap().kind, crate::node::Kind::Directory);
    }

    #[tokio::test]
    async fn write_file_creates_missing_ancestors() {
        let fs = MemoryBackend::new();
        fs.write_file(&p("/x/y/z.txt"), b"hi".to_vec(), None)
            .await
            .unwrap();
        assert!(fs.exists(&p("/x/y")).await);
        assert_eq!(fs.read_file(&p("/x/y/z.txt")).await.unwrap(), b"hi");
    }

    #[tokio::test]
    async fn write_file_is_last_writer_wins() {
        let fs = MemoryBackend::new();
        fs.write_file(&p("/f"), b"one".to_vec(), None).await.unwrap();
        fs.write_file(&p("/f"), b"two".to_vec(), None).await.unwrap();
        let bytes = fs.read_file(&p("/f")).await.unwrap();
        assert_eq!(bytes, b"two");
        assert_eq!(fs.stat(&p("/f")).await.unwrap().size, Some(3));
    }

    #[tokio::test]
    async fn move_round_trip() {
        let fs = MemoryBackend::new();
        fs.write_file(&p("/a"), b"x".to_vec(), None).await.unwrap();
        fs.mv(&p("/a"), &p("/b/c")).await.unwrap();
        assert_eq!(fs.read_file(&p("/b/c")).await.unwrap(), b"x");
        assert!(!fs.exists(&p("/a")).await);
    }

    #[tokio::test]
    async fn copy_round_trip_keeps_source() {
        let fs = MemoryBackend::new();
        fs.write_file(&p("/a"), b"x".to_vec(), None).await.unwrap();
        fs.copy(&p("/a"), &p("/b")).await.unwrap();
        assert_eq!(fs.read_file(&p("/b")).await.unwrap(), b"x");
        assert!(fs.exists(&p("/a")).await);
    }

    #[tokio::test]
    async fn copy_directory_deep_clones() {
        let fs = MemoryBackend::new();
        fs.write_file(&p("/dir/a.txt"), b"1".to_vec(), None).await.unwrap();
        fs.copy(&p("/dir"), &p("/dir2")).await.unwrap();
        assert_eq!(fs.read_file(&p("/dir2/a.txt")).await.unwrap(), b"1");
        assert_eq!(fs.read_file(&p("/dir/a.txt")).await.unwrap(), b"1");
    }

    #[tokio::test]
    async fn remove_non_empty_dir_requires_recursive() {
        let fs = MemoryBackend::new();
        fs.write_file(&p("/dir/a.txt"), b"1".to_vec(), None).await.unwrap();
        assert_eq!(
            fs.remove(&p("/dir"), RemoveOptions::default()).await,
            Err(FsError::NotEmpty)
        );
        fs.remove(&p("/dir"), RemoveOptions { recursive: true })
            .await
            .unwrap();
        assert!(!fs.exists(&p("/dir")).await);
    }

    #[tokio::test]
    async fn read_file_on_directory_is_is_a_directory() {
        let fs = MemoryBackend::new();
        fs.ensure_dir(&p("/dir")).await.unwrap();
        assert_eq!(fs.read_file(&p("/dir")).await, Err(FsError::IsADirectory));
    }
}

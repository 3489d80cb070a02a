//! Disk-backed adapter: maps paths under a configured `persist_root`
//! onto the host filesystem.
//!
//! Thin wrapper over `tokio::fs`, in the same style as the teacher's
//! `LocalFs` (`src/fs/localfs.rs`): every operation is a short async
//! block, `trace!`-logged at entry, ending in an explicit `FsError`
//! conversion.

use std::path::{Path as StdPath, PathBuf};

use async_trait::async_trait;
use log::trace;
use tokio::fs;

use crate::error::{FsError, FsResult};
use crate::node::{Kind, Stat};
use crate::path::Path;

use super::{PersistenceAdapter, RemoveOptions};

pub struct DiskBackend {
    persist_root: PathBuf,
}

impl DiskBackend {
    pub fn new(persist_root: impl Into<PathBuf>) -> DiskBackend {
        DiskBackend {
            persist_root: persist_root.into(),
        }
    }

    fn abs(&self, path: &Path) -> PathBuf {
        let mut p = self.persist_root.clone();
        for seg in path.segments() {
            p.push(seg);
        }
        p
    }

    async fn ensure_parent_dir(abs_path: &StdPath) -> FsResult<()> {
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceAdapter for DiskBackend {
    async fn ensure_dir(&self, path: &Path) -> FsResult<()> {
        trace!("disk: ensure_dir {path}");
        let abs = self.abs(path);
        match fs::create_dir_all(&abs).await {
            Ok(()) => Ok(()),
            Err(e) if abs.is_dir() => {
                let _ = e;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn readdir(&self, path: &Path) -> FsResult<Vec<String>> {
        trace!("disk: readdir {path}");
        let abs = self.abs(path);
        let meta = fs::metadata(&abs).await?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory);
        }
        let mut out = Vec::new();
        let mut rd = fs::read_dir(&abs).await?;
        while let Some(entry) = rd.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                out.push(name.to_string());
            }
        }
        out.sort();
        Ok(out)
    }

    async fn stat(&self, path: &Path) -> FsResult<Stat> {
        let abs = self.abs(path);
        let meta = fs::metadata(&abs).await?;
        Ok(Stat {
            kind: if meta.is_dir() { Kind::Directory } else { Kind::File },
            size: if meta.is_dir() { None } else { Some(meta.len()) },
            mtime: meta.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH),
        })
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::metadata(self.abs(path)).await.is_ok()
    }

    async fn read_file(&self, path: &Path) -> FsResult<Vec<u8>> {
        trace!("disk: read_file {path}");
        let abs = self.abs(path);
        if abs.is_dir() {
            return Err(FsError::IsADirectory);
        }
        Ok(fs::read(&abs).await?)
    }

    async fn write_file(&self, path: &Path, bytes: Vec<u8>, _mime: Option<String>) -> FsResult<()> {
        trace!("disk: write_file {path} ({} bytes)", bytes.len());
        let abs = self.abs(path);
        if abs.is_dir() {
            return Err(FsError::IsADirectory);
        }
        Self::ensure_parent_dir(&abs).await?;
        fs::write(&abs, bytes).await?;
        Ok(())
    }

    async fn remove(&self, path: &Path, opts: RemoveOptions) -> FsResult<()> {
        trace!("disk: remove {path} recursive={}", opts.recursive);
        let abs = self.abs(path);
        let meta = fs::metadata(&abs).await?;
        if meta.is_dir() {
            if opts.recursive {
                fs::remove_dir_all(&abs).await?;
            } else {
                fs::remove_dir(&abs).await.map_err(|e| {
                    if e.raw_os_error() == Some(libc_enotempty()) {
                        FsError::NotEmpty
                    } else {
                        e.into()
                    }
                })?;
            }
        } else {
            fs::remove_file(&abs).await?;
        }
        Ok(())
    }

    async fn mv(&self, from: &Path, to: &Path) -> FsResult<()> {
        trace!("disk: mv {from} -> {to}");
        let abs_from = self.abs(from);
        let abs_to = self.abs(to);
        Self::ensure_parent_dir(&abs_to).await?;
        if abs_to.is_dir() {
            fs::remove_dir_all(&abs_to).await.ok();
        }
        fs::rename(&abs_from, &abs_to).await?;
        Ok(())
    }

    async fn copy(&self, from: &Path, to: &Path) -> FsResult<()> {
        trace!("disk: copy {from} -> {to}");
        let abs_from = self.abs(from);
        let abs_to = self.abs(to);
        Self::ensure_parent_dir(&abs_to).await?;
        if abs_from.is_dir() {
            copy_dir_recursive(&abs_from, &abs_to).await
        } else {
            fs::copy(&abs_from, &abs_to).await?;
            Ok(())
        }
    }
}

// `tokio::fs` exposes no stable directory-copy helper; walk it by hand,
// the same recursive pattern the teacher uses for directory deletes.
fn copy_dir_recursive<'a>(
    from: &'a StdPath,
    to: &'a StdPath,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = FsResult<()>> + Send + 'a>> {
    Box::pin(async move {
        fs::create_dir_all(to).await?;
        let mut rd = fs::read_dir(from).await?;
        while let Some(entry) = rd.next_entry().await? {
            let from_child = entry.path();
            let to_child = to.join(entry.file_name());
            let meta = entry.metadata().await?;
            if meta.is_dir() {
                copy_dir_recursive(&from_child, &to_child).await?;
            } else {
                fs::copy(&from_child, &to_child).await?;
            }
        }
        Ok(())
    })
}

#[cfg(unix)]
fn libc_enotempty() -> i32 {
    39
}

#[cfg(not(unix))]
fn libc_enotempty() -> i32 {
    -1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let fs = DiskBackend::new(dir.path());
        fs.write_file(&p("/a/b.txt"), b"hello".to_vec(), None)
            .await
            .unwrap();
        assert_eq!(fs.read_file(&p("/a/b.txt")).await.unwrap(), b"hello");
        assert_eq!(fs.stat(&p("/a/b.txt")).await.unwrap().size, Some(5));
    }

    #[tokio::test]
    async fn ensure_dir_then_readdir() {
        let dir = tempfile::tempdir().unwrap();
        let fs = DiskBackend::new(dir.path());
        fs.ensure_dir(&p("/x")).await.unwrap();
        fs.write_file(&p("/x/one.txt"), b"1".to_vec(), None).await.unwrap();
        let names = fs.readdir(&p("/x")).await.unwrap();
        assert_eq!(names, vec!["one.txt".to_string()]);
    }

    #[tokio::test]
    async fn move_and_copy_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let fs = DiskBackend::new(dir.path());
        fs.write_file(&p("/a"), b"x".to_vec(), None).await.unwrap();
        fs.copy(&p("/a"), &p("/b")).await.unwrap();
        assert!(fs.exists(&p("/a")).await);
        assert_eq!(fs.read_file(&p("/b")).await.unwrap(), b"x");
        fs.mv(&p("/a"), &p("/c")).await.unwrap();
        assert!(!fs.exists(&p("/a")).await);
        assert_eq!(fs.read_file(&p("/c")).await.unwrap(), b"x");
    }
}

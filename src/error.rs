//! Error kinds and the single HTTP status mapping function.
//!
//! Mirrors the teacher's `errors::DavError`/`fs::FsError` split (see
//! `other_examples/12bcf1c6_messense-dav-server-rs__src-fs.rs.rs` for
//! the upstream shape this descends from), expressed with `thiserror`
//! the way `oxcrypt-webdav::error::WebDavError` does.

use http::StatusCode;
use thiserror::Error;

/// Errors a `PersistenceAdapter` can return. Kept to exactly the
/// vocabulary spec.md §7 names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("not found")]
    NotFound,
    #[error("not a directory")]
    NotADirectory,
    #[error("is a directory")]
    IsADirectory,
    #[error("directory not empty")]
    NotEmpty,
    #[error("permission denied")]
    PermissionDenied,
    #[error("already exists")]
    AlreadyExists,
    #[error("internal error")]
    Internal,
}

impl FsError {
    pub fn status(self) -> StatusCode {
        match self {
            FsError::NotFound => StatusCode::NOT_FOUND,
            FsError::NotADirectory | FsError::IsADirectory | FsError::NotEmpty => {
                StatusCode::CONFLICT
            }
            FsError::PermissionDenied => StatusCode::FORBIDDEN,
            FsError::AlreadyExists => StatusCode::PRECONDITION_FAILED,
            FsError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for FsError {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::NotFound => FsError::NotFound,
            ErrorKind::PermissionDenied => FsError::PermissionDenied,
            ErrorKind::AlreadyExists => FsError::AlreadyExists,
            _ => {
                // Some not-a-directory/directory-not-empty kinds are still
                // unstable across platforms, so fall back to string sniffing
                // the way the teacher's in-memory backend is explicitly
                // allowed to (spec.md §4.1: "string-message heuristics are
                // acceptable for the in-memory backend").
                let msg = e.to_string();
                if msg.contains("Not a directory") {
                    FsError::NotADirectory
                } else if msg.contains("Is a directory") {
                    FsError::IsADirectory
                } else if msg.contains("not empty") || msg.contains("Directory not empty") {
                    FsError::NotEmpty
                } else {
                    FsError::Internal
                }
            }
        }
    }
}

pub type FsResult<T> = Result<T, FsError>;

/// Top-level error the protocol engine maps to an HTTP response.
#[derive(Debug, Error)]
pub enum DavError {
    #[error("filesystem error: {0}")]
    Fs(#[from] FsError),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("status {0}")]
    Status(StatusCode),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DavError {
    pub fn status(&self) -> StatusCode {
        match self {
            DavError::Fs(e) => e.status(),
            DavError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DavError::Status(s) => *s,
            DavError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StatusCode> for DavError {
    fn from(s: StatusCode) -> Self {
        DavError::Status(s)
    }
}

pub type DavResult<T> = Result<T, DavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_error_status_mapping() {
        assert_eq!(FsError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(FsError::NotEmpty.status(), StatusCode::CONFLICT);
        assert_eq!(FsError::PermissionDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(FsError::AlreadyExists.status(), StatusCode::PRECONDITION_FAILED);
        assert_eq!(FsError::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn io_error_not_found_maps_through() {
        let e: FsError = std::io::Error::new(std::io::ErrorKind::NotFound, "x").into();
        assert_eq!(e, FsError::NotFound);
    }
}

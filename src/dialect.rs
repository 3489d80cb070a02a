//! Client-dialect compatibility policy (spec.md §4.3.5).
//!
//! Real WebDAV clients diverge from RFC 4918 in small, well-known ways.
//! Rather than special-case each client inline in the handlers, the
//! engine asks an injectable `DialectPolicy` whether to relax a given
//! RFC check, the same separation-of-concerns the teacher keeps between
//! `DavHandler` dispatch and its `LockSystem`/`DavFileSystem` ports.

/// Context passed to a dialect decision: whatever it needs to decide,
/// nothing more.
pub struct DialectCtx<'a> {
    pub user_agent: Option<&'a str>,
}

/// An injectable decision object that may relax an RFC requirement for
/// clients known to violate it in practice.
pub trait DialectPolicy: Send + Sync {
    /// `default_check` is whether the RFC 4918 requirement (Depth
    /// present and a recognized value) is already satisfied; a dialect
    /// may return `true` even when it isn't, to accept a client that
    /// habitually omits `Depth` on directory MOVE/COPY.
    fn ensure_depth_ok_for_dir_ops(&self, ctx: &DialectCtx, default_check: bool) -> bool {
        default_check
    }

    /// Same shape, for PROPPATCH's missing `Lock-Token` header.
    fn ensure_lock_ok_for_proppatch(&self, ctx: &DialectCtx, default_check: bool) -> bool {
        default_check
    }
}

fn ua_contains(ctx: &DialectCtx, needle: &str) -> bool {
    ctx.user_agent
        .map(|ua| ua.to_ascii_lowercase().contains(&needle.to_ascii_lowercase()))
        .unwrap_or(false)
}

/// Strict RFC 4918 behavior: never relaxes anything. The default when
/// no dialect is configured.
pub struct StrictDialect;

impl DialectPolicy for StrictDialect {}

/// macOS Finder / `WebDAVFS` / `CFNetwork` clients routinely omit
/// `Depth` on directory MOVE.
pub struct FinderDialect;

impl DialectPolicy for FinderDialect {
    fn ensure_depth_ok_for_dir_ops(&self, ctx: &DialectCtx, default_check: bool) -> bool {
        default_check
            || ua_contains(ctx, "webdavfs")
            || ua_contains(ctx, "cfnetwork")
            || ua_contains(ctx, "darwin")
    }
}

/// Windows' built-in WebDAV mini-redirector.
pub struct MiniRedirDialect;

impl DialectPolicy for MiniRedirDialect {
    fn ensure_depth_ok_for_dir_ops(&self, ctx: &DialectCtx, default_check: bool) -> bool {
        default_check || ua_contains(ctx, "microsoft-webdav-miniredir") || ua_contains(ctx, "davclnt")
    }
}

/// Linux desktop WebDAV clients (GNOME's `gvfs`/`gio`, `cadaver`,
/// `davfs2`).
pub struct GvfsDialect;

impl DialectPolicy for GvfsDialect {
    fn ensure_depth_ok_for_dir_ops(&self, ctx: &DialectCtx, default_check: bool) -> bool {
        default_check
            || ua_contains(ctx, "gvfs")
            || ua_contains(ctx, "gio")
            || ua_contains(ctx, "cadaver")
            || ua_contains(ctx, "davfs2")
    }
}

/// Microsoft Office issues PROPPATCH without a `Lock-Token` header even
/// after successfully LOCKing, so that check alone is relaxed for it.
pub struct OfficeDialect;

impl DialectPolicy for OfficeDialect {
    fn ensure_lock_ok_for_proppatch(&self, ctx: &DialectCtx, default_check: bool) -> bool {
        default_check || ua_contains(ctx, "microsoft office")
    }
}

/// Composes any number of dialects by OR: relaxed if any member relaxes.
pub struct CompositeDialect {
    members: Vec<Box<dyn DialectPolicy>>,
}

impl CompositeDialect {
    pub fn new(members: Vec<Box<dyn DialectPolicy>>) -> CompositeDialect {
        CompositeDialect { members }
    }

    /// The four built-in dialects plus strict fallback, composed by OR
    /// — the default dialect set spec.md §4.3.5 names.
    pub fn all_known() -> CompositeDialect {
        CompositeDialect::new(vec![
            Box::new(FinderDialect),
            Box::new(MiniRedirDialect),
            Box::new(GvfsDialect),
            Box::new(OfficeDialect),
        ])
    }
}

impl DialectPolicy for CompositeDialect {
    fn ensure_depth_ok_for_dir_ops(&self, ctx: &DialectCtx, default_check: bool) -> bool {
        default_check
            || self
                .members
                .iter()
                .any(|m| m.ensure_depth_ok_for_dir_ops(ctx, false))
    }

    fn ensure_lock_ok_for_proppatch(&self, ctx: &DialectCtx, default_check: bool) -> bool {
        default_check
            || self
                .members
                .iter()
                .any(|m| m.ensure_lock_ok_for_proppatch(ctx, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_never_relaxes() {
        let ctx = DialectCtx {
            user_agent: Some("WebDAVFS/3.0 (Darwin) CFNetwork"),
        };
        assert!(!StrictDialect.ensure_depth_ok_for_dir_ops(&ctx, false));
    }

    #[test]
    fn finder_relaxes_depth_for_cfnetwork() {
        let ctx = DialectCtx {
            user_agent: Some("WebDAVFS/3.0 (Darwin) CFNetwork"),
        };
        assert!(FinderDialect.ensure_depth_ok_for_dir_ops(&ctx, false));
    }

    #[test]
    fn curl_is_not_relaxed_by_finder() {
        let ctx = DialectCtx {
            user_agent: Some("curl/8.0"),
        };
        assert!(!FinderDialect.ensure_depth_ok_for_dir_ops(&ctx, false));
    }

    #[test]
    fn composite_relaxes_if_any_member_does() {
        let composite = CompositeDialect::all_known();
        let ctx = DialectCtx {
            user_agent: Some("Microsoft-WebDAV-MiniRedir/10.0"),
        };
        assert!(composite.ensure_depth_ok_for_dir_ops(&ctx, false));

        let ctx_curl = DialectCtx {
            user_agent: Some("curl/8.0"),
        };
        assert!(!composite.ensure_depth_ok_for_dir_ops(&ctx_curl, false));
    }

    #[test]
    fn office_relaxes_lock_token_only() {
        let composite = CompositeDialect::all_known();
        let ctx = DialectCtx {
            user_agent: Some("Microsoft Office Word 2019"),
        };
        assert!(composite.ensure_lock_ok_for_proppatch(&ctx, false));
        assert!(!composite.ensure_depth_ok_for_dir_ops(&ctx, false));
    }
}

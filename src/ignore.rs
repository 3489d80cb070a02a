//! Client litter filter (spec.md §4.3.1): macOS Finder, Windows, and
//! various desktop clients probe for sentinel files (`.DS_Store`,
//! `._*`, `Thumbs.db`, `desktop.ini`, `.Trash*`) the server should
//! refuse to fabricate. Grounded on the teacher's `util::dav_method`
//! module, which keeps this kind of client-quirk table as a small
//! static list rather than spreading it through the handlers.

use globset::{Glob, GlobSet, GlobSetBuilder};

const DEFAULT_PATTERNS: &[&str] = &[
    ".DS_Store",
    "._*",
    ".Spotlight-V100",
    ".Trashes",
    ".fseventsd",
    "Thumbs.db",
    "desktop.ini",
    "$RECYCLE.BIN",
    ".~lock.*#",
];

/// Matches file/directory *names* (not full paths) against a set of
/// glob patterns. A match means: never fabricate it, return 404 for any
/// verb that would otherwise synthesize content there.
pub struct IgnoreFilter {
    set: GlobSet,
}

impl IgnoreFilter {
    pub fn new(extra_patterns: &[String]) -> IgnoreFilter {
        let mut builder = GlobSetBuilder::new();
        for pat in DEFAULT_PATTERNS {
            builder.add(Glob::new(pat).expect("built-in ignore glob is valid"));
        }
        for pat in extra_patterns {
            if let Ok(glob) = Glob::new(pat) {
                builder.add(glob);
            }
        }
        IgnoreFilter {
            set: builder.build().expect("ignore globset compiles"),
        }
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.set.is_match(name)
    }
}

impl Default for IgnoreFilter {
    fn default() -> Self {
        IgnoreFilter::new(&[])
    }
}

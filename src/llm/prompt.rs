//! Pure prompt construction (spec.md §4.5). No I/O, no async — a
//! string in, a string out, which is what makes it unit-testable
//! without a transport.

use serde_json::json;

use crate::path::Path;

/// What the orchestrator is asking the model to fabricate.
pub enum FabricationTarget<'a> {
    Listing { depth: Option<&'a str> },
    FileContent { mime_hint: Option<&'a str> },
}

/// Ordered `(matcher, hint)` pairs evaluated against the last path
/// segment(s); the first match wins, falling through to the default
/// bucket (the five buckets spec.md §4.5 names, not a classifier).
const STYLE_HINTS: &[(&str, &str)] = &[
    ("src", "code-like filenames (source files, modules, tests)"),
    ("lib", "code-like filenames (source files, modules, tests)"),
    ("docs", "documentation-like filenames (guides, references)"),
    ("doc", "documentation-like filenames (guides, references)"),
    ("readme", "documentation-like filenames (guides, references)"),
    ("music", "a tracklist of song-like filenames"),
    ("songs", "a tracklist of song-like filenames"),
    ("photos", "image filenames with plausible extensions"),
    ("images", "image filenames with plausible extensions"),
    ("pictures", "image filenames with plausible extensions"),
];

fn style_hint_for(segments: &[String]) -> &'static str {
    for seg in segments.iter().rev().take(2) {
        let lower = seg.to_ascii_lowercase();
        for (matcher, hint) in STYLE_HINTS {
            if lower.contains(matcher) {
                return hint;
            }
        }
    }
    "a plausible mix of files and subfolders for this kind of directory"
}

fn tool_name(target: &FabricationTarget) -> &'static str {
    match target {
        FabricationTarget::Listing { .. } => "emit_fs_listing",
        FabricationTarget::FileContent { .. } => "emit_file_content",
    }
}

/// Build the plain-text prompt for one fabrication call.
pub fn build_prompt(path: &Path, target: &FabricationTarget) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Call exactly one `{}` tool with no other output.",
        tool_name(target)
    ));

    match target {
        FabricationTarget::Listing { depth } => {
            if let Some(depth) = depth {
                lines.push(format!("WEBDAV_DEPTH={depth}"));
            }
            lines.push(format!(
                "Style hint: {}",
                style_hint_for(path.segments())
            ));
        }
        FabricationTarget::FileContent { mime_hint } => {
            if let Some(mime) = mime_hint {
                lines.push(format!("Expected content type: {mime}"));
            }
            lines.push(format!(
                "Style hint: {}",
                style_hint_for(path.segments())
            ));
        }
    }

    // The pure root-path rule (spec.md §4.5): the root's folder_array
    // is `[]`, never `["root"]`.
    let request = json!({
        "path": path.display_path(),
        "folder_array": path.segments(),
    });
    if path.is_root() {
        lines.push("This request is for the root path; folder_array must be [].".to_string());
    }
    lines.push(format!("REQUEST={request}"));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_prompt_notes_the_empty_array_rule() {
        let prompt = build_prompt(&Path::root(), &FabricationTarget::Listing { depth: Some("1") });
        assert!(prompt.contains("folder_array must be []"));
        assert!(prompt.contains("\"folder_array\":[]"));
        assert!(prompt.contains("emit_fs_listing"));
        assert!(prompt.contains("WEBDAV_DEPTH=1"));
    }

    #[test]
    fn nested_path_does_not_claim_the_root_rule() {
        let path = Path::root().child("src").child("main.rs");
        let prompt = build_prompt(&path, &FabricationTarget::FileContent { mime_hint: Some("text/plain") });
        assert!(!prompt.contains("folder_array must be []"));
        assert!(prompt.contains("code-like filenames"));
        assert!(prompt.contains("emit_file_content"));
    }

    #[test]
    fn style_hint_falls_through_to_default() {
        let path = Path::root().child("misc");
        assert_eq!(
            style_hint_for(path.segments()),
            "a plausible mix of files and subfolders for this kind of directory"
        );
    }
}

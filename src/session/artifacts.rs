// SPDX-License-Identifier: MIT
//! Artifact collection — sweep session directories for screenshots the MCP
//! server wrote as side effects of tool calls.

use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::Session;

/// One file believed to be a session output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Resolved filesystem path.  Existence was checked at collection time;
    /// the file may still vanish before render.
    pub path: PathBuf,
    /// Display name — the base filename.
    pub caption: String,
}

impl Artifact {
    pub fn new(path: PathBuf) -> Self {
        let caption = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, caption }
    }
}

fn screenshot_matcher() -> GlobMatcher {
    // Infallible for a fixed pattern; compiled per sweep, which is cheap at
    // session-teardown frequency.
    Glob::new("*.png")
        .expect("valid glob pattern")
        .compile_matcher()
}

/// Sweep the session's default search locations (cwd, output root,
/// screenshots dir) for screenshots.  Idempotent and monotonic: only adds,
/// never removes, and converges once no new files appear.
pub fn collect_artifacts(session: &mut Session) {
    let locations = session.search_locations();
    collect_into(session, &locations);
}

/// Sweep an explicit, ordered set of directories.  Directories that do not
/// exist or cannot be read yield zero matches, not an error.
pub fn collect_into(session: &mut Session, locations: &[PathBuf]) {
    let matcher = screenshot_matcher();
    for dir in locations {
        for path in matching_files(dir, &matcher) {
            session.add_artifact(&path);
        }
    }
    debug!(
        artifacts = session.artifacts.len(),
        "artifact sweep complete"
    );
}

/// Non-recursive scan of one directory for files matching the glob.
fn matching_files(dir: &Path, matcher: &GlobMatcher) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        // Missing or unreadable directory — silently skipped.
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .map(|name| matcher.is_match(name))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn session_in(dir: &Path) -> Session {
        Session::new(dir.join("output")).unwrap()
    }

    #[test]
    fn collects_png_files_only() {
        let dir = tempdir().unwrap();
        let mut session = session_in(dir.path());
        std::fs::write(session.screenshots_dir.join("login_page.png"), b"png").unwrap();
        std::fs::write(session.screenshots_dir.join("notes.txt"), b"text").unwrap();

        let locations = vec![session.screenshots_dir.clone()];
        collect_into(&mut session, &locations);
        assert_eq!(session.artifacts.len(), 1);
        assert_eq!(
            session.artifacts.values().next().unwrap().caption,
            "login_page.png"
        );
    }

    #[test]
    fn repeated_collection_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut session = session_in(dir.path());
        std::fs::write(session.output_root.join("a.png"), b"png").unwrap();
        std::fs::write(session.screenshots_dir.join("b.png"), b"png").unwrap();

        let locations = vec![
            session.output_root.clone(),
            session.screenshots_dir.clone(),
        ];
        collect_into(&mut session, &locations);
        let first: Vec<_> = session.artifacts.keys().cloned().collect();
        collect_into(&mut session, &locations);
        let second: Vec<_> = session.artifacts.keys().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn collection_is_monotonic_across_new_files() {
        let dir = tempdir().unwrap();
        let mut session = session_in(dir.path());
        std::fs::write(session.output_root.join("first.png"), b"png").unwrap();

        let locations = vec![session.output_root.clone()];
        collect_into(&mut session, &locations);
        assert_eq!(session.artifacts.len(), 1);

        std::fs::write(session.output_root.join("second.png"), b"png").unwrap();
        collect_into(&mut session, &locations);
        assert_eq!(session.artifacts.len(), 2);
    }

    #[test]
    fn missing_directory_yields_zero_matches() {
        let dir = tempdir().unwrap();
        let mut session = session_in(dir.path());
        let locations = vec![dir.path().join("does-not-exist")];
        collect_into(&mut session, &locations);
        assert!(session.artifacts.is_empty());
    }
}

// SPDX-License-Identifier: MIT
//! Session state — the event log and artifact set behind one automation run.
//!
//! A `Session` is created at orchestration start, mutated only by the
//! orchestrator's single thread of control, and consumed as a snapshot by
//! the report synthesizer.  Events are append-only; the artifact map only
//! grows.

pub mod artifacts;

pub use artifacts::{collect_artifacts, collect_into, Artifact};

use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Longest `result` text stored on an event.  Applied by callers before
/// append; the report renders stored text in full.
pub const RESULT_TRUNCATE_LEN: usize = 200;

/// Timestamp format used for event display and session IDs.
const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where a finished session ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    CompletedOk,
    CompletedError,
}

/// The outcome attached to one logged event.  Success and failure are
/// mutually exclusive by construction; an event may also carry neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(String),
}

/// One logged occurrence.  Never edited or removed after append.
#[derive(Debug, Clone)]
pub struct Event {
    pub timestamp: DateTime<Local>,
    pub action: String,
    pub outcome: Option<Outcome>,
}

impl Event {
    /// Wall-clock timestamp at second resolution, for display.
    pub fn time_display(&self) -> String {
        self.timestamp.format(EVENT_TIME_FORMAT).to_string()
    }
}

/// One end-to-end orchestration run.
pub struct Session {
    /// Timestamp-derived identifier, unique per run.
    pub id: String,
    pub output_root: PathBuf,
    pub screenshots_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub events: Vec<Event>,
    /// Keyed by resolved path — collecting the same file twice is a no-op.
    pub artifacts: BTreeMap<PathBuf, Artifact>,
    pub status: SessionStatus,
}

impl Session {
    /// Create a session rooted at `output_root`, creating the output
    /// directory tree idempotently.
    pub fn new(output_root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let output_root = output_root.into();
        let screenshots_dir = output_root.join("screenshots");
        let reports_dir = output_root.join("reports");
        std::fs::create_dir_all(&screenshots_dir)?;
        std::fs::create_dir_all(&reports_dir)?;

        Ok(Self {
            id: Local::now().format("%Y%m%d_%H%M%S").to_string(),
            output_root,
            screenshots_dir,
            reports_dir,
            events: Vec::new(),
            artifacts: BTreeMap::new(),
            status: SessionStatus::Running,
        })
    }

    /// Append an event with no outcome.
    pub fn log(&mut self, action: impl Into<String>) {
        self.append(action.into(), None);
    }

    /// Append an event carrying a result.
    pub fn log_result(&mut self, action: impl Into<String>, result: impl Into<String>) {
        self.append(action.into(), Some(Outcome::Success(result.into())));
    }

    /// Append an event carrying an error.
    pub fn log_error(&mut self, action: impl Into<String>, error: impl Into<String>) {
        self.append(action.into(), Some(Outcome::Failure(error.into())));
    }

    /// The directories the artifact collector scans, in order: current
    /// working directory, output root, screenshots subdirectory.
    pub fn search_locations(&self) -> Vec<PathBuf> {
        let mut locations = Vec::with_capacity(3);
        if let Ok(cwd) = std::env::current_dir() {
            locations.push(cwd);
        }
        locations.push(self.output_root.clone());
        locations.push(self.screenshots_dir.clone());
        locations
    }

    /// Record an artifact, deduplicated by resolved path.
    pub fn add_artifact(&mut self, path: &Path) {
        let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.artifacts
            .entry(resolved.clone())
            .or_insert_with(|| Artifact::new(resolved));
    }

    // Logging must never itself fail the session: malformed input (e.g. an
    // empty action) is accepted as-is.
    fn append(&mut self, action: String, outcome: Option<Outcome>) {
        let event = Event {
            timestamp: Local::now(),
            action,
            outcome,
        };
        // Live status sink — real-time visibility without blocking the append.
        match &event.outcome {
            Some(Outcome::Failure(e)) => {
                info!(time = %event.time_display(), action = %event.action, error = %e, "session event")
            }
            _ => info!(time = %event.time_display(), action = %event.action, "session event"),
        }
        self.events.push(event);
    }
}

/// Bound `text` to `RESULT_TRUNCATE_LEN` characters, marking the cut with an
/// ellipsis.  Char-based, so multi-byte input never splits a code point.
pub fn truncate_result(text: &str) -> String {
    if text.chars().count() <= RESULT_TRUNCATE_LEN {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(RESULT_TRUNCATE_LEN).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn events_append_in_chronological_order() {
        let dir = tempdir().unwrap();
        let mut session = Session::new(dir.path().join("output")).unwrap();
        session.log_result("Server started", "ok");
        session.log("User request: navigate");
        session.log_error("Request failed", "boom");

        assert_eq!(session.events.len(), 3);
        for pair in session.events.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        assert_eq!(session.events[0].action, "Server started");
        assert_eq!(
            session.events[2].outcome,
            Some(Outcome::Failure("boom".into()))
        );
    }

    #[test]
    fn empty_action_is_accepted() {
        let dir = tempdir().unwrap();
        let mut session = Session::new(dir.path().join("output")).unwrap();
        session.log("");
        assert_eq!(session.events.len(), 1);
    }

    #[test]
    fn new_session_creates_directory_tree() {
        let dir = tempdir().unwrap();
        let session = Session::new(dir.path().join("output")).unwrap();
        assert!(session.screenshots_dir.is_dir());
        assert!(session.reports_dir.is_dir());
        assert_eq!(session.id.len(), "20260829_120000".len());
    }

    #[test]
    fn add_artifact_deduplicates_by_resolved_path() {
        let dir = tempdir().unwrap();
        let mut session = Session::new(dir.path().join("output")).unwrap();
        let shot = session.screenshots_dir.join("login_page.png");
        std::fs::write(&shot, b"png").unwrap();

        session.add_artifact(&shot);
        session.add_artifact(&shot);
        assert_eq!(session.artifacts.len(), 1);
        let artifact = session.artifacts.values().next().unwrap();
        assert_eq!(artifact.caption, "login_page.png");
    }

    #[test]
    fn truncate_keeps_short_text_verbatim() {
        assert_eq!(truncate_result("all good"), "all good");
        let exactly = "x".repeat(RESULT_TRUNCATE_LEN);
        assert_eq!(truncate_result(&exactly), exactly);
    }

    #[test]
    fn truncate_cuts_long_text_with_ellipsis() {
        let long = "y".repeat(RESULT_TRUNCATE_LEN + 1);
        let cut = truncate_result(&long);
        assert_eq!(cut.chars().count(), RESULT_TRUNCATE_LEN + 3);
        assert!(cut.ends_with("..."));
    }

    proptest! {
        #[test]
        fn truncate_never_exceeds_bound(text in ".*") {
            let cut = truncate_result(&text);
            prop_assert!(cut.chars().count() <= RESULT_TRUNCATE_LEN + 3);
            // The stored text is always a prefix of the original.
            let prefix: String = text.chars().take(RESULT_TRUNCATE_LEN).collect();
            prop_assert!(cut.starts_with(&prefix) || cut == text);
        }
    }
}

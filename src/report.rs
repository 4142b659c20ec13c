// SPDX-License-Identifier: MIT
//! Report synthesis — render one immutable HTML document from a session
//! snapshot.
//!
//! The document is print-oriented (A4 page box, `@media print` page breaks)
//! so it reads as a paginated report: title block, session metadata, the
//! full event log, then — only when artifacts exist — a page break and one
//! image block per screenshot, embedded as a base64 data URI.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Local;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::PilotError;
use crate::session::{Outcome, Session};

const REPORT_TITLE: &str = "Browser Automation Report";

const REPORT_STYLE: &str = r#"
  body { font-family: Georgia, serif; max-width: 46em; margin: 2em auto; color: #1a1a2e; }
  h1 { text-align: center; color: #16325c; }
  h2 { color: #16325c; border-bottom: 1px solid #ccd; padding-bottom: 0.2em; }
  .meta p { margin: 0.2em 0; }
  .event { margin: 1em 0; }
  .event .time { color: #667; font-size: 0.9em; }
  .event .error { color: #b00020; }
  .artifact { margin: 1.5em 0; text-align: center; }
  .artifact img { max-width: 100%; border: 1px solid #ccd; }
  .artifact .caption { font-style: italic; color: #667; }
  @media print {
    .screenshots { page-break-before: always; }
    .event { page-break-inside: avoid; }
  }
  @page { size: A4; margin: 2cm; }
"#;

/// Render the session into `reports_dir` and return the report path.
///
/// `sequence` distinguishes successive renders of the same session (an
/// on-demand report and the final one are distinct files); every filename
/// embeds the session id.
///
/// Never fails silently: an unwritable destination is `ReportWrite`.  An
/// artifact that became unreadable since collection degrades to an inline
/// error note for that entry.
pub fn render_report(session: &Session, sequence: u32) -> Result<PathBuf, PilotError> {
    let path = report_path(session, sequence);
    let html = render_html(session);
    std::fs::write(&path, html).map_err(|source| PilotError::ReportWrite {
        path: path.clone(),
        source,
    })?;
    info!(report = %path.display(), "report generated");
    Ok(path)
}

/// The destination path for render number `sequence` of this session.
pub fn report_path(session: &Session, sequence: u32) -> PathBuf {
    session
        .reports_dir
        .join(format!("webpilot-session-{}-{:02}.html", session.id, sequence))
}

fn render_html(session: &Session) -> String {
    let mut html = String::with_capacity(16 * 1024);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{REPORT_TITLE}</title>\n<style>{REPORT_STYLE}</style>\n</head>\n<body>\n"
    );

    // Title + session metadata.
    let _ = write!(html, "<h1>{REPORT_TITLE}</h1>\n<div class=\"meta\">\n");
    let _ = write!(
        html,
        "<p><b>Session ID:</b> {}</p>\n",
        escape_html(&session.id)
    );
    let _ = write!(
        html,
        "<p><b>Generated:</b> {}</p>\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    let _ = write!(
        html,
        "<p><b>Total actions:</b> {}</p>\n</div>\n",
        session.events.len()
    );

    // Event log, one block per event, stored text rendered in full.
    html.push_str("<h2>Actions Log</h2>\n");
    for (i, event) in session.events.iter().enumerate() {
        let _ = write!(
            html,
            "<div class=\"event\">\n<p><b>Step {}:</b> {}</p>\n\
             <p class=\"time\">{}</p>\n",
            i + 1,
            escape_html(&event.action),
            event.time_display()
        );
        match &event.outcome {
            Some(Outcome::Success(result)) => {
                let _ = write!(html, "<p><b>Result:</b> {}</p>\n", escape_html(result));
            }
            Some(Outcome::Failure(error)) => {
                let _ = write!(
                    html,
                    "<p class=\"error\"><b>Error:</b> {}</p>\n",
                    escape_html(error)
                );
            }
            None => {}
        }
        html.push_str("</div>\n");
    }

    // Screenshot pages — omitted entirely when no artifacts were collected.
    if !session.artifacts.is_empty() {
        html.push_str("<div class=\"screenshots\">\n<h2>Screenshots</h2>\n");
        for artifact in session.artifacts.values() {
            match embed_png(&artifact.path) {
                Ok(data_uri) => {
                    let _ = write!(
                        html,
                        "<div class=\"artifact\">\n<img src=\"{}\" alt=\"{}\">\n\
                         <p class=\"caption\">{}</p>\n</div>\n",
                        data_uri,
                        escape_html(&artifact.caption),
                        escape_html(&artifact.caption)
                    );
                }
                Err(err) => {
                    let _ = write!(
                        html,
                        "<p class=\"error\"><b>Error loading screenshot:</b> {}</p>\n",
                        escape_html(&err.to_string())
                    );
                }
            }
        }
        html.push_str("</div>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Read a PNG from disk and encode it as a data URI.
fn embed_png(path: &Path) -> Result<String, PilotError> {
    let bytes = std::fs::read(path).map_err(|e| PilotError::Artifact {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    if bytes.is_empty() {
        return Err(PilotError::Artifact {
            path: path.to_path_buf(),
            detail: "file is empty".to_string(),
        });
    }
    Ok(format!("data:image/png;base64,{}", BASE64.encode(&bytes)))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

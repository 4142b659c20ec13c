// SPDX-License-Identifier: MIT
// Launch configuration for the Playwright MCP server subprocess.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default per-tool-call timeout enforced by the MCP server itself (ms).
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 30_000;
/// Default per-page-load timeout enforced by the MCP server itself (ms).
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 60_000;
/// Default upper bound for session acquisition (spawn + handshake + tool list).
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 60;

/// How to launch one Playwright MCP server process.
///
/// The arg vector mirrors the upstream CLI:
/// `npx -y @playwright/mcp@latest --output-dir <dir> --timeout-action <ms>
/// --timeout-navigation <ms> --isolated --headless`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpLaunchConfig {
    /// Executable to run.  Defaults to `"npx"`; overridable for tests and
    /// for locally installed server binaries.
    pub command: String,

    /// Root directory where the server writes captured artifacts.
    pub output_dir: PathBuf,

    /// Per-tool-call upper bound, in milliseconds.
    pub action_timeout_ms: u64,

    /// Per-page-load upper bound, in milliseconds.
    pub navigation_timeout_ms: u64,

    /// Keep the browser profile in memory — no state persists across sessions.
    pub isolated: bool,

    /// Run the browser without any visible UI surface.
    pub headless: bool,

    /// Upper bound for the whole acquisition sequence (distinct from the
    /// per-action timeouts above, which the server enforces itself).
    pub handshake_timeout_secs: u64,
}

impl McpLaunchConfig {
    /// Config pointing the server's artifact output at `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: "npx".to_string(),
            output_dir: output_dir.into(),
            action_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            isolated: true,
            headless: true,
            handshake_timeout_secs: DEFAULT_HANDSHAKE_TIMEOUT_SECS,
        }
    }

    /// The argument vector passed to `command`.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "@playwright/mcp@latest".to_string(),
            "--output-dir".to_string(),
            self.output_dir.to_string_lossy().into_owned(),
            "--timeout-action".to_string(),
            self.action_timeout_ms.to_string(),
            "--timeout-navigation".to_string(),
            self.navigation_timeout_ms.to_string(),
        ];
        if self.isolated {
            args.push("--isolated".to_string());
        }
        if self.headless {
            args.push("--headless".to_string());
        }
        args
    }

    /// Acquisition bound as a `Duration`.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_include_isolation_and_headless() {
        let config = McpLaunchConfig::new("output");
        let args = config.args();
        assert_eq!(args[0], "-y");
        assert_eq!(args[1], "@playwright/mcp@latest");
        assert!(args.contains(&"--isolated".to_string()));
        assert!(args.contains(&"--headless".to_string()));
        assert!(args.contains(&"30000".to_string()));
        assert!(args.contains(&"60000".to_string()));
    }

    #[test]
    fn headed_config_omits_headless_flag() {
        let mut config = McpLaunchConfig::new("output");
        config.headless = false;
        assert!(!config.args().contains(&"--headless".to_string()));
    }

    #[test]
    fn handshake_timeout_defaults_to_sixty_seconds() {
        let config = McpLaunchConfig::new("output");
        assert_eq!(config.handshake_timeout(), Duration::from_secs(60));
    }
}

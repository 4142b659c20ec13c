// SPDX-License-Identifier: MIT
// `webpilot` CLI — interactive browser-automation REPL and scripted login runs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write as _};
use std::path::PathBuf;

use webpilot::config::McpLaunchConfig;
use webpilot::controller::{openai, prompts, OpenAiController};
use webpilot::mcp::McpSession;
use webpilot::orchestrator::{
    SessionOrchestrator, INTERACTIVE_REQUEST_TIMEOUT, SCRIPTED_REQUEST_TIMEOUT,
};
use webpilot::session::Session;

const DEFAULT_LOGIN_URL: &str = "http://localhost:81/dashboard/";

#[derive(Parser)]
#[command(
    name = "webpilot",
    about = "LLM-driven browser automation sessions with durable HTML reports",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Root directory for screenshots and reports
    #[arg(long, env = "WEBPILOT_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Model name sent to the chat-completions endpoint
    #[arg(long, env = "WEBPILOT_MODEL", default_value = openai::DEFAULT_MODEL)]
    model: String,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "WEBPILOT_BASE_URL", default_value = openai::DEFAULT_BASE_URL)]
    base_url: String,

    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "WEBPILOT_LOG")]
    log: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive request loop (default when no subcommand given).
    ///
    /// Type free-text automation requests at the prompt; 'report' renders an
    /// on-demand report, 'exit' quits and renders the final one.
    Run,
    /// Scripted login automation: navigate, fill the form, screenshot each
    /// step, and report. Missing parameters are prompted for.
    Login {
        /// Login page URL
        #[arg(long)]
        url: Option<String>,
        /// Username to fill in (optional)
        #[arg(long)]
        username: Option<String>,
        /// Password to fill in (optional)
        #[arg(long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref());

    let session =
        Session::new(&args.output_dir).context("could not create session output directories")?;
    let mut launch = McpLaunchConfig::new(&args.output_dir);
    launch.headless = !args.headed;
    let backend = McpSession::new(launch);

    match args.command.unwrap_or(Command::Run) {
        Command::Run => {
            let controller = OpenAiController::from_env(
                args.base_url,
                args.model,
                prompts::BROWSER_ASSISTANT.to_string(),
            );
            let mut orchestrator = SessionOrchestrator::new(
                session,
                backend,
                controller,
                INTERACTIVE_REQUEST_TIMEOUT,
            );
            let outcome = orchestrator.run_interactive(io::stdin().lock()).await;
            print_reports(orchestrator.reports());
            outcome?;
        }
        Command::Login {
            url,
            username,
            password,
        } => {
            let url = nonempty(url)
                .or_else(|| prompt_line("Login URL: "))
                .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string());
            let username = nonempty(username)
                .or_else(|| prompt_line("Username (optional, Enter to skip): "));
            let password = nonempty(password)
                .or_else(|| prompt_line("Password (optional, Enter to skip): "));
            let request =
                prompts::build_login_request(&url, username.as_deref(), password.as_deref());

            let controller = OpenAiController::from_env(
                args.base_url,
                args.model,
                prompts::LOGIN_SPECIALIST.to_string(),
            );
            let mut orchestrator =
                SessionOrchestrator::new(session, backend, controller, SCRIPTED_REQUEST_TIMEOUT);
            let outcome = orchestrator.run_scripted(&request).await;
            print_reports(orchestrator.reports());
            match outcome? {
                Some(_) => println!("Login automation completed."),
                None => println!("Login automation failed — check the report for details."),
            }
        }
    }

    Ok(())
}

fn init_tracing(level: Option<&str>) {
    use tracing_subscriber::EnvFilter;
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_reports(reports: &[PathBuf]) {
    for report in reports {
        println!("Report: {}", report.display());
    }
}

fn nonempty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn prompt_line(label: &str) -> Option<String> {
    print!("{label}");
    let _ = io::stdout().flush();
    let mut line = String::new();
    io::stdin().read_line(&mut line).ok()?;
    let trimmed = line.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// File: cbpoller-server/src/cli.rs

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "cbpoller")]
#[command(author, version, about = "Long-polls the Chaturbate Events API and dispatches each event to a handler")]
pub struct Args {
    /// Broadcaster username (overrides CB_USERNAME)
    #[arg(long)]
    pub username: Option<String>,

    /// Events API token (overrides CB_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Server-side long-poll timeout in seconds (overrides CB_TIMEOUT)
    #[arg(long, allow_negative_numbers = true)]
    pub timeout: Option<i64>,

    /// Poll the testbed instead of production
    #[arg(long, default_value = "false")]
    pub testbed: bool,

    /// Event handler: "logging" or "database"
    #[arg(long)]
    pub handler: Option<String>,

    /// Raise the default log level to debug
    #[arg(long, short = 'v', default_value = "false")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, default_value = "false")]
    pub json_logs: bool,

    /// YAML settings file, lowest precedence
    #[arg(long)]
    pub config: Option<PathBuf>,
}

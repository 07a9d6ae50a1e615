use clap::{Parser, Subcommand};

use crate::commands;
use crate::error::Result;

/// Reloadr CLI - Automated page reloading with randomized delays
#[derive(Parser)]
#[command(name = "reloadr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Browser executable path (overrides auto-discovery)
    #[arg(long, env = "RELOADR_BROWSER_PATH", global = true)]
    pub browser_path: Option<String>,

    /// CDP debugging port for the launched browser
    #[arg(long, env = "RELOADR_CDP_PORT", global = true)]
    pub cdp_port: Option<u16>,

    /// Run the browser in headless mode
    #[arg(long, env = "RELOADR_HEADLESS", global = true)]
    pub headless: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reload a page repeatedly with randomized delays
    Run {
        /// Target URL (file:/// or http(s)://)
        url: String,

        /// Number of reloads to perform
        #[arg(short, long)]
        count: u32,

        /// Minimum delay between reloads in seconds
        #[arg(long, allow_negative_numbers = true)]
        min_delay: Option<f64>,

        /// Maximum delay between reloads in seconds
        #[arg(long, allow_negative_numbers = true)]
        max_delay: Option<f64>,

        /// Seconds to wait for a navigation to settle
        #[arg(long)]
        implicit_wait: Option<f64>,

        /// Disable the live progress bar (log one line per reload instead)
        #[arg(long)]
        no_progress: bool,

        /// Skip the summary table at the end of the run
        #[arg(long)]
        no_summary: bool,
    },

    /// List browsers discovered on this system
    Browsers,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Show configuration file path
    Path,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Run {
                url,
                count,
                min_delay,
                max_delay,
                implicit_wait,
                no_progress,
                no_summary,
            } => {
                let options = commands::run::RunOptions {
                    url: url.clone(),
                    count: *count,
                    min_delay: *min_delay,
                    max_delay: *max_delay,
                    implicit_wait: *implicit_wait,
                    no_progress: *no_progress,
                    no_summary: *no_summary,
                };
                commands::run::run(self, &options).await
            }
            Commands::Browsers => commands::browsers::run(self),
            Commands::Config { command } => commands::config::run(self, command),
        }
    }
}
